//! Reconciler - Known/Novel classification against the knowledge store
//!
//! Every candidate gets its own lookup; all lookups of one call run
//! concurrently and the call completes once every one has settled. A failed
//! lookup becomes a value (`LookupOutcome::Failed`) and the candidate is
//! reported as Novel, so one bad lookup never sinks the batch.

pub mod store;

pub use store::*;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::scanner::{AnnotatedEntity, RawCandidate};

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Known(StoreRecord),
    Novel,
    Failed(StoreError),
}

/// A lookup that failed and was downgraded to Novel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupFailure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// One entry per input candidate, in input order
    pub entities: Vec<AnnotatedEntity>,
    pub failures: Vec<LookupFailure>,
}

pub struct Reconciler {
    store: Arc<dyn KnowledgeStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self { store }
    }

    /// Look one candidate up. A hit must echo the name and carry an id;
    /// anything else is a malformed response.
    pub async fn lookup(&self, candidate: &RawCandidate, campaign_id: &str) -> LookupOutcome {
        match self.store.find_by_title(campaign_id, &candidate.name).await {
            Ok(Some(record)) => {
                if record.id.trim().is_empty() {
                    LookupOutcome::Failed(StoreError::Malformed(format!(
                        "record for '{}' has no id",
                        candidate.name
                    )))
                } else if record.title.to_lowercase() != candidate.name_key() {
                    LookupOutcome::Failed(StoreError::Malformed(format!(
                        "asked for '{}', store returned '{}'",
                        candidate.name, record.title
                    )))
                } else {
                    LookupOutcome::Known(record)
                }
            }
            Ok(None) => LookupOutcome::Novel,
            Err(e) => LookupOutcome::Failed(e),
        }
    }

    pub async fn reconcile(&self, candidates: Vec<RawCandidate>, campaign_id: &str) -> Reconciliation {
        let outcomes = join_all(candidates.iter().map(|c| self.lookup(c, campaign_id))).await;

        let mut result = Reconciliation::default();
        for (candidate, outcome) in candidates.into_iter().zip(outcomes) {
            let entity = match outcome {
                LookupOutcome::Known(record) => {
                    AnnotatedEntity::known(candidate, record.id, record.record_type)
                }
                LookupOutcome::Novel => AnnotatedEntity::novel(candidate),
                LookupOutcome::Failed(err) => {
                    warn!(
                        campaign_id,
                        name = %candidate.name,
                        error = %err,
                        "store lookup failed, treating mention as novel"
                    );
                    result.failures.push(LookupFailure {
                        name: candidate.name.clone(),
                        error: err.to_string(),
                    });
                    AnnotatedEntity::novel(candidate)
                }
            };
            result.entities.push(entity);
        }

        debug!(
            campaign_id,
            entities = result.entities.len(),
            known = result.entities.iter().filter(|e| e.exists_in_store).count(),
            failures = result.failures.len(),
            "reconciliation complete"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{EntityCategory, GenerationHint};
    use async_trait::async_trait;

    fn cand(name: &str) -> RawCandidate {
        RawCandidate {
            text: name.to_string(),
            name: name.to_string(),
            category: EntityCategory::Character,
            generation_hint: Some(GenerationHint::new("npc")),
            start: 0,
            end: name.len(),
            priority_rank: 0,
            rule: "test".into(),
        }
    }

    /// Returns whatever record it was built with, for any title
    struct EchoStore(StoreRecord);

    #[async_trait]
    impl KnowledgeStore for EchoStore {
        async fn find_by_title(&self, _: &str, _: &str) -> Result<Option<StoreRecord>, StoreError> {
            Ok(Some(self.0.clone()))
        }
    }

    #[tokio::test]
    async fn test_known_and_novel() {
        let store = InMemoryStore::new();
        store.insert("c1", StoreRecord::new("r1", "Gareth", "npc")).unwrap();
        let reconciler = Reconciler::new(Arc::new(store));

        let out = reconciler.reconcile(vec![cand("Gareth"), cand("Vex")], "c1").await;
        assert_eq!(out.entities.len(), 2);
        assert!(out.entities[0].exists_in_store);
        assert_eq!(out.entities[0].store_record_type.as_deref(), Some("npc"));
        assert!(!out.entities[1].exists_in_store);
        assert!(out.entities[1].generation_hint.is_some());
        assert!(out.failures.is_empty());
    }

    #[tokio::test]
    async fn test_mismatched_title_is_malformed() {
        let reconciler = Reconciler::new(Arc::new(EchoStore(StoreRecord::new("r1", "Someone Else", "npc"))));
        let outcome = reconciler.lookup(&cand("Gareth"), "c1").await;
        assert!(matches!(outcome, LookupOutcome::Failed(StoreError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_missing_id_is_malformed_and_novel() {
        let reconciler = Reconciler::new(Arc::new(EchoStore(StoreRecord::new(" ", "Gareth", "npc"))));
        let out = reconciler.reconcile(vec![cand("Gareth")], "c1").await;
        assert!(!out.entities[0].exists_in_store);
        assert!(out.entities[0].store_record_id.is_none());
        assert_eq!(out.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let reconciler = Reconciler::new(Arc::new(InMemoryStore::new()));
        let out = reconciler.reconcile(Vec::new(), "c1").await;
        assert!(out.entities.is_empty());
    }
}
