//! Knowledge-store seam
//!
//! The engine only ever reads: "find at most one record in campaign X whose
//! title equals `name`, case-insensitively". Backends implement
//! `KnowledgeStore`; `InMemoryStore` backs tests and the WASM detector.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreError;

/// A campaign record as the store reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: String,
    pub title: String,
    /// Record kind in the store ("npc", "location", ...)
    #[serde(rename = "type")]
    pub record_type: String,
}

impl StoreRecord {
    pub fn new(id: &str, title: &str, record_type: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            record_type: record_type.to_string(),
        }
    }
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Exact, case-insensitive title match within one campaign.
    async fn find_by_title(
        &self,
        campaign_id: &str,
        title: &str,
    ) -> Result<Option<StoreRecord>, StoreError>;
}

/// Campaign records held in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    campaigns: RwLock<HashMap<String, Vec<StoreRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, campaign_id: &str, record: StoreRecord) -> Result<(), StoreError> {
        let mut campaigns = self.campaigns.write().map_err(|_| poisoned())?;
        campaigns.entry(campaign_id.to_string()).or_default().push(record);
        Ok(())
    }

    /// Replace every record of one campaign
    pub fn hydrate(&self, campaign_id: &str, records: Vec<StoreRecord>) -> Result<(), StoreError> {
        let mut campaigns = self.campaigns.write().map_err(|_| poisoned())?;
        campaigns.insert(campaign_id.to_string(), records);
        Ok(())
    }

    pub fn record_count(&self, campaign_id: &str) -> usize {
        self.campaigns
            .read()
            .map(|c| c.get(campaign_id).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".into())
}

#[async_trait]
impl KnowledgeStore for InMemoryStore {
    async fn find_by_title(
        &self,
        campaign_id: &str,
        title: &str,
    ) -> Result<Option<StoreRecord>, StoreError> {
        let campaigns = self.campaigns.read().map_err(|_| poisoned())?;
        let wanted = title.to_lowercase();
        Ok(campaigns.get(campaign_id).and_then(|records| {
            records
                .iter()
                .find(|r| r.title.to_lowercase() == wanted)
                .cloned()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert("c1", StoreRecord::new("r1", "Gareth", "npc")).unwrap();
        store.insert("c1", StoreRecord::new("r2", "Old Mill", "location")).unwrap();
        store
    }

    #[tokio::test]
    async fn test_case_insensitive_exact_match() {
        let store = seeded();
        let hit = store.find_by_title("c1", "GARETH").await.unwrap();
        assert_eq!(hit.map(|r| r.id), Some("r1".to_string()));
    }

    #[tokio::test]
    async fn test_no_substring_match() {
        let store = seeded();
        assert!(store.find_by_title("c1", "Mill").await.unwrap().is_none());
        assert!(store.find_by_title("c1", "Gareth the guard").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scoped_to_campaign() {
        let store = seeded();
        assert!(store.find_by_title("c2", "Gareth").await.unwrap().is_none());
    }

    #[test]
    fn test_hydrate_replaces_campaign() {
        let store = seeded();
        store
            .hydrate("c1", vec![StoreRecord::new("r9", "Vex", "npc")])
            .unwrap();
        assert_eq!(store.record_count("c1"), 1);
    }

    #[test]
    fn test_record_type_serializes_as_type() {
        let json = serde_json::to_value(StoreRecord::new("r1", "Gareth", "npc")).unwrap();
        assert_eq!(json["type"], "npc");
    }
}
