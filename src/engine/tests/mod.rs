//! Engine tests: end-to-end detection against fake stores


use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::engine::MentionEngine;
use crate::error::StoreError;
use crate::reconcile::{InMemoryStore, KnowledgeStore, StoreRecord};

/// Wraps a store and counts lookups
pub(super) struct CountingStore {
    inner: InMemoryStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub(super) fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeStore for CountingStore {
    async fn find_by_title(
        &self,
        campaign_id: &str,
        title: &str,
    ) -> Result<Option<StoreRecord>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_title(campaign_id, title).await
    }
}

/// Fails lookups for selected names, answers the rest from memory
pub(super) struct FlakyStore {
    inner: InMemoryStore,
    failing: HashSet<String>,
}

impl FlakyStore {
    pub(super) fn new(inner: InMemoryStore, failing: &[&str]) -> Self {
        Self {
            inner,
            failing: failing.iter().map(|s| s.to_lowercase()).collect(),
        }
    }
}

#[async_trait]
impl KnowledgeStore for FlakyStore {
    async fn find_by_title(
        &self,
        campaign_id: &str,
        title: &str,
    ) -> Result<Option<StoreRecord>, StoreError> {
        if self.failing.contains(&title.to_lowercase()) {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        self.inner.find_by_title(campaign_id, title).await
    }
}

/// Every lookup fails
pub(super) struct DownStore;

#[async_trait]
impl KnowledgeStore for DownStore {
    async fn find_by_title(&self, _: &str, _: &str) -> Result<Option<StoreRecord>, StoreError> {
        Err(StoreError::Timeout)
    }
}

pub(super) fn campaign_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert("c1", StoreRecord::new("rec-gareth", "Gareth", "npc")).unwrap();
    store
        .insert("c1", StoreRecord::new("rec-inn", "Prancing Pony Inn", "location"))
        .unwrap();
    store
}

pub(super) fn engine_with(store: impl KnowledgeStore + 'static) -> MentionEngine {
    MentionEngine::new(Arc::new(store))
}
