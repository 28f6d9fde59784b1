//! In-memory collaborators shared by the pipeline tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::errors::StoreError;
use crate::interfaces::{
    EntryStore, LifecycleHooks, LifecycleSubscription, StaticEntityTypeRegistry,
};
use search_sync_repository::{
    BatchOperationResult, BatchOperationSummary, SearchIndexError, SearchIndexProvider,
};
use search_sync_shared::{EntityType, EntriesQuery, Entry, EntryKey, IndexDocument, LifecycleEvent};

/// Build an entry from a JSON object literal.
pub fn entry(value: Value) -> Entry {
    Entry::try_from(value).expect("test entries are objects")
}

pub fn posts() -> EntityType {
    EntityType::new("api::post.post", "posts")
}

pub fn article() -> EntityType {
    EntityType::new("api::article.article", "article")
}

pub fn registry() -> StaticEntityTypeRegistry {
    StaticEntityTypeRegistry::new(vec![posts(), article()])
}

fn matches_filter(entry: &Entry, filter: &Value) -> bool {
    match filter {
        Value::Object(conditions) => conditions
            .iter()
            .all(|(field, expected)| entry.get(field) == Some(expected)),
        _ => true,
    }
}

/// Entry store over in-memory rows, recording every page read.
#[derive(Default)]
pub struct MemoryEntryStore {
    rows: Mutex<HashMap<String, Vec<Entry>>>,
    pages: Mutex<Vec<(usize, usize)>>,
    fail: AtomicBool,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, entity_type: &str, entry: Entry) {
        self.rows
            .lock()
            .await
            .entry(entity_type.to_string())
            .or_default()
            .push(entry);
    }

    pub async fn delete_row(&self, entity_type: &str, id: &EntryKey) {
        if let Some(rows) = self.rows.lock().await.get_mut(entity_type) {
            rows.retain(|row| row.id().as_ref() != Some(id));
        }
    }

    /// `(offset, limit)` of every page read so far.
    pub async fn pages(&self) -> Vec<(usize, usize)> {
        self.pages.lock().await.clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn get_entry(
        &self,
        entity_type: &str,
        id: &EntryKey,
        _query: &EntriesQuery,
    ) -> Result<Option<Entry>, StoreError> {
        self.check()?;
        let rows = self.rows.lock().await;
        Ok(rows
            .get(entity_type)
            .and_then(|rows| rows.iter().find(|row| row.id().as_ref() == Some(id)))
            .cloned())
    }

    async fn get_entries(
        &self,
        entity_type: &str,
        filter: &Value,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Entry>, StoreError> {
        self.check()?;
        self.pages.lock().await.push((offset, limit));
        let rows = self.rows.lock().await;
        Ok(rows
            .get(entity_type)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_filter(row, filter))
                    .skip(offset)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, entity_type: &str, filter: &Value) -> Result<usize, StoreError> {
        self.check()?;
        let rows = self.rows.lock().await;
        Ok(rows
            .get(entity_type)
            .map(|rows| rows.iter().filter(|row| matches_filter(row, filter)).count())
            .unwrap_or(0))
    }
}

/// One provider call.
#[derive(Debug, Clone)]
pub struct ProviderCall {
    pub op: &'static str,
    pub index: String,
    pub ids: Vec<String>,
    pub documents: Vec<IndexDocument>,
}

/// Search index provider recording every call.
#[derive(Default)]
pub struct RecordingProvider {
    calls: Mutex<Vec<ProviderCall>>,
    ensured: Mutex<Vec<(String, Value)>>,
    fail: AtomicBool,
    delay: Option<Duration>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose mutations take `delay` to complete.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().await.clone()
    }

    pub async fn ensured(&self) -> Vec<(String, Value)> {
        self.ensured.lock().await.clone()
    }

    async fn record(
        &self,
        op: &'static str,
        index: &str,
        ids: Vec<String>,
        documents: Vec<IndexDocument>,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(SearchIndexError::connection("index unreachable"));
        }
        let results = ids.iter().map(BatchOperationResult::succeeded).collect();
        self.calls.lock().await.push(ProviderCall {
            op,
            index: index.to_string(),
            ids,
            documents,
        });
        Ok(BatchOperationSummary::from_results(results))
    }
}

#[async_trait]
impl SearchIndexProvider for RecordingProvider {
    async fn ensure_index_exists(&self, index: &str, settings: &Value) -> Result<(), SearchIndexError> {
        self.ensured
            .lock()
            .await
            .push((index.to_string(), settings.clone()));
        Ok(())
    }

    async fn add_documents(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let ids = documents.iter().map(|d| d.id.clone()).collect();
        self.record("add", index, ids, documents.to_vec()).await
    }

    async fn update_documents(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let ids = documents.iter().map(|d| d.id.clone()).collect();
        self.record("update", index, ids, documents.to_vec()).await
    }

    async fn delete_documents(
        &self,
        index: &str,
        document_ids: &[String],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        self.record("delete", index, document_ids.to_vec(), Vec::new())
            .await
    }
}

/// Hook facility that delivers events synchronously to matching handlers.
#[derive(Default)]
pub struct RecordingHooks {
    subscriptions: Mutex<Vec<LifecycleSubscription>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscriptions(&self) -> Vec<LifecycleSubscription> {
        self.subscriptions.lock().await.clone()
    }

    /// Deliver `event` to every matching handler, in registration order.
    pub async fn emit(&self, event: LifecycleEvent) {
        let subscriptions = self.subscriptions().await;
        for subscription in subscriptions.iter().filter(|s| s.matches(&event)) {
            subscription.handler.handle(&event).await;
        }
    }
}

#[async_trait]
impl LifecycleHooks for RecordingHooks {
    async fn subscribe(&self, subscription: LifecycleSubscription) -> Result<(), StoreError> {
        self.subscriptions.lock().await.push(subscription);
        Ok(())
    }
}

/// Shared handle to a provider, usable where an `Arc<dyn SearchIndexProvider>` is needed.
pub fn provider_handle(provider: &Arc<RecordingProvider>) -> Arc<dyn SearchIndexProvider> {
    provider.clone()
}
