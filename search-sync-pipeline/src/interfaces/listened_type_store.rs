//! Listened-type bookkeeping.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::errors::StoreError;
use search_sync_shared::ListenedType;

/// Records which entity types are being synchronized.
#[async_trait]
pub trait ListenedTypeStore: Send + Sync {
    /// Record `uid` as listened. Recording a type twice is not an error.
    async fn record_listened(&self, uid: &str) -> Result<(), StoreError>;
}

/// Process-local bookkeeping, for hosts that do not persist it.
#[derive(Debug, Default)]
pub struct MemoryListenedTypeStore {
    types: Mutex<HashMap<String, ListenedType>>,
}

impl MemoryListenedTypeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Listened types, ordered by uid.
    pub async fn listened(&self) -> Vec<ListenedType> {
        let mut types: Vec<ListenedType> = self.types.lock().await.values().cloned().collect();
        types.sort_by(|a, b| a.uid.cmp(&b.uid));
        types
    }
}

#[async_trait]
impl ListenedTypeStore for MemoryListenedTypeStore {
    async fn record_listened(&self, uid: &str) -> Result<(), StoreError> {
        self.types
            .lock()
            .await
            .entry(uid.to_string())
            .or_insert_with(|| ListenedType::now(uid));
        Ok(())
    }
}
