//! Reads authoritative entries from the primary store.
//!
//! Notifications may carry partial payloads, so every synchronization re-reads
//! the entries it indexes. Bulk reads go page by page so memory stays bounded
//! by the page size no matter how many entries a filter matches.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::SyncError;
use crate::interfaces::EntryStore;
use search_sync_shared::{EntityType, EntriesQuery, Entry, EntryKey};

/// Number of entries read per page.
pub const BATCH_SIZE: usize = 500;

/// Reader fetching entries one by one or in fixed-size pages.
#[derive(Clone)]
pub struct BatchedReader {
    store: Arc<dyn EntryStore>,
}

impl BatchedReader {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self { store }
    }

    /// Fetch one entry in full.
    ///
    /// A missing entry is a [`SyncError::FetchError`].
    #[instrument(skip(self, entity_type, query), fields(entity_type = %entity_type, entry_id = %id))]
    pub async fn fetch_entry(
        &self,
        entity_type: &EntityType,
        id: &EntryKey,
        query: &EntriesQuery,
    ) -> Result<Entry, SyncError> {
        self.store
            .get_entry(&entity_type.uid, id, query)
            .await
            .map_err(|e| SyncError::fetch(&entity_type.uid, id, e.to_string()))?
            .ok_or_else(|| SyncError::fetch(&entity_type.uid, id, "entry not found"))
    }

    /// Fetch every entry matching `filter`.
    #[instrument(skip(self, entity_type, filter), fields(entity_type = %entity_type))]
    pub async fn fetch_matching(
        &self,
        entity_type: &EntityType,
        filter: &Value,
    ) -> Result<Vec<Entry>, SyncError> {
        let total = self.store.count(&entity_type.uid, filter).await?;
        self.fetch_pages(entity_type, filter, total).await
    }

    /// Fetch `total` entries matching `filter`, [`BATCH_SIZE`] at a time,
    /// concatenated in store order.
    pub async fn fetch_pages(
        &self,
        entity_type: &EntityType,
        filter: &Value,
        total: usize,
    ) -> Result<Vec<Entry>, SyncError> {
        let mut entries = Vec::with_capacity(total);
        let mut offset = 0;
        while offset < total {
            let page = self
                .store
                .get_entries(&entity_type.uid, filter, offset, BATCH_SIZE)
                .await?;
            debug!(offset = offset, count = page.len(), "Read page of entries");
            entries.extend(page);
            offset += BATCH_SIZE;
        }
        Ok(entries)
    }
}
