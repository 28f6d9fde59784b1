//! Primary store reader trait definition.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;
use search_sync_shared::{EntriesQuery, Entry, EntryKey};

/// Read access to the primary record store.
///
/// Entity types are addressed by uid. Filters are the store's own where-filter
/// objects, passed through untouched from bulk notifications.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Fetch one entry in full, applying the type's entries query.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Entry))` - The entry
    /// * `Ok(None)` - No entry with that id exists
    /// * `Err(StoreError)` - If the read fails
    async fn get_entry(
        &self,
        entity_type: &str,
        id: &EntryKey,
        query: &EntriesQuery,
    ) -> Result<Option<Entry>, StoreError>;

    /// Fetch one page of the entries matching `filter`, in store order.
    async fn get_entries(
        &self,
        entity_type: &str,
        filter: &Value,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Entry>, StoreError>;

    /// Count the entries matching `filter`.
    async fn count(&self, entity_type: &str, filter: &Value) -> Result<usize, StoreError>;
}
