//! Loader module for the search sync pipeline.
//!
//! Runs entries of one entity type through the processor and applies the
//! resulting documents to the type's index.

mod dispatcher;

pub use dispatcher::{
    spawn_failure_logger, DispatcherConfig, IndexDispatcher, IndexFailure, IndexOperation,
    DEFAULT_INDEX_TIMEOUT,
};

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::adapter::document_id;
use crate::config::ConfigResolver;
use crate::errors::SyncError;
use crate::processor::{log_abort, EntryProcessor};
use search_sync_repository::{BatchOperationSummary, SearchIndexClient};
use search_sync_shared::{EntityType, Entry};

/// Loader applying entries to the search index.
///
/// Indexes are created on first use with the type's settings, once per index
/// name for the lifetime of the loader.
pub struct IndexLoader {
    client: SearchIndexClient,
    resolver: Arc<ConfigResolver>,
    processor: EntryProcessor,
    ensured: Mutex<HashSet<String>>,
}

impl IndexLoader {
    /// Create a new loader writing through `client`.
    pub fn new(client: SearchIndexClient, resolver: Arc<ConfigResolver>) -> Self {
        Self {
            client,
            processor: EntryProcessor::new(resolver.clone()),
            resolver,
            ensured: Mutex::new(HashSet::new()),
        }
    }

    pub fn processor(&self) -> &EntryProcessor {
        &self.processor
    }

    async fn ensure_index(&self, entity_type: &EntityType, index: &str) -> Result<(), SyncError> {
        let mut ensured = self.ensured.lock().await;
        if ensured.contains(index) {
            return Ok(());
        }
        self.client
            .ensure_index(index, &self.resolver.settings(entity_type))
            .await?;
        ensured.insert(index.to_string());
        Ok(())
    }

    /// Index new entries.
    #[instrument(skip(self, entity_type, entries), fields(entity_type = %entity_type, count = entries.len()))]
    pub async fn add_entries(
        &self,
        entity_type: &EntityType,
        entries: Vec<Entry>,
    ) -> Result<BatchOperationSummary, SyncError> {
        let documents = self.processor.process(entity_type, entries).await;
        if documents.is_empty() {
            debug!("No documents to add");
            return Ok(BatchOperationSummary::empty());
        }

        let index = self.resolver.index_name_of(entity_type);
        self.ensure_index(entity_type, &index).await?;
        let summary = self
            .client
            .add_documents(&index, &documents)
            .await?
            .into_result()?;

        info!(index = %index, count = summary.succeeded, "Added documents");
        Ok(summary)
    }

    /// Re-index updated entries.
    ///
    /// Entries that no longer qualify (turned into drafts, moved to another
    /// locale, rejected by the filter) are deleted from the index. An aborted
    /// batch leaves the index untouched.
    #[instrument(skip(self, entity_type, entries), fields(entity_type = %entity_type, count = entries.len()))]
    pub async fn update_entries(
        &self,
        entity_type: &EntityType,
        entries: Vec<Entry>,
    ) -> Result<BatchOperationSummary, SyncError> {
        let candidates: Vec<String> = entries
            .iter()
            .filter_map(|entry| self.processor.key_of(entity_type, entry).ok())
            .map(|key| document_id(&entity_type.collection_name, &key))
            .collect();

        let documents = match self.processor.try_process(entity_type, entries).await {
            Ok(documents) => documents,
            Err(e) if e.is_pipeline_abort() => {
                log_abort(entity_type, &e);
                return Ok(BatchOperationSummary::empty());
            }
            Err(e) => return Err(e),
        };

        let kept: HashSet<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        let stale: Vec<String> = candidates
            .into_iter()
            .filter(|id| !kept.contains(id.as_str()))
            .collect();

        let index = self.resolver.index_name_of(entity_type);
        let mut summary = BatchOperationSummary::empty();
        if !documents.is_empty() {
            self.ensure_index(entity_type, &index).await?;
            summary.merge(
                self.client
                    .update_documents(&index, &documents)
                    .await?
                    .into_result()?,
            );
        }
        if !stale.is_empty() {
            debug!(count = stale.len(), "Removing entries that no longer qualify");
            summary.merge(
                self.client
                    .delete_documents(&index, &stale)
                    .await?
                    .into_result()?,
            );
        }

        info!(
            index = %index,
            updated = documents.len(),
            removed = stale.len(),
            "Updated documents"
        );
        Ok(summary)
    }

    /// Remove deleted entries from the index.
    ///
    /// Entries are the ones captured before deletion; only their keys are read.
    #[instrument(skip(self, entity_type, entries), fields(entity_type = %entity_type, count = entries.len()))]
    pub async fn delete_entries(
        &self,
        entity_type: &EntityType,
        entries: Vec<Entry>,
    ) -> Result<BatchOperationSummary, SyncError> {
        let ids = match entries
            .iter()
            .map(|entry| {
                self.processor
                    .key_of(entity_type, entry)
                    .map(|key| document_id(&entity_type.collection_name, &key))
            })
            .collect::<Result<Vec<_>, SyncError>>()
        {
            Ok(ids) => ids,
            Err(e) => {
                log_abort(entity_type, &e);
                return Ok(BatchOperationSummary::empty());
            }
        };
        if ids.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        let index = self.resolver.index_name_of(entity_type);
        let summary = self
            .client
            .delete_documents(&index, &ids)
            .await?
            .into_result()?;

        info!(index = %index, count = ids.len(), "Deleted documents");
        Ok(summary)
    }
}
