//! Search index client implementation.
//!
//! This module provides the client the sync pipeline uses to add, update, and
//! delete documents. It validates batches and splits them into chunks the
//! provider can take in one request.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::config::SearchIndexConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::types::BatchOperationSummary;
use search_sync_shared::IndexDocument;

/// The client for mutating the search index.
pub struct SearchIndexClient {
    provider: Arc<dyn SearchIndexProvider>,
    config: SearchIndexConfig,
}

impl SearchIndexClient {
    /// Create a new SearchIndexClient with default configuration.
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self {
            provider,
            config: SearchIndexConfig::default(),
        }
    }

    /// Create a new SearchIndexClient with custom configuration.
    pub fn with_config(provider: Arc<dyn SearchIndexProvider>, config: SearchIndexConfig) -> Self {
        Self { provider, config }
    }

    fn validate_index(index: &str) -> Result<(), SearchIndexError> {
        if index.trim().is_empty() {
            return Err(SearchIndexError::validation("index name is required"));
        }
        Ok(())
    }

    fn validate_documents(documents: &[IndexDocument]) -> Result<(), SearchIndexError> {
        if documents.iter().any(|d| d.id.is_empty()) {
            return Err(SearchIndexError::validation(
                "All documents must have an id",
            ));
        }
        Ok(())
    }

    /// Run `op` over `items` in chunks of the configured size, merging the summaries.
    async fn chunked<'a, T, F, Fut>(
        &self,
        index: &str,
        items: &'a [T],
        op: F,
    ) -> Result<BatchOperationSummary, SearchIndexError>
    where
        F: Fn(&'a [T]) -> Fut,
        Fut: Future<Output = Result<BatchOperationSummary, SearchIndexError>>,
    {
        let mut summary = BatchOperationSummary::empty();
        for chunk in items.chunks(self.config.chunk_size(items.len())) {
            debug!(index = %index, count = chunk.len(), "Sending chunk to search index");
            summary.merge(op(chunk).await?);
        }
        Ok(summary)
    }

    /// Ensure an index exists with the given settings.
    pub async fn ensure_index(&self, index: &str, settings: &Value) -> Result<(), SearchIndexError> {
        Self::validate_index(index)?;
        self.provider.ensure_index_exists(index, settings).await
    }

    /// Add documents to an index.
    /// Input: index name, documents (each with a non-empty id)
    /// Output: Result<BatchOperationSummary, SearchIndexError>
    pub async fn add_documents(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }
        Self::validate_index(index)?;
        Self::validate_documents(documents)?;

        self.chunked(index, documents, |chunk| {
            self.provider.add_documents(index, chunk)
        })
        .await
    }

    /// Update documents in an index.
    /// Input: index name, documents (each with a non-empty id)
    /// Output: Result<BatchOperationSummary, SearchIndexError>
    pub async fn update_documents(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }
        Self::validate_index(index)?;
        Self::validate_documents(documents)?;

        self.chunked(index, documents, |chunk| {
            self.provider.update_documents(index, chunk)
        })
        .await
    }

    /// Delete documents from an index.
    /// Input: index name, external document ids
    /// Output: Result<BatchOperationSummary, SearchIndexError>
    ///
    /// Documents that don't exist are considered successful deletes.
    pub async fn delete_documents(
        &self,
        index: &str,
        document_ids: &[String],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if document_ids.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }
        Self::validate_index(index)?;
        if document_ids.iter().any(String::is_empty) {
            return Err(SearchIndexError::validation(
                "All document ids must be non-empty",
            ));
        }

        self.chunked(index, document_ids, |chunk| {
            self.provider.delete_documents(index, chunk)
        })
        .await
    }
}
