//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::BatchOperationSummary;
use search_sync_shared::IndexDocument;

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// This trait defines the interface for all search index backend implementations. Implementations
/// are injected into `SearchIndexClient` to enable dependency injection and easy testing with
/// mock implementations.
///
/// Every method names the target index explicitly, since several entity types may
/// share one index while others have their own.
///
/// All methods return `Result<T, SearchIndexError>` for consistent error handling across
/// different backend implementations.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the index exists, creating it with the given settings if necessary.
    ///
    /// # Arguments
    ///
    /// * `index` - Name of the index
    /// * `settings` - Engine-specific index settings; `{}` uses the engine defaults
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError)` - If initialization fails
    async fn ensure_index_exists(&self, index: &str, settings: &Value)
        -> Result<(), SearchIndexError>;

    /// Add documents to the index, replacing documents with the same id.
    ///
    /// # Arguments
    ///
    /// * `index` - Name of the index
    /// * `documents` - Documents to add
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Contains aggregate statistics and individual results
    /// * `Err(SearchIndexError)` - If the bulk operation fails entirely
    async fn add_documents(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Update documents in the index, creating those that don't exist (upsert).
    ///
    /// # Arguments
    ///
    /// * `index` - Name of the index
    /// * `documents` - Documents to update
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Contains aggregate statistics and individual results
    /// * `Err(SearchIndexError)` - If the bulk operation fails entirely
    async fn update_documents(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Delete documents from the index by external id.
    ///
    /// Documents that don't exist are considered successful deletions.
    ///
    /// # Arguments
    ///
    /// * `index` - Name of the index
    /// * `document_ids` - External ids of the documents to delete
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Contains aggregate statistics and individual results
    /// * `Err(SearchIndexError)` - If the bulk operation fails entirely
    async fn delete_documents(
        &self,
        index: &str,
        document_ids: &[String],
    ) -> Result<BatchOperationSummary, SearchIndexError>;
}
