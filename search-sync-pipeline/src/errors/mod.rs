//! Error types for the search sync pipeline.

use std::time::Duration;

use search_sync_repository::SearchIndexError;
use thiserror::Error;

/// Errors reported by the primary store collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A read query failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Registering lifecycle handlers or bookkeeping failed.
    #[error("Subscription error: {0}")]
    SubscriptionError(String),
}

impl StoreError {
    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a subscription error.
    pub fn subscription(msg: impl Into<String>) -> Self {
        Self::SubscriptionError(msg.into())
    }
}

/// Errors that can occur in the search sync pipeline.
///
/// None of these ever reach the primary store's write path: they are logged
/// where they are detected and the affected batch is not indexed.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Re-fetching authoritative entry data failed.
    #[error("Could not fetch entry {entry_id} of {entity_type}: {message}")]
    FetchError {
        entity_type: String,
        entry_id: String,
        message: String,
    },

    /// A configured transform failed or produced something other than an object.
    #[error("Indexing of {entity_type} aborted as the data could not be transformed: {message}")]
    TransformError { entity_type: String, message: String },

    /// A configured filter predicate failed.
    #[error("Indexing of {entity_type} aborted as the data could not be filtered: {message}")]
    FilterError { entity_type: String, message: String },

    /// The configured custom id could not be read from an entry.
    #[error("Indexing of {entity_type} aborted as the data could not be mapped: {message}")]
    CustomIdError { entity_type: String, message: String },

    /// The index client rejected an operation.
    #[error("Index error: {0}")]
    IndexError(#[from] SearchIndexError),

    /// The notification cannot be synchronized.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The primary store failed.
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// The entity type is not known to the registry.
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    /// An index operation did not finish in time.
    #[error("Index operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SyncError {
    /// Create a fetch error.
    pub fn fetch(
        entity_type: impl Into<String>,
        entry_id: impl ToString,
        msg: impl Into<String>,
    ) -> Self {
        Self::FetchError {
            entity_type: entity_type.into(),
            entry_id: entry_id.to_string(),
            message: msg.into(),
        }
    }

    /// Create a transform error.
    pub fn transform(entity_type: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::TransformError {
            entity_type: entity_type.into(),
            message: msg.into(),
        }
    }

    /// Create a filter error.
    pub fn filter(entity_type: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::FilterError {
            entity_type: entity_type.into(),
            message: msg.into(),
        }
    }

    /// Create a custom id error.
    pub fn custom_id(entity_type: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::CustomIdError {
            entity_type: entity_type.into(),
            message: msg.into(),
        }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the error aborted a batch inside the transform/filter pipeline.
    pub fn is_pipeline_abort(&self) -> bool {
        matches!(
            self,
            Self::TransformError { .. } | Self::FilterError { .. } | Self::CustomIdError { .. }
        )
    }
}
