//! # Search Sync
//!
//! Entry crate for the lifecycle-driven search index sync.
//!
//! This crate wires the pipeline to OpenSearch from environment settings and
//! installs logging. The host provides the primary store collaborators.

pub mod config;
pub mod telemetry;

pub use config::{Collaborators, Dependencies, LogFormat, SyncSettings};
pub use telemetry::init_tracing;

use search_sync_pipeline::SyncError;
use search_sync_repository::SearchIndexError;
use thiserror::Error;

/// Errors that can occur while starting the sync.
#[derive(Error, Debug)]
pub enum SyncInitError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Sync error: {0}")]
    SyncError(#[from] SyncError),

    /// Search index error.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchIndexError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SyncInitError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
