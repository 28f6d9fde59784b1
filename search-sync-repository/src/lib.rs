//! # Search Sync Repository
//!
//! This crate provides the index client used by the sync pipeline: the
//! `SearchIndexProvider` trait abstracting the search engine, the
//! `SearchIndexClient` that validates and chunks batches in front of it, and a
//! concrete implementation for OpenSearch.

pub mod client;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use client::SearchIndexClient;
pub use config::SearchIndexConfig;
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use opensearch::OpenSearchProvider;
pub use types::{BatchOperationResult, BatchOperationSummary};
