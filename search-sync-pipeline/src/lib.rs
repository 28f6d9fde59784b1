//! # Search Sync Pipeline
//!
//! This crate keeps a search index in step with a primary record store by
//! reacting to the store's lifecycle notifications.
//!
//! ## Architecture
//!
//! 1. **Lifecycle**: subscribes to create/update/delete notifications per entity type
//! 2. **Reader**: re-fetches authoritative entries, paging through bulk writes
//! 3. **Processor**: transforms, redacts and filters entries into documents
//! 4. **Adapter**: derives collection-prefixed document ids
//! 5. **Loader**: sends documents to the index in detached, time-bounded tasks

pub mod adapter;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod lifecycle;
pub mod loader;
pub mod processor;
pub mod reader;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigResolver, EntityTypeConfig, ResolvedTypeConfig, SyncConfig};
pub use errors::{StoreError, SyncError};
pub use lifecycle::{DeleteCaptureStore, LifecycleSubscriber};
pub use loader::{
    spawn_failure_logger, DispatcherConfig, IndexDispatcher, IndexFailure, IndexLoader,
    IndexOperation,
};
pub use processor::EntryProcessor;
pub use reader::{BatchedReader, BATCH_SIZE};
