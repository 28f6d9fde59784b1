//! User hooks applied to entries before indexing.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use search_sync_shared::{EntityType, Entry};

/// Error type user hooks may return.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Reshapes an entry before it is indexed.
///
/// The result must be a JSON object; anything else aborts the whole batch.
#[async_trait]
pub trait EntryTransform: Send + Sync {
    async fn transform(&self, entry: Entry, entity_type: &EntityType) -> Result<Value, HookError>;
}

/// Decides whether an entry is indexed.
#[async_trait]
pub trait EntryFilter: Send + Sync {
    async fn keep(&self, entry: &Entry, entity_type: &EntityType) -> Result<bool, HookError>;
}

struct TransformFn<F>(F);

#[async_trait]
impl<F> EntryTransform for TransformFn<F>
where
    F: Fn(Entry, &EntityType) -> Result<Value, HookError> + Send + Sync,
{
    async fn transform(&self, entry: Entry, entity_type: &EntityType) -> Result<Value, HookError> {
        (self.0)(entry, entity_type)
    }
}

struct FilterFn<F>(F);

#[async_trait]
impl<F> EntryFilter for FilterFn<F>
where
    F: Fn(&Entry, &EntityType) -> Result<bool, HookError> + Send + Sync,
{
    async fn keep(&self, entry: &Entry, entity_type: &EntityType) -> Result<bool, HookError> {
        (self.0)(entry, entity_type)
    }
}

/// Wrap a synchronous closure as an [`EntryTransform`].
pub fn transform_fn<F>(f: F) -> Arc<dyn EntryTransform>
where
    F: Fn(Entry, &EntityType) -> Result<Value, HookError> + Send + Sync + 'static,
{
    Arc::new(TransformFn(f))
}

/// Wrap a synchronous closure as an [`EntryFilter`].
pub fn filter_fn<F>(f: F) -> Arc<dyn EntryFilter>
where
    F: Fn(&Entry, &EntityType) -> Result<bool, HookError> + Send + Sync + 'static,
{
    Arc::new(FilterFn(f))
}
