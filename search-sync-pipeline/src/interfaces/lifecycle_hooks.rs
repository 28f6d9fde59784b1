//! Lifecycle hook facility trait definition.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::StoreError;
use search_sync_shared::{LifecycleEvent, LifecycleEventKind};

/// Receives the lifecycle notifications of the models it was subscribed for.
///
/// Handlers must not fail: whatever goes wrong is logged, never returned to the
/// store's write path.
#[async_trait]
pub trait LifecycleHandler: Send + Sync {
    /// Handle one notification.
    async fn handle(&self, event: &LifecycleEvent);
}

/// A handler registration.
#[derive(Clone)]
pub struct LifecycleSubscription {
    /// Entity type uids the handler listens to.
    pub models: Vec<String>,
    /// Notification kinds the handler receives.
    pub kinds: Vec<LifecycleEventKind>,
    /// The handler.
    pub handler: Arc<dyn LifecycleHandler>,
}

impl LifecycleSubscription {
    /// Whether this subscription receives `event`.
    pub fn matches(&self, event: &LifecycleEvent) -> bool {
        self.kinds.contains(&event.kind) && self.models.iter().any(|m| *m == event.model)
    }
}

/// The primary store's hook registration facility.
#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    /// Register a handler. The store calls it for every matching notification,
    /// in the order the notifications occur.
    async fn subscribe(&self, subscription: LifecycleSubscription) -> Result<(), StoreError>;
}
