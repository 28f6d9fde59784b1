//! Background execution of index mutations.
//!
//! Lifecycle handlers never wait for the index: every mutation runs in its own
//! task, bounded by a timeout, and failures go to a logging sink over a channel.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::errors::SyncError;
use crate::loader::IndexLoader;
use search_sync_shared::{EntityType, Entry};

/// Default upper bound for one index mutation.
pub const DEFAULT_INDEX_TIMEOUT: Duration = Duration::from_secs(30);

/// Kind of index mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOperation {
    Add,
    Update,
    Delete,
}

impl IndexOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for IndexOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A background index mutation that did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexFailure {
    pub operation: IndexOperation,
    /// Uid of the entity type.
    pub entity_type: String,
    /// Natural ids of the entries in the batch.
    pub entry_ids: Vec<String>,
    pub message: String,
}

/// Configuration for the index dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub index_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            index_timeout: DEFAULT_INDEX_TIMEOUT,
        }
    }
}

#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count when the task ends, however it ends.
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn acquire(in_flight: &Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::SeqCst);
        Self(in_flight.clone())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Spawns index mutations as detached, time-bounded tasks.
pub struct IndexDispatcher {
    loader: Arc<IndexLoader>,
    config: DispatcherConfig,
    failures: UnboundedSender<IndexFailure>,
    in_flight: Arc<InFlight>,
}

impl IndexDispatcher {
    /// Create a dispatcher and the receiving end of its failure channel.
    pub fn new(
        loader: Arc<IndexLoader>,
        config: DispatcherConfig,
    ) -> (Self, UnboundedReceiver<IndexFailure>) {
        let (failures, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            loader,
            config,
            failures,
            in_flight: Arc::new(InFlight::default()),
        };
        (dispatcher, rx)
    }

    /// Run `operation` over `entries` in the background.
    ///
    /// The returned handle may be dropped; the task keeps running.
    pub fn dispatch(
        &self,
        operation: IndexOperation,
        entity_type: EntityType,
        entries: Vec<Entry>,
    ) -> JoinHandle<()> {
        let guard = InFlightGuard::acquire(&self.in_flight);
        let loader = self.loader.clone();
        let failures = self.failures.clone();
        let index_timeout = self.config.index_timeout;
        let entry_ids: Vec<String> = entries
            .iter()
            .filter_map(Entry::id)
            .map(|id| id.to_string())
            .collect();

        tokio::spawn(async move {
            let _guard = guard;
            let run = AssertUnwindSafe(async {
                match operation {
                    IndexOperation::Add => loader.add_entries(&entity_type, entries).await,
                    IndexOperation::Update => loader.update_entries(&entity_type, entries).await,
                    IndexOperation::Delete => loader.delete_entries(&entity_type, entries).await,
                }
            })
            .catch_unwind();

            let message = match tokio::time::timeout(index_timeout, run).await {
                Ok(Ok(Ok(summary))) => {
                    debug!(
                        entity_type = %entity_type,
                        operation = %operation,
                        count = summary.total,
                        "Index task completed"
                    );
                    return;
                }
                Ok(Ok(Err(e))) => e.to_string(),
                Ok(Err(panic)) => format!("Index task panicked: {}", panic_message(panic.as_ref())),
                Err(_) => SyncError::Timeout(index_timeout).to_string(),
            };

            let failure = IndexFailure {
                operation,
                entity_type: entity_type.uid.clone(),
                entry_ids,
                message,
            };
            if let Err(mpsc::error::SendError(failure)) = failures.send(failure) {
                log_failure(&failure);
            }
        })
    }

    /// Number of index tasks still running.
    pub fn pending(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Wait until no index task is running.
    pub async fn wait_for_pending(&self) {
        loop {
            let idle = self.in_flight.idle.notified();
            if self.pending() == 0 {
                return;
            }
            idle.await;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn log_failure(failure: &IndexFailure) {
    error!(
        operation = %failure.operation,
        entity_type = %failure.entity_type,
        entry_ids = ?failure.entry_ids,
        error = %failure.message,
        "Index operation failed"
    );
}

/// Log every failure received on `rx` until all senders are gone.
pub fn spawn_failure_logger(mut rx: UnboundedReceiver<IndexFailure>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(failure) = rx.recv().await {
            log_failure(&failure);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigResolver, EntityTypeConfig, SyncConfig};
    use crate::interfaces::transform_fn;
    use crate::testing::{entry, posts, provider_handle, registry, RecordingProvider};
    use search_sync_repository::SearchIndexClient;
    use serde_json::json;

    fn dispatcher(
        provider: &Arc<RecordingProvider>,
        config: DispatcherConfig,
    ) -> (IndexDispatcher, UnboundedReceiver<IndexFailure>) {
        dispatcher_with(SyncConfig::new(), provider, config)
    }

    fn dispatcher_with(
        sync_config: SyncConfig,
        provider: &Arc<RecordingProvider>,
        config: DispatcherConfig,
    ) -> (IndexDispatcher, UnboundedReceiver<IndexFailure>) {
        let resolver = ConfigResolver::new(Arc::new(sync_config), Arc::new(registry()));
        let loader = IndexLoader::new(
            SearchIndexClient::new(provider_handle(provider)),
            Arc::new(resolver),
        );
        IndexDispatcher::new(Arc::new(loader), config)
    }

    #[tokio::test]
    async fn test_dispatch_runs_in_background() {
        let provider = Arc::new(RecordingProvider::new());
        let (dispatcher, mut rx) = dispatcher(&provider, DispatcherConfig::default());

        dispatcher.dispatch(IndexOperation::Add, posts(), vec![entry(json!({ "id": 1 }))]);
        dispatcher.dispatch(IndexOperation::Delete, posts(), vec![entry(json!({ "id": 2 }))]);
        dispatcher.wait_for_pending().await;

        assert_eq!(dispatcher.pending(), 0);
        assert_eq!(provider.calls().await.len(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failure_is_reported() {
        let provider = Arc::new(RecordingProvider::new());
        provider.set_failing(true);
        let (dispatcher, mut rx) = dispatcher(&provider, DispatcherConfig::default());

        dispatcher
            .dispatch(IndexOperation::Update, posts(), vec![entry(json!({ "id": 4 }))])
            .await
            .unwrap();

        let failure = rx.try_recv().unwrap();
        assert_eq!(failure.operation, IndexOperation::Update);
        assert_eq!(failure.entity_type, "api::post.post");
        assert_eq!(failure.entry_ids, vec!["4"]);
        assert!(failure.message.contains("index unreachable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_reported() {
        let provider = Arc::new(RecordingProvider::with_delay(Duration::from_secs(60)));
        let (dispatcher, mut rx) = dispatcher(
            &provider,
            DispatcherConfig {
                index_timeout: Duration::from_secs(30),
            },
        );

        dispatcher.dispatch(IndexOperation::Add, posts(), vec![entry(json!({ "id": 1 }))]);
        dispatcher.wait_for_pending().await;

        let failure = rx.recv().await.unwrap();
        assert_eq!(failure.operation, IndexOperation::Add);
        assert!(failure.message.contains("timed out"));
        assert!(provider.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_hook_is_reported() {
        let provider = Arc::new(RecordingProvider::new());
        let sync_config = SyncConfig::new().with_type(
            "posts",
            EntityTypeConfig::new().with_transform(transform_fn(|_, _| panic!("template missing"))),
        );
        let (dispatcher, mut rx) =
            dispatcher_with(sync_config, &provider, DispatcherConfig::default());

        dispatcher
            .dispatch(IndexOperation::Add, posts(), vec![entry(json!({ "id": 5 }))])
            .await
            .unwrap();

        let failure = rx.try_recv().unwrap();
        assert_eq!(failure.operation, IndexOperation::Add);
        assert_eq!(failure.entry_ids, vec!["5"]);
        assert_eq!(failure.message, "Index task panicked: template missing");
        assert_eq!(dispatcher.pending(), 0);
        assert!(provider.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_pending_when_idle() {
        let provider = Arc::new(RecordingProvider::new());
        let (dispatcher, _rx) = dispatcher(&provider, DispatcherConfig::default());

        dispatcher.wait_for_pending().await;
        assert_eq!(dispatcher.pending(), 0);
    }
}
