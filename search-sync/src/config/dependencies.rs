//! Dependency initialization and wiring for the search sync.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::config::SyncSettings;
use crate::SyncInitError;
use search_sync_pipeline::interfaces::{
    EntityTypeRegistry, EntryStore, LifecycleHooks, ListenedTypeStore,
};
use search_sync_pipeline::loader::spawn_failure_logger;
use search_sync_pipeline::{
    BatchedReader, ConfigResolver, DispatcherConfig, IndexDispatcher, IndexLoader,
    LifecycleSubscriber, SyncConfig,
};
use search_sync_repository::{
    OpenSearchProvider, SearchIndexClient, SearchIndexConfig, SearchIndexProvider,
};

/// Primary store collaborators supplied by the host.
#[derive(Clone)]
pub struct Collaborators {
    pub hooks: Arc<dyn LifecycleHooks>,
    pub store: Arc<dyn EntryStore>,
    pub registry: Arc<dyn EntityTypeRegistry>,
    pub listened: Arc<dyn ListenedTypeStore>,
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The subscriber, ready to register entity types.
    pub subscriber: LifecycleSubscriber,
    /// Task logging background index failures.
    pub failure_logger: JoinHandle<()>,
    collections: Vec<String>,
}

impl Dependencies {
    /// Initialize everything from environment settings and the configuration
    /// file they point to.
    pub async fn from_env(collaborators: Collaborators) -> Result<Self, SyncInitError> {
        let settings = SyncSettings::from_env()?;
        let sync_config = settings.load_sync_config()?;
        Self::new(&settings, sync_config, collaborators).await
    }

    /// Initialize everything against the OpenSearch cluster in `settings`.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(SyncInitError)` - If the cluster is unreachable or unhealthy
    pub async fn new(
        settings: &SyncSettings,
        sync_config: SyncConfig,
        collaborators: Collaborators,
    ) -> Result<Self, SyncInitError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            index_timeout_ms = settings.index_timeout.as_millis() as u64,
            "Initializing dependencies"
        );

        let provider = OpenSearchProvider::new(&settings.opensearch_url)
            .await
            .map_err(|e| SyncInitError::config(format!("Failed to create OpenSearch provider: {}", e)))?;

        let healthy = provider
            .health_check()
            .await
            .map_err(|e| SyncInitError::config(format!("OpenSearch health check failed: {}", e)))?;
        if !healthy {
            return Err(SyncInitError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        Ok(Self::with_provider(
            settings,
            Arc::new(provider),
            sync_config,
            collaborators,
        ))
    }

    /// Wire the pipeline to an already constructed provider.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_provider(
        settings: &SyncSettings,
        provider: Arc<dyn SearchIndexProvider>,
        sync_config: SyncConfig,
        collaborators: Collaborators,
    ) -> Self {
        let collections = sync_config
            .collections()
            .into_iter()
            .map(ToString::to_string)
            .collect();

        let index_config = SearchIndexConfig {
            max_batch_size: settings.max_batch_size,
        };
        let client = SearchIndexClient::with_config(provider, index_config);

        let resolver = Arc::new(ConfigResolver::new(
            Arc::new(sync_config),
            collaborators.registry,
        ));
        let loader = IndexLoader::new(client, resolver.clone());
        let (dispatcher, failures) = IndexDispatcher::new(
            Arc::new(loader),
            DispatcherConfig {
                index_timeout: settings.index_timeout,
            },
        );
        let failure_logger = spawn_failure_logger(failures);

        let subscriber = LifecycleSubscriber::new(
            collaborators.hooks,
            collaborators.listened,
            resolver,
            BatchedReader::new(collaborators.store),
            Arc::new(dispatcher),
        );

        Self {
            subscriber,
            failure_logger,
            collections,
        }
    }

    /// Subscribe every entity type present in the configuration file.
    ///
    /// Returns the number of types subscribed.
    pub async fn subscribe_configured(&self) -> usize {
        let subscribed = self.subscriber.subscribe_entity_types(&self.collections).await;
        info!(
            configured = self.collections.len(),
            subscribed = subscribed,
            "Subscribed configured entity types"
        );
        subscribed
    }

    /// Wait for running index tasks, e.g. before shutting down.
    pub async fn wait_for_pending(&self) {
        self.subscriber.dispatcher().wait_for_pending().await;
    }

    /// Run until Ctrl-C, then let running index tasks finish.
    pub async fn run_until_shutdown(&self) -> Result<(), SyncInitError> {
        tokio::signal::ctrl_c().await?;
        info!(
            pending = self.subscriber.dispatcher().pending(),
            "Shutdown signal received, waiting for index tasks"
        );
        self.wait_for_pending().await;
        Ok(())
    }
}
