//! Lifecycle subscriber implementation.
//!
//! Binds the eight notification kinds to synchronization behaviour for an
//! entity type:
//!
//! - `afterCreate` / `afterUpdate`: re-fetch the entry, add / update it
//! - `afterUpdateMany`: re-fetch every matching entry page by page, update them
//! - `beforeDelete` / `beforeDeleteMany`: capture the entries about to go
//! - `afterDelete` / `afterDeleteMany`: delete the captured entries
//! - `afterCreateMany`: not supported, the notification carries no ids

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ConfigResolver;
use crate::errors::SyncError;
use crate::interfaces::{LifecycleHandler, LifecycleHooks, LifecycleSubscription, ListenedTypeStore};
use crate::lifecycle::{CapturedEntries, DeleteCaptureStore};
use crate::loader::{IndexDispatcher, IndexOperation};
use crate::reader::BatchedReader;
use search_sync_shared::{EntityType, Entry, LifecycleEvent, LifecycleEventKind};

/// Registers lifecycle handlers that keep the search index in sync.
pub struct LifecycleSubscriber {
    hooks: Arc<dyn LifecycleHooks>,
    listened: Arc<dyn ListenedTypeStore>,
    resolver: Arc<ConfigResolver>,
    reader: BatchedReader,
    dispatcher: Arc<IndexDispatcher>,
    captures: Arc<DeleteCaptureStore>,
}

impl LifecycleSubscriber {
    pub fn new(
        hooks: Arc<dyn LifecycleHooks>,
        listened: Arc<dyn ListenedTypeStore>,
        resolver: Arc<ConfigResolver>,
        reader: BatchedReader,
        dispatcher: Arc<IndexDispatcher>,
    ) -> Self {
        Self {
            hooks,
            listened,
            resolver,
            reader,
            dispatcher,
            captures: Arc::new(DeleteCaptureStore::new()),
        }
    }

    pub fn dispatcher(&self) -> &Arc<IndexDispatcher> {
        &self.dispatcher
    }

    /// Subscribe one entity type, by uid or collection name.
    ///
    /// Returns once the handler is registered; nothing is indexed here.
    #[instrument(skip(self))]
    pub async fn subscribe_entity_type(&self, name: &str) -> Result<(), SyncError> {
        let entity_type = self
            .resolver
            .registry()
            .resolve_type(name)
            .ok_or_else(|| SyncError::UnknownEntityType(name.to_string()))?;

        let handler = EntityTypeHandler {
            entity_type: entity_type.clone(),
            resolver: self.resolver.clone(),
            reader: self.reader.clone(),
            dispatcher: self.dispatcher.clone(),
            captures: self.captures.clone(),
        };

        self.hooks
            .subscribe(LifecycleSubscription {
                models: vec![entity_type.uid.clone()],
                kinds: LifecycleEventKind::ALL.to_vec(),
                handler: Arc::new(handler),
            })
            .await?;
        self.listened.record_listened(&entity_type.uid).await?;

        info!(
            entity_type = %entity_type,
            index = %self.resolver.index_name_of(&entity_type),
            "Subscribed to lifecycle notifications"
        );
        Ok(())
    }

    /// Subscribe every named type, skipping the ones that fail.
    ///
    /// Returns the number of types subscribed.
    pub async fn subscribe_entity_types(&self, names: &[String]) -> usize {
        let mut subscribed = 0;
        for name in names {
            match self.subscribe_entity_type(name).await {
                Ok(()) => subscribed += 1,
                Err(e) => error!(entity_type = %name, error = %e, "Could not subscribe entity type"),
            }
        }
        subscribed
    }
}

/// Handler bound to one entity type.
struct EntityTypeHandler {
    entity_type: EntityType,
    resolver: Arc<ConfigResolver>,
    reader: BatchedReader,
    dispatcher: Arc<IndexDispatcher>,
    captures: Arc<DeleteCaptureStore>,
}

impl EntityTypeHandler {
    /// Re-read the entry a single-entry notification is about.
    async fn fetch_result(&self, event: &LifecycleEvent) -> Option<Entry> {
        let Some(id) = event.result_id() else {
            error!(
                entity_type = %self.entity_type,
                event = %event.kind,
                "Notification carries no entry id"
            );
            return None;
        };

        let query = self.resolver.entries_query(&self.entity_type);
        match self.reader.fetch_entry(&self.entity_type, &id, &query).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                error!(
                    entity_type = %self.entity_type,
                    entry_id = %id,
                    event = %event.kind,
                    error = %e,
                    "Could not fetch entry"
                );
                None
            }
        }
    }

    /// Re-read every entry a bulk notification is about.
    async fn fetch_matching(&self, event: &LifecycleEvent) -> Option<Vec<Entry>> {
        let filter = event.where_filter.clone().unwrap_or_else(|| json!({}));
        match self.reader.fetch_matching(&self.entity_type, &filter).await {
            Ok(entries) => Some(entries),
            Err(e) => {
                error!(
                    entity_type = %self.entity_type,
                    event = %event.kind,
                    error = %e,
                    "Could not fetch entries"
                );
                None
            }
        }
    }

    async fn capture(&self, event: &LifecycleEvent, entries: CapturedEntries) {
        let count = entries.len();
        if self.captures.capture(event.operation_id, entries).await {
            debug!(
                entity_type = %self.entity_type,
                operation_id = %event.operation_id,
                count = count,
                "Captured entries before delete"
            );
        } else {
            warn!(
                entity_type = %self.entity_type,
                operation_id = %event.operation_id,
                "Entries already captured for this operation"
            );
        }
    }

    fn dispatch(&self, operation: IndexOperation, entries: Vec<Entry>) {
        self.dispatcher
            .dispatch(operation, self.entity_type.clone(), entries);
    }
}

#[async_trait]
impl LifecycleHandler for EntityTypeHandler {
    async fn handle(&self, event: &LifecycleEvent) {
        match event.kind {
            LifecycleEventKind::AfterCreate => {
                if let Some(entry) = self.fetch_result(event).await {
                    self.dispatch(IndexOperation::Add, vec![entry]);
                }
            }
            LifecycleEventKind::AfterCreateMany => {
                let err = SyncError::unsupported(format!(
                    "{} of {} cannot be synced as the created entries are not known",
                    event.kind, self.entity_type
                ));
                error!(entity_type = %self.entity_type, "{}", err);
            }
            LifecycleEventKind::AfterUpdate => {
                if let Some(entry) = self.fetch_result(event).await {
                    self.dispatch(IndexOperation::Update, vec![entry]);
                }
            }
            LifecycleEventKind::AfterUpdateMany => {
                if let Some(entries) = self.fetch_matching(event).await {
                    if entries.is_empty() {
                        debug!(entity_type = %self.entity_type, "No entries matched the update");
                    } else {
                        self.dispatch(IndexOperation::Update, entries);
                    }
                }
            }
            LifecycleEventKind::BeforeDelete => {
                if let Some(entry) = self.fetch_result(event).await {
                    self.capture(event, CapturedEntries::Single(entry)).await;
                }
            }
            LifecycleEventKind::BeforeDeleteMany => {
                if let Some(entries) = self.fetch_matching(event).await {
                    self.capture(event, CapturedEntries::Many(entries)).await;
                }
            }
            LifecycleEventKind::AfterDelete | LifecycleEventKind::AfterDeleteMany => {
                match self.captures.take(&event.operation_id).await {
                    Some(captured) if !captured.is_empty() => {
                        self.dispatch(IndexOperation::Delete, captured.into_entries());
                    }
                    Some(_) => {
                        debug!(entity_type = %self.entity_type, "No entries were deleted");
                    }
                    None => warn!(
                        entity_type = %self.entity_type,
                        operation_id = %event.operation_id,
                        event = %event.kind,
                        "No entries captured before delete, index left unchanged"
                    ),
                }
            }
        }
    }
}
