//! Resolution of entity type configuration with defaults applied.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::{EntityTypeConfig, SyncConfig};
use crate::interfaces::{EntityTypeRegistry, EntryFilter, EntryTransform};
use search_sync_shared::{EntityType, EntriesQuery};

/// A type's configuration with every default filled in.
#[derive(Clone)]
pub struct ResolvedTypeConfig {
    pub index_name: String,
    pub entries_query: EntriesQuery,
    pub custom_id: Option<String>,
    pub settings: Value,
    pub transform_entry: Option<Arc<dyn EntryTransform>>,
    pub filter_entry: Option<Arc<dyn EntryFilter>>,
    pub transform_unpublished_entry: Option<Arc<dyn EntryTransform>>,
}

impl ResolvedTypeConfig {
    fn from_config(entity_type: &EntityType, config: Option<&EntityTypeConfig>) -> Self {
        let config = config.cloned().unwrap_or_default();
        Self {
            index_name: config
                .index_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| entity_type.collection_name.clone()),
            entries_query: config.entries_query.unwrap_or_default(),
            custom_id: config.custom_id.filter(|field| !field.is_empty()),
            settings: config.settings.unwrap_or_else(|| json!({})),
            transform_entry: config.transform_entry,
            filter_entry: config.filter_entry,
            transform_unpublished_entry: config.transform_unpublished_entry,
        }
    }
}

/// Looks up the configuration of entity types.
///
/// Resolution has no side effects; the configuration is read-only once loaded.
#[derive(Clone)]
pub struct ConfigResolver {
    config: Arc<SyncConfig>,
    registry: Arc<dyn EntityTypeRegistry>,
}

impl ConfigResolver {
    pub fn new(config: Arc<SyncConfig>, registry: Arc<dyn EntityTypeRegistry>) -> Self {
        Self { config, registry }
    }

    /// Resolve the configuration of `entity_type`.
    pub fn resolve(&self, entity_type: &EntityType) -> ResolvedTypeConfig {
        ResolvedTypeConfig::from_config(entity_type, self.config.get(&entity_type.collection_name))
    }

    pub fn index_name_of(&self, entity_type: &EntityType) -> String {
        self.resolve(entity_type).index_name
    }

    pub fn entries_query(&self, entity_type: &EntityType) -> EntriesQuery {
        self.resolve(entity_type).entries_query
    }

    pub fn settings(&self, entity_type: &EntityType) -> Value {
        self.resolve(entity_type).settings
    }

    /// Collection names of every known type whose documents go to `index_name`.
    pub fn collections_with_index_name(&self, index_name: &str) -> Vec<String> {
        let mut collections: Vec<String> = self
            .registry
            .list_all_types()
            .into_iter()
            .filter(|t| self.index_name_of(t) == index_name)
            .map(|t| t.collection_name)
            .collect();
        collections.sort();
        collections
    }

    pub fn registry(&self) -> &Arc<dyn EntityTypeRegistry> {
        &self.registry
    }
}
