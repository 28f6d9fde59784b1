//! Configuration of how one entity type is indexed.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::SyncError;
use crate::interfaces::{EntryFilter, EntryTransform};
use search_sync_shared::EntriesQuery;

/// How one entity type is indexed.
///
/// The data part deserializes from JSON (`indexName`, `entriesQuery`,
/// `customId`, `settings`); hooks are attached in code.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTypeConfig {
    /// Index the type's documents go to. Defaults to the collection name.
    #[serde(default)]
    pub index_name: Option<String>,
    /// Query applied when reading and filtering entries.
    #[serde(default)]
    pub entries_query: Option<EntriesQuery>,
    /// Field used instead of `id` for the document key.
    #[serde(default)]
    pub custom_id: Option<String>,
    /// Index settings used when the index is created.
    #[serde(default)]
    pub settings: Option<Value>,
    #[serde(skip)]
    pub transform_entry: Option<Arc<dyn EntryTransform>>,
    #[serde(skip)]
    pub filter_entry: Option<Arc<dyn EntryFilter>>,
    /// Applied to every entry before drafts are dropped.
    #[serde(skip)]
    pub transform_unpublished_entry: Option<Arc<dyn EntryTransform>>,
}

impl EntityTypeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    pub fn with_entries_query(mut self, query: EntriesQuery) -> Self {
        self.entries_query = Some(query);
        self
    }

    pub fn with_custom_id(mut self, field: impl Into<String>) -> Self {
        self.custom_id = Some(field.into());
        self
    }

    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_transform(mut self, transform: Arc<dyn EntryTransform>) -> Self {
        self.transform_entry = Some(transform);
        self
    }

    pub fn with_filter(mut self, filter: Arc<dyn EntryFilter>) -> Self {
        self.filter_entry = Some(filter);
        self
    }

    pub fn with_unpublished_transform(mut self, transform: Arc<dyn EntryTransform>) -> Self {
        self.transform_unpublished_entry = Some(transform);
        self
    }
}

impl fmt::Debug for EntityTypeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityTypeConfig")
            .field("index_name", &self.index_name)
            .field("entries_query", &self.entries_query)
            .field("custom_id", &self.custom_id)
            .field("settings", &self.settings)
            .field("transform_entry", &self.transform_entry.is_some())
            .field("filter_entry", &self.filter_entry.is_some())
            .field(
                "transform_unpublished_entry",
                &self.transform_unpublished_entry.is_some(),
            )
            .finish()
    }
}

/// Configuration of every synchronized type, keyed by collection name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SyncConfig {
    types: HashMap<String, EntityTypeConfig>,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document keyed by collection name.
    pub fn from_json_str(json: &str) -> Result<Self, SyncError> {
        serde_json::from_str(json)
            .map_err(|e| SyncError::config(format!("Invalid sync configuration: {}", e)))
    }

    /// Read and parse a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SyncError::config(format!("Could not read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Builder-style registration of a type's configuration.
    pub fn with_type(mut self, collection: impl Into<String>, config: EntityTypeConfig) -> Self {
        self.types.insert(collection.into(), config);
        self
    }

    pub fn get(&self, collection: &str) -> Option<&EntityTypeConfig> {
        self.types.get(collection)
    }

    /// Edit a type's configuration in place, creating it when absent.
    ///
    /// Used to attach hooks to types loaded from JSON.
    pub fn configure<F>(&mut self, collection: impl Into<String>, f: F)
    where
        F: FnOnce(EntityTypeConfig) -> EntityTypeConfig,
    {
        let collection = collection.into();
        let current = self.types.remove(&collection).unwrap_or_default();
        self.types.insert(collection, f(current));
    }

    /// Configured collection names, sorted.
    pub fn collections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
