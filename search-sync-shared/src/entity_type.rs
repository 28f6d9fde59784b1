//! Entity types of the primary store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named category of entries, synchronized independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityType {
    /// Stable type identifier, e.g. `api::article.article`.
    pub uid: String,
    /// Collection name, used for document id prefixes and config lookup.
    pub collection_name: String,
}

impl EntityType {
    /// Create a new entity type.
    pub fn new(uid: impl Into<String>, collection_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            collection_name: collection_name.into(),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uid)
    }
}
