//! Entity type registry trait definition.

use search_sync_shared::EntityType;

/// Lookup of the entity types known to the primary store.
pub trait EntityTypeRegistry: Send + Sync {
    /// Resolve a type by uid or collection name.
    fn resolve_type(&self, name: &str) -> Option<EntityType>;

    /// Every known entity type.
    fn list_all_types(&self) -> Vec<EntityType>;
}

/// Registry over a fixed list of types, for hosts whose schema is static.
#[derive(Debug, Clone, Default)]
pub struct StaticEntityTypeRegistry {
    types: Vec<EntityType>,
}

impl StaticEntityTypeRegistry {
    /// Create a registry over `types`.
    pub fn new(types: Vec<EntityType>) -> Self {
        Self { types }
    }
}

impl EntityTypeRegistry for StaticEntityTypeRegistry {
    fn resolve_type(&self, name: &str) -> Option<EntityType> {
        self.types
            .iter()
            .find(|t| t.uid == name)
            .or_else(|| self.types.iter().find(|t| t.collection_name == name))
            .cloned()
    }

    fn list_all_types(&self) -> Vec<EntityType> {
        self.types.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_uid_or_collection() {
        let registry = StaticEntityTypeRegistry::new(vec![
            EntityType::new("api::article.article", "article"),
            EntityType::new("api::post.post", "posts"),
        ]);

        assert_eq!(
            registry.resolve_type("api::post.post").unwrap().collection_name,
            "posts"
        );
        assert_eq!(
            registry.resolve_type("article").unwrap().uid,
            "api::article.article"
        );
        assert!(registry.resolve_type("api::missing.missing").is_none());
        assert_eq!(registry.list_all_types().len(), 2);
    }
}
