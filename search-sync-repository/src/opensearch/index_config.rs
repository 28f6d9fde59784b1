//! OpenSearch index creation settings.
//!
//! Entity types may carry their own index settings. Whatever they leave out is
//! filled in with the defaults below when the index is created.

use serde_json::{json, Map, Value};

/// Default settings for indices created by the sync layer.
///
/// - 1 primary shard
/// - 1 replica for redundancy
pub fn default_index_settings() -> Value {
    json!({
        "number_of_shards": 1,
        "number_of_replicas": 1
    })
}

/// Build the index creation body from an entity type's settings.
///
/// `settings` may hold `settings`, `mappings` and `aliases` sections; a missing
/// `settings` section gets the defaults. Non-object settings are ignored.
pub fn index_body(settings: &Value) -> Value {
    let mut body = match settings {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    body.entry("settings")
        .or_insert_with(default_index_settings);
    Value::Object(body)
}
