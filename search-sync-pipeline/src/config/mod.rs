//! Per-entity-type synchronization configuration.

mod entity_type_config;
mod resolver;

pub use entity_type_config::{EntityTypeConfig, SyncConfig};
pub use resolver::{ConfigResolver, ResolvedTypeConfig};
