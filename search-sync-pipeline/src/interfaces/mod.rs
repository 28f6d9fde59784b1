//! Interfaces of the collaborators the pipeline depends on.
//!
//! The primary store, its hook facility, the entity type registry and the
//! listened-type bookkeeping are provided by the host. User hooks (transform,
//! filter) are provided per entity type through configuration.

mod entity_type_registry;
mod entry_hooks;
mod entry_store;
mod lifecycle_hooks;
mod listened_type_store;

pub use entity_type_registry::{EntityTypeRegistry, StaticEntityTypeRegistry};
pub use entry_hooks::{filter_fn, transform_fn, EntryFilter, EntryTransform, HookError};
pub use entry_store::EntryStore;
pub use lifecycle_hooks::{LifecycleHandler, LifecycleHooks, LifecycleSubscription};
pub use listened_type_store::{ListenedTypeStore, MemoryListenedTypeStore};
