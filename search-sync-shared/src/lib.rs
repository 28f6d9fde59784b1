//! # Search Sync Shared
//!
//! Shared types for the search sync system: primary-store entries, entity
//! types, entries queries, lifecycle events and the documents sent to the
//! search index.

mod document;
mod entity_type;
mod entry;
mod event;
mod listened;
mod query;

pub use document::IndexDocument;
pub use entity_type::EntityType;
pub use entry::{Entry, EntryKey, ID_FIELD, LOCALE_FIELD, PUBLISHED_AT_FIELD};
pub use event::{LifecycleEvent, LifecycleEventKind, OperationId};
pub use listened::ListenedType;
pub use query::{EntriesQuery, PublicationState, ALL_LOCALES};
