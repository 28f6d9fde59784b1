//! Derivation of external document ids.
//!
//! Ids are prefixed with the collection name so several types can share one
//! index without their keys colliding.

use search_sync_shared::{Entry, EntryKey, IndexDocument};

/// External id of the entry with `key` in `collection`.
pub fn document_id(collection: &str, key: &EntryKey) -> String {
    format!("{}-{}", collection, key)
}

/// Turn keyed entries into documents, preserving order.
pub fn prefix_documents(collection: &str, entries: Vec<(EntryKey, Entry)>) -> Vec<IndexDocument> {
    entries
        .into_iter()
        .map(|(key, entry)| IndexDocument::new(document_id(collection, &key), entry))
        .collect()
}
