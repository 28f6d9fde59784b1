//! Documents sent to the search index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entry::Entry;

/// Field carrying the external document id in serialized documents.
const DOCUMENT_ID_FIELD: &str = "_id";

/// A transformed, redacted entry qualified with its external id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// External id, `<collectionName>-<key>`.
    #[serde(rename = "_id")]
    pub id: String,
    /// Document body.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl IndexDocument {
    /// Build a document from an entry and its external id.
    pub fn new(id: impl Into<String>, entry: Entry) -> Self {
        let mut fields = entry.into_fields();
        fields.remove(DOCUMENT_ID_FIELD);
        Self {
            id: id.into(),
            fields,
        }
    }

    /// The document body without the id, as sent to engines that keep the id
    /// as metadata.
    pub fn source(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}
