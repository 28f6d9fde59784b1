//! Primary-store entries.
//!
//! An entry is kept as the JSON object the store returned for it. The sync
//! layer only reads entries; it never writes them back.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the natural primary key of an entry.
pub const ID_FIELD: &str = "id";

/// Field holding the publication timestamp. `null` marks a draft.
pub const PUBLISHED_AT_FIELD: &str = "publishedAt";

/// Field holding the locale of a localized entry.
pub const LOCALE_FIELD: &str = "locale";

/// Key of an entry: its natural primary key or a configured custom id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryKey {
    /// Integer key.
    Number(i64),
    /// String key.
    Text(String),
}

impl EntryKey {
    /// Read a key from a JSON value. Only integers and strings are keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Number),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntryKey {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for EntryKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EntryKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&EntryKey> for Value {
    fn from(key: &EntryKey) -> Self {
        match key {
            EntryKey::Number(n) => Value::from(*n),
            EntryKey::Text(s) => Value::from(s.as_str()),
        }
    }
}

/// One record instance of the primary store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(Map<String, Value>);

impl Entry {
    /// Create an empty entry.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// The natural primary key, if the entry carries a usable one.
    pub fn id(&self) -> Option<EntryKey> {
        self.0.get(ID_FIELD).and_then(EntryKey::from_value)
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Whether the entry is a draft.
    ///
    /// Only an explicit `null` counts; an entry without the field is treated
    /// as published.
    pub fn is_unpublished(&self) -> bool {
        matches!(self.0.get(PUBLISHED_AT_FIELD), Some(Value::Null))
    }

    /// The entry locale, when it is a string.
    pub fn locale(&self) -> Option<&str> {
        self.0.get(LOCALE_FIELD).and_then(Value::as_str)
    }

    /// Borrow the raw fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the entry, returning its fields.
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Entry {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Entry {
    type Error = Value;

    /// Only JSON objects are entries; anything else is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(other),
        }
    }
}

impl From<Entry> for Value {
    fn from(entry: Entry) -> Self {
        Value::Object(entry.0)
    }
}
