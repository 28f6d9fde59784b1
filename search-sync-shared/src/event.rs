//! Lifecycle notifications emitted by the primary store.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entry::{Entry, EntryKey};

/// Kinds of lifecycle notification the sync layer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleEventKind {
    AfterCreate,
    AfterCreateMany,
    AfterUpdate,
    AfterUpdateMany,
    BeforeDelete,
    BeforeDeleteMany,
    AfterDelete,
    AfterDeleteMany,
}

impl LifecycleEventKind {
    /// Every kind a subscription registers.
    pub const ALL: [LifecycleEventKind; 8] = [
        Self::AfterCreate,
        Self::AfterCreateMany,
        Self::AfterUpdate,
        Self::AfterUpdateMany,
        Self::BeforeDelete,
        Self::BeforeDeleteMany,
        Self::AfterDelete,
        Self::AfterDeleteMany,
    ];

    /// Hook name as used by the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AfterCreate => "afterCreate",
            Self::AfterCreateMany => "afterCreateMany",
            Self::AfterUpdate => "afterUpdate",
            Self::AfterUpdateMany => "afterUpdateMany",
            Self::BeforeDelete => "beforeDelete",
            Self::BeforeDeleteMany => "beforeDeleteMany",
            Self::AfterDelete => "afterDelete",
            Self::AfterDeleteMany => "afterDeleteMany",
        }
    }
}

impl fmt::Display for LifecycleEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlates a "before" notification with its paired "after" notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Create a fresh operation id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for OperationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A lifecycle notification.
///
/// Single-entry kinds carry `result`; bulk kinds carry `where_filter`. A
/// "before" event and its paired "after" event share `operation_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    /// Notification kind.
    pub kind: LifecycleEventKind,
    /// Uid of the entity type the write concerns.
    pub model: String,
    /// Correlation id of the write operation.
    pub operation_id: OperationId,
    /// The (possibly partial) entry written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Entry>,
    /// Filter selecting the entries of a bulk write.
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_filter: Option<Value>,
}

impl LifecycleEvent {
    /// Create an event without payload.
    pub fn new(kind: LifecycleEventKind, model: impl Into<String>, operation_id: OperationId) -> Self {
        Self {
            kind,
            model: model.into(),
            operation_id,
            result: None,
            where_filter: None,
        }
    }

    /// Attach the written entry.
    pub fn with_result(mut self, result: Entry) -> Self {
        self.result = Some(result);
        self
    }

    /// Attach the bulk filter.
    pub fn with_where(mut self, filter: Value) -> Self {
        self.where_filter = Some(filter);
        self
    }

    /// Primary key of the written entry.
    pub fn result_id(&self) -> Option<EntryKey> {
        self.result.as_ref().and_then(Entry::id)
    }
}
