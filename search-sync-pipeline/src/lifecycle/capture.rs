//! Entries captured before their deletion.
//!
//! A "before delete" notification reads the entries while they still exist;
//! the paired "after delete" notification takes them to remove the matching
//! documents. Each capture is written once and read once.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use search_sync_shared::{Entry, OperationId};

/// Captures older than this are dropped; their delete never completed.
pub const DEFAULT_CAPTURE_TTL: Duration = Duration::from_secs(15 * 60);

/// Entries read before a delete.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedEntries {
    Single(Entry),
    Many(Vec<Entry>),
}

impl CapturedEntries {
    pub fn into_entries(self) -> Vec<Entry> {
        match self {
            Self::Single(entry) => vec![entry],
            Self::Many(entries) => entries,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Correlation map from operation id to captured entries.
#[derive(Debug)]
pub struct DeleteCaptureStore {
    captures: Mutex<HashMap<OperationId, (CapturedEntries, Instant)>>,
    ttl: Duration,
}

impl Default for DeleteCaptureStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_CAPTURE_TTL)
    }
}

impl DeleteCaptureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            captures: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Record the entries of `operation_id`.
    ///
    /// Returns `false`, leaving the first capture in place, when the operation
    /// already has one.
    pub async fn capture(&self, operation_id: OperationId, entries: CapturedEntries) -> bool {
        let mut captures = self.captures.lock().await;
        let now = Instant::now();

        let before = captures.len();
        captures.retain(|_, (_, captured_at)| now.duration_since(*captured_at) < self.ttl);
        if captures.len() < before {
            warn!(count = before - captures.len(), "Dropped expired delete captures");
        }

        if captures.contains_key(&operation_id) {
            return false;
        }
        captures.insert(operation_id, (entries, now));
        true
    }

    /// Remove and return the entries of `operation_id`.
    pub async fn take(&self, operation_id: &OperationId) -> Option<CapturedEntries> {
        self.captures
            .lock()
            .await
            .remove(operation_id)
            .map(|(entries, _)| entries)
    }

    /// Number of captures waiting for their "after" notification.
    pub async fn len(&self) -> usize {
        self.captures.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_sync_shared::EntryKey;

    fn entry(id: i64) -> Entry {
        Entry::new().with("id", id)
    }

    #[tokio::test]
    async fn test_capture_is_read_once() {
        let store = DeleteCaptureStore::new();
        let operation = OperationId::new();

        assert!(store.capture(operation, CapturedEntries::Single(entry(3))).await);

        let taken = store.take(&operation).await.unwrap();
        assert_eq!(taken.into_entries()[0].id(), Some(EntryKey::from(3_i64)));
        assert!(store.take(&operation).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_capture_is_written_once() {
        let store = DeleteCaptureStore::new();
        let operation = OperationId::new();

        assert!(store.capture(operation, CapturedEntries::Single(entry(1))).await);
        assert!(
            !store
                .capture(operation, CapturedEntries::Many(vec![entry(2), entry(3)]))
                .await
        );

        let taken = store.take(&operation).await.unwrap();
        assert_eq!(taken, CapturedEntries::Single(entry(1)));
    }

    #[tokio::test]
    async fn test_operations_are_independent() {
        let store = DeleteCaptureStore::new();
        let first = OperationId::new();
        let second = OperationId::new();

        store.capture(first, CapturedEntries::Single(entry(1))).await;
        store
            .capture(second, CapturedEntries::Many(vec![entry(2), entry(3)]))
            .await;

        assert_eq!(store.take(&second).await.unwrap().len(), 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_captures_are_dropped() {
        let store = DeleteCaptureStore::with_ttl(Duration::from_secs(60));
        let stale = OperationId::new();
        store.capture(stale, CapturedEntries::Single(entry(1))).await;

        tokio::time::advance(Duration::from_secs(61)).await;
        store
            .capture(OperationId::new(), CapturedEntries::Single(entry(2)))
            .await;

        assert!(store.take(&stale).await.is_none());
        assert_eq!(store.len().await, 1);
    }
}
