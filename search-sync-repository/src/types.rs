//! Result types for search index operations.

use crate::errors::SearchIndexError;

/// Result of a batch operation for a single document.
///
/// This struct represents the outcome of a single operation within a batch (adding,
/// updating, or deleting one document). It indicates whether the operation
/// succeeded and includes error details if it failed.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The external document id.
    pub document_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

impl BatchOperationResult {
    /// A successful result.
    pub fn succeeded(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            success: true,
            error: None,
        }
    }

    /// A failed result.
    pub fn failed(document_id: impl Into<String>, error: SearchIndexError) -> Self {
        Self {
            document_id: document_id.into(),
            success: false,
            error: Some(error),
        }
    }
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// This struct provides a complete overview of a bulk operation, including the total
/// number of items processed, how many succeeded and failed, and detailed results for
/// each individual item. This allows callers to handle partial failures gracefully.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Summary of an empty batch.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a summary from individual results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Fold another summary (e.g. of a later chunk) into this one.
    pub fn merge(&mut self, other: BatchOperationSummary) {
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.results.extend(other.results);
    }

    /// Ids of the documents whose operation failed.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.document_id.as_str())
            .collect()
    }

    /// Turn partial failures into an error carrying the failed ids.
    pub fn into_result(self) -> Result<Self, SearchIndexError> {
        if self.failed == 0 {
            return Ok(self);
        }
        let first_error = self
            .results
            .iter()
            .find_map(|r| r.error.as_ref())
            .map(ToString::to_string)
            .unwrap_or_default();
        Err(SearchIndexError::bulk_operation(format!(
            "{} of {} documents failed ({}): {}",
            self.failed,
            self.total,
            self.failed_ids().join(", "),
            first_error
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_results() {
        let summary = BatchOperationSummary::from_results(vec![
            BatchOperationResult::succeeded("posts-1"),
            BatchOperationResult::failed("posts-2", SearchIndexError::index("mapping conflict")),
        ]);

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failed_ids(), vec!["posts-2"]);
    }

    #[test]
    fn test_merge() {
        let mut summary =
            BatchOperationSummary::from_results(vec![BatchOperationResult::succeeded("a-1")]);
        summary.merge(BatchOperationSummary::from_results(vec![
            BatchOperationResult::succeeded("a-2"),
            BatchOperationResult::succeeded("a-3"),
        ]));

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 3);
        assert!(summary.into_result().is_ok());
    }

    #[test]
    fn test_into_result_reports_failures() {
        let summary = BatchOperationSummary::from_results(vec![BatchOperationResult::failed(
            "posts-9",
            SearchIndexError::delete("boom"),
        )]);

        let err = summary.into_result().unwrap_err();
        assert!(matches!(err, SearchIndexError::BulkOperationError(_)));
        assert!(err.to_string().contains("posts-9"));
        assert!(err.to_string().contains("boom"));
    }
}
