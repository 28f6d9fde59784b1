//! Configuration types for the SearchIndexClient.

/// Configuration for the SearchIndexClient.
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Maximum number of documents sent to the provider in a single call.
    /// Larger batches are split into chunks of this size.
    /// Set to None to send every batch whole.
    pub max_batch_size: Option<usize>,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(1000),
        }
    }
}

impl SearchIndexConfig {
    /// Create a config that never splits batches.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
        }
    }

    /// Create a config with a custom chunk size.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
        }
    }

    /// Effective chunk size for a batch of `len` documents.
    pub(crate) fn chunk_size(&self, len: usize) -> usize {
        match self.max_batch_size {
            Some(max) if max > 0 => max,
            _ => len.max(1),
        }
    }
}
