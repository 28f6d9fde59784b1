//! Environment-driven process settings.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use search_sync_pipeline::SyncConfig;
use tracing::info;

use crate::SyncInitError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default index task timeout in milliseconds.
const DEFAULT_INDEX_TIMEOUT_MS: u64 = 30_000;

/// Default index client chunk size.
const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Process settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    pub opensearch_url: String,
    /// JSON file with the per-type configuration.
    pub config_path: Option<PathBuf>,
    pub index_timeout: Duration,
    /// Largest batch sent in one request; `None` sends batches whole.
    pub max_batch_size: Option<usize>,
    pub log_format: LogFormat,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            opensearch_url: DEFAULT_OPENSEARCH_URL.to_string(),
            config_path: None,
            index_timeout: Duration::from_millis(DEFAULT_INDEX_TIMEOUT_MS),
            max_batch_size: Some(DEFAULT_MAX_BATCH_SIZE),
            log_format: LogFormat::Text,
        }
    }
}

impl SyncSettings {
    /// Read settings from the environment, loading `.env` first.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `SEARCH_SYNC_CONFIG`: path to the per-type JSON configuration (default: none)
    /// - `INDEX_TIMEOUT_MS`: timeout of one index task (default: 30000)
    /// - `MAX_BATCH_SIZE`: documents per index request, 0 for no limit (default: 1000)
    /// - `LOG_FORMAT`: `json` or `text` (default: text)
    pub fn from_env() -> Result<Self, SyncInitError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the value of a variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncInitError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let opensearch_url = lookup("OPENSEARCH_URL").unwrap_or(defaults.opensearch_url);
        let config_path = lookup("SEARCH_SYNC_CONFIG")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let index_timeout = match lookup("INDEX_TIMEOUT_MS") {
            Some(value) => Duration::from_millis(parse_number("INDEX_TIMEOUT_MS", &value)?),
            None => defaults.index_timeout,
        };

        let max_batch_size = match lookup("MAX_BATCH_SIZE") {
            Some(value) => match parse_number("MAX_BATCH_SIZE", &value)? {
                0 => None,
                size => Some(size as usize),
            },
            None => defaults.max_batch_size,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(SyncInitError::config(format!(
                    "LOG_FORMAT must be json or text, got {}",
                    other
                )))
            }
        };

        Ok(Self {
            opensearch_url,
            config_path,
            index_timeout,
            max_batch_size,
            log_format,
        })
    }

    /// Load the per-type configuration; empty when no file is configured.
    pub fn load_sync_config(&self) -> Result<SyncConfig, SyncInitError> {
        match &self.config_path {
            Some(path) => {
                let config = SyncConfig::from_file(path)?;
                info!(
                    path = %path.display(),
                    types = config.collections().len(),
                    "Loaded sync configuration"
                );
                Ok(config)
            }
            None => Ok(SyncConfig::new()),
        }
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, SyncInitError> {
    value
        .trim()
        .parse()
        .map_err(|_| SyncInitError::config(format!("{} must be a number, got {}", key, value)))
}
