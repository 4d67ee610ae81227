//! Store configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! min_partition_span = 1000000
//! progress_capacity = 64
//! default_wait_timeout_secs = 10
//! worker_name = "tracestore-worker"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Smallest time span a partition cell may cover
pub const DEFAULT_MIN_PARTITION_SPAN: u64 = 1_000_000;
/// Progress messages buffered per future before new ones are dropped
pub const DEFAULT_PROGRESS_CAPACITY: usize = 64;
/// Wait budget used by the typed client when none is given
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Read {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

/// Tunables for planning, progress delivery and worker threads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Partition cells narrower than this are rejected
    pub min_partition_span: u64,
    /// Capacity of each future's progress channel
    pub progress_capacity: usize,
    /// Wait budget for callers that do not pass one
    pub default_wait_timeout_secs: u64,
    /// Thread name given to async workers
    pub worker_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            min_partition_span: DEFAULT_MIN_PARTITION_SPAN,
            progress_capacity: DEFAULT_PROGRESS_CAPACITY,
            default_wait_timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
            worker_name: "tracestore-worker".to_string(),
        }
    }
}

impl StoreConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.progress_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "progress_capacity",
                message: "must be at least 1".to_string(),
            });
        }
        if self.worker_name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "worker_name",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Set the minimum partition span
    pub fn with_min_partition_span(mut self, span: u64) -> Self {
        self.min_partition_span = span;
        self
    }

    /// Set the progress channel capacity
    pub fn with_progress_capacity(mut self, capacity: usize) -> Self {
        self.progress_capacity = capacity;
        self
    }

    /// Set the default wait budget
    pub fn with_default_wait_timeout_secs(mut self, secs: u64) -> Self {
        self.default_wait_timeout_secs = secs;
        self
    }

    /// Set the worker thread name
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    /// Default wait budget as a duration
    pub fn default_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.default_wait_timeout_secs)
    }
}
