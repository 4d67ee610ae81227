//! Backing store errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening or querying a backing store
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLite failure
    #[cfg(feature = "rocpd")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O failure (missing file, permissions)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not a recognized profiling database
    #[error("unrecognized database format: {}", .0.display())]
    UnknownFormat(PathBuf),

    /// Recognized but not supported by this build
    #[error("unsupported database: {0}")]
    Unsupported(String),

    /// Data does not match the expected schema
    #[error("schema mismatch: {0}")]
    Schema(String),
}

/// Result type for backing store operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

impl From<DatabaseError> for tracestore_core::Error {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Io(io) => tracestore_core::Error::Io(io),
            DatabaseError::Unsupported(what) => tracestore_core::Error::Unsupported(what),
            other => tracestore_core::Error::DatabaseAccess(other.to_string()),
        }
    }
}
