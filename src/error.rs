//! Unified error type for the trace store.
//!
//! The flattened [`crate::Session`] surface reports failures as sentinels and
//! [`ResultCode`]s. [`crate::TraceClient`] turns each of those into
//! [`Error::Call`], naming the operation that failed.

use thiserror::Error;
use tracestore_core::ResultCode;
use tracestore_database::DatabaseError;
use tracestore_engine::ConfigError;

/// All trace store errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A boundary call returned a non-success code or a null handle
    #[error("{call} failed: {}", code.name())]
    Call {
        /// Name of the failing operation
        call: &'static str,
        /// Code it reported
        code: ResultCode,
    },

    /// Error raised by the store itself
    #[error(transparent)]
    Core(#[from] tracestore_core::Error),

    /// Backing store error
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for trace store operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Boundary code for this error
    pub fn code(&self) -> ResultCode {
        match self {
            Error::Call { code, .. } => *code,
            Error::Core(e) => e.code(),
            Error::Database(DatabaseError::Unsupported(_)) => ResultCode::NotSupported,
            Error::Database(_) => ResultCode::DbAccessFailed,
            Error::Config(_) => ResultCode::InvalidParameter,
        }
    }

    /// Name of the failing call, for [`Error::Call`]
    pub fn call(&self) -> Option<&'static str> {
        match self {
            Error::Call { call, .. } => Some(call),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    ///
    /// A busy future or a timed-out wait may succeed once the running
    /// operation resolves.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Core(e) => e.is_retryable(),
            other => matches!(other.code(), ResultCode::ResourceBusy | ResultCode::Timeout),
        }
    }

    /// Check if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        self.code() == ResultCode::Timeout
    }
}
