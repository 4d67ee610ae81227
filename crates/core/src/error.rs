//! Result codes and the core error type
//!
//! Two views of the same failure set:
//! - [`ResultCode`]: the closed, by-value code returned across the flattened
//!   handle surface. Codes are frozen and must not change.
//! - [`Error`]: the typed error used inside the crates, convertible to a code.
//!
//! ## Result Codes (Canonical)
//!
//! | Code | Value | Description |
//! |------|-------|-------------|
//! | Success | 0 | Operation succeeded |
//! | UnknownError | 1 | Non-specific failure |
//! | Timeout | 2 | Wait budget elapsed or operation interrupted |
//! | NotLoaded | 3 | Data not loaded yet (e.g. slice before metadata) |
//! | AllocFailure | 4 | Resource allocation failure |
//! | InvalidParameter | 5 | Invalid argument or stale handle |
//! | DbAccessFailed | 6 | Backing store access failure |
//! | InvalidProperty | 7 | Unknown property for this entity kind |
//! | NotSupported | 8 | Operation or format not supported |
//! | ResourceBusy | 9 | Resource already in use (future in flight, trace bound) |
//! | NothingScheduled | 10 | Future waited on with no operation scheduled |

use thiserror::Error;

/// By-value status of a boundary operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ResultCode {
    /// Operation was successful
    Success = 0,
    /// Operation failed with a non-specific error
    UnknownError = 1,
    /// Operation failed due to a timeout
    Timeout = 2,
    /// Operation failed as the data was not yet loaded
    NotLoaded = 3,
    /// Operation failed due to resource allocation failure
    AllocFailure = 4,
    /// Operation failed due to an invalid parameter
    InvalidParameter = 5,
    /// Operation failed due to a database access problem
    DbAccessFailed = 6,
    /// Operation failed due to an invalid property
    InvalidProperty = 7,
    /// Operation is not supported
    NotSupported = 8,
    /// Resource is busy ("already in use")
    ResourceBusy = 9,
    /// Nothing was scheduled on the future being waited on
    NothingScheduled = 10,
}

impl ResultCode {
    /// True for [`ResultCode::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self, ResultCode::Success)
    }

    /// Raw numeric value
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            ResultCode::Success => "Success",
            ResultCode::UnknownError => "UnknownError",
            ResultCode::Timeout => "Timeout",
            ResultCode::NotLoaded => "NotLoaded",
            ResultCode::AllocFailure => "AllocFailure",
            ResultCode::InvalidParameter => "InvalidParameter",
            ResultCode::DbAccessFailed => "DbAccessFailed",
            ResultCode::InvalidProperty => "InvalidProperty",
            ResultCode::NotSupported => "NotSupported",
            ResultCode::ResourceBusy => "ResourceBusy",
            ResultCode::NothingScheduled => "NothingScheduled",
        }
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Result<()>> for ResultCode {
    fn from(r: Result<()>) -> Self {
        match r {
            Ok(()) => ResultCode::Success,
            Err(e) => e.code(),
        }
    }
}

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid argument
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Data required by the operation is not loaded
    #[error("not loaded: {0}")]
    NotLoaded(String),

    /// Entity not found
    #[error("not found: {0}")]
    NotFound(String),

    /// A future already has an operation in flight
    #[error("already in use: {0}")]
    AlreadyInUse(String),

    /// Trace or connector is already bound elsewhere
    #[error("already bound: {0}")]
    AlreadyBound(String),

    /// Wait budget elapsed before the operation resolved
    #[error("timed out after {0}s")]
    Timeout(u64),

    /// A future was waited on with no operation scheduled
    #[error("nothing scheduled on {0}")]
    NothingScheduled(String),

    /// Operation was interrupted cooperatively
    #[error("interrupted: {0}")]
    Interrupted(String),

    /// Backing store failure
    #[error("database access failed: {0}")]
    DatabaseAccess(String),

    /// Unsupported operation or format
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Boundary code for this error
    pub fn code(&self) -> ResultCode {
        match self {
            Error::InvalidParameter(_) | Error::NotFound(_) => ResultCode::InvalidParameter,
            Error::NotLoaded(_) => ResultCode::NotLoaded,
            Error::AlreadyInUse(_) | Error::AlreadyBound(_) => ResultCode::ResourceBusy,
            Error::Timeout(_) | Error::Interrupted(_) => ResultCode::Timeout,
            Error::DatabaseAccess(_) | Error::Io(_) => ResultCode::DbAccessFailed,
            Error::Unsupported(_) => ResultCode::NotSupported,
            Error::NothingScheduled(_) => ResultCode::NothingScheduled,
            Error::Internal(_) => ResultCode::UnknownError,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Scheduling conflicts and timeouts may succeed once the prior
    /// operation resolves.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::AlreadyInUse(_) | Error::Timeout(_))
    }
}
