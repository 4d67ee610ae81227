//! Backing stores for the trace store
//!
//! Implementations of [`EventSource`]:
//! - [`MemorySource`]: rows held in memory, built with a builder
//! - `RocpdSource`: the rocpd SQLite schema (feature `rocpd`, on by default)
//!
//! [`open`] picks an implementation for a file from a [`DatabaseKind`]
//! hint. `Autodetect` inspects the file's tables.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod memory;
#[cfg(feature = "rocpd")]
pub mod rocpd;

pub use error::{DatabaseError, Result};
pub use memory::{MemorySource, MemorySourceBuilder};
#[cfg(feature = "rocpd")]
pub use rocpd::RocpdSource;

use std::path::Path;
use std::sync::Arc;
use tracestore_core::EventSource;
use tracing::info;

/// Format hint passed to [`open`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DatabaseKind {
    /// Inspect the file
    Autodetect = 0,
    /// rocpd SQLite schema
    RocpdSqlite = 1,
    /// rocprofiler-sdk SQLite schema (recognized, not supported)
    RocprofSqlite = 2,
    /// In-process source; registered directly, never opened from a path
    Memory = 3,
}

impl DatabaseKind {
    /// Map a raw hint value
    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(DatabaseKind::Autodetect),
            1 => Some(DatabaseKind::RocpdSqlite),
            2 => Some(DatabaseKind::RocprofSqlite),
            3 => Some(DatabaseKind::Memory),
            _ => None,
        }
    }
}

/// Open the database at `path`
pub fn open(path: impl AsRef<Path>, kind: DatabaseKind) -> Result<Arc<dyn EventSource>> {
    let path = path.as_ref();
    let kind = match kind {
        DatabaseKind::Autodetect => detect(path)?,
        other => other,
    };
    info!(path = %path.display(), ?kind, "opening database");
    match kind {
        DatabaseKind::RocpdSqlite => open_rocpd(path),
        DatabaseKind::RocprofSqlite => Err(DatabaseError::Unsupported(
            "rocprofiler-sdk databases".to_string(),
        )),
        DatabaseKind::Memory => Err(DatabaseError::Unsupported(
            "memory sources are registered directly, not opened from a path".to_string(),
        )),
        DatabaseKind::Autodetect => Err(DatabaseError::UnknownFormat(path.to_path_buf())),
    }
}

#[cfg(feature = "rocpd")]
fn detect(path: &Path) -> Result<DatabaseKind> {
    match rocpd::detect(path)? {
        rocpd::DetectedFormat::Rocpd => Ok(DatabaseKind::RocpdSqlite),
        rocpd::DetectedFormat::Rocprof => Ok(DatabaseKind::RocprofSqlite),
        rocpd::DetectedFormat::Unknown => Err(DatabaseError::UnknownFormat(path.to_path_buf())),
    }
}

#[cfg(not(feature = "rocpd"))]
fn detect(path: &Path) -> Result<DatabaseKind> {
    if !path.exists() {
        return Err(DatabaseError::Io(std::io::Error::from(
            std::io::ErrorKind::NotFound,
        )));
    }
    Err(DatabaseError::Unsupported(
        "built without SQLite support".to_string(),
    ))
}

#[cfg(feature = "rocpd")]
fn open_rocpd(path: &Path) -> Result<Arc<dyn EventSource>> {
    Ok(Arc::new(RocpdSource::open(path)?))
}

#[cfg(not(feature = "rocpd"))]
fn open_rocpd(_path: &Path) -> Result<Arc<dyn EventSource>> {
    Err(DatabaseError::Unsupported(
        "built without SQLite support".to_string(),
    ))
}
