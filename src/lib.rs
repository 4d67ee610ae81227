//! # Tracestore
//!
//! Chunked, queryable store for GPU/CPU profiling traces.
//!
//! A profiling database is opened through a connector and bound to a
//! trace. Metadata describes the trace bounds and its tracks; range reads
//! materialize time-partitioned chunks under those tracks, either on the
//! caller's thread or on a worker driven through a future.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tracestore::prelude::*;
//!
//! let client = TraceClient::new();
//! let db = client.open("trace.rpd", DatabaseKind::Autodetect)?;
//! let trace = client.create_trace();
//! client.load(db, trace, None)?;
//!
//! // Read the trace as a 4 x 2 grid of cells
//! client.read_grid(db, trace, GridShape::new(4, 2), ReadMode::AllTracks, None)?;
//!
//! // Or one window asynchronously
//! let request = ReadRequest::builder()
//!     .window(0, 5_000_000)
//!     .tracks([TrackId::new(0), TrackId::new(1)])
//!     .build()?;
//! let future = client.future(None);
//! client.read_slice_async(db, request, future)?;
//! client.wait(future, None)?;
//! ```
//!
//! ## Surfaces
//!
//! - [`Session`] - flattened handles, result codes and property sentinels
//! - [`TraceClient`] - the same operations as checked `Result`s
//!
//! ## Crates
//!
//! - `tracestore-core` - ids, records, errors, property keys
//! - `tracestore-storage` - traces, tracks and chunks
//! - `tracestore-engine` - planner, futures, connector, property accessor
//! - `tracestore-database` - in-memory and rocpd SQLite sources

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod error;
mod session;

pub mod prelude;

pub use client::TraceClient;
pub use error::{Error, Result};
pub use session::Session;

// Re-export the layers
pub use tracestore_core;
pub use tracestore_database;
pub use tracestore_engine;
pub use tracestore_storage;
