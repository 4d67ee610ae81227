//! Query engine for the trace store
//!
//! This crate turns requests into materialized chunks:
//! - [`planner`]: splits a trace's `time × track` box into read-sized cells
//! - [`future`]: one outstanding async operation with progress delivery
//! - [`connector`]: binds a backing store to a trace and runs reads
//! - [`accessor`]: property lookups over traces, tracks, slices and resident
//!   event properties
//! - [`config`]: tunables, loadable from TOML
//!
//! # Threading
//!
//! Synchronous reads run on the caller's thread. Async reads run on a named
//! worker thread per scheduled operation; the caller only blocks inside
//! [`Future::wait`]. Per-track load locks (see `tracestore_storage::Track`)
//! let reads of disjoint track sets proceed in parallel.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accessor;
pub mod config;
pub mod connector;
pub mod future;
pub mod planner;

pub use accessor::{
    ext_data_property, flow_trace_property, slice_property, stack_trace_property, track_property,
    trace_property,
};
pub use config::{ConfigError, StoreConfig};
pub use connector::{DatabaseConnector, InlineProgress, ReadContext, ReadMode, ReadSummary};
pub use future::{Future, FutureState, FutureTask};
pub use planner::{Cell, GridShape, PartitionPlanner, Rejection};
