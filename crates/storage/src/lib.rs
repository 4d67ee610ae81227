//! Chunk store and track index
//!
//! This crate holds materialized trace data:
//! - [`Trace`]: root of a session, fixes bounds and the track list once
//! - [`Track`]: one timeline, owns chunks keyed by window start
//! - [`Chunk`]: records of one track within one window, with footprint
//! - [`StringTable`]: interned event strings shared by a trace's chunks
//! - [`EventProperty`]: on-demand detail of one event (flows, stacks,
//!   extended data)
//!
//! Memory accounting is derived: totals are always sums of what each chunk
//! reports. [`aggregate_chunks`] keeps no state of its own.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod event_property;
pub mod strings;
pub mod trace;
pub mod track;

pub use chunk::{Chunk, ChunkRecords, CounterEntry, EventEntry};
pub use event_property::{EventProperty, FlowEndpoint};
pub use strings::StringTable;
pub use trace::{aggregate_chunks, ChunkTotals, Trace};
pub use track::Track;
