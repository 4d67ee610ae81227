//! Core types for the trace store
//!
//! This crate defines the vocabulary shared by every other layer:
//! - [`types`]: timestamps, time windows and the strongly-typed handles
//! - [`metadata`]: track categories and per-track descriptors
//! - [`record`]: raw event and counter rows produced by a backing store
//! - [`event`]: event ids and on-demand per-event detail (flows, stacks,
//!   extended data)
//! - [`error`]: result codes and the core error type
//! - [`property`]: closed property enumerations and the tagged property value
//! - [`progress`]: progress reporting types shared by sync and async reads
//! - [`request`]: the immutable read request value object
//! - [`source`]: the [`EventSource`] trait implemented by backing stores

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod metadata;
pub mod progress;
pub mod property;
pub mod record;
pub mod request;
pub mod source;
pub mod types;

pub use error::{Error, Result, ResultCode};
pub use event::{
    ext_data_json, EventId, EventPropertyKind, ExtDataRecord, RawEventProperty, RawFlowEndpoint,
    StackFrame,
};
pub use metadata::{TraceMetadata, TrackCategory, TrackInfo};
pub use progress::{ProgressCallback, ProgressEvent, ProgressMeter, ProgressStatus};
pub use property::{
    EntityKind, ExtDataProperty, FlowTraceProperty, PropertyKey, PropertyValue, SliceProperty,
    StackTraceProperty, TraceProperty, TrackProperty,
};
pub use record::{EventOperation, RawEvent, RawRecord};
pub use request::{ReadRequest, ReadRequestBuilder};
pub use source::EventSource;
pub use types::{
    DatabaseId, EventPropertyHandle, FutureId, Handle, SliceHandle, TimeWindow, Timestamp,
    TraceId, TrackHandle, TrackId,
};
