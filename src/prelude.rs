//! Convenient imports for Tracestore.
//!
//! ```ignore
//! use tracestore::prelude::*;
//!
//! let session = Session::new();
//! let trace = session.create_trace();
//! ```

// Entry points
pub use crate::client::TraceClient;
pub use crate::session::Session;

// Error handling
pub use crate::error::{Error, Result};

// Handles and values
pub use tracestore_core::{
    DatabaseId, FutureId, Handle, ProgressCallback, ProgressStatus, PropertyKey, PropertyValue,
    ReadRequest, ResultCode, SliceHandle, SliceProperty, TimeWindow, Timestamp, TraceId,
    TraceProperty, TrackCategory, TrackHandle, TrackId, TrackInfo, TrackProperty,
};

// Per-event detail
pub use tracestore_core::{
    EventId, EventPropertyHandle, EventPropertyKind, ExtDataProperty, ExtDataRecord,
    FlowTraceProperty, RawEventProperty, RawFlowEndpoint, StackFrame, StackTraceProperty,
};

// Sources
pub use tracestore_core::{EventOperation, EventSource, RawEvent, RawRecord};
pub use tracestore_database::{DatabaseKind, MemorySource};

// Engine
pub use tracestore_engine::{FutureState, GridShape, ReadMode, ReadSummary, StoreConfig};
