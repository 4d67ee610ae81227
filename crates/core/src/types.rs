//! Core types for the trace store
//!
//! This module defines the fundamental types used throughout the system:
//! - [`Timestamp`] and [`TimeWindow`]: half-open time ranges in trace time units
//! - [`TraceId`], [`DatabaseId`], [`FutureId`]: arena indices for owned entities
//! - [`TrackId`], [`TrackHandle`], [`SliceHandle`]: value handles onto trace content
//! - [`EventPropertyHandle`]: value handle onto one event's resident detail
//! - [`Handle`]: the kind-tagged union used by the generic property surface
//!
//! Every id is a newtype so a track index can never be passed where a trace
//! id is expected. Absence is `Option::None`; there is no reserved null value.

use crate::event::{EventId, EventPropertyKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trace time, in the units of the backing profiling database (nanoseconds
/// for rocpd).
pub type Timestamp = u64;

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive start
    pub start: Timestamp,
    /// Exclusive end
    pub end: Timestamp,
}

impl TimeWindow {
    /// Create a new window
    ///
    /// # Examples
    ///
    /// ```
    /// use tracestore_core::TimeWindow;
    ///
    /// let w = TimeWindow::new(10, 20);
    /// assert!(w.contains(10));
    /// assert!(!w.contains(20));
    /// ```
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Width of the window (zero when `end <= start`)
    pub fn span(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// True when the window covers no time at all
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True when `time` falls inside `[start, end)`
    pub fn contains(&self, time: Timestamp) -> bool {
        time >= self.start && time < self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw index
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Raw index value
            pub const fn as_u32(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Identifier of a trace within its owning session
    TraceId,
    "trace"
);
arena_id!(
    /// Identifier of an open database connector within its owning session
    DatabaseId,
    "database"
);
arena_id!(
    /// Identifier of an allocated future within its owning session
    FutureId,
    "future"
);
arena_id!(
    /// Stable track id
    ///
    /// Track ids equal the track's index in its trace and never change for
    /// the lifetime of the trace.
    TrackId,
    "track"
);

impl TrackId {
    /// Index of the track in its trace
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Value handle onto one track of one trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackHandle {
    /// Owning trace
    pub trace: TraceId,
    /// Track within the trace
    pub track: TrackId,
}

/// Value handle onto one chunk of one track, identified by the chunk's
/// window start time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SliceHandle {
    /// Owning trace
    pub trace: TraceId,
    /// Owning track
    pub track: TrackId,
    /// Start time of the chunk window
    pub start: Timestamp,
}

impl SliceHandle {
    /// The track this slice belongs to
    pub fn track_handle(&self) -> TrackHandle {
        TrackHandle {
            trace: self.trace,
            track: self.track,
        }
    }
}

/// Value handle onto the resident detail of one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventPropertyHandle {
    /// Owning trace
    pub trace: TraceId,
    /// Which detail
    pub kind: EventPropertyKind,
    /// Which event
    pub event: EventId,
}

/// Kind-tagged handle used by the generic property surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    /// A trace
    Trace(TraceId),
    /// A track
    Track(TrackHandle),
    /// A slice (chunk cursor)
    Slice(SliceHandle),
    /// A database connector
    Database(DatabaseId),
    /// A future
    Future(FutureId),
    /// Flow trace, stack trace or extended data of one event
    EventProperty(EventPropertyHandle),
}

impl From<TraceId> for Handle {
    fn from(id: TraceId) -> Self {
        Handle::Trace(id)
    }
}

impl From<TrackHandle> for Handle {
    fn from(h: TrackHandle) -> Self {
        Handle::Track(h)
    }
}

impl From<SliceHandle> for Handle {
    fn from(h: SliceHandle) -> Self {
        Handle::Slice(h)
    }
}

impl From<DatabaseId> for Handle {
    fn from(id: DatabaseId) -> Self {
        Handle::Database(id)
    }
}

impl From<FutureId> for Handle {
    fn from(id: FutureId) -> Self {
        Handle::Future(id)
    }
}

impl From<EventPropertyHandle> for Handle {
    fn from(h: EventPropertyHandle) -> Self {
        Handle::EventProperty(h)
    }
}
