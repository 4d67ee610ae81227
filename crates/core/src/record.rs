//! Raw rows produced by a backing store
//!
//! These are the uninterned, owned forms of the records a chunk stores. The
//! storage layer interns their strings into the trace string table when a
//! chunk is materialized.

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Operation class of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u64)]
pub enum EventOperation {
    /// Unknown operation
    NoOp = 0,
    /// Host-side launch (API call)
    Launch = 1,
    /// Device-side dispatch (kernel execution)
    Dispatch = 2,
    /// Memory allocation
    MemoryAllocate = 3,
    /// Memory copy
    MemoryCopy = 4,
}

impl EventOperation {
    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOperation::NoOp => "No operation",
            EventOperation::Launch => "Launch",
            EventOperation::Dispatch => "Dispatch",
            EventOperation::MemoryAllocate => "Memory Allocate",
            EventOperation::MemoryCopy => "Memory Copy",
        }
    }

    /// Stable numeric value
    pub fn as_u64(&self) -> u64 {
        *self as u64
    }

    /// Parse a numeric value
    pub fn from_u64(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(EventOperation::NoOp),
            1 => Some(EventOperation::Launch),
            2 => Some(EventOperation::Dispatch),
            3 => Some(EventOperation::MemoryAllocate),
            4 => Some(EventOperation::MemoryCopy),
            _ => None,
        }
    }
}

/// An event row: something with a start and a duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event id in the backing store
    pub id: u64,
    /// Operation class
    pub operation: EventOperation,
    /// Start time
    pub timestamp: Timestamp,
    /// Duration; may be negative in corrupt captures, consumers must handle it
    pub duration: i64,
    /// Event type (API name or op type)
    pub type_name: String,
    /// Symbol (arguments or kernel description)
    pub symbol: String,
}

/// One row of a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawRecord {
    /// Event row for region / kernel tracks
    Event(RawEvent),
    /// Counter sample for counter tracks
    Counter {
        /// Sample time
        timestamp: Timestamp,
        /// Sampled value
        value: f64,
    },
}

impl RawRecord {
    /// Start time of the row
    pub fn timestamp(&self) -> Timestamp {
        match self {
            RawRecord::Event(e) => e.timestamp,
            RawRecord::Counter { timestamp, .. } => *timestamp,
        }
    }
}
