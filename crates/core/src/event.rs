//! Per-event detail read on demand
//!
//! Chunks hold the fields every event shares. Flow links, call stacks and
//! extended attributes exist for some events only and are asked for one
//! event at a time, so a backing store returns them as a
//! [`RawEventProperty`] keyed by [`EventPropertyKind`] and [`EventId`].
//!
//! ```
//! use tracestore_core::{EventId, EventOperation};
//!
//! let id = EventId::new(42, EventOperation::Dispatch);
//! assert_eq!(EventId::unpack(id.pack()), Some(id));
//! ```

use crate::metadata::TrackCategory;
use crate::record::EventOperation;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

const ID_BITS: u32 = 60;
const ID_MASK: u64 = (1 << ID_BITS) - 1;

/// Event identity across tables
///
/// Row ids are unique only within one table; the operation says which.
/// Packed as a `u64` the id takes the low 60 bits and the operation the top
/// four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// Row id, truncated to 60 bits
    pub id: u64,
    /// Operation class
    pub operation: EventOperation,
}

impl EventId {
    /// Create an event id; bits above 60 are dropped
    pub fn new(id: u64, operation: EventOperation) -> Self {
        Self {
            id: id & ID_MASK,
            operation,
        }
    }

    /// Packed form used by the flattened surface
    pub fn pack(self) -> u64 {
        (self.id & ID_MASK) | (self.operation.as_u64() << ID_BITS)
    }

    /// Parse a packed id; `None` for an unknown operation
    pub fn unpack(raw: u64) -> Option<Self> {
        let operation = EventOperation::from_u64(raw >> ID_BITS)?;
        Some(Self::new(raw, operation))
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} event {}", self.operation.as_str(), self.id)
    }
}

/// Kind of per-event detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum EventPropertyKind {
    /// Launch/dispatch links between host and device events
    FlowTrace = 0,
    /// Host call stack of an API event
    StackTrace = 1,
    /// Extended attributes as category/name/value triples
    ExtData = 2,
}

impl EventPropertyKind {
    /// Every kind, in value order
    pub const ALL: &'static [EventPropertyKind] = &[
        EventPropertyKind::FlowTrace,
        EventPropertyKind::StackTrace,
        EventPropertyKind::ExtData,
    ];

    /// Parse a raw kind value
    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(EventPropertyKind::FlowTrace),
            1 => Some(EventPropertyKind::StackTrace),
            2 => Some(EventPropertyKind::ExtData),
            _ => None,
        }
    }

    /// Raw kind value
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// True when events of `operation` can carry this detail
    ///
    /// Flow traces link launches and dispatches, stack traces are captured
    /// for host calls that launch or allocate, and extended data exists for
    /// launches and dispatches.
    pub fn applies_to(self, operation: EventOperation) -> bool {
        use EventOperation::{Dispatch, Launch, MemoryAllocate};
        match self {
            EventPropertyKind::FlowTrace | EventPropertyKind::ExtData => {
                matches!(operation, Launch | Dispatch)
            }
            EventPropertyKind::StackTrace => matches!(operation, Launch | MemoryAllocate),
        }
    }

    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventPropertyKind::FlowTrace => "Flow trace",
            EventPropertyKind::StackTrace => "Stack trace",
            EventPropertyKind::ExtData => "Extended data",
        }
    }
}

impl fmt::Display for EventPropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Far end of a flow link, located by track descriptor fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFlowEndpoint {
    /// Category of the track holding the endpoint
    pub category: TrackCategory,
    /// Main process string of that track
    pub process: String,
    /// Sub-process string of that track
    pub subprocess: String,
    /// The linked event
    pub event: EventId,
    /// Time the link lands: op start for dispatches, API end for launches
    pub timestamp: Timestamp,
}

/// One frame of a host call stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Depth, 0 being the innermost frame
    pub depth: u64,
    /// API the stack was captured for
    pub symbol: String,
    /// Arguments of that API call
    pub args: String,
    /// Frame text (function and source line)
    pub code_line: String,
}

/// One extended attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtDataRecord {
    /// Grouping, e.g. `Properties`
    pub category: String,
    /// Attribute name
    pub name: String,
    /// Attribute value as text
    pub value: String,
}

impl ExtDataRecord {
    /// Create a record
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Render records as one JSON object per category
///
/// Numeric values and values that are themselves JSON objects are embedded
/// as such; everything else becomes a string. Keys come out sorted.
pub fn ext_data_json(records: &[ExtDataRecord]) -> String {
    let mut root = Map::new();
    for record in records {
        let group = root
            .entry(record.category.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(group) = group {
            group.insert(record.name.clone(), json_value(&record.value));
        }
    }
    Value::Object(root).to_string()
}

fn json_value(text: &str) -> Value {
    if let Ok(number) = text.parse::<Number>() {
        return Value::Number(number);
    }
    if text.starts_with('{') {
        if let Ok(object @ Value::Object(_)) = serde_json::from_str::<Value>(text) {
            return object;
        }
    }
    Value::String(text.to_string())
}

/// Per-event detail as read from a backing store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawEventProperty {
    /// Flow endpoints
    Flow(Vec<RawFlowEndpoint>),
    /// Stack frames, outermost last
    Stack(Vec<StackFrame>),
    /// Extended attributes
    Ext(Vec<ExtDataRecord>),
}

impl RawEventProperty {
    /// Kind this value answers
    pub fn kind(&self) -> EventPropertyKind {
        match self {
            RawEventProperty::Flow(_) => EventPropertyKind::FlowTrace,
            RawEventProperty::Stack(_) => EventPropertyKind::StackTrace,
            RawEventProperty::Ext(_) => EventPropertyKind::ExtData,
        }
    }
}
