//! Property enumerations and values
//!
//! Entity attributes are read through a closed key enumeration per entity
//! kind rather than through per-field getters. Each key has a stable integer
//! value so the flattened surface can accept raw `u32` keys; [`PropertyKey`]
//! scopes a key to its entity kind and [`PropertyValue`] is the tagged result.
//!
//! Indexed keys (`*Indexed`, `SliceHandleTimed`) use the accompanying index
//! argument; scalar keys ignore it. The `*ByEventId` trace keys take a packed
//! [`EventId`](crate::EventId) as their index.

use crate::event::EventPropertyKind;
use crate::types::Handle;

/// Entity kinds that expose properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Trace root
    Trace,
    /// Track
    Track,
    /// Slice (chunk cursor)
    Slice,
    /// Flow trace of one event
    FlowTrace,
    /// Stack trace of one event
    StackTrace,
    /// Extended data of one event
    ExtData,
}

impl EntityKind {
    /// Entity kind answering an event property of `kind`
    pub fn of_event_property(kind: EventPropertyKind) -> Self {
        match kind {
            EventPropertyKind::FlowTrace => EntityKind::FlowTrace,
            EventPropertyKind::StackTrace => EntityKind::StackTrace,
            EventPropertyKind::ExtData => EntityKind::ExtData,
        }
    }
}

macro_rules! property_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl $name {
            /// Every key of this kind, in value order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Parse a raw key value
            pub fn from_u32(raw: u32) -> Option<Self> {
                match raw {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Raw key value
            pub fn as_u32(self) -> u32 {
                self as u32
            }
        }
    };
}

property_enum!(
    /// Trace-level property keys
    TraceProperty {
        /// Trace start time (u64)
        StartTime = 0,
        /// Trace end time (u64)
        EndTime = 1,
        /// Number of tracks (u64)
        NumberOfTracks = 2,
        /// Memory footprint of all resident chunks and strings (u64)
        MemoryFootprint = 3,
        /// Track handle at `index` (handle)
        TrackHandleIndexed = 4,
        /// Resident flow trace of the event packed in `index` (handle)
        FlowTraceHandleByEventId = 5,
        /// Resident stack trace of the event packed in `index` (handle)
        StackTraceHandleByEventId = 6,
        /// Resident extended data of the event packed in `index` (handle)
        ExtDataHandleByEventId = 7,
        /// Bound database connector (handle)
        DatabaseHandle = 8,
    }
);

property_enum!(
    /// Track-level property keys
    TrackProperty {
        /// Records across resident chunks (u64)
        NumRecords = 0,
        /// Earliest resident record timestamp (u64)
        MinimumTimestamp = 1,
        /// Latest resident record timestamp (u64)
        MaximumTimestamp = 2,
        /// Category discriminant (u64)
        CategoryEnum = 3,
        /// Category name (string)
        CategoryString = 4,
        /// Track id (u64)
        Id = 5,
        /// Node id (u64)
        NodeId = 6,
        /// Main process name (string)
        MainProcessName = 7,
        /// Sub-process name (string)
        SubProcessName = 8,
        /// Number of resident chunks (u64)
        NumberOfSlices = 9,
        /// Memory footprint of resident chunks (u64)
        MemoryFootprint = 10,
        /// Slice handle by chunk position, oldest window first (handle)
        SliceHandleIndexed = 11,
        /// Slice handle of the chunk covering time `index` (handle)
        SliceHandleTimed = 12,
        /// Owning trace (handle)
        TraceHandle = 13,
        /// Minimum nesting level or counter value (double)
        MinimumValue = 14,
        /// Maximum nesting level or counter value (double)
        MaximumValue = 15,
        /// Number of descriptive attributes (u64)
        NumberOfExtDataRecords = 16,
        /// Attribute category (string)
        ExtDataCategoryIndexed = 17,
        /// Attribute name (string)
        ExtDataNameIndexed = 18,
        /// Attribute value (string)
        ExtDataValueIndexed = 19,
        /// Attributes as a JSON object per category (string)
        InfoJson = 20,
        /// Connector bound to the owning trace (handle)
        DatabaseHandle = 21,
    }
);

property_enum!(
    /// Slice-level property keys
    SliceProperty {
        /// Index of the first record at or after timestamp `index` (u64)
        RecordIndexByTimestamp = 0,
        /// Chunk memory footprint (u64)
        MemoryFootprint = 1,
        /// Number of records (u64)
        NumberOfRecords = 2,
        /// Record timestamp (u64)
        TimestampIndexed = 3,
        /// Counter sample value (double)
        PmcValueIndexed = 4,
        /// Event id (u64)
        EventIdIndexed = 5,
        /// Event operation discriminant (u64)
        EventOperationEnumIndexed = 6,
        /// Event operation name (string)
        EventOperationStringIndexed = 7,
        /// Event duration (i64)
        EventDurationIndexed = 8,
        /// Event type name (string)
        EventTypeStringIndexed = 9,
        /// Event symbol (string)
        EventSymbolStringIndexed = 10,
        /// Event nesting level (u64)
        EventLevelIndexed = 11,
    }
);

property_enum!(
    /// Flow trace property keys
    FlowTraceProperty {
        /// Number of linked events (u64)
        NumberOfEndpoints = 0,
        /// Track id of the linked event (u64)
        EndpointTrackIdIndexed = 1,
        /// Packed id of the linked event (u64)
        EndpointIdIndexed = 2,
        /// Time the link lands (u64)
        EndpointTimestampIndexed = 3,
    }
);

property_enum!(
    /// Stack trace property keys
    StackTraceProperty {
        /// Number of frames (u64)
        NumberOfFrames = 0,
        /// Frame depth (u64)
        FrameDepthIndexed = 1,
        /// API the stack belongs to (string)
        FrameSymbolIndexed = 2,
        /// Arguments of that API call (string)
        FrameArgsIndexed = 3,
        /// Frame text (string)
        FrameCodeLineIndexed = 4,
    }
);

property_enum!(
    /// Extended data property keys
    ExtDataProperty {
        /// Number of attributes (u64)
        NumberOfRecords = 0,
        /// Attribute category (string)
        CategoryIndexed = 1,
        /// Attribute name (string)
        NameIndexed = 2,
        /// Attribute value (string)
        ValueIndexed = 3,
        /// All attributes as a JSON object per category (string)
        JsonBlob = 4,
    }
);

/// A property key scoped to its entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Trace key
    Trace(TraceProperty),
    /// Track key
    Track(TrackProperty),
    /// Slice key
    Slice(SliceProperty),
    /// Flow trace key
    FlowTrace(FlowTraceProperty),
    /// Stack trace key
    StackTrace(StackTraceProperty),
    /// Extended data key
    ExtData(ExtDataProperty),
}

impl PropertyKey {
    /// Resolve a raw key against an entity kind
    ///
    /// Returns `None` for values outside the kind's enumeration.
    pub fn resolve(kind: EntityKind, raw: u32) -> Option<Self> {
        match kind {
            EntityKind::Trace => TraceProperty::from_u32(raw).map(PropertyKey::Trace),
            EntityKind::Track => TrackProperty::from_u32(raw).map(PropertyKey::Track),
            EntityKind::Slice => SliceProperty::from_u32(raw).map(PropertyKey::Slice),
            EntityKind::FlowTrace => FlowTraceProperty::from_u32(raw).map(PropertyKey::FlowTrace),
            EntityKind::StackTrace => {
                StackTraceProperty::from_u32(raw).map(PropertyKey::StackTrace)
            }
            EntityKind::ExtData => ExtDataProperty::from_u32(raw).map(PropertyKey::ExtData),
        }
    }

    /// Entity kind the key belongs to
    pub fn kind(&self) -> EntityKind {
        match self {
            PropertyKey::Trace(_) => EntityKind::Trace,
            PropertyKey::Track(_) => EntityKind::Track,
            PropertyKey::Slice(_) => EntityKind::Slice,
            PropertyKey::FlowTrace(_) => EntityKind::FlowTrace,
            PropertyKey::StackTrace(_) => EntityKind::StackTrace,
            PropertyKey::ExtData(_) => EntityKind::ExtData,
        }
    }
}

impl From<TraceProperty> for PropertyKey {
    fn from(p: TraceProperty) -> Self {
        PropertyKey::Trace(p)
    }
}

impl From<TrackProperty> for PropertyKey {
    fn from(p: TrackProperty) -> Self {
        PropertyKey::Track(p)
    }
}

impl From<SliceProperty> for PropertyKey {
    fn from(p: SliceProperty) -> Self {
        PropertyKey::Slice(p)
    }
}

impl From<FlowTraceProperty> for PropertyKey {
    fn from(p: FlowTraceProperty) -> Self {
        PropertyKey::FlowTrace(p)
    }
}

impl From<StackTraceProperty> for PropertyKey {
    fn from(p: StackTraceProperty) -> Self {
        PropertyKey::StackTrace(p)
    }
}

impl From<ExtDataProperty> for PropertyKey {
    fn from(p: ExtDataProperty) -> Self {
        PropertyKey::ExtData(p)
    }
}

/// Tagged property value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Unsigned integer
    UInt64(u64),
    /// Signed integer
    Int64(i64),
    /// Floating point
    Double(f64),
    /// String
    Str(String),
    /// Entity handle
    Handle(Handle),
}

impl PropertyValue {
    /// Unsigned value, if this is one
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PropertyValue::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    /// Signed value, if this is one
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating point value, if this is one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// String value, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Handle value, if this is one
    pub fn as_handle(&self) -> Option<Handle> {
        match self {
            PropertyValue::Handle(h) => Some(*h),
            _ => None,
        }
    }
}
