//! Property accessor
//!
//! Resolves `(entity, key, index)` to a [`PropertyValue`]. Lookups are
//! partial: an out-of-range index, a key that does not apply to the entity
//! (e.g. a PMC value on an event chunk) or data that is not resident yields
//! `None` rather than an error.
//!
//! | Key family | Value |
//! |------------|-------|
//! | times, counts, ids, footprints, enums | `UInt64` |
//! | event duration | `Int64` |
//! | counter values, track min/max value | `Double` |
//! | names and category / operation strings | `Str` |
//! | `*Handle*` keys | `Handle` |
//!
//! Event property handles only exist while the detail is resident; the
//! `*ByEventId` trace keys return `None` for an event that was never read or
//! was evicted.

use tracestore_core::{
    ext_data_json, EventId, EventPropertyHandle, EventPropertyKind, ExtDataProperty,
    FlowTraceProperty, Handle, PropertyValue, SliceHandle, SliceProperty, StackTraceProperty,
    TraceProperty, TrackHandle, TrackProperty,
};
use tracestore_storage::{Chunk, EventProperty, Trace, Track};

/// Trace-level property
pub fn trace_property(trace: &Trace, key: TraceProperty, index: u64) -> Option<PropertyValue> {
    use PropertyValue::UInt64;
    let resident = |kind: EventPropertyKind| {
        let event = EventId::unpack(index)?;
        trace.event_property(kind, event)?;
        Some(PropertyValue::Handle(Handle::EventProperty(EventPropertyHandle {
            trace: trace.id(),
            kind,
            event,
        })))
    };
    match key {
        TraceProperty::StartTime => trace.start_time().map(UInt64),
        TraceProperty::EndTime => trace.end_time().map(UInt64),
        TraceProperty::NumberOfTracks => Some(UInt64(trace.track_count() as u64)),
        TraceProperty::MemoryFootprint => Some(UInt64(trace.memory_footprint() as u64)),
        TraceProperty::TrackHandleIndexed => {
            let track = trace.track_at(usize::try_from(index).ok()?)?;
            Some(PropertyValue::Handle(Handle::Track(TrackHandle {
                trace: trace.id(),
                track: track.id(),
            })))
        }
        TraceProperty::FlowTraceHandleByEventId => resident(EventPropertyKind::FlowTrace),
        TraceProperty::StackTraceHandleByEventId => resident(EventPropertyKind::StackTrace),
        TraceProperty::ExtDataHandleByEventId => resident(EventPropertyKind::ExtData),
        TraceProperty::DatabaseHandle => trace
            .bound_to()
            .map(|db| PropertyValue::Handle(Handle::Database(db))),
    }
}

/// Track-level property
///
/// `SliceHandleIndexed` takes the chunk ordinal as index and
/// `SliceHandleTimed` a timestamp.
pub fn track_property(
    trace: &Trace,
    track: &Track,
    key: TrackProperty,
    index: u64,
) -> Option<PropertyValue> {
    use PropertyValue::{Double, Str, UInt64};
    let slice = |chunk: &Chunk| {
        PropertyValue::Handle(Handle::Slice(SliceHandle {
            trace: trace.id(),
            track: track.id(),
            start: chunk.start_time(),
        }))
    };
    let ext = |index: u64| track.info().ext_data.get(usize::try_from(index).ok()?);
    match key {
        TrackProperty::NumRecords => Some(UInt64(track.record_count() as u64)),
        TrackProperty::MinimumTimestamp => track.min_timestamp().map(UInt64),
        TrackProperty::MaximumTimestamp => track.max_timestamp().map(UInt64),
        TrackProperty::CategoryEnum => Some(UInt64(track.category().as_u64())),
        TrackProperty::CategoryString => Some(Str(track.category().as_str().to_string())),
        TrackProperty::Id => Some(UInt64(track.id().as_u32() as u64)),
        TrackProperty::NodeId => Some(UInt64(track.info().node_id)),
        TrackProperty::MainProcessName => Some(Str(track.group_name().to_string())),
        TrackProperty::SubProcessName => Some(Str(track.name().to_string())),
        TrackProperty::NumberOfSlices => Some(UInt64(track.chunk_count() as u64)),
        TrackProperty::MemoryFootprint => Some(UInt64(track.memory_footprint() as u64)),
        TrackProperty::SliceHandleIndexed => {
            track.chunk_by_index(usize::try_from(index).ok()?).map(|c| slice(c.as_ref()))
        }
        TrackProperty::SliceHandleTimed => track.chunk_at_time(index).map(|c| slice(c.as_ref())),
        TrackProperty::TraceHandle => Some(PropertyValue::Handle(Handle::Trace(trace.id()))),
        TrackProperty::MinimumValue => track.value_range().map(|(lo, _)| Double(lo)),
        TrackProperty::MaximumValue => track.value_range().map(|(_, hi)| Double(hi)),
        TrackProperty::NumberOfExtDataRecords => Some(UInt64(track.info().ext_data.len() as u64)),
        TrackProperty::ExtDataCategoryIndexed => ext(index).map(|r| Str(r.category.clone())),
        TrackProperty::ExtDataNameIndexed => ext(index).map(|r| Str(r.name.clone())),
        TrackProperty::ExtDataValueIndexed => ext(index).map(|r| Str(r.value.clone())),
        TrackProperty::InfoJson => Some(Str(ext_data_json(&track.info().ext_data))),
        TrackProperty::DatabaseHandle => trace
            .bound_to()
            .map(|db| PropertyValue::Handle(Handle::Database(db))),
    }
}

/// Slice-level property
///
/// `RecordIndexByTimestamp` takes a timestamp as index; the other indexed
/// keys take a record index.
pub fn slice_property(
    trace: &Trace,
    chunk: &Chunk,
    key: SliceProperty,
    index: u64,
) -> Option<PropertyValue> {
    use PropertyValue::{Double, Int64, Str, UInt64};
    let i = usize::try_from(index).ok();
    let string = |idx: u32| trace.string(idx).map(|s| Str(s.to_string()));
    match key {
        SliceProperty::RecordIndexByTimestamp => {
            chunk.index_of_timestamp(index).map(|i| UInt64(i as u64))
        }
        SliceProperty::MemoryFootprint => Some(UInt64(chunk.memory_footprint() as u64)),
        SliceProperty::NumberOfRecords => Some(UInt64(chunk.record_count() as u64)),
        SliceProperty::TimestampIndexed => chunk.timestamp_at(i?).map(UInt64),
        SliceProperty::PmcValueIndexed => chunk.counter(i?).map(|c| Double(c.value)),
        SliceProperty::EventIdIndexed => chunk.event(i?).map(|e| UInt64(e.id)),
        SliceProperty::EventOperationEnumIndexed => {
            chunk.event(i?).map(|e| UInt64(e.operation.as_u64()))
        }
        SliceProperty::EventOperationStringIndexed => chunk
            .event(i?)
            .map(|e| Str(e.operation.as_str().to_string())),
        SliceProperty::EventDurationIndexed => chunk.event(i?).map(|e| Int64(e.duration)),
        SliceProperty::EventTypeStringIndexed => string(chunk.event(i?)?.type_idx),
        SliceProperty::EventSymbolStringIndexed => string(chunk.event(i?)?.symbol_idx),
        SliceProperty::EventLevelIndexed => chunk.event(i?).map(|e| UInt64(e.level as u64)),
    }
}

/// Flow trace property of a resident event property
pub fn flow_trace_property(
    property: &EventProperty,
    key: FlowTraceProperty,
    index: u64,
) -> Option<PropertyValue> {
    use PropertyValue::UInt64;
    if !matches!(property, EventProperty::Flow(_)) {
        return None;
    }
    let endpoint = || property.endpoint(usize::try_from(index).ok()?);
    match key {
        FlowTraceProperty::NumberOfEndpoints => Some(UInt64(property.len() as u64)),
        FlowTraceProperty::EndpointTrackIdIndexed => {
            endpoint().map(|e| UInt64(e.track.as_u32() as u64))
        }
        FlowTraceProperty::EndpointIdIndexed => endpoint().map(|e| UInt64(e.event.pack())),
        FlowTraceProperty::EndpointTimestampIndexed => endpoint().map(|e| UInt64(e.timestamp)),
    }
}

/// Stack trace property of a resident event property
pub fn stack_trace_property(
    property: &EventProperty,
    key: StackTraceProperty,
    index: u64,
) -> Option<PropertyValue> {
    use PropertyValue::{Str, UInt64};
    if !matches!(property, EventProperty::Stack(_)) {
        return None;
    }
    let frame = || property.frame(usize::try_from(index).ok()?);
    match key {
        StackTraceProperty::NumberOfFrames => Some(UInt64(property.len() as u64)),
        StackTraceProperty::FrameDepthIndexed => frame().map(|f| UInt64(f.depth)),
        StackTraceProperty::FrameSymbolIndexed => frame().map(|f| Str(f.symbol.clone())),
        StackTraceProperty::FrameArgsIndexed => frame().map(|f| Str(f.args.clone())),
        StackTraceProperty::FrameCodeLineIndexed => frame().map(|f| Str(f.code_line.clone())),
    }
}

/// Extended data property of a resident event property
pub fn ext_data_property(
    property: &EventProperty,
    key: ExtDataProperty,
    index: u64,
) -> Option<PropertyValue> {
    use PropertyValue::{Str, UInt64};
    let records = match property {
        EventProperty::Ext(records) => records,
        _ => return None,
    };
    let record = || property.ext_record(usize::try_from(index).ok()?);
    match key {
        ExtDataProperty::NumberOfRecords => Some(UInt64(records.len() as u64)),
        ExtDataProperty::CategoryIndexed => record().map(|r| Str(r.category.clone())),
        ExtDataProperty::NameIndexed => record().map(|r| Str(r.name.clone())),
        ExtDataProperty::ValueIndexed => record().map(|r| Str(r.value.clone())),
        ExtDataProperty::JsonBlob => Some(Str(ext_data_json(records))),
    }
}
