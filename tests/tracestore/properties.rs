//! Property Surface Tests
//!
//! Typed getters over raw keys, and the sentinels they return.

use crate::*;

fn read_all(session: &Session, db: DatabaseId) {
    session.configure_read_window(db, 0, 10_000_000);
    for id in track_ids(0..4) {
        session.add_track(db, id);
    }
    assert_eq!(session.read_chunk_all_tracks(db, None), ResultCode::Success);
}

fn slice_of(session: &Session, trace: TraceId, index: usize) -> Handle {
    let track = session.get_track_at(trace, index).unwrap();
    Handle::Slice(session.get_chunk(track).unwrap())
}

#[test]
fn test_indexed_track_handle_out_of_range() {
    let (session, _, trace) = loaded_session();
    let key = TraceProperty::TrackHandleIndexed.as_u32();
    let handle = session
        .get_property_as_handle(Handle::Trace(trace), key, 2)
        .unwrap();
    assert_eq!(
        handle,
        Handle::Track(TrackHandle {
            trace,
            track: TrackId::new(2)
        })
    );
    assert_eq!(session.get_property_as_handle(Handle::Trace(trace), key, 7), None);
}

#[test]
fn test_track_descriptors() {
    let (session, db, trace) = loaded_session();
    read_all(&session, db);
    let kernel = Handle::Track(session.get_track_at(trace, 2).unwrap());

    assert_eq!(
        session.get_property_as_uint64(kernel, TrackProperty::NodeId.as_u32(), 0),
        3
    );
    assert_eq!(
        session.get_property_as_uint64(kernel, TrackProperty::Id.as_u32(), 0),
        2
    );
    assert_eq!(
        session.get_property_as_uint64(kernel, TrackProperty::CategoryEnum.as_u32(), 0),
        TrackCategory::Kernel.as_u64()
    );
    assert_eq!(
        session.get_property_as_charptr(kernel, TrackProperty::CategoryString.as_u32(), 0),
        Some(TrackCategory::Kernel.as_str().to_string())
    );
    assert_eq!(
        session.get_property_as_uint64(kernel, TrackProperty::MinimumTimestamp.as_u32(), 0),
        3_000_000
    );
    assert_eq!(
        session.get_property_as_uint64(kernel, TrackProperty::MaximumTimestamp.as_u32(), 0),
        8_000_000
    );
    assert_eq!(
        session.get_property_as_handle(kernel, TrackProperty::TraceHandle.as_u32(), 0),
        Some(Handle::Trace(trace))
    );
}

#[test]
fn test_slice_lookup_by_time() {
    let (session, db, trace) = loaded_session();
    read_all(&session, db);
    let track = Handle::Track(session.get_track_at(trace, 1).unwrap());
    let timed = TrackProperty::SliceHandleTimed.as_u32();

    assert!(session.get_property_as_handle(track, timed, 0).is_some());
    assert!(session.get_property_as_handle(track, timed, 9_999_999).is_some());
    // Past the end of every resident chunk.
    assert_eq!(session.get_property_as_handle(track, timed, 10_000_000), None);
}

#[test]
fn test_event_slice_records() {
    let (session, db, trace) = loaded_session();
    read_all(&session, db);
    let slice = slice_of(&session, trace, 0);

    assert_eq!(
        session.get_property_as_uint64(slice, SliceProperty::NumberOfRecords.as_u32(), 0),
        4
    );
    // Record 2 is the 1.5M call nested inside the 1M..3M region.
    assert_eq!(
        session.get_property_as_uint64(slice, SliceProperty::EventIdIndexed.as_u32(), 2),
        3
    );
    assert_eq!(
        session.get_property_as_uint64(slice, SliceProperty::EventLevelIndexed.as_u32(), 2),
        1
    );
    assert_eq!(
        session.get_property_as_int64(slice, SliceProperty::EventDurationIndexed.as_u32(), 1),
        2_000_000
    );
    assert_eq!(
        session.get_property_as_charptr(slice, SliceProperty::EventTypeStringIndexed.as_u32(), 0),
        Some("hipLaunchKernel".to_string())
    );
    assert_eq!(
        session.get_property_as_charptr(
            slice,
            SliceProperty::EventOperationStringIndexed.as_u32(),
            0
        ),
        Some("Launch".to_string())
    );
    assert_eq!(
        session.get_property_as_uint64(
            slice,
            SliceProperty::RecordIndexByTimestamp.as_u32(),
            1_200_000
        ),
        2
    );

    // Out of range record index.
    assert_eq!(
        session.get_property_as_uint64(slice, SliceProperty::EventIdIndexed.as_u32(), 4),
        0
    );
    // PMC value on an event chunk.
    assert_eq!(
        session.get_property_as_double(slice, SliceProperty::PmcValueIndexed.as_u32(), 0),
        0.0
    );
}

#[test]
fn test_counter_slice_records() {
    let (session, db, trace) = loaded_session();
    read_all(&session, db);
    let slice = slice_of(&session, trace, 3);
    let value = SliceProperty::PmcValueIndexed.as_u32();

    assert_eq!(session.get_property_as_double(slice, value, 1), 90.0);
    assert_eq!(
        session.get_property_as_uint64(slice, SliceProperty::TimestampIndexed.as_u32(), 2),
        9_000_000
    );
    assert_eq!(
        session.get_property_as_charptr(slice, SliceProperty::EventSymbolStringIndexed.as_u32(), 0),
        None
    );

    let track = Handle::Track(session.get_track_at(trace, 3).unwrap());
    assert_eq!(
        session.get_property_as_double(track, TrackProperty::MinimumValue.as_u32(), 0),
        10.0
    );
    assert_eq!(
        session.get_property_as_double(track, TrackProperty::MaximumValue.as_u32(), 0),
        90.0
    );
}

#[test]
fn test_wrong_getter_and_kind_are_sentinels() {
    let (session, db, trace) = loaded_session();
    read_all(&session, db);
    let trace_handle = Handle::Trace(trace);

    // Right key, wrong value type.
    assert_eq!(
        session.get_property_as_double(trace_handle, TraceProperty::EndTime.as_u32(), 0),
        0.0
    );
    assert_eq!(
        session.get_property_as_charptr(trace_handle, TraceProperty::EndTime.as_u32(), 0),
        None
    );
    // Handles without properties.
    assert_eq!(session.get_property_as_uint64(Handle::Database(db), 0, 0), 0);
    assert_eq!(
        session.get_property_as_handle(Handle::Future(FutureId::new(0)), 0, 0),
        None
    );
}

#[test]
fn test_footprint_properties_agree() {
    let (session, db, trace) = loaded_session();
    read_all(&session, db);
    let key = TraceProperty::MemoryFootprint.as_u32();
    let trace_total = session.get_property_as_uint64(Handle::Trace(trace), key, 0);
    assert_eq!(trace_total, session.memory_footprint(db));

    let tracks: u64 = (0..4)
        .map(|i| {
            let track = Handle::Track(session.get_track_at(trace, i).unwrap());
            session.get_property_as_uint64(track, TrackProperty::MemoryFootprint.as_u32(), 0)
        })
        .sum();
    assert!(tracks > 0);
    assert!(tracks < trace_total);
}
