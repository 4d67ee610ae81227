//! Async Read Tests
//!
//! Future lifecycle through the flattened surface:
//! - metadata and slice reads on worker threads
//! - wait-before-schedule, busy futures, timeouts
//! - cooperative interruption

use crate::*;
use std::time::Duration;

const FOREVER: u64 = u64::MAX;

fn gated_session() -> (Session, DatabaseId, TraceId, mpsc::Sender<()>) {
    let (source, release) = GatedSource::new(four_track_source());
    let session = Session::new();
    let db = session.register_source(Arc::new(source));
    let trace = session.create_trace();
    assert_eq!(session.bind_trace(db, trace), ResultCode::Success);
    assert!(session.read_properties(db, None));
    (session, db, trace, release)
}

#[test]
fn test_async_metadata_then_slice() {
    init_tracing();
    let session = Session::new();
    let db = session.register_source(Arc::new(four_track_source()));
    let trace = session.create_trace();
    session.bind_trace(db, trace);

    let (callback, seen) = recorder();
    let future = session.future_alloc(Some(callback));
    assert_eq!(session.read_metadata_async(db, future), ResultCode::Success);
    assert_eq!(session.future_wait(future, 10), ResultCode::Success);
    assert_eq!(session.future_state(future), Some(FutureState::Succeeded));
    assert!(session.get_track_at(trace, 3).is_some());

    assert_eq!(
        session.read_slice_async(db, 0, 5_000_000, &track_ids(0..4), future),
        ResultCode::Success
    );
    assert_eq!(session.future_wait(future, FOREVER), ResultCode::Success);

    let totals = session.aggregate_chunks(trace, &track_ids(0..4)).unwrap();
    assert_eq!(totals.record_count, 6);

    let seen = seen.lock();
    let (percent, status, message) = seen.last().unwrap();
    assert_eq!((*percent, *status), (100, ProgressStatus::Success));
    assert_eq!(message, "4 chunks loaded, 6 records");
    assert_eq!(session.future_free(future), ResultCode::Success);
}

#[test]
fn test_wait_before_schedule() {
    let (session, db, _) = loaded_session();
    let future = session.future_alloc(None);
    assert_eq!(session.future_wait(future, 1), ResultCode::NothingScheduled);
    assert_eq!(session.future_state(future), Some(FutureState::Idle));

    session.read_slice_async(db, 0, 5_000_000, &track_ids(0..1), future);
    assert_eq!(session.future_wait(future, FOREVER), ResultCode::Success);
    // The resolution was observed; nothing is scheduled any more.
    assert_eq!(session.future_wait(future, 1), ResultCode::NothingScheduled);
}

#[test]
fn test_second_schedule_while_in_flight() {
    let (session, db, _, release) = gated_session();
    let future = session.future_alloc(None);
    let tracks = track_ids(0..2);

    assert_eq!(
        session.read_slice_async(db, 0, 5_000_000, &tracks, future),
        ResultCode::Success
    );
    assert_eq!(
        session.read_slice_async(db, 0, 5_000_000, &tracks, future),
        ResultCode::ResourceBusy
    );
    assert_eq!(session.future_free(future), ResultCode::ResourceBusy);

    drop(release);
    assert_eq!(session.future_wait(future, FOREVER), ResultCode::Success);
    assert_eq!(session.future_free(future), ResultCode::Success);
}

#[test]
fn test_timeout_leaves_operation_running() {
    let (session, db, trace, release) = gated_session();
    let future = session.future_alloc(None);
    session.read_slice_async(db, 0, 5_000_000, &track_ids(0..4), future);

    assert_eq!(session.future_wait(future, 0), ResultCode::Timeout);
    assert_eq!(session.future_state(future), Some(FutureState::TimedOut));
    assert_eq!(session.future_free(future), ResultCode::ResourceBusy);

    drop(release);
    assert_eq!(session.future_wait(future, FOREVER), ResultCode::Success);
    assert_eq!(session.future_state(future), Some(FutureState::Succeeded));
    assert_eq!(
        session.aggregate_chunks(trace, &track_ids(0..4)).unwrap().chunks,
        4
    );

    // Reusable once resolved.
    assert_eq!(
        session.read_slice_async(db, 5_000_000, 10_000_000, &track_ids(0..4), future),
        ResultCode::Success
    );
    assert_eq!(session.future_wait(future, FOREVER), ResultCode::Success);
}

#[test]
fn test_interrupt_stops_at_checkpoint() {
    let (session, db, trace, release) = gated_session();
    let future = session.future_alloc(None);
    session.read_slice_async(db, 0, 5_000_000, &track_ids(0..4), future);

    assert!(session.future_interrupt(future));
    drop(release);
    assert_eq!(session.future_wait(future, FOREVER), ResultCode::Timeout);
    assert_eq!(session.future_state(future), Some(FutureState::Failed));
    assert!(!session.future_interrupt(future));

    let loaded = session.aggregate_chunks(trace, &track_ids(0..4)).unwrap();
    assert!(loaded.chunks <= 1);
}

#[test]
fn test_failed_read_reports_error() {
    let (session, db, _) = loaded_session();
    let (callback, seen) = recorder();
    let future = session.future_alloc(Some(callback));

    // Track ids are resolved on the worker.
    assert_eq!(
        session.read_slice_async(db, 0, 5_000_000, &[TrackId::new(9)], future),
        ResultCode::Success
    );
    assert_eq!(
        session.future_wait(future, FOREVER),
        ResultCode::InvalidParameter
    );
    assert_eq!(session.future_state(future), Some(FutureState::Failed));
    let (_, status, _) = seen.lock().last().cloned().unwrap();
    assert_eq!(status, ProgressStatus::Error);
}

#[test]
fn test_schedule_rejections() {
    let session = Session::new();
    let db = session.register_source(Arc::new(four_track_source()));
    let future = session.future_alloc(None);

    // No bound trace.
    assert_eq!(
        session.read_metadata_async(db, future),
        ResultCode::InvalidParameter
    );
    // Empty window and empty track set.
    assert_eq!(
        session.read_slice_async(db, 10, 10, &track_ids(0..1), future),
        ResultCode::InvalidParameter
    );
    assert_eq!(
        session.read_slice_async(db, 0, 10, &[], future),
        ResultCode::InvalidParameter
    );
    // Unknown future.
    assert_eq!(
        session.read_metadata_async(db, FutureId::new(77)),
        ResultCode::InvalidParameter
    );
    assert_eq!(session.future_state(future), Some(FutureState::Idle));
}

#[test]
fn test_client_async_round_trip() {
    let client = TraceClient::new();
    let db = client.attach(Arc::new(four_track_source()));
    let trace = client.create_trace();
    client.bind(db, trace).unwrap();

    let future = client.future(None);
    client.read_metadata_async(db, future).unwrap();
    client.wait(future, Some(Duration::from_secs(10))).unwrap();

    let request = ReadRequest::builder()
        .window(5_000_000, 10_000_000)
        .tracks(track_ids(0..4))
        .build()
        .unwrap();
    client.read_slice_async(db, request, future).unwrap();
    client.wait(future, None).unwrap();

    let err = client.wait(future, None).unwrap_err();
    assert_eq!(err.call(), Some("future_wait"));
    assert_eq!(err.code(), ResultCode::NothingScheduled);
    client.free(future).unwrap();

    let track = client.track_at(trace, 3).unwrap();
    let slice = client.last_chunk(track).unwrap();
    assert_eq!(slice.start, 5_000_000);
    assert_eq!(
        client
            .property(slice, SliceProperty::NumberOfRecords, 0)
            .unwrap(),
        PropertyValue::UInt64(2)
    );
}
