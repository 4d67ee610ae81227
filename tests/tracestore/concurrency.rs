//! Concurrency Tests
//!
//! Tests for thread safety:
//! - Parallel async reads on disjoint tracks
//! - Overlapping reads of the same tracks
//! - Eviction racing population of the same track

use crate::*;
use std::sync::Barrier;
use std::thread;

fn shared_session() -> (Arc<Session>, DatabaseId, TraceId) {
    let (session, db, trace) = loaded_session();
    (Arc::new(session), db, trace)
}

/// One thread per track, each with its own future
#[test]
fn test_parallel_reads_on_disjoint_tracks() {
    let (session, db, trace) = shared_session();
    const NUM_READERS: u32 = 4;

    let barrier = Arc::new(Barrier::new(NUM_READERS as usize));
    let handles: Vec<_> = (0..NUM_READERS)
        .map(|i| {
            let session = Arc::clone(&session);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let future = session.future_alloc(None);
                barrier.wait();
                let code =
                    session.read_slice_async(db, 0, 10_000_000, &[TrackId::new(i)], future);
                assert_eq!(code, ResultCode::Success);
                assert_eq!(session.future_wait(future, u64::MAX), ResultCode::Success);
                assert_eq!(session.future_free(future), ResultCode::Success);
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let totals = session.aggregate_chunks(trace, &track_ids(0..4)).unwrap();
    assert_eq!(totals.chunks, 4);
    assert_eq!(totals.record_count, 11);
}

/// Overlapping track sets serialize per track and end in a consistent state
#[test]
fn test_overlapping_reads_converge() {
    let (session, db, trace) = shared_session();
    const NUM_READERS: usize = 8;
    const READS_PER_THREAD: usize = 10;

    let barrier = Arc::new(Barrier::new(NUM_READERS));
    let handles: Vec<_> = (0..NUM_READERS)
        .map(|i| {
            let session = Arc::clone(&session);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let future = session.future_alloc(None);
                // Alternate between the two halves, always touching track 1.
                let tracks = if i % 2 == 0 {
                    track_ids(0..2)
                } else {
                    track_ids(1..4)
                };
                barrier.wait();
                for _ in 0..READS_PER_THREAD {
                    session.read_slice_async(db, 0, 5_000_000, &tracks, future);
                    assert_eq!(session.future_wait(future, u64::MAX), ResultCode::Success);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    // Same window each time, so each track holds exactly one chunk.
    for i in 0..4 {
        let track = Handle::Track(session.get_track_at(trace, i).unwrap());
        assert_eq!(
            session.get_property_as_uint64(track, TrackProperty::NumberOfSlices.as_u32(), 0),
            1
        );
    }
    let totals = session.aggregate_chunks(trace, &track_ids(0..4)).unwrap();
    assert_eq!(totals.record_count, 6);
}

/// Eviction never observes a half-populated track
#[test]
fn test_eviction_races_population() {
    let (session, db, trace) = shared_session();
    const ROUNDS: usize = 50;

    let barrier = Arc::new(Barrier::new(2));
    let reader = {
        let session = Arc::clone(&session);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let future = session.future_alloc(None);
            barrier.wait();
            for _ in 0..ROUNDS {
                session.read_slice_async(db, 0, 5_000_000, &track_ids(0..1), future);
                assert_eq!(session.future_wait(future, u64::MAX), ResultCode::Success);
            }
        })
    };
    let evictor = {
        let session = Arc::clone(&session);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..ROUNDS {
                assert_eq!(session.delete_chunks_at(trace, 0), ResultCode::Success);
                thread::yield_now();
            }
        })
    };
    reader.join().unwrap();
    evictor.join().unwrap();

    let track = Handle::Track(session.get_track_at(trace, 0).unwrap());
    let records =
        session.get_property_as_uint64(track, TrackProperty::NumRecords.as_u32(), 0);
    assert!(records == 0 || records == 3, "records = {}", records);

    let chunks: u64 = (0..4)
        .map(|i| {
            let track = Handle::Track(session.get_track_at(trace, i).unwrap());
            session.get_property_as_uint64(track, TrackProperty::MemoryFootprint.as_u32(), 0)
        })
        .sum();
    let total = session.get_property_as_uint64(
        Handle::Trace(trace),
        TraceProperty::MemoryFootprint.as_u32(),
        0,
    );
    assert!(chunks <= total);
}

/// A worker keeps its trace alive after the trace is deleted
#[test]
fn test_delete_trace_during_async_read() {
    let (source, release) = GatedSource::new(four_track_source());
    let session = Session::new();
    let db = session.register_source(Arc::new(source));
    let trace = session.create_trace();
    session.bind_trace(db, trace);
    assert!(session.read_properties(db, None));

    let future = session.future_alloc(None);
    session.read_slice_async(db, 0, 5_000_000, &track_ids(0..4), future);
    assert_eq!(session.delete_trace(trace), ResultCode::Success);
    drop(release);
    assert_eq!(session.future_wait(future, u64::MAX), ResultCode::Success);
    assert_eq!(session.get_track_at(trace, 0), None);

    // The connector is free for a new trace once the worker let go.
    let next = session.create_trace();
    assert_eq!(session.bind_trace(db, next), ResultCode::Success);
}
