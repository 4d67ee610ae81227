//! Planner Scenario Tests
//!
//! Grids over a loaded four-track trace, driven into real reads.

use crate::*;
use tracestore::tracestore_engine::Rejection;

#[test]
fn test_two_by_two_grid_over_four_tracks() {
    let (session, db, trace) = loaded_session();
    let planner = session.planner(trace).unwrap();
    let shape = GridShape::new(2, 2);

    let cell = planner.cell(shape, 1, 1).unwrap();
    assert_eq!(cell.window, TimeWindow::new(5_000_000, 10_000_000));
    assert_eq!(cell.tracks, 2..4);

    let cell = planner.cell(shape, 0, 0).unwrap();
    assert_eq!(cell.window, TimeWindow::new(0, 5_000_000));
    assert_eq!(cell.tracks, 0..2);

    // Read every cell; together they load every row of the trace.
    for cell in session.plan(trace, 2, 2) {
        let request = cell.request().unwrap();
        assert_eq!(
            session.read_slice_async_blocking(db, &request),
            ResultCode::Success
        );
    }
    let totals: usize = (0..4)
        .map(|i| {
            let track = Handle::Track(session.get_track_at(trace, i).unwrap());
            session.get_property_as_uint64(track, TrackProperty::NumRecords.as_u32(), 0) as usize
        })
        .sum();
    assert_eq!(totals, 11);
}

#[test]
fn test_more_rows_than_tracks_rejects_every_cell() {
    let (session, _, trace) = loaded_session();
    let planner = session.planner(trace).unwrap();
    let shape = GridShape::new(2, 5);
    assert!(matches!(
        planner.check(shape),
        Err(Rejection::TooFewTracks { .. })
    ));
    for x in 0..2 {
        for y in 0..5 {
            assert!(planner.cell(shape, x, y).is_err());
        }
    }
    assert!(session.plan(trace, 2, 5).is_empty());
}

#[test]
fn test_granularity_guard() {
    let (session, _, trace) = loaded_session();
    // 10 columns of exactly 1_000_000 pass, 11 do not.
    assert_eq!(session.plan(trace, 10, 1).len(), 10);
    assert!(matches!(
        session.planner(trace).unwrap().check(GridShape::new(11, 1)),
        Err(Rejection::SpanTooNarrow { .. })
    ));
}

#[test]
fn test_planner_requires_metadata() {
    let session = Session::new();
    let trace = session.create_trace();
    assert!(session.planner(trace).is_none());
    assert!(session.plan(trace, 1, 1).is_empty());
}

#[test]
fn test_client_read_grid() {
    let client = TraceClient::new();
    let db = client.attach(Arc::new(four_track_source()));
    let trace = client.create_trace();
    client.load(db, trace, None).unwrap();

    let summaries = client
        .read_grid(db, trace, GridShape::new(5, 4), ReadMode::AllTracks, None)
        .unwrap();
    assert_eq!(summaries.len(), 20);
    // The 1M..3M region straddles the 2M column boundary and is read by both
    // neighbouring cells.
    assert_eq!(summaries.iter().map(|s| s.records).sum::<usize>(), 12);

    let err = client.planner(TraceId::new(99)).unwrap_err();
    assert_eq!(err.call(), Some("planner"));
}

#[test]
fn test_grid_keeps_event_across_column_boundary() {
    let thread = TrackInfo::new(TrackCategory::Region, "100", "100");
    let source = MemorySource::builder("straddle")
        .window(0, 10_000_000)
        .track(
            thread,
            vec![
                event(1, EventOperation::Launch, 1_000_000, 1_000, "a"),
                event(2, EventOperation::Launch, 4_900_000, 200_000, "b"),
                event(3, EventOperation::Launch, 8_000_000, 1_000, "c"),
            ],
        )
        .build();
    let client = TraceClient::new();
    let db = client.attach(Arc::new(source));
    let trace = client.create_trace();
    client.load(db, trace, None).unwrap();

    let summaries = client
        .read_grid(db, trace, GridShape::new(2, 1), ReadMode::AllTracks, None)
        .unwrap();
    let records: Vec<usize> = summaries.iter().map(|s| s.records).collect();
    assert_eq!(records, vec![2, 2]);

    // Both cells hold event 2; together they cover all three events.
    let track = client.track_at(trace, 0).unwrap();
    let mut ids = Vec::new();
    for start in [0, 5_000_000] {
        let slice = SliceHandle {
            trace: track.trace,
            track: track.track,
            start,
        };
        for i in 0..2 {
            ids.push(
                client
                    .property_u64(slice, SliceProperty::EventIdIndexed, i)
                    .unwrap(),
            );
        }
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids, vec![1, 2, 3]);
}

/// Helper trait keeping the scenario above readable
trait BlockingRead {
    fn read_slice_async_blocking(&self, db: DatabaseId, request: &ReadRequest) -> ResultCode;
}

impl BlockingRead for Session {
    fn read_slice_async_blocking(&self, db: DatabaseId, request: &ReadRequest) -> ResultCode {
        let future = self.future_alloc(None);
        let code = self.read_slice_async(
            db,
            request.window().start,
            request.window().end,
            request.tracks(),
            future,
        );
        if !code.is_success() {
            return code;
        }
        let code = self.future_wait(future, u64::MAX);
        self.future_free(future);
        code
    }
}
