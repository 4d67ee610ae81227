//! rocpd Source Tests
//!
//! A small rocpd SQLite file written with rusqlite, opened through the
//! session and the client.

use crate::*;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two CPU threads, one GPU queue with two kernels, one utilization counter,
/// each of the first two launches linked to its kernel
fn write_rocpd(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE rocpd_string (id INTEGER PRIMARY KEY, string TEXT);
         CREATE TABLE rocpd_api (id INTEGER PRIMARY KEY, pid INTEGER, tid INTEGER,
             start INTEGER, end INTEGER, apiName_id INTEGER, args_id INTEGER);
         CREATE TABLE rocpd_op (id INTEGER PRIMARY KEY, gpuId INTEGER, queueId INTEGER,
             sequenceId INTEGER, start INTEGER, end INTEGER,
             description_id INTEGER, opType_id INTEGER);
         CREATE TABLE rocpd_monitor (id INTEGER PRIMARY KEY, deviceType TEXT,
             deviceId INTEGER, monitorType TEXT, start INTEGER, end INTEGER, value TEXT);
         CREATE TABLE rocpd_api_ops (id INTEGER PRIMARY KEY, api_id INTEGER, op_id INTEGER);
         INSERT INTO rocpd_api_ops VALUES (1, 1, 10), (2, 2, 11);
         INSERT INTO rocpd_string VALUES (1, 'hipLaunchKernel'), (2, 'gemm_kernel'),
             (3, 'KernelExecution'), (4, '');",
    )
    .unwrap();
    for (id, tid, start, end) in [
        (1, 200, 2_000_000, 2_000_400),
        (2, 200, 4_000_000, 4_000_400),
        (3, 201, 4_500_000, 4_500_100),
    ] {
        conn.execute(
            "INSERT INTO rocpd_api VALUES (?1, 200, ?2, ?3, ?4, 1, 4)",
            params![id, tid, start, end],
        )
        .unwrap();
    }
    for (id, start, end) in [(10, 2_000_500, 2_600_000), (11, 4_000_500, 6_000_000)] {
        conn.execute(
            "INSERT INTO rocpd_op VALUES (?1, 1, 0, 0, ?2, ?3, 2, 3)",
            params![id, start, end],
        )
        .unwrap();
    }
    for (id, ts, value) in [(20, 2_100_000, "55.5"), (21, 5_000_000, "97")] {
        conn.execute(
            "INSERT INTO rocpd_monitor VALUES (?1, 'GPU', 1, 'GPU Utilization', ?2, ?2, ?3)",
            params![id, ts, value],
        )
        .unwrap();
    }
}

fn fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.rpd");
    write_rocpd(&path);
    (dir, path)
}

#[test]
fn test_open_and_load_metadata() {
    init_tracing();
    let (_dir, path) = fixture();
    let session = Session::new();
    let db = session
        .open_database(&path, DatabaseKind::Autodetect)
        .unwrap();
    let trace = session.create_trace();
    assert_eq!(session.bind_trace(db, trace), ResultCode::Success);

    let (callback, seen) = recorder();
    assert!(session.read_properties(db, Some(&callback)));
    assert_eq!(seen.lock().len(), 5);

    let handle = Handle::Trace(trace);
    let get = |key: TraceProperty| session.get_property_as_uint64(handle, key.as_u32(), 0);
    assert_eq!(get(TraceProperty::StartTime), 2_000_000);
    assert_eq!(get(TraceProperty::EndTime), 6_000_001);
    assert_eq!(get(TraceProperty::NumberOfTracks), 4);

    let names: Vec<(String, String)> = (0..4)
        .map(|i| {
            let track = session.get_track_at(trace, i).unwrap();
            (
                session.get_track_group_name(track).unwrap(),
                session.get_track_name(track).unwrap(),
            )
        })
        .collect();
    assert_eq!(
        names,
        vec![
            ("200".to_string(), "200".to_string()),
            ("200".to_string(), "201".to_string()),
            ("1".to_string(), "0".to_string()),
            ("1".to_string(), "GPU Utilization".to_string()),
        ]
    );
}

#[test]
fn test_batched_and_per_track_reads_agree() {
    let (_dir, path) = fixture();
    let client = TraceClient::new();
    let db = client.open(&path, DatabaseKind::RocpdSqlite).unwrap();
    let trace = client.create_trace();
    client.load(db, trace, None).unwrap();

    let request = ReadRequest::builder()
        .window(2_000_000, 6_000_001)
        .tracks(track_ids(0..4))
        .build()
        .unwrap();
    let batched = client
        .read(db, &request, ReadMode::AllTracks, None)
        .unwrap();
    let per_track = client
        .read(db, &request, ReadMode::TrackByTrack, None)
        .unwrap();
    assert_eq!(batched.records, 7);
    assert_eq!(batched, per_track);

    let counts: Vec<u64> = (0..4)
        .map(|i| {
            let track = client.track_at(trace, i).unwrap();
            client
                .property_u64(track, TrackProperty::NumRecords, 0)
                .unwrap()
        })
        .collect();
    assert_eq!(counts, vec![2, 1, 2, 2]);
}

#[test]
fn test_strings_and_values_from_sqlite() {
    let (_dir, path) = fixture();
    let client = TraceClient::new();
    let db = client.open(&path, DatabaseKind::Autodetect).unwrap();
    let trace = client.create_trace();
    client.load(db, trace, None).unwrap();
    let request = ReadRequest::new(TimeWindow::new(2_000_000, 6_000_001), track_ids(0..4)).unwrap();
    client.read(db, &request, ReadMode::AllTracks, None).unwrap();

    let kernels = client.last_chunk(client.track_at(trace, 2).unwrap()).unwrap();
    assert_eq!(
        client
            .property_str(kernels, SliceProperty::EventSymbolStringIndexed, 0)
            .unwrap(),
        "gemm_kernel"
    );
    assert_eq!(
        client
            .property_str(kernels, SliceProperty::EventTypeStringIndexed, 1)
            .unwrap(),
        "KernelExecution"
    );
    assert_eq!(
        client
            .property(kernels, SliceProperty::EventDurationIndexed, 1)
            .unwrap(),
        PropertyValue::Int64(1_999_500)
    );

    let counter = client.last_chunk(client.track_at(trace, 3).unwrap()).unwrap();
    assert_eq!(
        client
            .property(counter, SliceProperty::PmcValueIndexed, 0)
            .unwrap(),
        PropertyValue::Double(55.5)
    );
}

#[test]
fn test_async_read_from_sqlite() {
    let (_dir, path) = fixture();
    let session = Session::new();
    let db = session.open_database(&path, DatabaseKind::Autodetect).unwrap();
    let trace = session.create_trace();
    session.bind_trace(db, trace);

    let future = session.future_alloc(None);
    session.read_metadata_async(db, future);
    assert_eq!(session.future_wait(future, 10), ResultCode::Success);
    assert_eq!(
        session.read_slice_async(db, 2_000_000, 4_000_000, &track_ids(0..4), future),
        ResultCode::Success
    );
    assert_eq!(session.future_wait(future, 10), ResultCode::Success);

    let totals = session.aggregate_chunks(trace, &track_ids(0..4)).unwrap();
    // api 1, op 10 and sample 20 fall inside the window.
    assert_eq!(totals.record_count, 3);
    assert_eq!(totals.chunks, 4);
}

#[test]
fn test_flow_trace_from_sqlite() {
    let (_dir, path) = fixture();
    let client = TraceClient::new();
    let db = client.open(&path, DatabaseKind::Autodetect).unwrap();
    let trace = client.create_trace();
    client.load(db, trace, None).unwrap();

    let launch = EventId::new(1, EventOperation::Launch);
    let flow = client
        .event_property(db, trace, EventPropertyKind::FlowTrace, launch)
        .unwrap();
    assert_eq!(
        client.property_u64(flow, FlowTraceProperty::NumberOfEndpoints, 0).unwrap(),
        1
    );
    // Kernel 10 sits on the GPU queue track "1"/"0".
    assert_eq!(
        client.property_u64(flow, FlowTraceProperty::EndpointTrackIdIndexed, 0).unwrap(),
        2
    );
    assert_eq!(
        client.property_u64(flow, FlowTraceProperty::EndpointIdIndexed, 0).unwrap(),
        EventId::new(10, EventOperation::Dispatch).pack()
    );
    assert_eq!(
        client.property_u64(flow, FlowTraceProperty::EndpointTimestampIndexed, 0).unwrap(),
        2_000_500
    );

    // The reverse link lands at the end of the launching call.
    let dispatch = EventId::new(11, EventOperation::Dispatch);
    let back = client
        .event_property(db, trace, EventPropertyKind::FlowTrace, dispatch)
        .unwrap();
    assert_eq!(
        client.property_u64(back, FlowTraceProperty::EndpointTrackIdIndexed, 0).unwrap(),
        0
    );
    assert_eq!(
        client.property_u64(back, FlowTraceProperty::EndpointTimestampIndexed, 0).unwrap(),
        4_000_400
    );

    // No rocpd_stackframe table: an empty stack, not an error.
    let stack = client
        .event_property(db, trace, EventPropertyKind::StackTrace, launch)
        .unwrap();
    assert_eq!(
        client.property_u64(stack, StackTraceProperty::NumberOfFrames, 0).unwrap(),
        0
    );
}

#[test]
fn test_open_failures() {
    let dir = TempDir::new().unwrap();
    let session = Session::new();
    assert_eq!(
        session.open_database(dir.path().join("missing.rpd"), DatabaseKind::Autodetect),
        None
    );

    let client = TraceClient::new();
    let err = client
        .open(dir.path().join("missing.rpd"), DatabaseKind::RocpdSqlite)
        .unwrap_err();
    assert_eq!(err.call(), Some("open_database"));
    assert_eq!(err.code(), ResultCode::DbAccessFailed);

    let (_fixture_dir, path) = fixture();
    let err = client
        .open(&path, DatabaseKind::RocprofSqlite)
        .unwrap_err();
    assert_eq!(err.code(), ResultCode::NotSupported);

    let plain = dir.path().join("plain.db");
    Connection::open(&plain)
        .unwrap()
        .execute_batch("CREATE TABLE samples (x INTEGER);")
        .unwrap();
    assert_eq!(session.open_database(&plain, DatabaseKind::Autodetect), None);
}
