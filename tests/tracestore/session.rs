//! Session Tests
//!
//! Flattened surface end to end:
//! - open, bind, metadata
//! - legacy pending reads
//! - chunk store accessors and eviction

use crate::*;

mod lifecycle {
    use super::*;

    #[test]
    fn test_metadata_populates_trace() {
        init_tracing();
        let (session, _, trace) = loaded_session();
        let handle = Handle::Trace(trace);
        assert_eq!(
            session.property(handle, TraceProperty::StartTime.into(), 0),
            Some(PropertyValue::UInt64(0))
        );
        assert_eq!(
            session.property(handle, TraceProperty::EndTime.into(), 0),
            Some(PropertyValue::UInt64(10_000_000))
        );
        assert_eq!(
            session.property(handle, TraceProperty::NumberOfTracks.into(), 0),
            Some(PropertyValue::UInt64(4))
        );
    }

    #[test]
    fn test_track_names() {
        let (session, _, trace) = loaded_session();
        let region = session.get_track_at(trace, 1).unwrap();
        assert_eq!(session.get_track_group_name(region).as_deref(), Some("100"));
        assert_eq!(session.get_track_name(region).as_deref(), Some("101"));

        let counter = session.get_track_at(trace, 3).unwrap();
        assert_eq!(
            session.get_track_name(counter).as_deref(),
            Some("GPU Utilization")
        );
        assert_eq!(session.get_track_at(trace, 4), None);
    }

    #[test]
    fn test_read_properties_reports_progress() {
        let session = Session::new();
        let db = session.register_source(Arc::new(four_track_source()));
        let trace = session.create_trace();
        session.bind_trace(db, trace);

        let (callback, seen) = recorder();
        assert!(session.read_properties(db, Some(&callback)));
        let seen = seen.lock();
        let (percent, status, message) = seen.last().unwrap();
        assert_eq!(*percent, 100);
        assert_eq!(*status, ProgressStatus::Success);
        assert_eq!(message, "Trace metadata successfully loaded");
        assert!(seen[..seen.len() - 1]
            .iter()
            .all(|(_, status, _)| *status == ProgressStatus::Busy));
    }

    #[test]
    fn test_unbound_connector_cannot_read() {
        let session = Session::new();
        let db = session.register_source(Arc::new(four_track_source()));
        assert!(!session.read_properties(db, None));
        assert_eq!(session.memory_footprint(db), 0);
    }

    #[test]
    fn test_bind_is_one_shot() {
        let session = Session::new();
        let first = session.register_source(Arc::new(four_track_source()));
        let second = session.register_source(Arc::new(four_track_source()));
        let trace = session.create_trace();
        let other = session.create_trace();

        assert_eq!(session.bind_trace(first, trace), ResultCode::Success);
        // Same pair again is fine.
        assert_eq!(session.bind_trace(first, trace), ResultCode::Success);
        // Trace already bound elsewhere.
        assert_eq!(session.bind_trace(second, trace), ResultCode::ResourceBusy);
        // Connector already serving a live trace.
        assert_eq!(session.bind_trace(first, other), ResultCode::ResourceBusy);

        // Deleting the trace frees the connector.
        assert_eq!(session.delete_trace(trace), ResultCode::Success);
        assert_eq!(session.bind_trace(first, other), ResultCode::Success);
    }

    #[test]
    fn test_close_database() {
        let (session, db, trace) = loaded_session();
        assert_eq!(session.close_database(db), ResultCode::Success);
        assert_eq!(session.close_database(db), ResultCode::InvalidParameter);
        assert_eq!(
            session.configure_read_window(db, 0, 1),
            ResultCode::InvalidParameter
        );
        // The trace survives its connector.
        assert!(session.get_track_at(trace, 0).is_some());
    }
}

mod legacy_reads {
    use super::*;

    fn configure(session: &Session, db: DatabaseId, start: Timestamp, end: Timestamp, n: u32) {
        assert_eq!(
            session.configure_read_window(db, start, end),
            ResultCode::Success
        );
        for id in track_ids(0..n) {
            assert_eq!(session.add_track(db, id), ResultCode::Success);
        }
    }

    #[test]
    fn test_read_chunk_all_tracks() {
        let (session, db, trace) = loaded_session();
        configure(&session, db, 0, 5_000_000, 4);
        let (callback, seen) = recorder();
        assert_eq!(
            session.read_chunk_all_tracks(db, Some(&callback)),
            ResultCode::Success
        );

        let totals = session.aggregate_chunks(trace, &track_ids(0..4)).unwrap();
        assert_eq!(totals.chunks, 4);
        assert_eq!(totals.record_count, 6);
        assert!(totals.memory_footprint > 0);

        let (percent, status, _) = seen.lock().last().cloned().unwrap();
        assert_eq!((percent, status), (100, ProgressStatus::Success));
    }

    #[test]
    fn test_track_by_track_reports_each_track() {
        let (session, db, _) = loaded_session();
        configure(&session, db, 0, 5_000_000, 4);
        let (callback, seen) = recorder();
        assert_eq!(
            session.read_chunk_track_by_track(db, Some(&callback)),
            ResultCode::Success
        );
        let percents: Vec<u8> = seen.lock().iter().map(|(p, _, _)| *p).collect();
        assert_eq!(percents, vec![25, 50, 75, 100, 100]);
    }

    #[test]
    fn test_pending_state_consumed() {
        let (session, db, _) = loaded_session();
        configure(&session, db, 0, 5_000_000, 2);
        assert_eq!(session.read_chunk_all_tracks(db, None), ResultCode::Success);
        assert_eq!(
            session.read_chunk_all_tracks(db, None),
            ResultCode::InvalidParameter
        );

        // A window alone selects no tracks.
        session.configure_read_window(db, 0, 5_000_000);
        assert_eq!(
            session.read_chunk_track_by_track(db, None),
            ResultCode::InvalidParameter
        );
    }

    #[test]
    fn test_read_before_metadata() {
        let session = Session::new();
        let db = session.register_source(Arc::new(four_track_source()));
        let trace = session.create_trace();
        session.bind_trace(db, trace);
        configure(&session, db, 0, 5_000_000, 1);
        assert_eq!(
            session.read_chunk_all_tracks(db, None),
            ResultCode::NotLoaded
        );
    }
}

mod chunk_store {
    use super::*;

    fn read_window(session: &Session, db: DatabaseId, start: Timestamp, end: Timestamp) {
        session.configure_read_window(db, start, end);
        for id in track_ids(0..4) {
            session.add_track(db, id);
        }
        assert_eq!(
            session.read_chunk_track_by_track(db, None),
            ResultCode::Success
        );
    }

    #[test]
    fn test_get_chunk_is_last_acquired() {
        let (session, db, trace) = loaded_session();
        read_window(&session, db, 0, 5_000_000);
        read_window(&session, db, 5_000_000, 10_000_000);

        let track = session.get_track_at(trace, 0).unwrap();
        let slice = session.get_chunk(track).unwrap();
        assert_eq!(slice.start, 5_000_000);
        assert_eq!(session.get_chunk_record_count(slice), 1);
        assert!(session.get_chunk_memory_footprint(slice) > 0);
    }

    #[test]
    fn test_delete_chunks_at_is_idempotent() {
        let (session, db, trace) = loaded_session();
        read_window(&session, db, 0, 5_000_000);
        read_window(&session, db, 5_000_000, 10_000_000);
        let before = session.memory_footprint(db);

        assert_eq!(session.delete_chunks_at(trace, 5_000_000), ResultCode::Success);
        let after = session.memory_footprint(db);
        assert!(after < before);

        assert_eq!(session.delete_chunks_at(trace, 5_000_000), ResultCode::Success);
        assert_eq!(session.memory_footprint(db), after);

        // Last acquired chunk was evicted, so get_chunk is null.
        let track = session.get_track_at(trace, 2).unwrap();
        assert_eq!(session.get_chunk(track), None);
        let remaining = Handle::Track(track);
        assert_eq!(
            session.get_property_as_uint64(remaining, TrackProperty::NumberOfSlices.as_u32(), 0),
            1
        );
    }

    #[test]
    fn test_stale_slice_handle_is_sentinel() {
        let (session, db, trace) = loaded_session();
        read_window(&session, db, 0, 5_000_000);
        let slice = session
            .get_chunk(session.get_track_at(trace, 0).unwrap())
            .unwrap();
        assert_eq!(session.get_chunk_record_count(slice), 3);

        assert_eq!(session.delete_all_time_slices(trace), ResultCode::Success);
        assert_eq!(session.get_chunk_record_count(slice), 0);
        assert_eq!(session.get_chunk_memory_footprint(slice), 0);
    }

    #[test]
    fn test_delete_time_slice_matches_exact_window() {
        let (session, db, trace) = loaded_session();
        read_window(&session, db, 0, 5_000_000);
        let track = Handle::Track(session.get_track_at(trace, 1).unwrap());
        let slices = TrackProperty::NumberOfSlices.as_u32();

        assert_eq!(
            session.delete_time_slice(trace, 0, 4_000_000),
            ResultCode::Success
        );
        assert_eq!(session.get_property_as_uint64(track, slices, 0), 1);

        assert_eq!(
            session.delete_time_slice(trace, 0, 5_000_000),
            ResultCode::Success
        );
        assert_eq!(session.get_property_as_uint64(track, slices, 0), 0);
    }

    #[test]
    fn test_rereading_a_window_replaces_chunk() {
        let (session, db, trace) = loaded_session();
        read_window(&session, db, 0, 5_000_000);
        let footprint = session.memory_footprint(db);
        read_window(&session, db, 0, 5_000_000);
        assert_eq!(session.memory_footprint(db), footprint);

        let track = Handle::Track(session.get_track_at(trace, 0).unwrap());
        assert_eq!(
            session.get_property_as_uint64(track, TrackProperty::NumberOfSlices.as_u32(), 0),
            1
        );
    }
}
