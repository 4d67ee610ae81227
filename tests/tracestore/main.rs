//! Tracestore Integration Tests
//!
//! End-to-end tests over the public surfaces:
//! - session: flattened handles, legacy pending reads, eviction
//! - async_reads: futures, progress delivery, timeouts
//! - planner: grid scenarios driving real reads
//! - properties: typed getters and sentinels
//! - rocpd: SQLite-backed sources
//! - concurrency: parallel reads and eviction

use parking_lot::Mutex;
use std::sync::{mpsc, Arc};
use tracestore::prelude::*;
use tracestore::tracestore_core::TraceMetadata;

mod async_reads;
mod concurrency;
mod planner;
mod properties;
#[cfg(feature = "rocpd")]
mod rocpd;
mod session;

// ============================================================================
// Fixtures
// ============================================================================

/// Install a test-writer subscriber once per binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn event(id: u64, op: EventOperation, ts: Timestamp, dur: i64, symbol: &str) -> RawRecord {
    RawRecord::Event(RawEvent {
        id,
        operation: op,
        timestamp: ts,
        duration: dur,
        type_name: match op {
            EventOperation::Launch => "hipLaunchKernel".to_string(),
            _ => "KernelExecution".to_string(),
        },
        symbol: symbol.to_string(),
    })
}

pub fn sample(ts: Timestamp, value: f64) -> RawRecord {
    RawRecord::Counter {
        timestamp: ts,
        value,
    }
}

/// Four tracks over `[0, 10_000_000)`: two CPU threads, one GPU queue and
/// one utilization counter
pub fn four_track_source() -> MemorySource {
    use EventOperation::{Dispatch, Launch};
    MemorySource::builder("four-tracks")
        .window(0, 10_000_000)
        .track(
            TrackInfo::new(TrackCategory::Region, "100", "100"),
            vec![
                event(1, Launch, 100_000, 500, ""),
                event(2, Launch, 1_000_000, 2_000_000, ""),
                event(3, Launch, 1_500_000, 100, ""),
                event(4, Launch, 6_000_000, 10, ""),
            ],
        )
        .track(
            TrackInfo::new(TrackCategory::Region, "100", "101"),
            vec![
                event(5, Launch, 2_000_000, 50, ""),
                event(6, Launch, 7_000_000, 50, ""),
            ],
        )
        .track(
            TrackInfo::new(TrackCategory::Kernel, "0", "0").with_node(3),
            vec![
                event(7, Dispatch, 3_000_000, 1_000, "gemm"),
                event(8, Dispatch, 8_000_000, 1_000, "softmax"),
            ],
        )
        .track(
            TrackInfo::new(TrackCategory::Counter, "1", "GPU Utilization"),
            vec![
                sample(500_000, 10.0),
                sample(5_500_000, 90.0),
                sample(9_000_000, 40.0),
            ],
        )
        .build()
}

/// A session with the four-track source bound to a loaded trace
pub fn loaded_session() -> (Session, DatabaseId, TraceId) {
    let session = Session::new();
    let db = session.register_source(Arc::new(four_track_source()));
    let trace = session.create_trace();
    assert_eq!(session.bind_trace(db, trace), ResultCode::Success);
    assert!(session.read_properties(db, None));
    (session, db, trace)
}

pub fn track_ids(range: std::ops::Range<u32>) -> Vec<TrackId> {
    range.map(TrackId::new).collect()
}

/// Progress messages seen by a callback
pub type Seen = Arc<Mutex<Vec<(u8, ProgressStatus, String)>>>;

pub fn recorder() -> (ProgressCallback, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: ProgressCallback = Arc::new(move |_source, percent, status, message| {
        sink.lock().push((percent, status, message.to_string()));
    });
    (callback, seen)
}

/// Source whose track reads block until released
///
/// Each `read_track` consumes one message from the gate; dropping the
/// sender releases every pending and future read.
pub struct GatedSource {
    inner: MemorySource,
    gate: Mutex<mpsc::Receiver<()>>,
}

impl GatedSource {
    pub fn new(inner: MemorySource) -> (Self, mpsc::Sender<()>) {
        let (release, gate) = mpsc::channel();
        let source = Self {
            inner,
            gate: Mutex::new(gate),
        };
        (source, release)
    }
}

impl EventSource for GatedSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn read_metadata(
        &self,
        progress: &mut dyn FnMut(f64, &str),
    ) -> tracestore::tracestore_core::Result<TraceMetadata> {
        self.inner.read_metadata(progress)
    }

    fn read_track(
        &self,
        track: &TrackInfo,
        window: TimeWindow,
    ) -> tracestore::tracestore_core::Result<Vec<RawRecord>> {
        let _ = self.gate.lock().recv();
        self.inner.read_track(track, window)
    }
}
