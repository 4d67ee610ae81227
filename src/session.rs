//! Flattened handle-and-enum surface.
//!
//! [`Session`] owns every trace, connector and future behind arena ids and
//! exposes the store the way a C-style binding would: handles are `Option`s
//! where `None` is null, statuses are [`ResultCode`]s returned by value and
//! property getters return sentinels (`0`, `None`) instead of failing.
//!
//! Every flattened call is a thin wrapper over a typed `try_*` method that
//! returns [`tracestore_core::Result`]; [`crate::TraceClient`] builds on
//! those to report failures as [`crate::Error::Call`].
//!
//! The legacy read sequence keeps per-connector pending state:
//!
//! ```ignore
//! session.configure_read_window(db, 0, 5_000_000);
//! session.add_track(db, TrackId::new(0));
//! session.add_track(db, TrackId::new(1));
//! session.read_chunk_all_tracks(db, None); // consumes and clears the pending request
//! ```

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracestore_core::{
    DatabaseId, EntityKind, Error, EventId, EventPropertyHandle, EventPropertyKind, EventSource,
    FutureId, Handle, ProgressCallback, PropertyKey, PropertyValue, ReadRequest,
    ReadRequestBuilder, Result, ResultCode, SliceHandle, TimeWindow, Timestamp, TraceId,
    TrackHandle, TrackId,
};
use tracestore_database::DatabaseKind;
use tracestore_engine::{
    ext_data_property, flow_trace_property, slice_property, stack_trace_property, trace_property,
    track_property, Cell, DatabaseConnector, Future, FutureState, GridShape, PartitionPlanner,
    ReadMode, ReadSummary, StoreConfig,
};
use tracestore_storage::{aggregate_chunks, Chunk, ChunkTotals, EventProperty, Trace, Track};
use tracing::{debug, info};

/// A connector plus the legacy pending request built up by
/// `configure_read_window` / `add_track`.
struct Attached {
    connector: DatabaseConnector,
    pending: Mutex<ReadRequestBuilder>,
}

impl Attached {
    fn take_pending(&self) -> Result<ReadRequest> {
        std::mem::take(&mut *self.pending.lock()).build()
    }
}

/// Owner of every trace, connector and future
///
/// All methods take `&self`; a session can be shared across threads behind
/// an `Arc`.
pub struct Session {
    config: StoreConfig,
    traces: RwLock<FxHashMap<TraceId, Arc<Trace>>>,
    databases: RwLock<FxHashMap<DatabaseId, Arc<Attached>>>,
    futures: RwLock<FxHashMap<FutureId, Arc<Future>>>,
    next_trace: AtomicU32,
    next_database: AtomicU32,
    next_future: AtomicU32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session with default configuration
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Session with explicit configuration
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            traces: RwLock::new(FxHashMap::default()),
            databases: RwLock::new(FxHashMap::default()),
            futures: RwLock::new(FxHashMap::default()),
            next_trace: AtomicU32::new(0),
            next_database: AtomicU32::new(0),
            next_future: AtomicU32::new(0),
        }
    }

    /// Configuration shared by every connector of this session
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    fn trace(&self, id: TraceId) -> Result<Arc<Trace>> {
        self.traces
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn attached(&self, id: DatabaseId) -> Result<Arc<Attached>> {
        self.databases
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn future(&self, id: FutureId) -> Result<Arc<Future>> {
        self.futures
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn track(&self, handle: TrackHandle) -> Result<(Arc<Trace>, Arc<Track>)> {
        let trace = self.trace(handle.trace)?;
        let track = trace
            .track(handle.track)
            .ok_or_else(|| Error::NotFound(format!("{} in {}", handle.track, handle.trace)))?;
        Ok((trace, track))
    }

    fn slice(&self, handle: SliceHandle) -> Result<(Arc<Trace>, Arc<Chunk>)> {
        let (trace, track) = self.track(handle.track_handle())?;
        let chunk = track
            .chunk_at_time(handle.start)
            .filter(|chunk| chunk.start_time() == handle.start)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no chunk at {} on {} of {}",
                    handle.start, handle.track, handle.trace
                ))
            })?;
        Ok((trace, chunk))
    }

    fn event_property(&self, handle: EventPropertyHandle) -> Result<Arc<EventProperty>> {
        self.trace(handle.trace)?
            .event_property(handle.kind, handle.event)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no {} of {} in {}",
                    handle.kind, handle.event, handle.trace
                ))
            })
    }

    // ------------------------------------------------------------------
    // Connectors
    // ------------------------------------------------------------------

    pub(crate) fn try_open_database(
        &self,
        path: impl AsRef<Path>,
        kind: DatabaseKind,
    ) -> Result<DatabaseId> {
        let source = tracestore_database::open(path, kind)?;
        Ok(self.register_source(source))
    }

    /// Open a profiling database
    ///
    /// Returns `None` when the file is missing, unreadable or of an
    /// unsupported format.
    pub fn open_database(&self, path: impl AsRef<Path>, kind: DatabaseKind) -> Option<DatabaseId> {
        let path = path.as_ref();
        self.try_open_database(path, kind)
            .map_err(|e| debug!(path = %path.display(), error = %e, "open_database failed"))
            .ok()
    }

    /// Attach an already constructed source
    pub fn register_source(&self, source: Arc<dyn EventSource>) -> DatabaseId {
        let id = DatabaseId::new(self.next_database.fetch_add(1, Ordering::Relaxed));
        let attached = Attached {
            connector: DatabaseConnector::new(id, source, self.config.clone()),
            pending: Mutex::new(ReadRequestBuilder::default()),
        };
        info!(database = %id, source = attached.connector.name(), "database attached");
        self.databases.write().insert(id, Arc::new(attached));
        id
    }

    pub(crate) fn try_close_database(&self, db: DatabaseId) -> Result<()> {
        self.databases
            .write()
            .remove(&db)
            .map(|_| info!(database = %db, "database closed"))
            .ok_or_else(|| Error::NotFound(db.to_string()))
    }

    /// Close a connector
    ///
    /// Async reads already running keep their own reference to the source.
    pub fn close_database(&self, db: DatabaseId) -> ResultCode {
        code_of("close_database", self.try_close_database(db))
    }

    // ------------------------------------------------------------------
    // Traces
    // ------------------------------------------------------------------

    /// Construct an empty trace
    pub fn create_trace(&self) -> TraceId {
        let id = TraceId::new(self.next_trace.fetch_add(1, Ordering::Relaxed));
        self.traces.write().insert(id, Arc::new(Trace::new(id)));
        debug!(trace = %id, "trace created");
        id
    }

    pub(crate) fn try_delete_trace(&self, trace: TraceId) -> Result<()> {
        let removed = self
            .traces
            .write()
            .remove(&trace)
            .ok_or_else(|| Error::NotFound(trace.to_string()))?;
        let evicted = removed.delete_all_chunks();
        info!(%trace, evicted, "trace deleted");
        Ok(())
    }

    /// Destroy a trace and release its tracks and chunks
    pub fn delete_trace(&self, trace: TraceId) -> ResultCode {
        code_of("delete_trace", self.try_delete_trace(trace))
    }

    pub(crate) fn try_bind_trace(&self, db: DatabaseId, trace: TraceId) -> Result<()> {
        let attached = self.attached(db)?;
        let trace = self.trace(trace)?;
        attached.connector.bind_trace(&trace)
    }

    /// Bind `trace` to the connector `db`
    ///
    /// `ResourceBusy` when either side is already bound elsewhere.
    pub fn bind_trace(&self, db: DatabaseId, trace: TraceId) -> ResultCode {
        code_of("bind_trace", self.try_bind_trace(db, trace))
    }

    // ------------------------------------------------------------------
    // Metadata and reads
    // ------------------------------------------------------------------

    pub(crate) fn try_read_properties(
        &self,
        db: DatabaseId,
        callback: Option<&ProgressCallback>,
    ) -> Result<()> {
        self.attached(db)?.connector.read_properties(callback)
    }

    /// Load metadata into the bound trace on the caller's thread
    pub fn read_properties(&self, db: DatabaseId, callback: Option<&ProgressCallback>) -> bool {
        code_of("read_properties", self.try_read_properties(db, callback)).is_success()
    }

    pub(crate) fn try_read_metadata_async(&self, db: DatabaseId, future: FutureId) -> Result<()> {
        let attached = self.attached(db)?;
        let future = self.future(future)?;
        attached.connector.read_metadata_async(&future)
    }

    /// Schedule a metadata load on `future`
    pub fn read_metadata_async(&self, db: DatabaseId, future: FutureId) -> ResultCode {
        code_of("read_metadata_async", self.try_read_metadata_async(db, future))
    }

    pub(crate) fn try_read_slice_async(
        &self,
        db: DatabaseId,
        request: ReadRequest,
        future: FutureId,
    ) -> Result<()> {
        let attached = self.attached(db)?;
        let future = self.future(future)?;
        attached.connector.read_slice_async(request, &future)
    }

    /// Schedule a read of `[start, end)` over `tracks` on `future`
    pub fn read_slice_async(
        &self,
        db: DatabaseId,
        start: Timestamp,
        end: Timestamp,
        tracks: &[TrackId],
        future: FutureId,
    ) -> ResultCode {
        let result = ReadRequest::new(TimeWindow::new(start, end), tracks.iter().copied())
            .and_then(|request| self.try_read_slice_async(db, request, future));
        code_of("read_slice_async", result)
    }

    pub(crate) fn try_read_request(
        &self,
        db: DatabaseId,
        request: &ReadRequest,
        mode: ReadMode,
        callback: Option<&ProgressCallback>,
    ) -> Result<ReadSummary> {
        let attached = self.attached(db)?;
        match mode {
            ReadMode::AllTracks => attached.connector.read_chunk_all_tracks(request, callback),
            ReadMode::TrackByTrack => {
                attached.connector.read_chunk_track_by_track(request, callback)
            }
        }
    }

    pub(crate) fn try_configure_read_window(
        &self,
        db: DatabaseId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<()> {
        let attached = self.attached(db)?;
        let mut pending = attached.pending.lock();
        *pending = std::mem::take(&mut *pending).window(start, end);
        Ok(())
    }

    /// Set the window of the pending legacy read
    pub fn configure_read_window(
        &self,
        db: DatabaseId,
        start: Timestamp,
        end: Timestamp,
    ) -> ResultCode {
        code_of(
            "configure_read_window",
            self.try_configure_read_window(db, start, end),
        )
    }

    pub(crate) fn try_add_track(&self, db: DatabaseId, track: TrackId) -> Result<()> {
        let attached = self.attached(db)?;
        let mut pending = attached.pending.lock();
        *pending = std::mem::take(&mut *pending).track(track);
        Ok(())
    }

    /// Add a track to the pending legacy read
    pub fn add_track(&self, db: DatabaseId, track: TrackId) -> ResultCode {
        code_of("add_track", self.try_add_track(db, track))
    }

    pub(crate) fn try_read_pending(
        &self,
        db: DatabaseId,
        mode: ReadMode,
        callback: Option<&ProgressCallback>,
    ) -> Result<ReadSummary> {
        let request = self.attached(db)?.take_pending()?;
        self.try_read_request(db, &request, mode, callback)
    }

    /// Read the pending request with one batched query
    ///
    /// The pending window and tracks are cleared whether or not the read
    /// succeeds.
    pub fn read_chunk_all_tracks(
        &self,
        db: DatabaseId,
        callback: Option<&ProgressCallback>,
    ) -> ResultCode {
        code_of(
            "read_chunk_all_tracks",
            self.try_read_pending(db, ReadMode::AllTracks, callback).map(|_| ()),
        )
    }

    /// Read the pending request one track at a time
    pub fn read_chunk_track_by_track(
        &self,
        db: DatabaseId,
        callback: Option<&ProgressCallback>,
    ) -> ResultCode {
        code_of(
            "read_chunk_track_by_track",
            self.try_read_pending(db, ReadMode::TrackByTrack, callback).map(|_| ()),
        )
    }

    // ------------------------------------------------------------------
    // Event properties
    // ------------------------------------------------------------------

    pub(crate) fn try_read_event_property_async(
        &self,
        db: DatabaseId,
        kind: EventPropertyKind,
        event: EventId,
        future: FutureId,
    ) -> Result<()> {
        let attached = self.attached(db)?;
        let future = self.future(future)?;
        attached
            .connector
            .read_event_property_async(kind, event, &future)
    }

    /// Schedule a read of one event's detail on `future`
    ///
    /// `kind` is a raw [`EventPropertyKind`] and `event_id` a packed
    /// [`EventId`]; unknown values are `InvalidParameter`.
    pub fn read_event_property_async(
        &self,
        db: DatabaseId,
        kind: u32,
        event_id: u64,
        future: FutureId,
    ) -> ResultCode {
        let result = parse_event_property(kind, event_id).and_then(|(kind, event)| {
            self.try_read_event_property_async(db, kind, event, future)
        });
        code_of("read_event_property_async", result)
    }

    pub(crate) fn try_delete_event_property(
        &self,
        trace: TraceId,
        kind: EventPropertyKind,
        event: EventId,
    ) -> Result<bool> {
        Ok(self.trace(trace)?.delete_event_property(kind, event))
    }

    /// Evict one event's detail; evicting nothing still succeeds
    pub fn delete_event_property_for(
        &self,
        trace: TraceId,
        kind: u32,
        event_id: u64,
    ) -> ResultCode {
        let result = parse_event_property(kind, event_id)
            .and_then(|(kind, event)| self.try_delete_event_property(trace, kind, event))
            .map(|_| ());
        code_of("delete_event_property_for", result)
    }

    /// Evict every event's detail of `kind`
    pub fn delete_all_event_properties_for(&self, trace: TraceId, kind: u32) -> ResultCode {
        let result = EventPropertyKind::from_u32(kind)
            .ok_or_else(|| Error::InvalidParameter(format!("unknown event property {}", kind)))
            .and_then(|kind| Ok(self.trace(trace)?.delete_all_event_properties(kind)))
            .map(|_| ());
        code_of("delete_all_event_properties_for", result)
    }

    /// Footprint of the trace bound to `db`, zero when unbound or unknown
    pub fn memory_footprint(&self, db: DatabaseId) -> u64 {
        self.attached(db)
            .map_or(0, |a| a.connector.memory_footprint() as u64)
    }

    // ------------------------------------------------------------------
    // Futures
    // ------------------------------------------------------------------

    /// Allocate an idle future
    pub fn future_alloc(&self, callback: Option<ProgressCallback>) -> FutureId {
        let id = FutureId::new(self.next_future.fetch_add(1, Ordering::Relaxed));
        self.futures
            .write()
            .insert(id, Arc::new(Future::new(id, callback)));
        id
    }

    pub(crate) fn try_future_wait(&self, future: FutureId, timeout: Option<Duration>) -> Result<()> {
        self.future(future)?.wait(timeout)
    }

    /// Wait up to `timeout_secs` for the operation on `future`
    ///
    /// `u64::MAX` waits without bound and `0` polls. A timeout leaves the
    /// operation running; wait again to collect it.
    pub fn future_wait(&self, future: FutureId, timeout_secs: u64) -> ResultCode {
        let timeout = (timeout_secs != u64::MAX).then(|| Duration::from_secs(timeout_secs));
        code_of("future_wait", self.try_future_wait(future, timeout))
    }

    /// State of `future`, `None` once freed
    pub fn future_state(&self, future: FutureId) -> Option<FutureState> {
        self.future(future).ok().map(|f| f.state())
    }

    /// Ask the operation on `future` to stop at its next checkpoint
    pub fn future_interrupt(&self, future: FutureId) -> bool {
        self.future(future).map_or(false, |f| f.interrupt())
    }

    pub(crate) fn try_future_free(&self, future: FutureId) -> Result<()> {
        let mut futures = self.futures.write();
        let target = futures
            .get(&future)
            .ok_or_else(|| Error::NotFound(future.to_string()))?;
        target.ensure_idle()?;
        futures.remove(&future);
        Ok(())
    }

    /// Release a future
    ///
    /// `ResourceBusy` while its operation is still running.
    pub fn future_free(&self, future: FutureId) -> ResultCode {
        code_of("future_free", self.try_future_free(future))
    }

    // ------------------------------------------------------------------
    // Chunk store
    // ------------------------------------------------------------------

    pub(crate) fn try_delete_chunks_at(&self, trace: TraceId, time: Timestamp) -> Result<usize> {
        Ok(self.trace(trace)?.delete_chunks_at(time))
    }

    /// Evict every chunk starting at `time`; evicting nothing still succeeds
    pub fn delete_chunks_at(&self, trace: TraceId, time: Timestamp) -> ResultCode {
        code_of(
            "delete_chunks_at",
            self.try_delete_chunks_at(trace, time).map(|_| ()),
        )
    }

    /// Evict every chunk whose window is exactly `[start, end)`
    pub fn delete_time_slice(&self, trace: TraceId, start: Timestamp, end: Timestamp) -> ResultCode {
        let result = self
            .trace(trace)
            .map(|t| t.delete_time_slice(TimeWindow::new(start, end)))
            .map(|_| ());
        code_of("delete_time_slice", result)
    }

    /// Evict every chunk of `trace`
    pub fn delete_all_time_slices(&self, trace: TraceId) -> ResultCode {
        let result = self.trace(trace).map(|t| t.delete_all_chunks()).map(|_| ());
        code_of("delete_all_time_slices", result)
    }

    /// Track at `index`
    pub fn get_track_at(&self, trace: TraceId, index: usize) -> Option<TrackHandle> {
        let track = self.trace(trace).ok()?.track_at(index)?;
        Some(TrackHandle {
            trace,
            track: track.id(),
        })
    }

    /// Main process name of a track
    pub fn get_track_group_name(&self, handle: TrackHandle) -> Option<String> {
        let (_, track) = self.track(handle).ok()?;
        Some(track.group_name().to_string())
    }

    /// Sub-process name of a track
    pub fn get_track_name(&self, handle: TrackHandle) -> Option<String> {
        let (_, track) = self.track(handle).ok()?;
        Some(track.name().to_string())
    }

    /// Most recently materialized chunk of a track, if still resident
    pub fn get_chunk(&self, handle: TrackHandle) -> Option<SliceHandle> {
        let (_, track) = self.track(handle).ok()?;
        let chunk = track.last_chunk()?;
        Some(SliceHandle {
            trace: handle.trace,
            track: handle.track,
            start: chunk.start_time(),
        })
    }

    /// Chunk footprint in bytes, `0` for a stale handle
    pub fn get_chunk_memory_footprint(&self, slice: SliceHandle) -> u64 {
        self.slice(slice)
            .map_or(0, |(_, chunk)| chunk.memory_footprint() as u64)
    }

    /// Chunk record count, `0` for a stale handle
    pub fn get_chunk_record_count(&self, slice: SliceHandle) -> u64 {
        self.slice(slice)
            .map_or(0, |(_, chunk)| chunk.record_count() as u64)
    }

    /// Sum the last acquired chunks of `tracks`
    pub fn aggregate_chunks(&self, trace: TraceId, tracks: &[TrackId]) -> Option<ChunkTotals> {
        let trace = self.trace(trace).ok()?;
        Some(aggregate_chunks(&trace, tracks))
    }

    // ------------------------------------------------------------------
    // Planner
    // ------------------------------------------------------------------

    pub(crate) fn try_planner(&self, trace: TraceId) -> Result<PartitionPlanner> {
        let trace = self.trace(trace)?;
        Ok(PartitionPlanner::for_trace(&trace)?.with_min_span(self.config.min_partition_span))
    }

    /// Planner over a loaded trace, using the session's granularity guard
    pub fn planner(&self, trace: TraceId) -> Option<PartitionPlanner> {
        self.try_planner(trace).ok()
    }

    /// Accepted cells of a `columns × rows` grid; empty when rejected
    pub fn plan(&self, trace: TraceId, columns: u32, rows: u32) -> Vec<Cell> {
        self.planner(trace)
            .map(|p| p.plan(GridShape::new(columns, rows)))
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Typed property lookup
    ///
    /// `None` when the key does not apply to the handle's kind, the index is
    /// out of range or the entity no longer exists.
    pub fn property(&self, handle: Handle, key: PropertyKey, index: u64) -> Option<PropertyValue> {
        match (handle, key) {
            (Handle::Trace(id), PropertyKey::Trace(key)) => {
                trace_property(self.trace(id).ok()?.as_ref(), key, index)
            }
            (Handle::Track(h), PropertyKey::Track(key)) => {
                let (trace, track) = self.track(h).ok()?;
                track_property(&trace, &track, key, index)
            }
            (Handle::Slice(h), PropertyKey::Slice(key)) => {
                let (trace, chunk) = self.slice(h).ok()?;
                slice_property(&trace, &chunk, key, index)
            }
            (Handle::EventProperty(h), PropertyKey::FlowTrace(key)) => {
                flow_trace_property(&*self.event_property(h).ok()?, key, index)
            }
            (Handle::EventProperty(h), PropertyKey::StackTrace(key)) => {
                stack_trace_property(&*self.event_property(h).ok()?, key, index)
            }
            (Handle::EventProperty(h), PropertyKey::ExtData(key)) => {
                ext_data_property(&*self.event_property(h).ok()?, key, index)
            }
            _ => None,
        }
    }

    fn raw_property(&self, handle: Handle, key: u32, index: u64) -> Option<PropertyValue> {
        let kind = match handle {
            Handle::Trace(_) => EntityKind::Trace,
            Handle::Track(_) => EntityKind::Track,
            Handle::Slice(_) => EntityKind::Slice,
            Handle::EventProperty(h) => EntityKind::of_event_property(h.kind),
            Handle::Database(_) | Handle::Future(_) => return None,
        };
        self.property(handle, PropertyKey::resolve(kind, key)?, index)
    }

    /// Unsigned property, `0` when absent
    pub fn get_property_as_uint64(&self, handle: Handle, key: u32, index: u64) -> u64 {
        self.raw_property(handle, key, index)
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }

    /// Signed property, `0` when absent
    pub fn get_property_as_int64(&self, handle: Handle, key: u32, index: u64) -> i64 {
        self.raw_property(handle, key, index)
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
    }

    /// Floating point property, `0.0` when absent
    pub fn get_property_as_double(&self, handle: Handle, key: u32, index: u64) -> f64 {
        self.raw_property(handle, key, index)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    /// String property, `None` when absent
    pub fn get_property_as_charptr(&self, handle: Handle, key: u32, index: u64) -> Option<String> {
        match self.raw_property(handle, key, index)? {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Handle property, `None` when absent
    pub fn get_property_as_handle(&self, handle: Handle, key: u32, index: u64) -> Option<Handle> {
        self.raw_property(handle, key, index)?.as_handle()
    }
}

fn parse_event_property(kind: u32, event_id: u64) -> Result<(EventPropertyKind, EventId)> {
    let kind = EventPropertyKind::from_u32(kind)
        .ok_or_else(|| Error::InvalidParameter(format!("unknown event property {}", kind)))?;
    let event = EventId::unpack(event_id)
        .ok_or_else(|| Error::InvalidParameter(format!("malformed event id {:#x}", event_id)))?;
    Ok((kind, event))
}

fn code_of(call: &'static str, result: Result<()>) -> ResultCode {
    match result {
        Ok(()) => ResultCode::Success,
        Err(e) => {
            let code = e.code();
            debug!(call, code = code.name(), error = %e, "call failed");
            code
        }
    }
}
