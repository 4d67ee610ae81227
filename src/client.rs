//! Checked wrapper over [`Session`].
//!
//! [`TraceClient`] exposes the same operations as the flattened surface but
//! returns [`Result`]s: every non-success code or null handle becomes
//! [`Error::Call`] naming the operation.
//!
//! ```ignore
//! use tracestore::prelude::*;
//!
//! let client = TraceClient::new();
//! let db = client.open("trace.rpd", DatabaseKind::Autodetect)?;
//! let trace = client.create_trace();
//! client.load(db, trace, None)?;
//! for summary in client.read_grid(db, trace, GridShape::new(4, 2), ReadMode::AllTracks, None)? {
//!     println!("{} records", summary.records);
//! }
//! ```

use crate::error::{Error, Result};
use crate::session::Session;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracestore_core::{
    DatabaseId, EventId, EventPropertyHandle, EventPropertyKind, EventSource, FutureId, Handle,
    ProgressCallback, PropertyKey, PropertyValue, ReadRequest, ResultCode, SliceHandle, Timestamp,
    TraceId, TrackHandle,
};
use tracestore_database::DatabaseKind;
use tracestore_engine::{GridShape, PartitionPlanner, ReadMode, ReadSummary, StoreConfig};
use tracing::debug;

/// Typed, checked access to a [`Session`]
#[derive(Default)]
pub struct TraceClient {
    session: Session,
}

impl TraceClient {
    /// Client over a fresh session with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Client over a fresh session with `config`
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            session: Session::with_config(config),
        })
    }

    /// Client over a session configured from a TOML file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(StoreConfig::load(path)?)
    }

    /// The underlying flattened surface
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Open a profiling database
    pub fn open(&self, path: impl AsRef<Path>, kind: DatabaseKind) -> Result<DatabaseId> {
        checked("open_database", self.session.try_open_database(path, kind))
    }

    /// Attach an already constructed source
    pub fn attach(&self, source: Arc<dyn EventSource>) -> DatabaseId {
        self.session.register_source(source)
    }

    /// Close a connector
    pub fn close(&self, db: DatabaseId) -> Result<()> {
        checked("close_database", self.session.try_close_database(db))
    }

    /// Construct an empty trace
    pub fn create_trace(&self) -> TraceId {
        self.session.create_trace()
    }

    /// Destroy a trace
    pub fn delete_trace(&self, trace: TraceId) -> Result<()> {
        checked("delete_trace", self.session.try_delete_trace(trace))
    }

    /// Bind `trace` to `db`
    pub fn bind(&self, db: DatabaseId, trace: TraceId) -> Result<()> {
        checked("bind_trace", self.session.try_bind_trace(db, trace))
    }

    /// Bind `trace` to `db` and load its metadata on this thread
    pub fn load(
        &self,
        db: DatabaseId,
        trace: TraceId,
        callback: Option<&ProgressCallback>,
    ) -> Result<()> {
        self.bind(db, trace)?;
        self.read_properties(db, callback)
    }

    /// Load metadata into the trace bound to `db`
    pub fn read_properties(
        &self,
        db: DatabaseId,
        callback: Option<&ProgressCallback>,
    ) -> Result<()> {
        checked(
            "read_properties",
            self.session.try_read_properties(db, callback),
        )
    }

    /// Materialize `request` on this thread
    pub fn read(
        &self,
        db: DatabaseId,
        request: &ReadRequest,
        mode: ReadMode,
        callback: Option<&ProgressCallback>,
    ) -> Result<ReadSummary> {
        let call = match mode {
            ReadMode::AllTracks => "read_chunk_all_tracks",
            ReadMode::TrackByTrack => "read_chunk_track_by_track",
        };
        checked(call, self.session.try_read_request(db, request, mode, callback))
    }

    /// Planner over a loaded trace
    pub fn planner(&self, trace: TraceId) -> Result<PartitionPlanner> {
        checked("planner", self.session.try_planner(trace))
    }

    /// Read every accepted cell of a grid over `trace`
    ///
    /// Cells are read in row-major order. A grid the planner rejects reads
    /// nothing and returns an empty list.
    pub fn read_grid(
        &self,
        db: DatabaseId,
        trace: TraceId,
        shape: GridShape,
        mode: ReadMode,
        callback: Option<&ProgressCallback>,
    ) -> Result<Vec<ReadSummary>> {
        let cells = self.planner(trace)?.plan(shape);
        cells
            .iter()
            .map(|cell| {
                let request = checked("plan", cell.request())?;
                self.read(db, &request, mode, callback)
            })
            .collect()
    }

    /// Allocate a future
    pub fn future(&self, callback: Option<ProgressCallback>) -> FutureId {
        self.session.future_alloc(callback)
    }

    /// Schedule a metadata load on `future`
    pub fn read_metadata_async(&self, db: DatabaseId, future: FutureId) -> Result<()> {
        checked(
            "read_metadata_async",
            self.session.try_read_metadata_async(db, future),
        )
    }

    /// Schedule a read of `request` on `future`
    pub fn read_slice_async(
        &self,
        db: DatabaseId,
        request: ReadRequest,
        future: FutureId,
    ) -> Result<()> {
        checked(
            "read_slice_async",
            self.session.try_read_slice_async(db, request, future),
        )
    }

    /// Schedule a read of one event's detail on `future`
    pub fn read_event_property_async(
        &self,
        db: DatabaseId,
        kind: EventPropertyKind,
        event: EventId,
        future: FutureId,
    ) -> Result<()> {
        checked(
            "read_event_property_async",
            self.session
                .try_read_event_property_async(db, kind, event, future),
        )
    }

    /// Read one event's detail and wait for it within the default budget
    ///
    /// The returned handle stays valid until the detail is evicted.
    pub fn event_property(
        &self,
        db: DatabaseId,
        trace: TraceId,
        kind: EventPropertyKind,
        event: EventId,
    ) -> Result<EventPropertyHandle> {
        let future = self.future(None);
        let read = self
            .read_event_property_async(db, kind, event, future)
            .and_then(|_| self.wait_default(future));
        self.free(future)?;
        read?;
        Ok(EventPropertyHandle { trace, kind, event })
    }

    /// Evict one event's detail, returning whether any was resident
    pub fn delete_event_property(
        &self,
        trace: TraceId,
        kind: EventPropertyKind,
        event: EventId,
    ) -> Result<bool> {
        checked(
            "delete_event_property",
            self.session.try_delete_event_property(trace, kind, event),
        )
    }

    /// Wait for `future`; `None` waits without bound
    pub fn wait(&self, future: FutureId, timeout: Option<Duration>) -> Result<()> {
        checked("future_wait", self.session.try_future_wait(future, timeout))
    }

    /// Wait for `future` within the configured default budget
    pub fn wait_default(&self, future: FutureId) -> Result<()> {
        let timeout = self.session.config().default_wait_timeout();
        self.wait(future, Some(timeout))
    }

    /// Release `future`
    pub fn free(&self, future: FutureId) -> Result<()> {
        checked("future_free", self.session.try_future_free(future))
    }

    /// Evict the chunks starting at `time`, returning how many were evicted
    pub fn delete_chunks_at(&self, trace: TraceId, time: Timestamp) -> Result<usize> {
        checked(
            "delete_chunks_at",
            self.session.try_delete_chunks_at(trace, time),
        )
    }

    /// Track at `index`
    pub fn track_at(&self, trace: TraceId, index: usize) -> Result<TrackHandle> {
        self.session
            .get_track_at(trace, index)
            .ok_or(Error::Call {
                call: "get_track_at",
                code: ResultCode::InvalidParameter,
            })
    }

    /// Most recently materialized chunk of a track
    pub fn last_chunk(&self, track: TrackHandle) -> Result<SliceHandle> {
        self.session.get_chunk(track).ok_or(Error::Call {
            call: "get_chunk",
            code: ResultCode::NotLoaded,
        })
    }

    /// Property lookup
    pub fn property(
        &self,
        handle: impl Into<Handle>,
        key: impl Into<PropertyKey>,
        index: u64,
    ) -> Result<PropertyValue> {
        self.session
            .property(handle.into(), key.into(), index)
            .ok_or(Error::Call {
                call: "get_property",
                code: ResultCode::InvalidProperty,
            })
    }

    /// Unsigned property
    pub fn property_u64(
        &self,
        handle: impl Into<Handle>,
        key: impl Into<PropertyKey>,
        index: u64,
    ) -> Result<u64> {
        self.property(handle, key, index)?
            .as_u64()
            .ok_or(Error::Call {
                call: "get_property_as_uint64",
                code: ResultCode::InvalidProperty,
            })
    }

    /// String property
    pub fn property_str(
        &self,
        handle: impl Into<Handle>,
        key: impl Into<PropertyKey>,
        index: u64,
    ) -> Result<String> {
        match self.property(handle, key, index)? {
            PropertyValue::Str(s) => Ok(s),
            _ => Err(Error::Call {
                call: "get_property_as_charptr",
                code: ResultCode::InvalidProperty,
            }),
        }
    }
}

fn checked<T>(call: &'static str, result: tracestore_core::Result<T>) -> Result<T> {
    result.map_err(|e| {
        let code = e.code();
        debug!(call, code = code.name(), error = %e, "call failed");
        Error::Call { call, code }
    })
}
