//! Database connector
//!
//! Binds one [`EventSource`] to one [`Trace`] and moves rows from the
//! former into chunks of the latter. Every read exists in two forms:
//! - synchronous: runs on the caller's thread and invokes the progress
//!   callback inline
//! - asynchronous: runs on a [`Future`]'s worker thread; progress is posted
//!   to the future and delivered by whoever waits on it
//!
//! Both forms share one implementation through [`ReadContext`].
//!
//! Per-event detail (flow traces, stack traces, extended data) is read
//! asynchronously only, one event at a time, and requires loaded metadata.
//!
//! # Binding
//!
//! A connector holds a weak reference to its trace. Deleting the trace ends
//! the binding; a connector may then be bound to a new trace. While the
//! trace is alive, binding a different one is rejected. Async workers hold a
//! strong reference for the duration of their read.

use crate::config::StoreConfig;
use crate::future::{Future, FutureTask};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracestore_core::{
    DatabaseId, Error, EventId, EventPropertyKind, EventSource, ProgressCallback, ProgressMeter,
    ReadRequest, Result, TrackInfo,
};
use tracestore_storage::{EventProperty, Trace};
use tracing::{debug, info, warn};

/// Progress sink and cancellation point for a running read
pub trait ReadContext {
    /// Advance by `step` percent with a message
    fn report(&mut self, step: f64, message: &str);

    /// Fail if the read should stop
    fn checkpoint(&self) -> Result<()> {
        Ok(())
    }
}

impl ReadContext for FutureTask {
    fn report(&mut self, step: f64, message: &str) {
        FutureTask::report(self, step, message);
    }

    fn checkpoint(&self) -> Result<()> {
        FutureTask::checkpoint(self)
    }
}

/// Inline progress for synchronous reads
pub struct InlineProgress<'a> {
    meter: ProgressMeter,
    callback: Option<&'a ProgressCallback>,
}

impl<'a> InlineProgress<'a> {
    /// Report under `source` to an optional callback
    pub fn new(source: &str, callback: Option<&'a ProgressCallback>) -> Self {
        Self {
            meter: ProgressMeter::new(source),
            callback,
        }
    }

    /// Deliver the final event for `result`
    pub fn finish<T>(mut self, result: &Result<T>, message: impl FnOnce(&T) -> String) {
        let event = match result {
            Ok(value) => self.meter.finish(true, message(value)),
            Err(e) => self.meter.finish(false, e.to_string()),
        };
        if let Some(callback) = self.callback {
            event.deliver(callback);
        }
    }
}

impl ReadContext for InlineProgress<'_> {
    fn report(&mut self, step: f64, message: &str) {
        let event = self.meter.step(step, message);
        if let Some(callback) = self.callback {
            event.deliver(callback);
        }
    }
}

/// How a multi-track read queries the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// One query for every requested track
    AllTracks,
    /// One query per track, progress after each
    TrackByTrack,
}

/// What a read materialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    /// Chunks inserted
    pub chunks: usize,
    /// Records across those chunks
    pub records: usize,
    /// Bytes across those chunks
    pub memory_footprint: usize,
}

/// Connector between one backing store and one trace
pub struct DatabaseConnector {
    id: DatabaseId,
    source: Arc<dyn EventSource>,
    config: StoreConfig,
    trace: Mutex<Weak<Trace>>,
}

impl DatabaseConnector {
    /// Wrap an opened source
    pub fn new(id: DatabaseId, source: Arc<dyn EventSource>, config: StoreConfig) -> Self {
        Self {
            id,
            source,
            config,
            trace: Mutex::new(Weak::new()),
        }
    }

    /// Arena id
    pub fn id(&self) -> DatabaseId {
        self.id
    }

    /// Source name used in progress messages
    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Bind `trace` to this connector
    ///
    /// Rebinding the same pair succeeds. A trace bound elsewhere, or a
    /// connector already holding a live trace, is rejected.
    pub fn bind_trace(&self, trace: &Arc<Trace>) -> Result<()> {
        let mut bound = self.trace.lock();
        if let Some(current) = bound.upgrade() {
            if !Arc::ptr_eq(&current, trace) {
                warn!(
                    database = %self.id,
                    current = %current.id(),
                    rejected = %trace.id(),
                    "connector already bound"
                );
                return Err(Error::AlreadyBound(format!(
                    "{} already serves {}",
                    self.id,
                    current.id()
                )));
            }
        }
        trace.bind(self.id)?;
        *bound = Arc::downgrade(trace);
        info!(database = %self.id, trace = %trace.id(), "trace bound");
        Ok(())
    }

    /// The bound trace, if it is still alive
    pub fn bound_trace(&self) -> Option<Arc<Trace>> {
        self.trace.lock().upgrade()
    }

    fn require_trace(&self) -> Result<Arc<Trace>> {
        self.bound_trace()
            .ok_or_else(|| Error::NotFound(format!("{} has no bound trace", self.id)))
    }

    /// Read metadata on the caller's thread
    pub fn read_properties(&self, callback: Option<&ProgressCallback>) -> Result<()> {
        let trace = self.require_trace()?;
        let mut ctx = InlineProgress::new(self.source.name(), callback);
        let result = load_metadata(self.source.as_ref(), &trace, &mut ctx);
        ctx.finish(&result, String::clone);
        result.map(|_| ())
    }

    /// Schedule a metadata read on `future`
    pub fn read_metadata_async(&self, future: &Future) -> Result<()> {
        let trace = self.require_trace()?;
        let source = Arc::clone(&self.source);
        future.schedule("read metadata", self.source.name(), &self.config, move |task| {
            load_metadata(source.as_ref(), &trace, task)
        })
    }

    /// Read `request` on the caller's thread with one batched query
    pub fn read_chunk_all_tracks(
        &self,
        request: &ReadRequest,
        callback: Option<&ProgressCallback>,
    ) -> Result<ReadSummary> {
        self.read_inline(request, ReadMode::AllTracks, callback)
    }

    /// Read `request` on the caller's thread one track at a time
    pub fn read_chunk_track_by_track(
        &self,
        request: &ReadRequest,
        callback: Option<&ProgressCallback>,
    ) -> Result<ReadSummary> {
        self.read_inline(request, ReadMode::TrackByTrack, callback)
    }

    fn read_inline(
        &self,
        request: &ReadRequest,
        mode: ReadMode,
        callback: Option<&ProgressCallback>,
    ) -> Result<ReadSummary> {
        let trace = self.require_trace()?;
        let mut ctx = InlineProgress::new(self.source.name(), callback);
        let result = read_slice(self.source.as_ref(), &trace, request, mode, &mut ctx);
        ctx.finish(&result, completion_message);
        result
    }

    /// Schedule a track-by-track read of `request` on `future`
    pub fn read_slice_async(&self, request: ReadRequest, future: &Future) -> Result<()> {
        let trace = self.require_trace()?;
        let source = Arc::clone(&self.source);
        future.schedule("read slice", self.source.name(), &self.config, move |task| {
            read_slice(source.as_ref(), &trace, &request, ReadMode::TrackByTrack, task)
                .map(|summary| completion_message(&summary))
        })
    }

    /// Schedule a read of `event`'s `kind` detail on `future`
    ///
    /// Detail that is already resident is not read again.
    pub fn read_event_property_async(
        &self,
        kind: EventPropertyKind,
        event: EventId,
        future: &Future,
    ) -> Result<()> {
        let trace = self.require_trace()?;
        let source = Arc::clone(&self.source);
        future.schedule("read event property", self.source.name(), &self.config, move |task| {
            load_event_property(source.as_ref(), &trace, kind, event, task)
        })
    }

    /// Footprint of the bound trace (zero when unbound)
    pub fn memory_footprint(&self) -> usize {
        self.bound_trace().map_or(0, |t| t.memory_footprint())
    }
}

fn completion_message(summary: &ReadSummary) -> String {
    format!(
        "{} chunks loaded, {} records",
        summary.chunks, summary.records
    )
}

/// Load metadata from `source` into `trace`
pub fn load_metadata(
    source: &dyn EventSource,
    trace: &Trace,
    ctx: &mut dyn ReadContext,
) -> Result<String> {
    ctx.checkpoint()?;
    let metadata = source
        .read_metadata(&mut |step, message| ctx.report(step, message))
        .map_err(|e| {
            warn!(source = source.name(), error = %e, "metadata read failed");
            e
        })?;
    let tracks = metadata.tracks.len();
    trace.load_metadata(metadata);
    info!(source = source.name(), trace = %trace.id(), tracks, "metadata read");
    Ok("Trace metadata successfully loaded".to_string())
}

/// Load one event's `kind` detail from `source` into `trace`
///
/// The kind must apply to the event's operation. Flow endpoints are resolved
/// against the trace's tracks; endpoints on unknown tracks are skipped.
pub fn load_event_property(
    source: &dyn EventSource,
    trace: &Trace,
    kind: EventPropertyKind,
    event: EventId,
    ctx: &mut dyn ReadContext,
) -> Result<String> {
    ctx.checkpoint()?;
    if !trace.is_loaded() {
        return Err(Error::NotLoaded(format!(
            "{} has no metadata, cannot read {} of {}",
            trace.id(),
            kind,
            event
        )));
    }
    if !kind.applies_to(event.operation) {
        return Err(Error::InvalidParameter(format!(
            "{} is not available for {}",
            kind, event
        )));
    }
    if let Some(resident) = trace.event_property(kind, event) {
        debug!(
            trace = %trace.id(),
            %kind,
            %event,
            entries = resident.len(),
            "event property already resident"
        );
        return Ok(format!("{} already loaded", kind));
    }
    let raw = source.read_event_property(kind, event).map_err(|e| {
        warn!(
            source = source.name(),
            %kind,
            %event,
            error = %e,
            "event property read failed"
        );
        e
    })?;
    if raw.kind() != kind {
        return Err(Error::Internal(format!(
            "source answered {} with {}",
            kind,
            raw.kind()
        )));
    }
    let property = EventProperty::resolve(raw, |endpoint| {
        trace.find_track(endpoint.category, &endpoint.process, &endpoint.subprocess)
    });
    let entries = property.len();
    trace.insert_event_property(event, property);
    ctx.report(100.0, &format!("{} entries", entries));
    info!(
        source = source.name(),
        trace = %trace.id(),
        %kind,
        %event,
        entries,
        "event property read"
    );
    Ok(format!("{} successfully loaded", kind))
}

/// Materialize `request` from `source` into `trace`
pub fn read_slice(
    source: &dyn EventSource,
    trace: &Trace,
    request: &ReadRequest,
    mode: ReadMode,
    ctx: &mut dyn ReadContext,
) -> Result<ReadSummary> {
    let tracks = trace.resolve_tracks(request.tracks())?;
    let window = request.window();
    let mut summary = ReadSummary::default();
    let mut record = |chunk: &tracestore_storage::Chunk| {
        summary.chunks += 1;
        summary.records += chunk.record_count();
        summary.memory_footprint += chunk.memory_footprint();
    };

    match mode {
        ReadMode::AllTracks => {
            ctx.checkpoint()?;
            let mut ordered: Vec<&Arc<tracestore_storage::Track>> = tracks.iter().collect();
            ordered.sort_by_key(|t| t.id());
            let _guards: Vec<_> = ordered.iter().map(|t| t.lock_for_load()).collect();
            let infos: Vec<&TrackInfo> = tracks.iter().map(|t| t.info()).collect();
            let rows = source.read_tracks(&infos, window).map_err(|e| {
                warn!(source = source.name(), %window, error = %e, "batched read failed");
                e
            })?;
            if rows.len() != tracks.len() {
                return Err(Error::Internal(format!(
                    "source returned {} row sets for {} tracks",
                    rows.len(),
                    tracks.len()
                )));
            }
            for (track, rows) in tracks.iter().zip(rows) {
                record(&trace.materialize(track, window, rows));
            }
            ctx.report(100.0, &format!("{} tracks loaded", tracks.len()));
        }
        ReadMode::TrackByTrack => {
            let step = 100.0 / tracks.len() as f64;
            for track in &tracks {
                ctx.checkpoint()?;
                let _guard = track.lock_for_load();
                let rows = source.read_track(track.info(), window).map_err(|e| {
                    warn!(
                        source = source.name(),
                        track = %track.id(),
                        %window,
                        error = %e,
                        "track read failed"
                    );
                    e
                })?;
                record(&trace.materialize(track, window, rows));
                ctx.report(step, &format!("{} loaded", track.id()));
            }
        }
    }
    Ok(summary)
}
