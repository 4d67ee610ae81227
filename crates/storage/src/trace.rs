//! Trace: root of one profiling session
//!
//! A trace starts empty. Loading metadata fixes its time bounds and builds
//! one [`Track`] per descriptor, in descriptor order, so a track's id is its
//! index. The layout is set exactly once; the trace never grows or shrinks
//! tracks afterwards.
//!
//! Binding to a database connector is also one-shot: the first connector
//! that binds owns the trace, the same connector may bind again, and any
//! other connector is rejected.
//!
//! Besides chunks a trace keeps per-event detail (flow traces, stack traces,
//! extended data) keyed by kind and event id. These are loaded and evicted
//! one event at a time, independently of chunks.
//!
//! The string table is append-only and lives as long as the trace. Evicting
//! chunks releases chunk memory only; the interned vocabulary stays, so a
//! re-read of the same window interns nothing new.

use crate::chunk::Chunk;
use crate::event_property::EventProperty;
use crate::strings::StringTable;
use crate::track::Track;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracestore_core::{
    DatabaseId, Error, EventId, EventPropertyKind, RawRecord, Result, TimeWindow, Timestamp,
    TraceId, TraceMetadata, TrackCategory, TrackId,
};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct Layout {
    window: TimeWindow,
    tracks: Vec<Arc<Track>>,
}

/// Root handle over one session's tracks and global bounds
#[derive(Debug)]
pub struct Trace {
    id: TraceId,
    layout: OnceCell<Layout>,
    strings: RwLock<StringTable>,
    event_properties: RwLock<FxHashMap<(EventPropertyKind, EventId), Arc<EventProperty>>>,
    binding: OnceCell<DatabaseId>,
}

impl Trace {
    /// Create an empty, unbound trace
    pub fn new(id: TraceId) -> Self {
        Self {
            id,
            layout: OnceCell::new(),
            strings: RwLock::new(StringTable::new()),
            event_properties: RwLock::new(FxHashMap::default()),
            binding: OnceCell::new(),
        }
    }

    /// Arena id
    pub fn id(&self) -> TraceId {
        self.id
    }

    /// Install metadata
    ///
    /// Returns `false` when metadata was already loaded; the earlier layout
    /// is kept.
    pub fn load_metadata(&self, metadata: TraceMetadata) -> bool {
        let window = metadata.window();
        let count = metadata.tracks.len();
        let mut fresh = false;
        self.layout.get_or_init(|| {
            fresh = true;
            let tracks = metadata
                .tracks
                .into_iter()
                .enumerate()
                .map(|(i, info)| Arc::new(Track::new(TrackId::new(i as u32), info)))
                .collect();
            Layout { window, tracks }
        });
        if fresh {
            info!(trace = %self.id, %window, tracks = count, "trace metadata loaded");
        } else {
            debug!(trace = %self.id, "metadata already loaded, ignoring reload");
        }
        fresh
    }

    /// True once metadata has been loaded
    pub fn is_loaded(&self) -> bool {
        self.layout.get().is_some()
    }

    fn layout(&self) -> Result<&Layout> {
        self.layout
            .get()
            .ok_or_else(|| Error::NotLoaded(format!("{} has no metadata", self.id)))
    }

    /// Session bounds
    pub fn window(&self) -> Option<TimeWindow> {
        self.layout.get().map(|l| l.window)
    }

    /// Session start
    pub fn start_time(&self) -> Option<Timestamp> {
        self.window().map(|w| w.start)
    }

    /// Session end
    pub fn end_time(&self) -> Option<Timestamp> {
        self.window().map(|w| w.end)
    }

    /// Number of tracks (zero before metadata)
    pub fn track_count(&self) -> usize {
        self.layout.get().map_or(0, |l| l.tracks.len())
    }

    /// Track at `index`
    pub fn track_at(&self, index: usize) -> Option<Arc<Track>> {
        self.layout.get()?.tracks.get(index).cloned()
    }

    /// Track by id
    pub fn track(&self, id: TrackId) -> Option<Arc<Track>> {
        self.track_at(id.index())
    }

    /// Resolve a set of ids, failing on the first unknown one
    pub fn resolve_tracks(&self, ids: &[TrackId]) -> Result<Vec<Arc<Track>>> {
        let layout = self.layout()?;
        ids.iter()
            .map(|id| {
                layout.tracks.get(id.index()).cloned().ok_or_else(|| {
                    Error::InvalidParameter(format!(
                        "{} out of range ({} tracks)",
                        id,
                        layout.tracks.len()
                    ))
                })
            })
            .collect()
    }

    /// All tracks in id order
    pub fn tracks(&self) -> &[Arc<Track>] {
        self.layout.get().map_or(&[], |l| l.tracks.as_slice())
    }

    /// Id of the first track with the given descriptor fields
    pub fn find_track(
        &self,
        category: TrackCategory,
        process: &str,
        subprocess: &str,
    ) -> Option<TrackId> {
        self.tracks()
            .iter()
            .find(|t| t.info().matches(category, process, subprocess))
            .map(|t| t.id())
    }

    /// Build a chunk from raw rows and insert it on `track`
    ///
    /// Callers hold the track's load lock.
    pub fn materialize(
        &self,
        track: &Track,
        window: TimeWindow,
        rows: Vec<RawRecord>,
    ) -> Arc<Chunk> {
        let chunk = {
            let mut strings = self.strings.write();
            Chunk::build(
                track.id(),
                window,
                track.category().is_counter(),
                rows,
                &mut strings,
            )
        };
        track.insert_chunk(chunk)
    }

    /// Evict the chunk starting at `time` from every track holding one
    ///
    /// Returns the number of chunks evicted; a second call with no read in
    /// between evicts nothing.
    pub fn delete_chunks_at(&self, time: Timestamp) -> usize {
        let evicted = self
            .tracks()
            .iter()
            .filter(|track| track.evict_at(time).is_some())
            .count();
        debug!(trace = %self.id, time, evicted, "delete chunks at time");
        evicted
    }

    /// Evict every chunk whose window is exactly `window`
    pub fn delete_time_slice(&self, window: TimeWindow) -> usize {
        let evicted = self
            .tracks()
            .iter()
            .filter(|track| track.evict_window(window).is_some())
            .count();
        debug!(trace = %self.id, %window, evicted, "delete time slice");
        evicted
    }

    /// Evict every chunk of every track
    pub fn delete_all_chunks(&self) -> usize {
        let evicted = self.tracks().iter().map(|track| track.evict_all()).sum();
        debug!(trace = %self.id, evicted, "delete all chunks");
        evicted
    }

    /// Store detail for `event`, replacing any earlier value of that kind
    pub fn insert_event_property(
        &self,
        event: EventId,
        property: EventProperty,
    ) -> Arc<EventProperty> {
        let kind = property.kind();
        let property = Arc::new(property);
        debug!(
            trace = %self.id,
            %kind,
            %event,
            entries = property.len(),
            "event property stored"
        );
        self.event_properties
            .write()
            .insert((kind, event), Arc::clone(&property));
        property
    }

    /// Resident detail of `kind` for `event`
    pub fn event_property(
        &self,
        kind: EventPropertyKind,
        event: EventId,
    ) -> Option<Arc<EventProperty>> {
        self.event_properties.read().get(&(kind, event)).cloned()
    }

    /// Evict one event's detail; `false` when none was resident
    pub fn delete_event_property(&self, kind: EventPropertyKind, event: EventId) -> bool {
        let removed = self.event_properties.write().remove(&(kind, event)).is_some();
        debug!(trace = %self.id, %kind, %event, removed, "delete event property");
        removed
    }

    /// Evict every event's detail of `kind`
    pub fn delete_all_event_properties(&self, kind: EventPropertyKind) -> usize {
        let mut properties = self.event_properties.write();
        let before = properties.len();
        properties.retain(|(k, _), _| *k != kind);
        let evicted = before - properties.len();
        debug!(trace = %self.id, %kind, evicted, "delete all event properties");
        evicted
    }

    /// Bytes held by chunks, event properties and the string table
    ///
    /// The string table part never shrinks; see the module docs.
    pub fn memory_footprint(&self) -> usize {
        let chunks: usize = self.tracks().iter().map(|t| t.memory_footprint()).sum();
        let properties: usize = self
            .event_properties
            .read()
            .values()
            .map(|p| p.memory_footprint())
            .sum();
        chunks + properties + self.strings.read().memory_footprint()
    }

    /// Bind to a connector
    ///
    /// Binding again to the same connector succeeds; any other connector is
    /// rejected with [`Error::AlreadyBound`].
    pub fn bind(&self, database: DatabaseId) -> Result<()> {
        let bound = *self.binding.get_or_init(|| database);
        if bound == database {
            Ok(())
        } else {
            warn!(trace = %self.id, %bound, rejected = %database, "rebind rejected");
            Err(Error::AlreadyBound(format!(
                "{} is bound to {}",
                self.id, bound
            )))
        }
    }

    /// Connector this trace is bound to
    pub fn bound_to(&self) -> Option<DatabaseId> {
        self.binding.get().copied()
    }

    /// Interned string by index
    pub fn string(&self, index: u32) -> Option<Arc<str>> {
        self.strings.read().get(index)
    }
}

/// Footprint and record totals over a set of tracks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkTotals {
    /// Tracks that had a last acquired chunk
    pub chunks: usize,
    /// Sum of chunk footprints
    pub memory_footprint: usize,
    /// Sum of chunk record counts
    pub record_count: usize,
}

/// Sum the last acquired chunk of each listed track
///
/// Keeps no state of its own; unknown ids and tracks without a chunk are
/// skipped.
pub fn aggregate_chunks(trace: &Trace, tracks: &[TrackId]) -> ChunkTotals {
    tracks
        .iter()
        .filter_map(|&id| trace.track(id)?.last_chunk())
        .fold(ChunkTotals::default(), |mut totals, chunk| {
            totals.chunks += 1;
            totals.memory_footprint += chunk.memory_footprint();
            totals.record_count += chunk.record_count();
            totals
        })
}
