//! Track: one timeline and the chunks materialized on it
//!
//! # Locking
//!
//! A track carries two locks:
//! - `chunks`: a `RwLock` over the start-time index. Readers (property
//!   lookups, footprint sums) take it shared; insert and evict take it
//!   exclusive for the duration of a single map update.
//! - `load`: a `Mutex` held by a read for the whole time it populates this
//!   track (query plus materialization), and by every eviction. Eviction
//!   therefore never interleaves with an in-flight population of the same
//!   track, while reads of unrelated tracks proceed in parallel.
//!
//! Lock order when both are needed: `load` first, then `chunks`.

use crate::chunk::Chunk;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracestore_core::{TimeWindow, Timestamp, TrackCategory, TrackId, TrackInfo};
use tracing::debug;

/// One timeline of a trace
#[derive(Debug)]
pub struct Track {
    id: TrackId,
    info: TrackInfo,
    /// Chunks keyed by window start
    chunks: RwLock<BTreeMap<Timestamp, Arc<Chunk>>>,
    /// Start of the chunk most recently materialized here
    last_acquired: Mutex<Option<Timestamp>>,
    /// Serializes population against eviction
    load: Mutex<()>,
}

impl Track {
    /// Create an empty track
    pub fn new(id: TrackId, info: TrackInfo) -> Self {
        Self {
            id,
            info,
            chunks: RwLock::new(BTreeMap::new()),
            last_acquired: Mutex::new(None),
            load: Mutex::new(()),
        }
    }

    /// Stable id (equal to the track's index in its trace)
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Descriptor reported by the backing store
    pub fn info(&self) -> &TrackInfo {
        &self.info
    }

    /// Category
    pub fn category(&self) -> TrackCategory {
        self.info.category
    }

    /// Group name shown for the track (main process)
    pub fn group_name(&self) -> &str {
        &self.info.process
    }

    /// Track name (sub-process)
    pub fn name(&self) -> &str {
        &self.info.subprocess
    }

    /// Acquire the load lock
    ///
    /// Hold the guard across the backing-store query and the call to
    /// [`Track::insert_chunk`].
    pub fn lock_for_load(&self) -> MutexGuard<'_, ()> {
        self.load.lock()
    }

    /// Insert a chunk, replacing any chunk with the same start
    ///
    /// The inserted chunk becomes the track's last acquired chunk. Callers
    /// hold the load lock.
    pub fn insert_chunk(&self, chunk: Chunk) -> Arc<Chunk> {
        let start = chunk.start_time();
        let chunk = Arc::new(chunk);
        let replaced = self.chunks.write().insert(start, Arc::clone(&chunk));
        *self.last_acquired.lock() = Some(start);
        debug!(
            track = %self.id,
            start,
            records = chunk.record_count(),
            replaced = replaced.is_some(),
            "chunk materialized"
        );
        chunk
    }

    /// Chunk covering `time`, if any
    pub fn chunk_at_time(&self, time: Timestamp) -> Option<Arc<Chunk>> {
        let chunks = self.chunks.read();
        chunks
            .range(..=time)
            .next_back()
            .filter(|(_, chunk)| time < chunk.end_time())
            .map(|(_, chunk)| Arc::clone(chunk))
    }

    /// The `index`-th chunk in start-time order
    pub fn chunk_by_index(&self, index: usize) -> Option<Arc<Chunk>> {
        self.chunks.read().values().nth(index).cloned()
    }

    /// Most recently materialized chunk, if it is still resident
    pub fn last_chunk(&self) -> Option<Arc<Chunk>> {
        let start = (*self.last_acquired.lock())?;
        self.chunks.read().get(&start).cloned()
    }

    /// Number of resident chunks
    pub fn chunk_count(&self) -> usize {
        self.chunks.read().len()
    }

    /// Evict the chunk whose window starts exactly at `start`
    pub fn evict_at(&self, start: Timestamp) -> Option<Arc<Chunk>> {
        let _load = self.load.lock();
        let removed = self.chunks.write().remove(&start);
        if removed.is_some() {
            debug!(track = %self.id, start, "chunk evicted");
        }
        removed
    }

    /// Evict the chunk whose window is exactly `window`
    pub fn evict_window(&self, window: TimeWindow) -> Option<Arc<Chunk>> {
        let _load = self.load.lock();
        let mut chunks = self.chunks.write();
        let matches = chunks
            .get(&window.start)
            .map_or(false, |chunk| chunk.window() == window);
        let removed = if matches {
            chunks.remove(&window.start)
        } else {
            None
        };
        if removed.is_some() {
            debug!(track = %self.id, %window, "chunk evicted");
        }
        removed
    }

    /// Evict every chunk, returning how many were resident
    pub fn evict_all(&self) -> usize {
        let _load = self.load.lock();
        let mut chunks = self.chunks.write();
        let count = chunks.len();
        chunks.clear();
        *self.last_acquired.lock() = None;
        count
    }

    /// Bytes held by resident chunks
    pub fn memory_footprint(&self) -> usize {
        self.chunks
            .read()
            .values()
            .map(|chunk| chunk.memory_footprint())
            .sum()
    }

    /// Records across resident chunks
    pub fn record_count(&self) -> usize {
        self.chunks
            .read()
            .values()
            .map(|chunk| chunk.record_count())
            .sum()
    }

    /// Earliest record timestamp across resident chunks
    pub fn min_timestamp(&self) -> Option<Timestamp> {
        self.chunks
            .read()
            .values()
            .filter_map(|chunk| chunk.min_timestamp())
            .min()
    }

    /// Latest record timestamp across resident chunks
    pub fn max_timestamp(&self) -> Option<Timestamp> {
        self.chunks
            .read()
            .values()
            .filter_map(|chunk| chunk.max_timestamp())
            .max()
    }

    /// Level (events) or value (counters) range across resident chunks
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.chunks
            .read()
            .values()
            .filter_map(|chunk| chunk.value_range())
            .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)))
    }
}
