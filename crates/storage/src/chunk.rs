//! Chunk: a materialized, time-windowed run of records for one track
//!
//! A chunk owns its records outright and reports its own memory footprint.
//! Footprint is authoritative for memory accounting: every total the store
//! reports is a sum of chunk footprints plus the trace string table.
//!
//! ## Layout
//!
//! Event tracks store [`EventEntry`] rows with interned strings and a
//! precomputed nesting level. Counter tracks store [`CounterEntry`] samples.
//! Rows are sorted by timestamp at build time so lookups can binary search.

use crate::strings::StringTable;
use std::mem::size_of;
use tracestore_core::{EventOperation, RawRecord, TimeWindow, Timestamp, TrackId};

/// Stored event row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventEntry {
    /// Event id in the backing store
    pub id: u64,
    /// Start time
    pub timestamp: Timestamp,
    /// Duration (may be negative in corrupt captures)
    pub duration: i64,
    /// Index of the type name in the trace string table
    pub type_idx: u32,
    /// Index of the symbol in the trace string table
    pub symbol_idx: u32,
    /// Operation class
    pub operation: EventOperation,
    /// Nesting depth among the events of this chunk
    pub level: u8,
}

/// Stored counter sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterEntry {
    /// Sample time
    pub timestamp: Timestamp,
    /// Sampled value
    pub value: f64,
}

/// Rows of a chunk
#[derive(Debug, Clone)]
pub enum ChunkRecords {
    /// Event rows
    Events(Vec<EventEntry>),
    /// Counter samples
    Counters(Vec<CounterEntry>),
}

/// A materialized run of records for one track within one window
#[derive(Debug)]
pub struct Chunk {
    track: TrackId,
    window: TimeWindow,
    records: ChunkRecords,
}

impl Chunk {
    /// Build a chunk from raw rows, interning strings into `strings`
    ///
    /// `counter` selects the counter layout; event rows handed to a counter
    /// chunk (or the reverse) are skipped, since a track has a single layout.
    pub fn build(
        track: TrackId,
        window: TimeWindow,
        counter: bool,
        rows: Vec<RawRecord>,
        strings: &mut StringTable,
    ) -> Self {
        let records = if counter {
            let mut samples: Vec<CounterEntry> = rows
                .into_iter()
                .filter_map(|row| match row {
                    RawRecord::Counter { timestamp, value } => {
                        Some(CounterEntry { timestamp, value })
                    }
                    RawRecord::Event(_) => None,
                })
                .collect();
            samples.sort_by_key(|s| s.timestamp);
            samples.shrink_to_fit();
            ChunkRecords::Counters(samples)
        } else {
            let mut events: Vec<EventEntry> = rows
                .into_iter()
                .filter_map(|row| match row {
                    RawRecord::Event(e) => Some(EventEntry {
                        id: e.id,
                        timestamp: e.timestamp,
                        duration: e.duration,
                        type_idx: strings.intern(&e.type_name),
                        symbol_idx: strings.intern(&e.symbol),
                        operation: e.operation,
                        level: 0,
                    }),
                    RawRecord::Counter { .. } => None,
                })
                .collect();
            events.sort_by_key(|e| e.timestamp);
            assign_levels(&mut events);
            events.shrink_to_fit();
            ChunkRecords::Events(events)
        };
        Self {
            track,
            window,
            records,
        }
    }

    /// Owning track
    pub fn track(&self) -> TrackId {
        self.track
    }

    /// Requested window this chunk covers
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Window start; chunks are indexed by it
    pub fn start_time(&self) -> Timestamp {
        self.window.start
    }

    /// Window end (exclusive)
    pub fn end_time(&self) -> Timestamp {
        self.window.end
    }

    /// Rows
    pub fn records(&self) -> &ChunkRecords {
        &self.records
    }

    /// Number of rows
    pub fn record_count(&self) -> usize {
        match &self.records {
            ChunkRecords::Events(v) => v.len(),
            ChunkRecords::Counters(v) => v.len(),
        }
    }

    /// Bytes owned by this chunk
    pub fn memory_footprint(&self) -> usize {
        let rows = match &self.records {
            ChunkRecords::Events(v) => v.len() * size_of::<EventEntry>(),
            ChunkRecords::Counters(v) => v.len() * size_of::<CounterEntry>(),
        };
        size_of::<Chunk>() + rows
    }

    /// Event row at `index`
    pub fn event(&self, index: usize) -> Option<&EventEntry> {
        match &self.records {
            ChunkRecords::Events(v) => v.get(index),
            ChunkRecords::Counters(_) => None,
        }
    }

    /// Counter sample at `index`
    pub fn counter(&self, index: usize) -> Option<&CounterEntry> {
        match &self.records {
            ChunkRecords::Counters(v) => v.get(index),
            ChunkRecords::Events(_) => None,
        }
    }

    /// Timestamp of the row at `index`
    pub fn timestamp_at(&self, index: usize) -> Option<Timestamp> {
        match &self.records {
            ChunkRecords::Events(v) => v.get(index).map(|e| e.timestamp),
            ChunkRecords::Counters(v) => v.get(index).map(|c| c.timestamp),
        }
    }

    /// Index of the first row at or after `timestamp`
    ///
    /// Returns `None` when every row is earlier.
    pub fn index_of_timestamp(&self, timestamp: Timestamp) -> Option<usize> {
        let idx = match &self.records {
            ChunkRecords::Events(v) => v.partition_point(|e| e.timestamp < timestamp),
            ChunkRecords::Counters(v) => v.partition_point(|c| c.timestamp < timestamp),
        };
        (idx < self.record_count()).then_some(idx)
    }

    /// Earliest row timestamp
    pub fn min_timestamp(&self) -> Option<Timestamp> {
        self.timestamp_at(0)
    }

    /// Latest row timestamp
    pub fn max_timestamp(&self) -> Option<Timestamp> {
        self.record_count()
            .checked_sub(1)
            .and_then(|last| self.timestamp_at(last))
    }

    /// Minimum and maximum of the level (events) or value (counters)
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let values: Box<dyn Iterator<Item = f64> + '_> = match &self.records {
            ChunkRecords::Events(v) => Box::new(v.iter().map(|e| e.level as f64)),
            ChunkRecords::Counters(v) => Box::new(v.iter().map(|c| c.value)),
        };
        values.fold(None, |acc, x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
        })
    }
}

/// Assign nesting levels to time-sorted events
///
/// An event nests inside every earlier event that has not ended by its start.
/// Open events may end in any order, so every ended one is dropped, not only
/// the innermost.
fn assign_levels(events: &mut [EventEntry]) {
    let mut open_ends: Vec<Timestamp> = Vec::new();
    for event in events.iter_mut() {
        open_ends.retain(|&end| end > event.timestamp);
        event.level = open_ends.len().min(u8::MAX as usize) as u8;
        let end = event.timestamp.saturating_add(event.duration.max(0) as u64);
        open_ends.push(end);
    }
}
