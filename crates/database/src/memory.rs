//! In-memory event source
//!
//! Holds pre-built rows per track, plus optional per-event detail. Useful
//! for tests and for embedding callers that already have their events in
//! memory.
//!
//! ```
//! use tracestore_core::{EventSource, RawRecord, TimeWindow, TrackCategory, TrackInfo};
//! use tracestore_database::MemorySource;
//!
//! let source = MemorySource::builder("gpu-util")
//!     .track(
//!         TrackInfo::new(TrackCategory::Counter, "1", "GPU Utilization"),
//!         vec![RawRecord::Counter { timestamp: 10, value: 0.5 }],
//!     )
//!     .build();
//! let meta = source.read_metadata(&mut |_, _| {}).unwrap();
//! assert_eq!(meta.tracks.len(), 1);
//! ```

use rustc_hash::FxHashMap;
use tracestore_core::{
    Error, EventId, EventPropertyKind, EventSource, RawEventProperty, RawRecord, Result,
    TimeWindow, Timestamp, TraceMetadata, TrackInfo,
};

type PropertyMap = FxHashMap<(EventPropertyKind, EventId), RawEventProperty>;

/// Event source over rows held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    window: TimeWindow,
    tracks: Vec<(TrackInfo, Vec<RawRecord>)>,
    properties: PropertyMap,
}

impl MemorySource {
    /// Start a builder
    pub fn builder(name: impl Into<String>) -> MemorySourceBuilder {
        MemorySourceBuilder {
            name: name.into(),
            window: None,
            tracks: Vec::new(),
            properties: PropertyMap::default(),
        }
    }

    fn rows(&self, track: &TrackInfo) -> Result<&[RawRecord]> {
        self.tracks
            .iter()
            .find(|(info, _)| info == track)
            .map(|(_, rows)| rows.as_slice())
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "{} has no track {}/{}",
                    self.name, track.process, track.subprocess
                ))
            })
    }
}

/// Incremental construction of a [`MemorySource`]
#[derive(Debug, Clone)]
pub struct MemorySourceBuilder {
    name: String,
    window: Option<TimeWindow>,
    tracks: Vec<(TrackInfo, Vec<RawRecord>)>,
    properties: PropertyMap,
}

impl MemorySourceBuilder {
    /// Set session bounds explicitly
    ///
    /// Without this the bounds span the rows: earliest start to one past the
    /// latest end.
    pub fn window(mut self, start: Timestamp, end: Timestamp) -> Self {
        self.window = Some(TimeWindow::new(start, end));
        self
    }

    /// Add a track and its rows
    pub fn track(mut self, info: TrackInfo, mut rows: Vec<RawRecord>) -> Self {
        rows.sort_by_key(RawRecord::timestamp);
        self.tracks.push((info, rows));
        self
    }

    /// Attach per-event detail to `event`
    ///
    /// Events without attached detail of a kind answer with an empty one.
    pub fn event_property(mut self, event: EventId, property: RawEventProperty) -> Self {
        self.properties.insert((property.kind(), event), property);
        self
    }

    /// Finish the source
    pub fn build(self) -> MemorySource {
        let window = self.window.unwrap_or_else(|| {
            let rows = self.tracks.iter().flat_map(|(_, rows)| rows.iter());
            let (start, end) = rows.fold((Timestamp::MAX, 0), |(lo, hi), row| {
                (lo.min(row.timestamp()), hi.max(end_of(row)))
            });
            if start > end {
                TimeWindow::new(0, 0)
            } else {
                TimeWindow::new(start, end.saturating_add(1))
            }
        });
        MemorySource {
            name: self.name,
            window,
            tracks: self.tracks,
            properties: self.properties,
        }
    }
}

/// Events overlap the window; counter samples fall inside it
fn in_window(row: &RawRecord, window: TimeWindow) -> bool {
    match row {
        RawRecord::Event(e) => {
            e.timestamp < window.end && (end_of(row) > window.start || e.timestamp >= window.start)
        }
        RawRecord::Counter { timestamp, .. } => window.contains(*timestamp),
    }
}

fn end_of(row: &RawRecord) -> Timestamp {
    match row {
        RawRecord::Event(e) => e.timestamp.saturating_add(e.duration.max(0) as u64),
        RawRecord::Counter { timestamp, .. } => *timestamp,
    }
}

impl EventSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_metadata(&self, progress: &mut dyn FnMut(f64, &str)) -> Result<TraceMetadata> {
        progress(50.0, "Trace bounds loaded");
        let tracks = self.tracks.iter().map(|(info, _)| info.clone()).collect();
        progress(50.0, "Track descriptors loaded");
        Ok(TraceMetadata {
            start_time: self.window.start,
            end_time: self.window.end,
            tracks,
        })
    }

    fn read_track(&self, track: &TrackInfo, window: TimeWindow) -> Result<Vec<RawRecord>> {
        Ok(self
            .rows(track)?
            .iter()
            .filter(|row| in_window(row, window))
            .cloned()
            .collect())
    }

    fn read_event_property(
        &self,
        kind: EventPropertyKind,
        event: EventId,
    ) -> Result<RawEventProperty> {
        if !kind.applies_to(event.operation) {
            return Err(Error::InvalidParameter(format!(
                "{} is not available for {}",
                kind, event
            )));
        }
        Ok(self
            .properties
            .get(&(kind, event))
            .cloned()
            .unwrap_or_else(|| match kind {
                EventPropertyKind::FlowTrace => RawEventProperty::Flow(Vec::new()),
                EventPropertyKind::StackTrace => RawEventProperty::Stack(Vec::new()),
                EventPropertyKind::ExtData => RawEventProperty::Ext(Vec::new()),
            }))
    }
}
