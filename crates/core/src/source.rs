//! Backing store query surface
//!
//! The store never parses profiling files itself. It consumes an
//! [`EventSource`]: something that can describe a session (metadata) and
//! return the rows of a track within a time window. Implementations live in
//! `tracestore-database`.

use crate::error::{Error, Result};
use crate::event::{EventId, EventPropertyKind, RawEventProperty};
use crate::metadata::{TraceMetadata, TrackInfo};
use crate::record::RawRecord;
use crate::types::TimeWindow;

/// Query surface of a profiling database
///
/// # Thread Safety
///
/// Sources are shared between the caller and worker threads, so they must
/// be `Send + Sync`. Calls may arrive concurrently from different futures.
pub trait EventSource: Send + Sync {
    /// Name used in progress messages (usually the file path)
    fn name(&self) -> &str;

    /// Read session bounds and track descriptors
    ///
    /// `progress` receives `(step_percent, message)` for each completed step.
    fn read_metadata(&self, progress: &mut dyn FnMut(f64, &str)) -> Result<TraceMetadata>;

    /// Read the rows of one track that overlap `window`, ordered by start time
    ///
    /// An event `[start, end)` overlaps when `start < window.end` and
    /// `end > window.start`; a zero-length event needs its start inside the
    /// window. Counter samples belong to the window containing their
    /// timestamp.
    fn read_track(&self, track: &TrackInfo, window: TimeWindow) -> Result<Vec<RawRecord>>;

    /// Read several tracks with as few queries as the source allows
    ///
    /// The result has one row set per requested track, in request order.
    fn read_tracks(&self, tracks: &[&TrackInfo], window: TimeWindow) -> Result<Vec<Vec<RawRecord>>> {
        tracks
            .iter()
            .map(|track| self.read_track(track, window))
            .collect()
    }

    /// Read one kind of per-event detail for `event`
    ///
    /// An event with no such detail yields an empty property. Kinds that do
    /// not apply to the event's operation fail with
    /// [`Error::InvalidParameter`]. The default supports nothing.
    fn read_event_property(
        &self,
        kind: EventPropertyKind,
        event: EventId,
    ) -> Result<RawEventProperty> {
        Err(Error::Unsupported(format!(
            "{} does not provide {} for {}",
            self.name(),
            kind,
            event
        )))
    }
}
