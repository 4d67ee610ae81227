//! Read request value object
//!
//! A [`ReadRequest`] names one time window and an ordered set of tracks.
//! It is immutable once built and is passed by value into a read, so there
//! is no pending query state that a read has to remember to clear.
//!
//! ```
//! use tracestore_core::{ReadRequest, TrackId};
//!
//! let request = ReadRequest::builder()
//!     .window(0, 5_000_000)
//!     .track(TrackId::new(2))
//!     .track(TrackId::new(0))
//!     .track(TrackId::new(2))
//!     .build()
//!     .unwrap();
//! assert_eq!(request.tracks(), &[TrackId::new(2), TrackId::new(0)]);
//! ```

use crate::error::{Error, Result};
use crate::types::{TimeWindow, Timestamp, TrackId};

/// Immutable (window, track set) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    window: TimeWindow,
    tracks: Vec<TrackId>,
}

impl ReadRequest {
    /// Build a request directly
    ///
    /// Duplicate track ids are dropped, keeping first-seen order.
    pub fn new(window: TimeWindow, tracks: impl IntoIterator<Item = TrackId>) -> Result<Self> {
        if window.is_empty() {
            return Err(Error::InvalidParameter(format!(
                "read window {} is empty",
                window
            )));
        }
        let mut unique = Vec::new();
        for id in tracks {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        if unique.is_empty() {
            return Err(Error::InvalidParameter(
                "read request selects no tracks".to_string(),
            ));
        }
        Ok(Self {
            window,
            tracks: unique,
        })
    }

    /// Start a builder
    pub fn builder() -> ReadRequestBuilder {
        ReadRequestBuilder::default()
    }

    /// Requested window
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Requested tracks, in request order
    pub fn tracks(&self) -> &[TrackId] {
        &self.tracks
    }
}

/// Incremental construction of a [`ReadRequest`]
///
/// Mirrors the "configure window, then add tracks" call sequence.
#[derive(Debug, Clone, Default)]
pub struct ReadRequestBuilder {
    window: Option<TimeWindow>,
    tracks: Vec<TrackId>,
}

impl ReadRequestBuilder {
    /// Set the time window
    pub fn window(mut self, start: Timestamp, end: Timestamp) -> Self {
        self.window = Some(TimeWindow::new(start, end));
        self
    }

    /// Add one track
    pub fn track(mut self, id: TrackId) -> Self {
        self.tracks.push(id);
        self
    }

    /// Add several tracks
    pub fn tracks(mut self, ids: impl IntoIterator<Item = TrackId>) -> Self {
        self.tracks.extend(ids);
        self
    }

    /// True when nothing has been configured yet
    pub fn is_empty(&self) -> bool {
        self.window.is_none() && self.tracks.is_empty()
    }

    /// Finish the request
    pub fn build(self) -> Result<ReadRequest> {
        let window = self.window.ok_or_else(|| {
            Error::InvalidParameter("read window was never configured".to_string())
        })?;
        ReadRequest::new(window, self.tracks)
    }
}
