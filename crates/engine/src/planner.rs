//! Partition planner
//!
//! Splits a trace's `time × track` box into a grid of `columns × rows`
//! cells, each of which bounds one read.
//!
//! ## Geometry
//!
//! With `span = end - start`:
//! - `size_x = span / columns`, `size_y = track_count / rows` (real-valued)
//! - cell `(x, y)` covers `[start + x·size_x, start + (x+1)·size_x)` in time
//!   and `[y·size_y, (y+1)·size_y)` in tracks, each bound floored
//! - the last column ends at `end` and the last row at `track_count`
//!
//! Bounds are computed in integer arithmetic (`u128`) so large absolute
//! timestamps do not lose precision. Adjacent cells share their boundary,
//! so accepted cells tile the box with no gap and no overlap.
//!
//! ## Rejection
//!
//! A grid is infeasible when `size_y < 1` (more rows than tracks) or
//! `size_x < min_span`. Every cell of an infeasible grid is rejected and the
//! caller skips it; geometry is never adjusted to make a grid fit.

use crate::config::DEFAULT_MIN_PARTITION_SPAN;
use std::ops::Range;
use thiserror::Error;
use tracestore_core::{Error, ReadRequest, Result, TimeWindow, TrackId};
use tracestore_storage::Trace;
use tracing::debug;

/// Grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    /// Time partitions (`numChunksX`)
    pub columns: u32,
    /// Track partitions (`numChunksY`)
    pub rows: u32,
}

impl GridShape {
    /// Create a shape
    pub fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }
}

/// Why a cell is infeasible
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// A grid dimension is zero
    #[error("grid has a zero dimension")]
    EmptyGrid,
    /// Fewer tracks than rows
    #[error("{tracks} tracks cannot fill {rows} rows")]
    TooFewTracks {
        /// Tracks in the box
        tracks: usize,
        /// Requested rows
        rows: u32,
    },
    /// Columns narrower than the granularity guard
    #[error("span {span} over {columns} columns is below {min_span}")]
    SpanTooNarrow {
        /// Time span of the box
        span: u64,
        /// Requested columns
        columns: u32,
        /// Granularity guard
        min_span: u64,
    },
    /// Coordinates fall outside the grid
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfGrid {
        /// Column
        x: u32,
        /// Row
        y: u32,
    },
}

/// One accepted grid cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Column
    pub x: u32,
    /// Row
    pub y: u32,
    /// Time window
    pub window: TimeWindow,
    /// Track index range
    pub tracks: Range<usize>,
}

impl Cell {
    /// Read request covering this cell
    pub fn request(&self) -> Result<ReadRequest> {
        ReadRequest::new(
            self.window,
            self.tracks.clone().map(|i| TrackId::new(i as u32)),
        )
    }
}

/// Grid planner over one `time × track` box
#[derive(Debug, Clone, Copy)]
pub struct PartitionPlanner {
    window: TimeWindow,
    track_count: usize,
    min_span: u64,
}

impl PartitionPlanner {
    /// Planner over `window × [0, track_count)` with the default guard
    pub fn new(window: TimeWindow, track_count: usize) -> Self {
        Self {
            window,
            track_count,
            min_span: DEFAULT_MIN_PARTITION_SPAN,
        }
    }

    /// Planner over a loaded trace's full bounds
    pub fn for_trace(trace: &Trace) -> Result<Self> {
        let window = trace
            .window()
            .ok_or_else(|| Error::NotLoaded(format!("{} has no metadata", trace.id())))?;
        Ok(Self::new(window, trace.track_count()))
    }

    /// Override the granularity guard
    pub fn with_min_span(mut self, min_span: u64) -> Self {
        self.min_span = min_span;
        self
    }

    /// Check a grid shape without producing cells
    pub fn check(&self, shape: GridShape) -> std::result::Result<(), Rejection> {
        if shape.columns == 0 || shape.rows == 0 {
            return Err(Rejection::EmptyGrid);
        }
        if self.track_count < shape.rows as usize {
            return Err(Rejection::TooFewTracks {
                tracks: self.track_count,
                rows: shape.rows,
            });
        }
        let span = self.window.span();
        if (span as u128) < (self.min_span as u128) * (shape.columns as u128) {
            return Err(Rejection::SpanTooNarrow {
                span,
                columns: shape.columns,
                min_span: self.min_span,
            });
        }
        Ok(())
    }

    /// True when every cell of `shape` is feasible
    pub fn is_feasible(&self, shape: GridShape) -> bool {
        self.check(shape).is_ok()
    }

    /// Evaluate cell `(x, y)` of `shape`
    pub fn cell(&self, shape: GridShape, x: u32, y: u32) -> std::result::Result<Cell, Rejection> {
        self.check(shape)?;
        if x >= shape.columns || y >= shape.rows {
            return Err(Rejection::OutOfGrid { x, y });
        }
        let span = self.window.span() as u128;
        let time_bound = |i: u32| -> u64 {
            if i >= shape.columns {
                self.window.end
            } else {
                self.window.start + (span * i as u128 / shape.columns as u128) as u64
            }
        };
        let track_bound = |j: u32| -> usize {
            if j >= shape.rows {
                self.track_count
            } else {
                (self.track_count as u128 * j as u128 / shape.rows as u128) as usize
            }
        };
        Ok(Cell {
            x,
            y,
            window: TimeWindow::new(time_bound(x), time_bound(x + 1)),
            tracks: track_bound(y)..track_bound(y + 1),
        })
    }

    /// Accepted cells of `shape`, row-major
    ///
    /// An infeasible grid yields no cells.
    pub fn plan(&self, shape: GridShape) -> Vec<Cell> {
        if let Err(reason) = self.check(shape) {
            debug!(?shape, %reason, "partition grid rejected");
            return Vec::new();
        }
        (0..shape.rows)
            .flat_map(|y| (0..shape.columns).map(move |x| (x, y)))
            .filter_map(|(x, y)| self.cell(shape, x, y).ok())
            .collect()
    }
}
