//! Track and trace metadata
//!
//! A backing store describes a profiling session as a time range plus an
//! ordered list of [`TrackInfo`] descriptors. The order is significant: the
//! position of a descriptor becomes the stable [`TrackId`](crate::TrackId) of
//! the track built from it.

use crate::event::ExtDataRecord;
use crate::types::{TimeWindow, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a track
///
/// Discriminants are stable and exposed through the property surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u64)]
pub enum TrackCategory {
    /// Object is not a track
    NotATrack = 0,
    /// Performance counter samples
    Counter = 1,
    /// Host API calls on a CPU thread
    Region = 2,
    /// Kernel executions on a GPU queue
    Kernel = 3,
    /// Shader execution (SQTT)
    Sqtt = 4,
    /// Network activity
    Nic = 5,
}

impl TrackCategory {
    /// Human readable category name
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackCategory::NotATrack => "Invalid track",
            TrackCategory::Counter => "Counter",
            TrackCategory::Region => "CPU Thread",
            TrackCategory::Kernel => "GPU Queue",
            TrackCategory::Sqtt => "Shader Execution",
            TrackCategory::Nic => "Network Activity",
        }
    }

    /// Stable numeric value
    pub fn as_u64(&self) -> u64 {
        *self as u64
    }

    /// True for tracks whose records are sampled values rather than events
    pub fn is_counter(&self) -> bool {
        matches!(self, TrackCategory::Counter)
    }
}

impl fmt::Display for TrackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of one timeline, as reported by the backing store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Node (host) the timeline was captured on
    pub node_id: u64,
    /// Track category
    pub category: TrackCategory,
    /// Main process string: PID for CPU threads, GPU id for queues, device
    /// id for counters
    pub process: String,
    /// Sub-process string: TID, queue id or counter name
    pub subprocess: String,
    /// Descriptive attributes (process command line, agent name, ...)
    #[serde(default)]
    pub ext_data: Vec<ExtDataRecord>,
}

impl TrackInfo {
    /// Create a track descriptor on node 0
    pub fn new(
        category: TrackCategory,
        process: impl Into<String>,
        subprocess: impl Into<String>,
    ) -> Self {
        Self {
            node_id: 0,
            category,
            process: process.into(),
            subprocess: subprocess.into(),
            ext_data: Vec::new(),
        }
    }

    /// Set the node id
    pub fn with_node(mut self, node_id: u64) -> Self {
        self.node_id = node_id;
        self
    }

    /// Append a descriptive attribute
    pub fn with_ext_data(
        mut self,
        category: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.ext_data.push(ExtDataRecord::new(category, name, value));
        self
    }

    /// True when this descriptor names the given timeline
    pub fn matches(&self, category: TrackCategory, process: &str, subprocess: &str) -> bool {
        self.category == category && self.process == process && self.subprocess == subprocess
    }
}

/// Everything a metadata read produces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceMetadata {
    /// Earliest timestamp in the session
    pub start_time: Timestamp,
    /// Latest timestamp in the session
    pub end_time: Timestamp,
    /// Track descriptors in id order
    pub tracks: Vec<TrackInfo>,
}

impl TraceMetadata {
    /// Session bounds as a window
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }
}
