//! Resident per-event detail
//!
//! The stored form of a [`RawEventProperty`]. Flow endpoints are resolved to
//! track ids of the owning trace when stored; endpoints on timelines the
//! trace does not have are dropped.

use std::mem::size_of;
use tracestore_core::{
    EventId, EventPropertyKind, ExtDataRecord, RawEventProperty, RawFlowEndpoint, StackFrame,
    Timestamp, TrackId,
};
use tracing::debug;

/// Linked event on a known track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowEndpoint {
    /// Track holding the linked event
    pub track: TrackId,
    /// The linked event
    pub event: EventId,
    /// Time the link lands
    pub timestamp: Timestamp,
}

/// Flow trace, stack trace or extended data of one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventProperty {
    /// Resolved flow endpoints
    Flow(Vec<FlowEndpoint>),
    /// Stack frames
    Stack(Vec<StackFrame>),
    /// Extended attributes
    Ext(Vec<ExtDataRecord>),
}

impl EventProperty {
    /// Store `raw`, resolving flow endpoints through `find_track`
    pub fn resolve(
        raw: RawEventProperty,
        find_track: impl Fn(&RawFlowEndpoint) -> Option<TrackId>,
    ) -> Self {
        match raw {
            RawEventProperty::Flow(endpoints) => EventProperty::Flow(
                endpoints
                    .iter()
                    .filter_map(|endpoint| match find_track(endpoint) {
                        Some(track) => Some(FlowEndpoint {
                            track,
                            event: endpoint.event,
                            timestamp: endpoint.timestamp,
                        }),
                        None => {
                            debug!(
                                event = %endpoint.event,
                                process = %endpoint.process,
                                subprocess = %endpoint.subprocess,
                                "flow endpoint on unknown track skipped"
                            );
                            None
                        }
                    })
                    .collect(),
            ),
            RawEventProperty::Stack(frames) => EventProperty::Stack(frames),
            RawEventProperty::Ext(records) => EventProperty::Ext(records),
        }
    }

    /// Kind of detail held
    pub fn kind(&self) -> EventPropertyKind {
        match self {
            EventProperty::Flow(_) => EventPropertyKind::FlowTrace,
            EventProperty::Stack(_) => EventPropertyKind::StackTrace,
            EventProperty::Ext(_) => EventPropertyKind::ExtData,
        }
    }

    /// Endpoints, frames or attributes held
    pub fn len(&self) -> usize {
        match self {
            EventProperty::Flow(v) => v.len(),
            EventProperty::Stack(v) => v.len(),
            EventProperty::Ext(v) => v.len(),
        }
    }

    /// True when the event has no such detail
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flow endpoint at `index`
    pub fn endpoint(&self, index: usize) -> Option<&FlowEndpoint> {
        match self {
            EventProperty::Flow(v) => v.get(index),
            _ => None,
        }
    }

    /// Stack frame at `index`
    pub fn frame(&self, index: usize) -> Option<&StackFrame> {
        match self {
            EventProperty::Stack(v) => v.get(index),
            _ => None,
        }
    }

    /// Extended attribute at `index`
    pub fn ext_record(&self, index: usize) -> Option<&ExtDataRecord> {
        match self {
            EventProperty::Ext(v) => v.get(index),
            _ => None,
        }
    }

    /// Approximate bytes held
    pub fn memory_footprint(&self) -> usize {
        match self {
            EventProperty::Flow(v) => v.len() * size_of::<FlowEndpoint>(),
            EventProperty::Stack(v) => v
                .iter()
                .map(|f| {
                    size_of::<StackFrame>() + f.symbol.len() + f.args.len() + f.code_line.len()
                })
                .sum(),
            EventProperty::Ext(v) => v
                .iter()
                .map(|r| {
                    size_of::<ExtDataRecord>() + r.category.len() + r.name.len() + r.value.len()
                })
                .sum(),
        }
    }
}
