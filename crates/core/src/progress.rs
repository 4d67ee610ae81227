//! Progress reporting
//!
//! Both read models report progress with the same message shape
//! `(source, percent, status, message)`. Synchronous reads invoke the
//! callback inline; asynchronous reads post [`ProgressEvent`]s that are
//! delivered to the callback later, on the waiting thread.

use std::sync::Arc;

/// Status attached to a progress message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ProgressStatus {
    /// Step or operation completed successfully
    Success = 0,
    /// Operation failed
    Error = 1,
    /// Operation still running
    Busy = 2,
}

/// Caller-supplied progress handler: `(source, percent, status, message)`
///
/// In the asynchronous model the handler may run on a thread other than the
/// one that scheduled the operation. It must not call back into the
/// connector that is reporting.
pub type ProgressCallback = Arc<dyn Fn(&str, u8, ProgressStatus, &str) + Send + Sync>;

/// One progress message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Name of the reporting database
    pub source: String,
    /// Accumulated progress, 0..=100
    pub percent: u8,
    /// Status
    pub status: ProgressStatus,
    /// Free-form description of the step
    pub message: String,
}

impl ProgressEvent {
    /// Hand this event to a callback
    pub fn deliver(&self, callback: &ProgressCallback) {
        callback(&self.source, self.percent, self.status, &self.message);
    }
}

/// Accumulates step percentages for one operation
///
/// Steps add to the running total, which is clamped to 100. The final
/// message of an operation should come from [`ProgressMeter::finish`],
/// which reports 100 on success and leaves the total untouched on failure.
#[derive(Debug, Clone)]
pub struct ProgressMeter {
    source: String,
    percent: f64,
}

impl ProgressMeter {
    /// Start a meter at 0%
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            percent: 0.0,
        }
    }

    /// Current total, 0..=100
    pub fn percent(&self) -> u8 {
        self.percent.clamp(0.0, 100.0) as u8
    }

    /// Advance by `step` percent and build a busy message
    pub fn step(&mut self, step: f64, message: impl Into<String>) -> ProgressEvent {
        self.percent = (self.percent + step).clamp(0.0, 100.0);
        self.event(ProgressStatus::Busy, message.into())
    }

    /// Build the closing message
    pub fn finish(&mut self, ok: bool, message: impl Into<String>) -> ProgressEvent {
        if ok {
            self.percent = 100.0;
            self.event(ProgressStatus::Success, message.into())
        } else {
            self.event(ProgressStatus::Error, message.into())
        }
    }

    fn event(&self, status: ProgressStatus, message: String) -> ProgressEvent {
        ProgressEvent {
            source: self.source.clone(),
            percent: self.percent(),
            status,
            message,
        }
    }
}
