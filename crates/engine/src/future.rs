//! Future: one outstanding asynchronous operation
//!
//! # State machine
//!
//! ```text
//! Idle ──schedule──► Scheduled ──wait observes result──► Succeeded | Failed
//!                        │                                     │
//!                        └──wait budget elapses──► TimedOut    └──schedule──► Scheduled
//! ```
//!
//! `Succeeded` and `Failed` are reported as soon as the worker resolves, even
//! before a wait observes it. A resolved future has nothing scheduled and may
//! be reused or freed.
//!
//! # Timeouts
//!
//! A wait that runs out of budget only stops the caller from waiting. The
//! worker keeps running, the future stays `TimedOut` and in flight, and it
//! can be waited on again. Scheduling on it or freeing it is refused until
//! the operation resolves. [`Future::interrupt`] asks the worker to stop at
//! its next checkpoint; an interrupted operation resolves with
//! [`Error::Interrupted`].
//!
//! # Progress
//!
//! The worker posts [`ProgressEvent`]s to a bounded channel with `try_send`
//! and never blocks on it: when the channel is full the message is dropped.
//! Events reach the callback on the thread that calls [`Future::wait`] or
//! [`Future::drain_progress`]. The final event travels with the result, so
//! it is always delivered before `wait` returns.

use crate::config::StoreConfig;
use crossbeam::channel::{self, Receiver, RecvError, Sender, TrySendError};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracestore_core::{
    Error, FutureId, ProgressCallback, ProgressEvent, ProgressMeter, Result,
};
use tracing::{debug, warn};

const PENDING: u8 = 0;
const RESOLVED_OK: u8 = 1;
const RESOLVED_ERR: u8 = 2;

/// Observable state of a future
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FutureState {
    /// Nothing has ever been scheduled
    Idle,
    /// Operation in flight
    Scheduled,
    /// Last operation succeeded
    Succeeded,
    /// Last operation failed
    Failed,
    /// A wait ran out of budget; the operation is still in flight
    TimedOut,
}

type Resolution = (Result<()>, ProgressEvent);

/// Worker-side view of a scheduled operation
pub struct FutureTask {
    source: String,
    meter: ProgressMeter,
    progress: Sender<ProgressEvent>,
    interrupt: Arc<AtomicBool>,
    dropped: usize,
}

impl FutureTask {
    /// Name reported in progress messages
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Advance progress by `step` percent and post a message
    pub fn report(&mut self, step: f64, message: impl Into<String>) {
        let event = self.meter.step(step, message);
        match self.progress.try_send(event) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped += 1;
                debug!(source = %self.source, message = %event.message, "progress dropped");
            }
        }
    }

    /// True once the owner asked the operation to stop
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Acquire)
    }

    /// Fail with [`Error::Interrupted`] if the owner asked to stop
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_interrupted() {
            Err(Error::Interrupted(self.source.clone()))
        } else {
            Ok(())
        }
    }

    fn resolve(mut self, result: Result<String>) -> Resolution {
        if self.dropped > 0 {
            warn!(source = %self.source, dropped = self.dropped, "progress messages dropped");
        }
        match result {
            Ok(message) => (Ok(()), self.meter.finish(true, message)),
            Err(e) => {
                let event = self.meter.finish(false, e.to_string());
                (Err(e), event)
            }
        }
    }
}

struct InFlight {
    label: &'static str,
    progress: Receiver<ProgressEvent>,
    done: Receiver<Resolution>,
    resolution: Arc<AtomicU8>,
    interrupt: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl InFlight {
    fn is_pending(&self) -> bool {
        self.resolution.load(Ordering::Acquire) == PENDING
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(operation = self.label, "worker panicked");
            }
        }
    }
}

struct Inner {
    state: FutureState,
    op: Option<InFlight>,
}

enum Wake {
    Progress(std::result::Result<ProgressEvent, RecvError>),
    Done(std::result::Result<Resolution, RecvError>),
    Deadline,
}

/// Handle onto at most one outstanding operation
pub struct Future {
    id: FutureId,
    callback: Option<ProgressCallback>,
    inner: Mutex<Inner>,
}

impl fmt::Debug for Future {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

impl Future {
    /// Create an idle future
    pub fn new(id: FutureId, callback: Option<ProgressCallback>) -> Self {
        Self {
            id,
            callback,
            inner: Mutex::new(Inner {
                state: FutureState::Idle,
                op: None,
            }),
        }
    }

    /// Arena id
    pub fn id(&self) -> FutureId {
        self.id
    }

    /// Current state
    pub fn state(&self) -> FutureState {
        let inner = self.inner.lock();
        match &inner.op {
            Some(op) => match op.resolution.load(Ordering::Acquire) {
                RESOLVED_OK => FutureState::Succeeded,
                RESOLVED_ERR => FutureState::Failed,
                _ => inner.state,
            },
            None => inner.state,
        }
    }

    /// True while an operation has not resolved
    pub fn is_in_flight(&self) -> bool {
        self.inner
            .lock()
            .op
            .as_ref()
            .map_or(false, InFlight::is_pending)
    }

    /// Fail with [`Error::AlreadyInUse`] while an operation is in flight
    pub fn ensure_idle(&self) -> Result<()> {
        if self.is_in_flight() {
            Err(Error::AlreadyInUse(format!("{} has an operation in flight", self.id)))
        } else {
            Ok(())
        }
    }

    /// Run `work` on a named worker thread
    ///
    /// Returns as soon as the worker is started. `work` returns the message
    /// of the final progress event.
    pub fn schedule<F>(
        &self,
        label: &'static str,
        source: impl Into<String>,
        config: &StoreConfig,
        work: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut FutureTask) -> Result<String> + Send + 'static,
    {
        let mut inner = self.inner.lock();
        if let Some(op) = inner.op.as_mut() {
            if op.is_pending() {
                return Err(Error::AlreadyInUse(format!(
                    "{} is busy with {}",
                    self.id, op.label
                )));
            }
            op.join();
        }

        let source = source.into();
        let (progress_tx, progress_rx) = channel::bounded(config.progress_capacity.max(1));
        let (done_tx, done_rx) = channel::bounded(1);
        let resolution = Arc::new(AtomicU8::new(PENDING));
        let interrupt = Arc::new(AtomicBool::new(false));

        let task = FutureTask {
            source: source.clone(),
            meter: ProgressMeter::new(source),
            progress: progress_tx,
            interrupt: Arc::clone(&interrupt),
            dropped: 0,
        };
        let worker_resolution = Arc::clone(&resolution);
        let worker = thread::Builder::new()
            .name(config.worker_name.clone())
            .spawn(move || {
                let mut task = task;
                let result = work(&mut task);
                let (result, event) = task.resolve(result);
                let flag = if result.is_ok() { RESOLVED_OK } else { RESOLVED_ERR };
                worker_resolution.store(flag, Ordering::Release);
                let _ = done_tx.send((result, event));
            })
            .map_err(|e| Error::Internal(format!("cannot start worker: {}", e)))?;

        debug!(future = %self.id, operation = label, "operation scheduled");
        inner.state = FutureState::Scheduled;
        inner.op = Some(InFlight {
            label,
            progress: progress_rx,
            done: done_rx,
            resolution,
            interrupt,
            worker: Some(worker),
        });
        Ok(())
    }

    /// Block until the operation resolves or `timeout` elapses
    ///
    /// `None` waits without bound and `Some(Duration::ZERO)` polls. Progress
    /// events are delivered to the callback while waiting.
    pub fn wait(&self, timeout: Option<Duration>) -> Result<()> {
        let (mut progress, done) = {
            let inner = self.inner.lock();
            match &inner.op {
                Some(op) => (op.progress.clone(), op.done.clone()),
                None => return Err(Error::NothingScheduled(self.id.to_string())),
            }
        };
        let deadline = match timeout.and_then(|t| Instant::now().checked_add(t)) {
            Some(at) => channel::at(at),
            None => channel::never(),
        };

        let resolved = loop {
            if let Ok(resolution) = done.try_recv() {
                break Some(resolution);
            }
            let wake = channel::select! {
                recv(progress) -> msg => Wake::Progress(msg),
                recv(done) -> msg => Wake::Done(msg),
                recv(deadline) -> _ => Wake::Deadline,
            };
            match wake {
                Wake::Progress(Ok(event)) => self.deliver(&event),
                Wake::Progress(Err(_)) => progress = channel::never(),
                Wake::Done(Ok(resolution)) => break Some(resolution),
                Wake::Done(Err(_)) => {
                    break Some((
                        Err(Error::Internal("worker exited without a result".to_string())),
                        ProgressMeter::new(self.id.to_string())
                            .finish(false, "worker exited without a result"),
                    ))
                }
                Wake::Deadline => break done.try_recv().ok(),
            }
        };

        let Some((result, last)) = resolved else {
            self.inner.lock().state = FutureState::TimedOut;
            let secs = timeout.map_or(u64::MAX, |t| t.as_secs());
            debug!(future = %self.id, secs, "wait timed out, operation still running");
            return Err(Error::Timeout(secs));
        };

        for event in progress.try_iter() {
            self.deliver(&event);
        }
        self.deliver(&last);

        let mut inner = self.inner.lock();
        if let Some(mut op) = inner.op.take() {
            op.join();
        }
        inner.state = if result.is_ok() {
            FutureState::Succeeded
        } else {
            FutureState::Failed
        };
        result
    }

    /// Ask the in-flight operation to stop at its next checkpoint
    ///
    /// Returns `false` when nothing is in flight.
    pub fn interrupt(&self) -> bool {
        let inner = self.inner.lock();
        match &inner.op {
            Some(op) if op.is_pending() => {
                op.interrupt.store(true, Ordering::Release);
                debug!(future = %self.id, operation = op.label, "interrupt requested");
                true
            }
            _ => false,
        }
    }

    /// Deliver queued progress events without waiting
    pub fn drain_progress(&self) -> usize {
        let progress = match &self.inner.lock().op {
            Some(op) => op.progress.clone(),
            None => return 0,
        };
        let mut delivered = 0;
        for event in progress.try_iter() {
            self.deliver(&event);
            delivered += 1;
        }
        delivered
    }

    fn deliver(&self, event: &ProgressEvent) {
        if let Some(callback) = &self.callback {
            event.deliver(callback);
        }
    }
}
