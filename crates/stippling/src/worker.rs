//! Background worker running a stippling job on its own thread.
//!
//! The worker owns its copy of the density field and its population; the caller only
//! sees messages. One [`ToWorker::Init`] message starts the job, then zero or more
//! [`FromWorker::Progress`] messages arrive in increasing iteration order, followed by
//! exactly one [`FromWorker::Done`].
//!
//! ```no_run
//! use stippling::prelude::*;
//!
//! let field = DensityField::from_fn(64, 64, |x, y| (x * y) as f32)?;
//! let config = StippleConfig::new().with_initial_stipple_radius(1.5).with_seed(7);
//! let mut worker = StippleWorker::spawn(StippleRequest::new(field, config))?;
//! for message in worker.iter() {
//!     println!("{:.0}%", message.snapshot().progress);
//! }
//! # Ok::<(), stippling::error::Error>(())
//! ```
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::field::DensityField;
use crate::stipple::config::StippleConfig;
use crate::stipple::events::{EventSink, Snapshot, StippleEvent, StippleEventKind};
use crate::stipple::runner::{EngineState, StippleEngine};

/// Everything a worker needs to run one job.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StippleRequest {
    pub field: DensityField,
    pub config: StippleConfig,
}

impl StippleRequest {
    pub fn new(field: DensityField, config: StippleConfig) -> Self {
        Self { field, config }
    }
}

/// Caller to worker.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ToWorker {
    Init(StippleRequest),
}

/// Worker to caller.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FromWorker {
    Progress(Snapshot),
    Done(Snapshot),
}

impl FromWorker {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            FromWorker::Progress(s) | FromWorker::Done(s) => s,
        }
    }

    pub fn into_snapshot(self) -> Snapshot {
        match self {
            FromWorker::Progress(s) | FromWorker::Done(s) => s,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, FromWorker::Done(_))
    }
}

/// Handle to a running worker. Dropping it cancels the job.
pub struct StippleWorker {
    outbox: Option<Receiver<FromWorker>>,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    finished: bool,
}

impl StippleWorker {
    /// Validates `request`, starts the worker thread and posts the init message.
    pub fn spawn(request: StippleRequest) -> Result<Self> {
        request
            .config
            .validate_for(request.field.width(), request.field.height())?;

        let (inbox_tx, inbox_rx) = crossbeam_channel::bounded::<ToWorker>(1);
        let (outbox_tx, outbox_rx) = crossbeam_channel::unbounded::<FromWorker>();
        let cancel = Arc::new(AtomicBool::new(false));

        let worker_cancel = cancel.clone();
        let handle = thread::Builder::new()
            .name("stipple-worker".into())
            .spawn(move || worker_main(inbox_rx, outbox_tx, worker_cancel))?;

        inbox_tx
            .send(ToWorker::Init(request))
            .map_err(|_| Error::Worker("worker exited before receiving its job".into()))?;

        Ok(Self {
            outbox: Some(outbox_rx),
            cancel,
            handle,
            finished: false,
        })
    }

    /// Blocks for the next message. Fails once the worker is gone, finished or was
    /// terminated.
    pub fn recv(&mut self) -> Result<FromWorker> {
        let outbox = self
            .outbox
            .as_ref()
            .ok_or_else(|| Error::Worker("worker was terminated".into()))?;
        let message = outbox
            .recv()
            .map_err(|_| Error::Worker("worker disconnected".into()))?;
        if message.is_done() {
            self.finished = true;
        }
        Ok(message)
    }

    /// Next message if one is buffered.
    pub fn try_recv(&mut self) -> Result<Option<FromWorker>> {
        let Some(outbox) = self.outbox.as_ref() else {
            return Err(Error::Worker("worker was terminated".into()));
        };
        match outbox.try_recv() {
            Ok(message) => {
                if message.is_done() {
                    self.finished = true;
                }
                Ok(Some(message))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::Worker("worker disconnected".into())),
        }
    }

    /// Blocking iterator over the remaining messages, ending after `Done`.
    pub fn iter(&mut self) -> impl Iterator<Item = FromWorker> + '_ {
        std::iter::from_fn(move || {
            if self.finished {
                return None;
            }
            self.recv().ok()
        })
    }

    /// Blocks until the terminal snapshot, discarding progress messages.
    pub fn wait(mut self) -> Result<Snapshot> {
        loop {
            if let FromWorker::Done(snapshot) = self.recv()? {
                return Ok(snapshot);
            }
        }
    }

    /// Whether the `Done` message has been received.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the worker thread is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops the job at the next iteration boundary and drops all pending messages.
    pub fn terminate(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if self.outbox.take().is_some() {
            debug!("Stipple worker terminated by caller.");
        }
    }
}

impl Drop for StippleWorker {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

/// Maps progress and terminal events onto the outbox. A closed outbox cancels the job.
struct OutboxSink {
    tx: Sender<FromWorker>,
    cancel: Arc<AtomicBool>,
}

impl EventSink for OutboxSink {
    fn send(&mut self, event: StippleEvent) {
        let message = match event {
            StippleEvent::Progress(s) => FromWorker::Progress(s),
            StippleEvent::Done(s) => FromWorker::Done(s),
            _ => return,
        };
        if self.tx.send(message).is_err() {
            self.cancel.store(true, Ordering::Relaxed);
        }
    }

    fn wants(&self, kind: StippleEventKind) -> bool {
        matches!(kind, StippleEventKind::Progress | StippleEventKind::Done)
            && !self.cancel.load(Ordering::Relaxed)
    }
}

fn worker_main(inbox: Receiver<ToWorker>, outbox: Sender<FromWorker>, cancel: Arc<AtomicBool>) {
    let Ok(ToWorker::Init(request)) = inbox.recv() else {
        warn!("Stipple worker started without a job.");
        return;
    };

    let StippleRequest { field, config } = request;
    let seed = config.seed.unwrap_or_else(|| rand::rng().next_u64());
    let mut rng = StdRng::seed_from_u64(seed);
    debug!("Stipple worker running with seed {}.", seed);

    let engine = StippleEngine::new(config);
    let mut sink = OutboxSink {
        tx: outbox,
        cancel: cancel.clone(),
    };
    let mut run = engine.start(&field, &mut rng, &mut sink);
    while run.state() == EngineState::Iterating {
        if cancel.load(Ordering::Relaxed) {
            debug!(
                "Stipple worker cancelled after {} iterations.",
                run.iteration()
            );
            return;
        }
        run.step(&mut rng, &mut sink);
    }
}
