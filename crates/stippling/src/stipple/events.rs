//! Event types and sinks for observing stippling runs.
//!
//! This module defines [`StippleEvent`] and a set of sinks and adapters to emit,
//! collect, or forward events while a [`crate::stipple::runner::StippleEngine`] runs.
//! Progress events are emitted once per completed step, in step order, and the
//! terminal [`StippleEvent::Done`] is always the last event of a run.
use crossbeam_channel::Sender;

use crate::stipple::config::StippleConfig;
use crate::stipple::relax::IterationStats;
use crate::stipple::Stipple;

/// The record streamed to observers after each step and at the end of a run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Percentage in `[0, 100]`; always 100 when `done`.
    pub progress: f64,
    pub done: bool,
    /// Completed relaxation steps.
    pub iteration: u32,
    /// Normalised copy of the population.
    pub stipples: Vec<Stipple>,
}

/// Describes events emitted by stippling runs.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum StippleEvent {
    /// Emitted once the initial population exists.
    RunStarted {
        /// The run configuration used.
        config: StippleConfig,
        /// Field width in samples.
        width: usize,
        /// Field height in samples.
        height: usize,
        /// Size of the initial population.
        initial_count: usize,
    },

    /// Emitted after every completed relaxation step.
    Progress(Snapshot),

    /// Per-step counters, emitted right before the matching [`StippleEvent::Progress`].
    IterationFinished {
        iteration: u32,
        stats: IterationStats,
        /// Threshold that was used for this step.
        error_threshold: f64,
    },

    /// Final population; the last event of every run.
    Done(Snapshot),

    /// Non-fatal warning generated during the run.
    Warning {
        /// Context string (e.g. `iteration:3`).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`StippleEvent`] used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StippleEventKind {
    RunStarted,
    Progress,
    IterationFinished,
    Done,
    Warning,
}

impl StippleEvent {
    pub fn kind(&self) -> StippleEventKind {
        match self {
            StippleEvent::RunStarted { .. } => StippleEventKind::RunStarted,
            StippleEvent::Progress(_) => StippleEventKind::Progress,
            StippleEvent::IterationFinished { .. } => StippleEventKind::IterationFinished,
            StippleEvent::Done(_) => StippleEventKind::Done,
            StippleEvent::Warning { .. } => StippleEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`StippleEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: StippleEvent);

    /// Whether events of `kind` should be built at all. Snapshots copy the whole
    /// population, so sinks that ignore them should say so.
    fn wants(&self, _kind: StippleEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = StippleEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: StippleEvent) {}

    #[inline]
    fn wants(&self, _kind: StippleEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(StippleEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(StippleEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(StippleEvent),
{
    #[inline]
    fn send(&mut self, event: StippleEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<StippleEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
        }
    }

    pub fn into_inner(self) -> Vec<StippleEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[StippleEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Progress and terminal snapshots in emission order.
    pub fn snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.events.iter().filter_map(|e| match e {
            StippleEvent::Progress(s) | StippleEvent::Done(s) => Some(s),
            _ => None,
        })
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: StippleEvent) {
        self.events.push(event);
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: StippleEvent) {
        if self.sinks.is_empty() {
            return;
        }
        let last_idx = self.sinks.len() - 1;
        for i in 0..last_idx {
            self.sinks[i].send(event.clone());
        }
        self.sinks[last_idx].send(event);
    }

    fn wants(&self, kind: StippleEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}

/// Forwards events over a channel, e.g. to a UI thread. Send failures (receiver
/// gone) are ignored.
pub struct ChannelSink {
    pub tx: Sender<StippleEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<StippleEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    #[inline]
    fn send(&mut self, event: StippleEvent) {
        let _ = self.tx.send(event);
    }
}

/// Restricts an inner sink to a set of event kinds.
pub struct FilterSink<S: EventSink> {
    inner: S,
    kinds: Vec<StippleEventKind>,
}

impl<S: EventSink> FilterSink<S> {
    pub fn new(inner: S, kinds: impl IntoIterator<Item = StippleEventKind>) -> Self {
        Self {
            inner,
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EventSink> EventSink for FilterSink<S> {
    fn send(&mut self, event: StippleEvent) {
        if self.kinds.contains(&event.kind()) {
            self.inner.send(event);
        }
    }

    fn wants(&self, kind: StippleEventKind) -> bool {
        self.kinds.contains(&kind) && self.inner.wants(kind)
    }
}
