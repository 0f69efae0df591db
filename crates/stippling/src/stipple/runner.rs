//! High-level engine driving relaxation steps until the population settles.
//!
//! A run moves through three states: [`EngineState::Initializing`] (random initial
//! population), [`EngineState::Iterating`] (one relaxation step per call), and the
//! terminal [`EngineState::Converged`]. The error threshold anneals by the configured
//! rate after every step, widening the keep band until no cell splits or dies.
use rand::Rng;
use tracing::{debug, info, warn};

use glam::DVec2;

use crate::error::Result;
use crate::field::DensityField;
use crate::sampling::{PositionSampling, UniformRandomSampling};
use crate::stipple::config::StippleConfig;
use crate::stipple::events::{EventSink, Snapshot, StippleEvent, StippleEventKind};
use crate::stipple::relax::{relax, IterationStats, Thresholds};
use crate::stipple::{normalize_stipples, Stipple};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConvergenceReason {
    /// A step finished without any split or deletion.
    Stable,
    /// `max_iterations` steps were run.
    IterationLimit,
}

/// Lifecycle of a [`StippleRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Initializing,
    Iterating,
    Converged(ConvergenceReason),
}

/// Final output of a run.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StippleResult {
    /// Normalised final population, never empty.
    pub stipples: Vec<Stipple>,
    /// Completed relaxation steps.
    pub iterations: u32,
    pub reason: ConvergenceReason,
    /// Error threshold after the last step.
    pub error_threshold: f64,
}

impl StippleResult {
    /// The terminal snapshot equivalent to this result.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            progress: 100.0,
            done: true,
            iteration: self.iterations,
            stipples: self.stipples.clone(),
        }
    }
}

/// Stippling engine: validated configuration plus the initial-population sampler.
pub struct StippleEngine {
    config: StippleConfig,
    sampler: Box<dyn PositionSampling>,
}

impl StippleEngine {
    /// Validates `config` and builds an engine with uniform random seeding.
    pub fn try_new(config: StippleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn new(config: StippleConfig) -> Self {
        debug_assert!(
            config.initial_stipple_radius.is_finite() && config.initial_stipple_radius > 0.0,
            "initial_stipple_radius must be finite and > 0"
        );
        Self {
            config,
            sampler: Box::new(UniformRandomSampling::new()),
        }
    }

    /// Replaces the initial-population sampler.
    pub fn with_sampler(mut self, sampler: impl PositionSampling + 'static) -> Self {
        self.sampler = Box::new(sampler);
        self
    }

    pub fn config(&self) -> &StippleConfig {
        &self.config
    }

    /// Random initial population for `field`, never empty.
    pub fn initial_population(&self, field: &DensityField, rng: &mut dyn Rng) -> Vec<Stipple> {
        let count = self.config.initial_count(field.width(), field.height());
        let mut stipples: Vec<Stipple> = self
            .sampler
            .generate(count, field.extent().into(), rng)
            .into_iter()
            .map(|p| Stipple::new(DVec2::from(p)))
            .filter(|s| field.bounds().contains(s.position))
            .collect();
        if stipples.is_empty() {
            warn!("Sampler produced no positions; falling back to one uniform stipple.");
            stipples.extend(
                UniformRandomSampling::new()
                    .generate(1, field.extent().into(), rng)
                    .into_iter()
                    .map(|p| Stipple::new(DVec2::from(p))),
            );
        }
        stipples
    }

    /// Creates the initial population and returns a run ready to step.
    pub fn start<'a>(
        &'a self,
        field: &'a DensityField,
        rng: &mut impl Rng,
        sink: &mut dyn EventSink,
    ) -> StippleRun<'a> {
        let mut run = StippleRun {
            field,
            config: &self.config,
            stipples: Vec::new(),
            iteration: 0,
            state: EngineState::Initializing,
            last_stats: None,
        };
        run.stipples = self.initial_population(field, rng);

        info!(
            "Stippling {}x{} field | initial stipples: {} | target mass: {:.3} | max iterations: {}.",
            field.width(),
            field.height(),
            run.stipples.len(),
            self.config.target_area(),
            self.config.max_iterations
        );
        if sink.wants(StippleEventKind::RunStarted) {
            sink.send(StippleEvent::RunStarted {
                config: self.config.clone(),
                width: field.width(),
                height: field.height(),
                initial_count: run.stipples.len(),
            });
        }

        if self.config.max_iterations == 0 {
            run.converge(ConvergenceReason::IterationLimit, sink);
        } else {
            run.state = EngineState::Iterating;
        }
        run
    }

    /// Runs to convergence without observing progress.
    pub fn run(&self, field: &DensityField, rng: &mut impl Rng) -> StippleResult {
        self.run_with_events(field, rng, &mut ())
    }

    /// Runs to convergence, streaming progress snapshots into `sink`.
    pub fn run_with_events(
        &self,
        field: &DensityField,
        rng: &mut impl Rng,
        sink: &mut dyn EventSink,
    ) -> StippleResult {
        let mut run = self.start(field, rng, sink);
        while run.state() == EngineState::Iterating {
            run.step(rng, sink);
        }
        run.into_result()
    }
}

/// Validates `config` against `field` and runs it in one call.
pub fn run_stippling<R: Rng>(
    field: &DensityField,
    config: StippleConfig,
    rng: &mut R,
    sink: Option<&mut dyn EventSink>,
) -> Result<StippleResult> {
    config.validate_for(field.width(), field.height())?;
    let engine = StippleEngine::try_new(config)?;
    Ok(match sink {
        Some(s) => engine.run_with_events(field, rng, s),
        None => engine.run(field, rng),
    })
}

/// An in-progress run. Owns its population; the field is only read.
pub struct StippleRun<'a> {
    field: &'a DensityField,
    config: &'a StippleConfig,
    stipples: Vec<Stipple>,
    iteration: u32,
    state: EngineState,
    last_stats: Option<IterationStats>,
}

impl<'a> StippleRun<'a> {
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Completed relaxation steps.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Threshold the next step will use: `e0 + iteration * rate`.
    pub fn error_threshold(&self) -> f64 {
        self.config.error_threshold_after(self.iteration)
    }

    /// Working population with raw (unnormalised) cell masses.
    pub fn stipples(&self) -> &[Stipple] {
        &self.stipples
    }

    pub fn last_stats(&self) -> Option<IterationStats> {
        self.last_stats
    }

    /// `iteration / max_iterations * 100`, or 100 once converged.
    pub fn progress(&self) -> f64 {
        match self.state {
            EngineState::Converged(_) => 100.0,
            _ if self.config.max_iterations == 0 => 100.0,
            _ => (self.iteration as f64 / self.config.max_iterations as f64 * 100.0).min(100.0),
        }
    }

    /// Normalised copy of the current population.
    pub fn snapshot(&self) -> Snapshot {
        let done = matches!(self.state, EngineState::Converged(_));
        Snapshot {
            progress: self.progress(),
            done,
            iteration: self.iteration,
            stipples: normalize_stipples(&self.stipples, self.field.extent()),
        }
    }

    /// Runs one relaxation step. Does nothing once converged.
    pub fn step(&mut self, rng: &mut impl Rng, sink: &mut dyn EventSink) -> EngineState {
        if self.state != EngineState::Iterating {
            return self.state;
        }

        let error_threshold = self.error_threshold();
        let thresholds = Thresholds::new(self.config.target_area(), error_threshold);
        let generation = relax(&self.stipples, self.field, thresholds, rng);
        self.stipples = generation.stipples;
        self.iteration += 1;
        self.last_stats = Some(generation.stats);

        let stats = generation.stats;
        debug!(
            "Iteration {}: kept {} | split {} | deleted {} | stipples {} | threshold {:.4}.",
            self.iteration,
            stats.kept,
            stats.split,
            stats.deleted,
            self.stipples.len(),
            error_threshold
        );

        if sink.wants(StippleEventKind::Warning) {
            let context = format!("iteration:{}", self.iteration);
            if stats.missing_cells > 0 {
                sink.send(StippleEvent::Warning {
                    context: context.clone(),
                    message: format!(
                        "{} stipples had no Voronoi cell and were weighed as points",
                        stats.missing_cells
                    ),
                });
            }
            if stats.injected {
                sink.send(StippleEvent::Warning {
                    context,
                    message: "Population collapsed; injected one random stipple".into(),
                });
            }
        }
        if sink.wants(StippleEventKind::IterationFinished) {
            sink.send(StippleEvent::IterationFinished {
                iteration: self.iteration,
                stats,
                error_threshold,
            });
        }
        if sink.wants(StippleEventKind::Progress) {
            sink.send(StippleEvent::Progress(self.snapshot()));
        }

        if !generation.changed {
            self.converge(ConvergenceReason::Stable, sink);
        } else if self.iteration >= self.config.max_iterations {
            self.converge(ConvergenceReason::IterationLimit, sink);
        }
        self.state
    }

    fn converge(&mut self, reason: ConvergenceReason, sink: &mut dyn EventSink) {
        self.state = EngineState::Converged(reason);
        info!(
            "Stippling converged ({:?}) after {} iterations with {} stipples.",
            reason,
            self.iteration,
            self.stipples.len()
        );
        if sink.wants(StippleEventKind::Done) {
            sink.send(StippleEvent::Done(self.snapshot()));
        }
    }

    /// Final normalised result. If the run has not converged yet, the current
    /// population is returned as if the iteration limit had been hit.
    pub fn into_result(self) -> StippleResult {
        let reason = match self.state {
            EngineState::Converged(reason) => reason,
            _ => ConvergenceReason::IterationLimit,
        };
        StippleResult {
            stipples: normalize_stipples(&self.stipples, self.field.extent()),
            iterations: self.iteration,
            reason,
            error_threshold: self.error_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::error::Error;
    use crate::sampling::JitterGridSampling;
    use crate::stipple::events::VecSink;

    fn uniform_field(n: usize) -> DensityField {
        // Half-and-half so the field is not degenerate.
        DensityField::from_fn(n, n, |x, _| if x < n / 2 { 1.0 } else { 2.0 }).unwrap()
    }

    #[test]
    fn try_new_rejects_invalid_config() {
        let err = StippleEngine::try_new(StippleConfig::new().with_initial_stipple_radius(0.0));
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_iterations_returns_initial_population() {
        let field = uniform_field(10);
        let engine = StippleEngine::try_new(
            StippleConfig::new()
                .with_initial_stipple_radius(1.0)
                .with_max_iterations(0),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        let expected = engine.initial_population(&field, &mut rng);

        let mut rng = StdRng::seed_from_u64(11);
        let mut sink = VecSink::new();
        let result = engine.run_with_events(&field, &mut rng, &mut sink);

        assert_eq!(result.iterations, 0);
        assert_eq!(result.reason, ConvergenceReason::IterationLimit);
        let positions: Vec<DVec2> = result.stipples.iter().map(|s| s.position).collect();
        let expected: Vec<DVec2> = expected.iter().map(|s| s.position).collect();
        assert_eq!(positions, expected);
        // All initial densities are equal, so normalisation zero-fills.
        assert!(result.stipples.iter().all(|s| s.density == 0.0));

        let snapshots: Vec<&Snapshot> = sink.snapshots().collect();
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].done);
        assert_eq!(snapshots[0].progress, 100.0);
    }

    #[test]
    fn each_step_uses_annealed_threshold() {
        let field = uniform_field(12);
        let config = StippleConfig::new()
            .with_initial_stipple_radius(1.5)
            .with_initial_error_threshold(0.3)
            .with_convergence_rate(0.07)
            .with_max_iterations(6);
        let engine = StippleEngine::try_new(config).unwrap();
        let mut sink = VecSink::new();
        let result = engine.run_with_events(&field, &mut StdRng::seed_from_u64(5), &mut sink);

        let used: Vec<(u32, f64)> = sink
            .as_slice()
            .iter()
            .filter_map(|e| match e {
                StippleEvent::IterationFinished {
                    iteration,
                    error_threshold,
                    ..
                } => Some((*iteration, *error_threshold)),
                _ => None,
            })
            .collect();
        assert_eq!(used.len() as u32, result.iterations);
        assert!(!used.is_empty());
        // Step k runs with the threshold after k - 1 completed steps.
        for (k, threshold) in &used {
            let expected = 0.3 + (*k - 1) as f64 * 0.07;
            assert!((threshold - expected).abs() < 1e-12, "step {k}: {threshold}");
        }
        assert_eq!(used[0].1, 0.3);
        let expected_final = 0.3 + result.iterations as f64 * 0.07;
        assert!((result.error_threshold - expected_final).abs() < 1e-12);
    }

    #[test]
    fn progress_events_increase_and_done_is_last() {
        let field = uniform_field(16);
        let engine = StippleEngine::try_new(
            StippleConfig::new()
                .with_initial_stipple_radius(1.5)
                .with_max_iterations(8),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        let mut sink = VecSink::new();
        let result = engine.run_with_events(&field, &mut rng, &mut sink);

        let events = sink.into_inner();
        assert!(matches!(events.first(), Some(StippleEvent::RunStarted { .. })));
        assert!(matches!(events.last(), Some(StippleEvent::Done(_))));

        let progress: Vec<(u32, f64)> = events
            .iter()
            .filter_map(|e| match e {
                StippleEvent::Progress(s) => Some((s.iteration, s.progress)),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len() as u32, result.iterations);
        for (i, (iteration, pct)) in progress.iter().enumerate() {
            assert_eq!(*iteration, i as u32 + 1);
            assert!(*pct <= 100.0);
        }

        let done = events
            .iter()
            .filter(|e| matches!(e, StippleEvent::Done(_)))
            .count();
        assert_eq!(done, 1);
    }

    #[test]
    fn same_seed_gives_identical_runs() {
        let field = uniform_field(14);
        let engine = StippleEngine::try_new(
            StippleConfig::new()
                .with_initial_stipple_radius(1.2)
                .with_max_iterations(10),
        )
        .unwrap();

        let mut sink_a = VecSink::new();
        let mut sink_b = VecSink::new();
        let a = engine.run_with_events(&field, &mut StdRng::seed_from_u64(7), &mut sink_a);
        let b = engine.run_with_events(&field, &mut StdRng::seed_from_u64(7), &mut sink_b);
        assert_eq!(a, b);
        let snaps_a: Vec<&Snapshot> = sink_a.snapshots().collect();
        let snaps_b: Vec<&Snapshot> = sink_b.snapshots().collect();
        assert_eq!(snaps_a, snaps_b);
    }

    #[test]
    fn step_after_convergence_is_a_no_op() {
        let field = uniform_field(8);
        let engine = StippleEngine::try_new(
            StippleConfig::new()
                .with_initial_stipple_radius(1.0)
                .with_max_iterations(1),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let mut run = engine.start(&field, &mut rng, &mut ());
        run.step(&mut rng, &mut ());
        assert!(matches!(run.state(), EngineState::Converged(_)));
        let before = run.stipples().to_vec();
        run.step(&mut rng, &mut ());
        assert_eq!(run.iteration(), 1);
        assert_eq!(run.stipples(), &before[..]);
    }

    #[test]
    fn custom_sampler_seeds_population() {
        let field = uniform_field(10);
        let engine = StippleEngine::try_new(
            StippleConfig::new()
                .with_initial_stipple_radius(1.0)
                .with_max_iterations(0),
        )
        .unwrap()
        .with_sampler(JitterGridSampling::new(0.0));
        let result = engine.run(&field, &mut StdRng::seed_from_u64(1));
        let expected = engine.config().initial_count(10, 10);
        assert!(!result.stipples.is_empty());
        assert!(result.stipples.len() <= expected);
    }

    #[test]
    fn run_stippling_validates_first() {
        let field = uniform_field(4);
        let mut rng = StdRng::seed_from_u64(0);
        let bad = StippleConfig::new().with_initial_stipple_radius(-2.0);
        assert!(run_stippling(&field, bad, &mut rng, None).is_err());
        let tiny = StippleConfig::new().with_initial_stipple_radius(1e-9);
        assert!(matches!(
            run_stippling(&field, tiny, &mut rng, None),
            Err(Error::InvalidConfig(_))
        ));
        let ok = StippleConfig::new()
            .with_initial_stipple_radius(1.0)
            .with_max_iterations(3);
        let result = run_stippling(&field, ok, &mut rng, None).unwrap();
        assert!(!result.stipples.is_empty());
        assert!(result.iterations <= 3);
    }
}
