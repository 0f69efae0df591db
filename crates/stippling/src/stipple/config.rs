//! Run parameters for the stippling engine.
use std::f64::consts::PI;

use crate::error::{Error, Result};

/// Fraction of the domain covered by the initial population's target cells.
pub const INITIAL_COVERAGE: f64 = 0.7;

/// Largest initial population a run may start from (2^24 stipples).
pub const MAX_INITIAL_STIPPLES: usize = 1 << 24;

/// Configuration for a stippling run.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct StippleConfig {
    /// Radius `r0` defining the target cell mass `A = pi * r0^2`.
    pub initial_stipple_radius: f64,
    /// Half-width of the keep band around `A` at the first step.
    pub initial_error_threshold: f64,
    /// Amount added to the error threshold after every step.
    pub convergence_rate: f64,
    /// Upper bound on relaxation steps. Zero returns the initial population.
    pub max_iterations: u32,
    /// Seed for runs that own their random source (the worker). `None` draws one
    /// from the thread-local generator.
    pub seed: Option<u64>,
}

impl Default for StippleConfig {
    fn default() -> Self {
        Self {
            initial_stipple_radius: 2.0,
            initial_error_threshold: 0.0,
            convergence_rate: 0.01,
            max_iterations: 100,
            seed: None,
        }
    }
}

impl StippleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_stipple_radius(mut self, radius: f64) -> Self {
        self.initial_stipple_radius = radius;
        self
    }

    pub fn with_initial_error_threshold(mut self, threshold: f64) -> Self {
        self.initial_error_threshold = threshold;
        self
    }

    pub fn with_convergence_rate(mut self, rate: f64) -> Self {
        self.convergence_rate = rate;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Target density mass per stipple, `pi * r0^2`.
    pub fn target_area(&self) -> f64 {
        PI * self.initial_stipple_radius * self.initial_stipple_radius
    }

    /// Error threshold in effect after `iterations` completed steps.
    pub fn error_threshold_after(&self, iterations: u32) -> f64 {
        self.initial_error_threshold + iterations as f64 * self.convergence_rate
    }

    fn estimated_count(&self, width: usize, height: usize) -> f64 {
        (INITIAL_COVERAGE * width as f64 * height as f64 / self.target_area()).round()
    }

    /// Initial population for a `width x height` field: `round(0.7 * W * H / A)`,
    /// at least one and at most [`MAX_INITIAL_STIPPLES`].
    pub fn initial_count(&self, width: usize, height: usize) -> usize {
        let n = self.estimated_count(width, height);
        if n >= MAX_INITIAL_STIPPLES as f64 {
            MAX_INITIAL_STIPPLES
        } else if n >= 1.0 {
            n as usize
        } else {
            1
        }
    }

    /// [`validate`](Self::validate) plus a check that the initial population for a
    /// `width x height` field stays within [`MAX_INITIAL_STIPPLES`].
    pub fn validate_for(&self, width: usize, height: usize) -> Result<()> {
        self.validate()?;
        let n = self.estimated_count(width, height);
        if n > MAX_INITIAL_STIPPLES as f64 {
            return Err(Error::InvalidConfig(format!(
                "initial_stipple_radius {} on a {}x{} field needs {:.0} initial stipples, limit is {}",
                self.initial_stipple_radius, width, height, n, MAX_INITIAL_STIPPLES
            )));
        }
        Ok(())
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.initial_stipple_radius.is_finite() || self.initial_stipple_radius <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "initial_stipple_radius must be finite and > 0, got {}",
                self.initial_stipple_radius
            )));
        }
        if !self.target_area().is_finite() {
            return Err(Error::InvalidConfig(
                "initial_stipple_radius is too large".into(),
            ));
        }
        if !self.initial_error_threshold.is_finite() {
            return Err(Error::InvalidConfig(
                "initial_error_threshold must be finite".into(),
            ));
        }
        if !self.convergence_rate.is_finite() {
            return Err(Error::InvalidConfig(
                "convergence_rate must be finite".into(),
            ));
        }
        Ok(())
    }
}
