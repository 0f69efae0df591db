//! Stipple population, relaxation, and the convergence engine.
//!
//! - [`relax`]: one adaptive Lloyd step (assign mass, delete, split, move to centroid)
//! - [`runner`]: the convergence loop driving relaxation steps to a final population
//! - [`config`]: run parameters and their validation
//! - [`events`]: progress snapshots and sinks for observing a run
use glam::DVec2;

pub mod config;
pub mod events;
pub mod relax;
pub mod runner;

/// Density assigned to freshly created stipples before their first mass assignment.
pub const DEFAULT_DENSITY: f64 = 0.5;

/// Cosmetic radius carried by every stipple for renderers.
pub const DEFAULT_RADIUS: f64 = 0.5;

/// One placed point.
///
/// While the engine runs, `density` holds the density mass of the stipple's cell from
/// the latest step. Snapshots and final results carry normalised copies where
/// `density` is in `[0, 1]` and `relative_position` is `(x / W, y / H)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stipple {
    /// Position in field coordinates, within `[0, W] x [0, H]`.
    pub position: DVec2,
    pub density: f64,
    pub radius: f64,
    pub relative_position: DVec2,
}

impl Stipple {
    pub fn new(position: DVec2) -> Self {
        Self {
            position,
            density: DEFAULT_DENSITY,
            radius: DEFAULT_RADIUS,
            relative_position: DVec2::ZERO,
        }
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }
}

/// Normalised copies of `stipples`: densities min-max scaled into `[0, 1]` (all zero
/// when every density is equal) and relative positions filled in.
pub fn normalize_stipples(stipples: &[Stipple], extent: DVec2) -> Vec<Stipple> {
    let (min, max) = stipples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.density), hi.max(s.density))
        });
    let range = max - min;
    let degenerate = !(range > 0.0 && range.is_finite());

    stipples
        .iter()
        .map(|s| Stipple {
            density: if degenerate {
                0.0
            } else {
                ((s.density - min) / range).clamp(0.0, 1.0)
            },
            relative_position: s.position / extent,
            ..*s
        })
        .collect()
}
