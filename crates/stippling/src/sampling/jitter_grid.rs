//! Jittered-grid position sampling strategy.
//!
//! Stratifies the initial population: one point per grid cell, offset by a random
//! fraction of the cell. Starting closer to an even spread usually saves a few
//! relaxation steps compared to i.i.d. seeding.
use glam::DVec2;
use mint::Vector2;
use rand::Rng;

use crate::sampling::{next_down, rand01, PositionSampling};

/// Jittered grid sampling sized to the requested count.
#[derive(Debug, Clone, Copy)]
pub struct JitterGridSampling {
    /// Jitter amount in [0, 1], where 0 is grid centers and 1 is max jitter.
    pub jitter: f64,
}

impl JitterGridSampling {
    /// Create a new JitterGridSampling with specified jitter (0.0 to 1.0).
    pub fn new(jitter: f64) -> Self {
        Self {
            jitter: jitter.clamp(0.0, 1.0),
        }
    }
}

impl Default for JitterGridSampling {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PositionSampling for JitterGridSampling {
    fn generate(
        &self,
        count: usize,
        domain_extent: Vector2<f64>,
        rng: &mut dyn Rng,
    ) -> Vec<Vector2<f64>> {
        let extent = DVec2::from(domain_extent);
        if count == 0 || extent.x <= 0.0 || extent.y <= 0.0 {
            return Vec::new();
        }

        // Square-ish cells whose count is closest to `count` without exceeding it.
        let cell = (extent.x * extent.y / count as f64).sqrt();
        let cols = ((extent.x / cell).round() as usize).max(1);
        let rows = (count / cols).max(1);

        let cell_w = extent.x / cols as f64;
        let cell_h = extent.y / rows as f64;
        let max_x = next_down(extent.x);
        let max_y = next_down(extent.y);

        let mut points = Vec::with_capacity(cols * rows);
        for j in 0..rows {
            for i in 0..cols {
                if points.len() == count {
                    return points;
                }
                let cx = (i as f64 + 0.5) * cell_w;
                let cy = (j as f64 + 0.5) * cell_h;
                let jx = (rand01(rng) * 2.0 - 1.0) * self.jitter * cell_w * 0.5;
                let jy = (rand01(rng) * 2.0 - 1.0) * self.jitter * cell_h * 0.5;
                let px = (cx + jx).clamp(0.0, max_x);
                let py = (cy + jy).clamp(0.0, max_y);
                points.push(DVec2::new(px, py).into());
            }
        }

        points
    }
}
