//! Uniform random position sampling strategy.
use glam::DVec2;
use mint::Vector2;
use rand::Rng;

use crate::sampling::{next_down, rand01, PositionSampling};

/// Uniform i.i.d. random sampling over a rectangular domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformRandomSampling;

impl UniformRandomSampling {
    pub fn new() -> Self {
        Self
    }
}

impl PositionSampling for UniformRandomSampling {
    fn generate(
        &self,
        count: usize,
        domain_extent: Vector2<f64>,
        rng: &mut dyn Rng,
    ) -> Vec<Vector2<f64>> {
        let w = domain_extent.x;
        let h = domain_extent.y;

        if count == 0 || w <= 0.0 || h <= 0.0 {
            return Vec::new();
        }

        // Next representable floats below the right/top edges to enforce strict < comparisons
        let max_x = next_down(w);
        let max_y = next_down(h);

        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let x = (rand01(rng) * w).clamp(0.0, max_x);
            let y = (rand01(rng) * h).clamp(0.0, max_y);
            out.push(DVec2::new(x, y).into());
        }

        out
    }
}
