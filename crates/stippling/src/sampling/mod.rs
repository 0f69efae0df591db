//! Sampling strategies for the initial stipple population.
//!
//! Strategies place points in the domain `[0, W) x [0, H)` before the first
//! relaxation step. The engine defaults to [`UniformRandomSampling`].
use mint::Vector2;
use rand::Rng;

pub mod jitter_grid;
pub mod uniform_random;

pub use jitter_grid::JitterGridSampling;
pub use uniform_random::UniformRandomSampling;

/// Trait for position sampling over `[0, extent.x) x [0, extent.y)`.
pub trait PositionSampling: Send + Sync {
    /// Generates up to `count` positions. Strategies with a fixed layout may
    /// return fewer.
    fn generate(
        &self,
        count: usize,
        domain_extent: Vector2<f64>,
        rng: &mut dyn Rng,
    ) -> Vec<Vector2<f64>>;
}

/// Generate a random float in the range [0, 1).
#[inline]
pub(crate) fn rand01(rng: &mut dyn Rng) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Compute the next smaller representable float value.
///
/// Returns a value that is strictly less than the input, useful for
/// ensuring bounds are strictly inside a domain.
#[inline]
pub(crate) fn next_down(val: f64) -> f64 {
    if val.is_nan() {
        return f64::NAN;
    }

    if val == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }

    if val == f64::INFINITY {
        return f64::MAX;
    }

    if val == 0.0 {
        return -f64::MIN_POSITIVE;
    }

    let bits = val.to_bits();
    if val > 0.0 {
        f64::from_bits(bits.saturating_sub(1))
    } else {
        f64::from_bits(bits.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRng {
        value: u64,
    }

    impl rand::TryRng for FixedRng {
        type Error = std::convert::Infallible;

        fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
            Ok(self.value as u32)
        }

        fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
            Ok(self.value)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Self::Error> {
            let bytes = self.value.to_le_bytes();
            for (i, b) in dest.iter_mut().enumerate() {
                *b = bytes[i % 8];
            }
            Ok(())
        }
    }

    #[test]
    fn rand01_returns_zero_for_zero_input() {
        let mut rng = FixedRng { value: 0 };
        assert_eq!(rand01(&mut rng), 0.0);
    }

    #[test]
    fn rand01_stays_below_one() {
        let mut rng = FixedRng { value: u64::MAX };
        let result = rand01(&mut rng);
        assert!(result < 1.0);
        assert!(result > 0.999_999);
    }

    #[test]
    fn rand01_midpoint() {
        let mut rng = FixedRng {
            value: u64::MAX / 2,
        };
        assert!((rand01(&mut rng) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn next_down_handles_edge_cases() {
        assert!(next_down(1.0) < 1.0);
        assert!(next_down(0.5) < 0.5);

        let down_min_pos = next_down(f64::MIN_POSITIVE);
        assert!(down_min_pos >= 0.0);
        assert!(down_min_pos < f64::MIN_POSITIVE);

        assert_eq!(next_down(0.0), -f64::MIN_POSITIVE);
        assert!(next_down(-1.0) < -1.0);

        assert_eq!(next_down(f64::INFINITY), f64::MAX);
        assert_eq!(next_down(f64::NEG_INFINITY), f64::NEG_INFINITY);
        assert!(next_down(f64::NAN).is_nan());
    }
}
