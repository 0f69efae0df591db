//! Tone quantisation and Mach-band emphasis for density fields.
//!
//! Mach banding quantises the field into flat tone steps, blurs the steps, and blends
//! the two. Stipples then cluster along step edges, which reads as sharper contrast.
use crate::error::{Error, Result};
use crate::field::DensityField;

/// Number of box-blur passes; three passes approximate a Gaussian.
const BLUR_PASSES: usize = 3;

/// Quantisation levels `[0, 1/n, 2/n, ..., (n-1)/n]`.
pub fn quantisation_levels(levels: usize) -> Vec<f32> {
    (0..levels).map(|i| i as f32 / levels as f32).collect()
}

/// Snaps `value` down to the last level not above it; values past the top level map to 1.
pub fn quantise(value: f32, levels: &[f32]) -> f32 {
    for (i, level) in levels.iter().enumerate() {
        if value < *level {
            return if i == 0 { 0.0 } else { levels[i - 1] };
        }
    }
    1.0
}

/// Separable box blur with clamped edges.
fn box_blur(data: &[f32], width: usize, height: usize, radius: usize) -> Vec<f32> {
    if radius == 0 {
        return data.to_vec();
    }
    let r = radius as isize;
    let norm = (2 * radius + 1) as f32;

    let mut horizontal = vec![0.0f32; data.len()];
    for y in 0..height {
        let row = &data[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0;
            for dx in -r..=r {
                let sx = (x as isize + dx).clamp(0, width as isize - 1) as usize;
                acc += row[sx];
            }
            horizontal[y * width + x] = acc / norm;
        }
    }

    let mut out = vec![0.0f32; data.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for dy in -r..=r {
                let sy = (y as isize + dy).clamp(0, height as isize - 1) as usize;
                acc += horizontal[sy * width + x];
            }
            out[y * width + x] = acc / norm;
        }
    }
    out
}

fn check_levels(levels: usize) -> Result<()> {
    if levels == 0 {
        return Err(Error::InvalidConfig("quantisation needs at least one level".into()));
    }
    Ok(())
}

impl DensityField {
    /// Field with every sample quantised to `levels` tone steps.
    pub fn quantize(&self, levels: usize) -> Result<DensityField> {
        check_levels(levels)?;
        let q = quantisation_levels(levels);
        let data = self.samples().iter().map(|v| quantise(*v, &q)).collect();
        DensityField::new(self.width(), self.height(), data)
    }

    /// Mach-banded copy: `weight * blur(quantised) + (1 - weight) * quantised`, clamped
    /// to `[0, 1]` and renormalised.
    pub fn mach_banding(
        &self,
        levels: usize,
        weight: f32,
        blur_radius: usize,
    ) -> Result<DensityField> {
        check_levels(levels)?;
        let q = quantisation_levels(levels);
        let quantised: Vec<f32> = self.samples().iter().map(|v| quantise(*v, &q)).collect();

        let mut blurred = quantised.clone();
        for _ in 0..BLUR_PASSES {
            blurred = box_blur(&blurred, self.width(), self.height(), blur_radius);
        }

        let banded = blurred
            .iter()
            .zip(&quantised)
            .map(|(b, q)| (weight * b + (1.0 - weight) * q).clamp(0.0, 1.0))
            .collect();
        DensityField::new(self.width(), self.height(), banded)
    }
}
