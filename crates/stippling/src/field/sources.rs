//! Ready-made density sources: synthetic test functions and RGBA pixel buffers.
//!
//! Every source produces raw samples and hands them to [`DensityField::new`], so the
//! result is normalised like any other field.
use std::f64::consts::TAU;

use crate::error::{Error, Result};
use crate::field::DensityField;

/// Maps one RGBA pixel to a raw density sample.
pub type ColorMapping = fn(r: u8, g: u8, b: u8, a: u8) -> f32;

/// Rec. 601 luma, rounded to an integer level in `0..=255`.
pub fn grayscale(r: u8, g: u8, b: u8, _a: u8) -> f32 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round()
}

/// Inverted luma: dark pixels attract stipples, the usual choice for ink on paper.
pub fn inverted_grayscale(r: u8, g: u8, b: u8, a: u8) -> f32 {
    255.0 - grayscale(r, g, b, a)
}

/// Builds a field from a tightly packed RGBA8 buffer (`width * height * 4` bytes).
pub fn from_rgba(
    width: usize,
    height: usize,
    rgba: &[u8],
    mapping: ColorMapping,
) -> Result<DensityField> {
    let expected = width.saturating_mul(height).saturating_mul(4);
    if rgba.len() != expected {
        return Err(Error::InvalidField(format!(
            "expected {expected} RGBA bytes for {width}x{height}, got {}",
            rgba.len()
        )));
    }
    let samples = rgba
        .chunks_exact(4)
        .map(|px| mapping(px[0], px[1], px[2], px[3]))
        .collect();
    DensityField::new(width, height, samples)
}

/// Left-to-right ramp: `100 * x / W`.
pub fn linear_gradient(width: usize, height: usize) -> Result<DensityField> {
    DensityField::from_fn(width, height, |x, _| (x as f64 / width as f64 * 100.0) as f32)
}

fn scaled(x: usize, y: usize, width: usize, height: usize) -> (f64, f64) {
    (
        x as f64 / width as f64 * 100.0,
        y as f64 / height as f64 * 100.0,
    )
}

/// Rastrigin function over `[0, 100)^2`.
pub fn rastrigin(width: usize, height: usize) -> Result<DensityField> {
    DensityField::from_fn(width, height, |x, y| {
        let (xs, ys) = scaled(x, y, width, height);
        (20.0 + xs * xs - 10.0 * (TAU * xs).cos() + ys * ys - 10.0 * (TAU * ys).cos()) as f32
    })
}

/// Simplified egg-holder-style bowl with cosine ripples over `[0, 100)^2`.
pub fn eggholder(width: usize, height: usize) -> Result<DensityField> {
    DensityField::from_fn(width, height, |x, y| {
        let (xs, ys) = scaled(x, y, width, height);
        (20.0 + xs * xs + ys * ys - 10.0 * ((TAU * xs).cos() + (TAU * ys).cos())) as f32
    })
}

/// A single hot sample at `(hx, hy)` on an otherwise empty grid.
pub fn hot_spot(width: usize, height: usize, hx: usize, hy: usize) -> Result<DensityField> {
    DensityField::from_fn(width, height, |x, y| if x == hx && y == hy { 1.0 } else { 0.0 })
}
