use std::path::Path;

use anyhow::Context;
use glam::DVec2;
use image::{Rgb, RgbImage};
use stippling::field::sources::{from_rgba, ColorMapping};
use stippling::field::DensityField;
use stippling::stipple::Stipple;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber honouring `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// How a stipple's normalised density maps to a dot.
#[derive(Debug, Clone, Copy)]
pub enum DotStyle {
    /// Every dot has the same pixel radius.
    Fixed { radius: f64 },
    /// Radius grows linearly from `min` (density 0) to `max` (density 1).
    ScaledByDensity { min: f64, max: f64 },
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub image_size: (u32, u32),
    /// Field extent `(W, H)` the stipples live in.
    pub domain_extent: DVec2,
    pub background: [u8; 3],
    pub ink: [u8; 3],
    pub dot: DotStyle,
}

impl RenderConfig {
    pub fn new(image_size: (u32, u32), domain_extent: DVec2) -> Self {
        Self {
            image_size,
            domain_extent,
            background: [250, 248, 240],
            ink: [20, 20, 20],
            dot: DotStyle::ScaledByDensity { min: 1.0, max: 3.0 },
        }
    }

    pub fn with_background(mut self, rgb: [u8; 3]) -> Self {
        self.background = rgb;
        self
    }

    pub fn with_ink(mut self, rgb: [u8; 3]) -> Self {
        self.ink = rgb;
        self
    }

    pub fn with_dot(mut self, dot: DotStyle) -> Self {
        self.dot = dot;
        self
    }

    fn to_pixels(&self, p: DVec2) -> DVec2 {
        let (w, h) = self.image_size;
        DVec2::new(
            p.x / self.domain_extent.x * w as f64,
            p.y / self.domain_extent.y * h as f64,
        )
    }

    fn radius_for(&self, density: f64) -> f64 {
        match self.dot {
            DotStyle::Fixed { radius } => radius,
            DotStyle::ScaledByDensity { min, max } => min + (max - min) * density.clamp(0.0, 1.0),
        }
    }
}

/// Draws `stipples` as filled dots and writes a PNG to `path`.
pub fn render_stipples_to_png(
    stipples: &[Stipple],
    config: &RenderConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let (w, h) = config.image_size;
    let mut img = RgbImage::from_pixel(w, h, Rgb(config.background));

    for stipple in stipples {
        let centre = config.to_pixels(stipple.position);
        let r = config.radius_for(stipple.density);
        fill_disk(&mut img, centre, r, Rgb(config.ink));
    }

    let path = path.as_ref();
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote {} stipples to {}.", stipples.len(), path.display());
    Ok(())
}

fn fill_disk(img: &mut RgbImage, centre: DVec2, radius: f64, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    let x0 = (centre.x - radius).floor().max(0.0) as u32;
    let y0 = (centre.y - radius).floor().max(0.0) as u32;
    let x1 = ((centre.x + radius).ceil().max(0.0) as u32).min(w.saturating_sub(1));
    let y1 = ((centre.y + radius).ceil().max(0.0) as u32).min(h.saturating_sub(1));
    let r2 = radius * radius;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = DVec2::new(x as f64 + 0.5, y as f64 + 0.5) - centre;
            if d.length_squared() <= r2 {
                img.put_pixel(x, y, color);
            }
        }
    }
}

/// Loads an image file into a density field, one sample per pixel.
pub fn load_density_image(
    path: impl AsRef<Path>,
    mapping: ColorMapping,
) -> anyhow::Result<DensityField> {
    let path = path.as_ref();
    let rgba = image::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .to_rgba8();
    let (w, h) = rgba.dimensions();
    let field = from_rgba(w as usize, h as usize, rgba.as_raw(), mapping)?;
    Ok(field)
}
