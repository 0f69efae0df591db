//! Normalised density grids: the only input the stippling engine needs.
//!
//! A [`DensityField`] is built once from raw samples (any non-negative source: a
//! sampled raster, image luminance, a synthetic function), min-max normalised into
//! `[0, 1]`, and is immutable afterwards. Sample `(ix, iy)` covers the unit square
//! `[ix, ix + 1) x [iy, iy + 1)` of the domain `[0, W] x [0, H]`.
use glam::DVec2;
use tracing::warn;

use crate::error::{Error, Result};
use crate::geometry::polygon::{bounding_box, contains, Bounds, BOUNDARY_EPSILON};

pub mod banding;
pub mod sources;

/// Immutable, normalised 2D scalar grid in row-major order.
///
/// With the `serde` feature the wire form is `{ width, height, samples }`, and
/// deserialising goes through [`DensityField::new`], so transported fields are
/// validated and normalised like any other.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawDensityField", into = "RawDensityField")
)]
pub struct DensityField {
    width: usize,
    height: usize,
    data: Vec<f32>,
    degenerate: bool,
}

impl DensityField {
    /// Builds a field from `width * height` row-major samples and normalises it.
    ///
    /// A constant grid (max equals min) becomes all zeros rather than NaN.
    pub fn new(width: usize, height: usize, samples: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidField(format!(
                "dimensions must be > 0, got {width}x{height}"
            )));
        }
        let expected = width.checked_mul(height).ok_or_else(|| {
            Error::InvalidField(format!("dimensions {width}x{height} overflow"))
        })?;
        if samples.len() != expected {
            return Err(Error::InvalidField(format!(
                "expected {expected} samples for {width}x{height}, got {}",
                samples.len()
            )));
        }
        if let Some(i) = samples.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidField(format!(
                "sample {i} is not finite ({})",
                samples[i]
            )));
        }

        let mut data = samples;
        let degenerate = normalize(&mut data);
        if degenerate {
            warn!(
                "Density field {}x{} is constant; treating it as all-zero.",
                width, height
            );
        }
        Ok(Self {
            width,
            height,
            data,
            degenerate,
        })
    }

    /// Builds a field from rows of equal length (`rows[y][x]`).
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(Error::InvalidField(format!(
                    "row {y} has {} samples, expected {width}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Self::new(width, height, data)
    }

    /// Builds a field by evaluating `f(x, y)` at every lattice point.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> f32,
    ) -> Result<Self> {
        let mut data = Vec::with_capacity(width.saturating_mul(height));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self::new(width, height, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Domain size `(W, H)` in field units.
    pub fn extent(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_extent(self.extent())
    }

    /// Normalised samples in row-major order.
    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    /// `true` when the raw input was constant and the field was zero-filled.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Sample at integer lattice coordinates.
    pub fn get(&self, ix: usize, iy: usize) -> Option<f32> {
        if ix >= self.width || iy >= self.height {
            return None;
        }
        Some(self.data[iy * self.width + ix])
    }

    /// Sample at `(floor(x), floor(y))`, clamped to the grid.
    ///
    /// Callers must stay within `[0, W] x [0, H]`; anything outside is a bug
    /// upstream (polygons are clipped to the field bounds before integration).
    pub fn density_at(&self, x: f64, y: f64) -> f32 {
        debug_assert!(
            x.is_finite() && y.is_finite(),
            "density_at called with non-finite coordinates ({x}, {y})"
        );
        debug_assert!(
            (0.0..=self.width as f64).contains(&x) && (0.0..=self.height as f64).contains(&y),
            "density_at({x}, {y}) outside field {}x{}",
            self.width,
            self.height
        );
        let ix = (x.floor().max(0.0) as usize).min(self.width - 1);
        let iy = (y.floor().max(0.0) as usize).min(self.height - 1);
        self.data[iy * self.width + ix]
    }

    /// Sum of samples at integer lattice points `(x, y)` inside `polygon`.
    ///
    /// Only the polygon's bounding box (intersected with the grid) is scanned. Points
    /// on the polygon boundary count as inside. Polygons with fewer than three
    /// vertices carry no mass.
    pub fn mass_in_polygon(&self, polygon: &[DVec2]) -> f64 {
        if polygon.len() < 3 {
            return 0.0;
        }
        let Some(bb) = bounding_box(polygon) else {
            return 0.0;
        };
        // Widen by the boundary tolerance so lattice points on an edge are scanned.
        let max_x = (self.width - 1) as f64;
        let max_y = (self.height - 1) as f64;
        let x0 = (bb.min.x - BOUNDARY_EPSILON).ceil().max(0.0);
        let y0 = (bb.min.y - BOUNDARY_EPSILON).ceil().max(0.0);
        let x1 = (bb.max.x + BOUNDARY_EPSILON).floor().min(max_x);
        let y1 = (bb.max.y + BOUNDARY_EPSILON).floor().min(max_y);
        if x0 > x1 || y0 > y1 {
            return 0.0;
        }
        let (x0, y0, x1, y1) = (x0 as usize, y0 as usize, x1 as usize, y1 as usize);

        let mut sum = 0.0f64;
        for iy in y0..=y1 {
            let row = &self.data[iy * self.width..(iy + 1) * self.width];
            for ix in x0..=x1 {
                if contains(polygon, DVec2::new(ix as f64, iy as f64)) {
                    sum += row[ix] as f64;
                }
            }
        }
        sum
    }

    /// Sum of all samples.
    pub fn total_mass(&self) -> f64 {
        self.data.iter().map(|v| *v as f64).sum()
    }
}

/// Serialised form of a [`DensityField`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawDensityField {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

#[cfg(feature = "serde")]
impl From<DensityField> for RawDensityField {
    fn from(field: DensityField) -> Self {
        Self {
            width: field.width,
            height: field.height,
            samples: field.data,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<RawDensityField> for DensityField {
    type Error = Error;

    fn try_from(raw: RawDensityField) -> Result<Self> {
        DensityField::new(raw.width, raw.height, raw.samples)
    }
}

/// Min-max normalises `data` in place. Returns `true` (and zero-fills) when
/// every value is equal.
pub(crate) fn normalize(data: &mut [f32]) -> bool {
    let (min, max) = data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let range = max - min;
    if !(range > 0.0 && range.is_finite()) {
        data.iter_mut().for_each(|v| *v = 0.0);
        return true;
    }
    for v in data.iter_mut() {
        *v = ((*v - min) / range).clamp(0.0, 1.0);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_into_unit_range() {
        let field = DensityField::new(2, 2, vec![2.0, 4.0, 6.0, 10.0]).unwrap();
        assert_eq!(field.samples(), &[0.0, 0.25, 0.5, 1.0]);
        assert!(!field.is_degenerate());
    }

    #[test]
    fn constant_field_becomes_zero() {
        let field = DensityField::new(3, 2, vec![7.0; 6]).unwrap();
        assert!(field.samples().iter().all(|v| *v == 0.0));
        assert!(field.is_degenerate());
    }

    #[test]
    fn new_rejects_bad_shapes_and_values() {
        assert!(matches!(
            DensityField::new(0, 2, vec![]),
            Err(Error::InvalidField(_))
        ));
        assert!(matches!(
            DensityField::new(2, 2, vec![1.0; 3]),
            Err(Error::InvalidField(_))
        ));
        assert!(matches!(
            DensityField::new(1, 2, vec![1.0, f32::NAN]),
            Err(Error::InvalidField(_))
        ));
    }

    #[test]
    fn from_rows_is_row_major() {
        let field = DensityField::from_rows(&[vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]]).unwrap();
        assert_eq!(field.width(), 3);
        assert_eq!(field.height(), 2);
        assert_eq!(field.get(2, 0), Some(0.4));
        assert_eq!(field.get(0, 1), Some(0.6));
        assert_eq!(field.get(3, 0), None);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = DensityField::from_rows(&[vec![0.0, 1.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidField(_)));
    }

    #[test]
    fn density_at_floors_and_clamps_far_edge() {
        let field = DensityField::from_fn(2, 2, |x, y| (x + 2 * y) as f32).unwrap();
        assert_eq!(field.density_at(0.9, 0.9), 0.0);
        assert_eq!(field.density_at(1.2, 0.0), field.get(1, 0).unwrap());
        assert_eq!(field.density_at(2.0, 2.0), 1.0);
    }

    #[test]
    fn full_domain_polygon_holds_total_mass() {
        let field = DensityField::from_fn(5, 4, |x, y| ((x * 7 + y * 3) % 5) as f32).unwrap();
        let mass = field.mass_in_polygon(&field.bounds().to_polygon());
        assert!((mass - field.total_mass()).abs() < 1e-9);
    }

    #[test]
    fn mass_counts_only_enclosed_lattice_points() {
        let field = DensityField::new(4, 4, {
            let mut v = vec![0.0; 16];
            v[5] = 1.0; // (1, 1)
            v[15] = 1.0; // (3, 3)
            v
        })
        .unwrap();
        let around_first = vec![
            DVec2::new(0.5, 0.5),
            DVec2::new(1.5, 0.5),
            DVec2::new(1.5, 1.5),
            DVec2::new(0.5, 1.5),
        ];
        assert_eq!(field.mass_in_polygon(&around_first), 1.0);
        // (1, 1) lies exactly on this polygon's left edge.
        let touching = vec![
            DVec2::new(1.0, 0.0),
            DVec2::new(3.0, 0.0),
            DVec2::new(3.0, 2.5),
            DVec2::new(1.0, 2.5),
        ];
        assert_eq!(field.mass_in_polygon(&touching), 1.0);
    }

    #[test]
    fn degenerate_polygons_have_no_mass() {
        let field = DensityField::new(2, 2, vec![1.0, 1.0, 1.0, 0.0]).unwrap();
        assert_eq!(field.mass_in_polygon(&[]), 0.0);
        assert_eq!(field.mass_in_polygon(&[DVec2::new(0.0, 0.0)]), 0.0);
        assert_eq!(
            field.mass_in_polygon(&[DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0)]),
            0.0
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialising_validates_and_normalises() {
        let short = r#"{"width":4,"height":4,"samples":[5.0,-3.0]}"#;
        assert!(serde_json::from_str::<DensityField>(short).is_err());

        let zero_width = r#"{"width":0,"height":2,"samples":[]}"#;
        assert!(serde_json::from_str::<DensityField>(zero_width).is_err());

        let raw = r#"{"width":2,"height":1,"samples":[-3.0,5.0]}"#;
        let field: DensityField = serde_json::from_str(raw).unwrap();
        assert_eq!(field.samples(), &[0.0, 1.0]);
        assert_eq!(field.mass_in_polygon(&field.bounds().to_polygon()), 1.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serialised_field_round_trips() {
        let field = DensityField::from_fn(3, 2, |x, y| (x + 3 * y) as f32).unwrap();
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["width"], 3);
        assert!(json.get("degenerate").is_none());
        let back: DensityField = serde_json::from_value(json).unwrap();
        assert_eq!(back, field);

        let flat = DensityField::new(2, 2, vec![4.0; 4]).unwrap();
        let back: DensityField =
            serde_json::from_str(&serde_json::to_string(&flat).unwrap()).unwrap();
        assert!(back.is_degenerate());
    }

    #[test]
    fn polygon_outside_grid_has_no_mass() {
        let field = DensityField::new(2, 2, vec![1.0, 1.0, 1.0, 0.0]).unwrap();
        let far = Bounds::new(DVec2::new(10.0, 10.0), DVec2::new(12.0, 12.0)).to_polygon();
        assert_eq!(field.mass_in_polygon(&far), 0.0);
    }
}
