//! One adaptive relaxation step over a stipple population.
//!
//! Each stipple's Voronoi cell is weighed by the density it encloses. Cells that are
//! too light lose their stipple, cells that are too heavy are split in two, and the
//! rest move their stipple to the cell centroid (a Lloyd step). The previous
//! generation is only read; the next one is built from scratch.
use glam::DVec2;
use rand::Rng;
use tracing::{debug, warn};

use crate::field::DensityField;
use crate::geometry::{centroid, Tessellation};
use crate::sampling::{PositionSampling, UniformRandomSampling};
use crate::stipple::Stipple;

/// Mass band for one step: `[target_area - error_threshold, target_area + error_threshold]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub delete: f64,
    pub split: f64,
}

impl Thresholds {
    pub fn new(target_area: f64, error_threshold: f64) -> Self {
        Self {
            delete: target_area - error_threshold,
            split: target_area + error_threshold,
        }
    }
}

/// Outcome of classifying one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellAction {
    Delete,
    Split(DVec2, DVec2),
    Keep(DVec2),
}

/// Counters for a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IterationStats {
    pub kept: usize,
    pub split: usize,
    pub deleted: usize,
    /// Stipples whose cell could not be built and were weighed as a single point.
    pub missing_cells: usize,
    /// Whether the population collapsed and a fresh stipple was injected.
    pub injected: bool,
}

/// Next population produced by [`relax`].
#[derive(Debug, Clone)]
pub struct Generation {
    pub stipples: Vec<Stipple>,
    /// Any split or deletion happened.
    pub changed: bool,
    pub stats: IterationStats,
}

/// Splits a cell into two child positions.
///
/// Finds the vertices farthest and second-farthest from the centroid in one scan
/// (earlier vertices win ties) and places a child halfway towards each.
pub fn split_cell(polygon: &[DVec2]) -> (DVec2, DVec2) {
    let c = centroid(polygon).unwrap_or(DVec2::ZERO);
    let mut largest = (DVec2::ZERO, 0.0f64);
    let mut second = (DVec2::ZERO, 0.0f64);
    for p in polygon {
        let dir = *p - c;
        let d = dir.length_squared();
        if d > largest.1 {
            second = largest;
            largest = (dir, d);
        } else if d > second.1 {
            second = (dir, d);
        }
    }
    (c + largest.0 * 0.5, c + second.0 * 0.5)
}

/// Decides what happens to a cell holding `mass`.
pub fn classify(polygon: &[DVec2], mass: f64, thresholds: Thresholds) -> CellAction {
    if mass < thresholds.delete {
        CellAction::Delete
    } else if mass > thresholds.split {
        let (a, b) = split_cell(polygon);
        CellAction::Split(a, b)
    } else {
        CellAction::Keep(centroid(polygon).unwrap_or(DVec2::ZERO))
    }
}

/// Runs one relaxation step of `stipples` over `field`.
///
/// `rng` is only drawn from when every stipple gets deleted: the population is then
/// reseeded with one uniformly random stipple so it never becomes empty.
pub fn relax(
    stipples: &[Stipple],
    field: &DensityField,
    thresholds: Thresholds,
    rng: &mut dyn Rng,
) -> Generation {
    let sites: Vec<DVec2> = stipples.iter().map(|s| s.position).collect();
    let tessellation = Tessellation::new(&sites, field.bounds());

    let mut stats = IterationStats::default();
    let mut next = Vec::with_capacity(stipples.len() + stipples.len() / 4);

    for (i, stipple) in stipples.iter().enumerate() {
        let polygon = tessellation.cell_or_point(i);
        if polygon.len() < 3 {
            debug!(
                "No Voronoi cell for stipple {} at {:?}; weighing it as a point.",
                i, stipple.position
            );
            stats.missing_cells += 1;
        }
        let mass = field.mass_in_polygon(&polygon);

        match classify(&polygon, mass, thresholds) {
            CellAction::Delete => stats.deleted += 1,
            CellAction::Split(a, b) => {
                stats.split += 1;
                next.push(Stipple::new(a));
                next.push(Stipple::new(b));
            }
            CellAction::Keep(c) => {
                stats.kept += 1;
                next.push(Stipple {
                    position: c,
                    density: mass,
                    ..*stipple
                });
            }
        }
    }

    if stats.missing_cells > 0 {
        warn!(
            "{} of {} stipples had no Voronoi cell this step.",
            stats.missing_cells,
            stipples.len()
        );
    }

    if next.is_empty() {
        warn!("Every stipple was deleted; injecting one random stipple.");
        next.extend(
            UniformRandomSampling::new()
                .generate(1, field.extent().into(), rng)
                .into_iter()
                .map(|p| Stipple::new(DVec2::from(p))),
        );
        stats.injected = true;
    }

    Generation {
        stipples: next,
        changed: stats.split > 0 || stats.deleted > 0,
        stats,
    }
}
