//! Bounded Voronoi tessellation over an ordered point set.
//!
//! A Delaunay triangulation ([`spade`]) supplies each site's natural neighbours; the
//! site's cell is the domain rectangle clipped by the perpendicular bisector towards
//! every neighbour. Cells are rebuilt from scratch whenever the sites move.
use std::collections::HashSet;

use glam::DVec2;
use spade::handles::FixedVertexHandle;
use spade::{DelaunayTriangulation, Point2, Triangulation};
use tracing::debug;

use crate::geometry::polygon::{clip_to_bisector, convex_hull, Bounds};

/// Voronoi cells of an ordered site list, clipped to a rectangle.
pub struct Tessellation {
    triangulation: DelaunayTriangulation<Point2<f64>>,
    handles: Vec<Option<FixedVertexHandle>>,
    sites: Vec<DVec2>,
    bounds: Bounds,
}

impl Tessellation {
    /// Triangulates `sites` in order.
    ///
    /// Sites that cannot be inserted (non-finite coordinates) and later duplicates of an
    /// already inserted position get no vertex and therefore no cell.
    pub fn new(sites: &[DVec2], bounds: Bounds) -> Self {
        let mut triangulation = DelaunayTriangulation::<Point2<f64>>::new();
        let mut claimed: HashSet<FixedVertexHandle> = HashSet::with_capacity(sites.len());
        let mut handles = Vec::with_capacity(sites.len());

        for (i, site) in sites.iter().enumerate() {
            if !site.is_finite() {
                debug!("Site {} at {:?} is not finite; no cell.", i, site);
                handles.push(None);
                continue;
            }
            match triangulation.insert(Point2::new(site.x, site.y)) {
                Ok(handle) if claimed.insert(handle) => handles.push(Some(handle)),
                Ok(_) => {
                    debug!("Site {} duplicates an earlier site at {:?}; no cell.", i, site);
                    handles.push(None);
                }
                Err(e) => {
                    debug!("Site {} at {:?} rejected by triangulation: {:?}.", i, site, e);
                    handles.push(None);
                }
            }
        }

        Self {
            triangulation,
            handles,
            sites: sites.to_vec(),
            bounds,
        }
    }

    /// Number of sites, including the ones without a cell.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn site(&self, index: usize) -> Option<DVec2> {
        self.sites.get(index).copied()
    }

    /// Cell polygon of site `index`: counter-clockwise, at least three vertices,
    /// clipped to the bounds. `None` when the site has no vertex or the clipped
    /// region has no area.
    pub fn cell_polygon(&self, index: usize) -> Option<Vec<DVec2>> {
        let handle = (*self.handles.get(index)?)?;
        let site = self.sites[index];

        let vertex = self.triangulation.vertex(handle);
        let mut neighbours: Vec<DVec2> = vertex
            .out_edges()
            .map(|edge| {
                let p = edge.to().position();
                DVec2::new(p.x, p.y)
            })
            .collect();
        if neighbours.is_empty() && self.triangulation.num_vertices() > 1 {
            // Degenerate triangulations may expose no adjacency; every other site
            // still bounds the cell.
            neighbours = self
                .handles
                .iter()
                .enumerate()
                .filter(|(j, h)| *j != index && h.is_some())
                .map(|(j, _)| self.sites[j])
                .collect();
        }

        let mut cell = self.bounds.to_polygon();
        for other in neighbours {
            cell = clip_to_bisector(&cell, site, other);
            if cell.len() < 3 {
                return None;
            }
        }

        let hull = convex_hull(&cell);
        (hull.len() >= 3).then_some(hull)
    }

    /// Cell polygon, or the single-vertex polygon `[site]` when no cell exists.
    pub fn cell_or_point(&self, index: usize) -> Vec<DVec2> {
        match self.cell_polygon(index) {
            Some(cell) => cell,
            None => self.site(index).map(|s| vec![s]).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon::{contains, signed_area};

    fn bounds(w: f64, h: f64) -> Bounds {
        Bounds::from_extent(DVec2::new(w, h))
    }

    #[test]
    fn single_site_owns_whole_domain() {
        let t = Tessellation::new(&[DVec2::new(1.0, 1.0)], bounds(4.0, 3.0));
        let cell = t.cell_polygon(0).expect("cell");
        assert!((signed_area(&cell) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn two_sites_split_domain_at_bisector() {
        let sites = [DVec2::new(1.0, 2.0), DVec2::new(3.0, 2.0)];
        let t = Tessellation::new(&sites, bounds(4.0, 4.0));
        let left = t.cell_polygon(0).unwrap();
        let right = t.cell_polygon(1).unwrap();
        assert!((signed_area(&left) - 8.0).abs() < 1e-9);
        assert!((signed_area(&right) - 8.0).abs() < 1e-9);
        assert!(left.iter().all(|p| p.x <= 2.0 + 1e-9));
        assert!(right.iter().all(|p| p.x >= 2.0 - 1e-9));
    }

    #[test]
    fn cells_partition_domain() {
        let sites = [
            DVec2::new(1.0, 1.0),
            DVec2::new(8.0, 1.5),
            DVec2::new(4.5, 5.0),
            DVec2::new(2.0, 8.0),
            DVec2::new(7.5, 8.5),
            DVec2::new(5.0, 2.5),
        ];
        let t = Tessellation::new(&sites, bounds(10.0, 10.0));
        let total: f64 = (0..sites.len())
            .map(|i| signed_area(&t.cell_polygon(i).unwrap()))
            .sum();
        assert!((total - 100.0).abs() < 1e-6);
    }

    #[test]
    fn cells_follow_nearest_site_rule() {
        let sites = [
            DVec2::new(1.0, 1.0),
            DVec2::new(8.0, 1.5),
            DVec2::new(4.5, 5.0),
            DVec2::new(2.0, 8.0),
            DVec2::new(7.5, 8.5),
        ];
        let t = Tessellation::new(&sites, bounds(10.0, 10.0));
        for probe in [
            DVec2::new(0.5, 0.5),
            DVec2::new(9.0, 2.0),
            DVec2::new(5.0, 5.5),
            DVec2::new(1.0, 9.0),
            DVec2::new(9.5, 9.5),
        ] {
            let nearest = sites
                .iter()
                .enumerate()
                .min_by(|a, b| {
                    a.1.distance_squared(probe)
                        .total_cmp(&b.1.distance_squared(probe))
                })
                .map(|(i, _)| i)
                .unwrap();
            assert!(contains(&t.cell_polygon(nearest).unwrap(), probe));
        }
    }

    #[test]
    fn duplicate_site_has_no_cell() {
        let sites = [DVec2::new(1.0, 1.0), DVec2::new(3.0, 3.0), DVec2::new(1.0, 1.0)];
        let t = Tessellation::new(&sites, bounds(4.0, 4.0));
        assert!(t.cell_polygon(0).is_some());
        assert!(t.cell_polygon(2).is_none());
        assert_eq!(t.cell_or_point(2), vec![DVec2::new(1.0, 1.0)]);
    }

    #[test]
    fn non_finite_site_has_no_cell() {
        let sites = [DVec2::new(1.0, 1.0), DVec2::new(f64::NAN, 2.0)];
        let t = Tessellation::new(&sites, bounds(4.0, 4.0));
        assert!(t.cell_polygon(1).is_none());
        let full = t.cell_polygon(0).unwrap();
        assert!((signed_area(&full) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn collinear_sites_still_get_cells() {
        let sites = [DVec2::new(1.0, 2.0), DVec2::new(2.0, 2.0), DVec2::new(3.0, 2.0)];
        let t = Tessellation::new(&sites, bounds(4.0, 4.0));
        let middle = t.cell_polygon(1).unwrap();
        assert!((signed_area(&middle) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_index_is_none() {
        let t = Tessellation::new(&[DVec2::new(1.0, 1.0)], bounds(2.0, 2.0));
        assert!(t.cell_polygon(5).is_none());
        assert!(t.cell_or_point(5).is_empty());
    }
}
