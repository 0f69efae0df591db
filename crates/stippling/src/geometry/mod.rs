//! Planar geometry: polygon predicates and bounded Voronoi tessellation.
pub mod polygon;
pub mod tessellation;

pub use polygon::{centroid, contains, convex_hull, Bounds};
pub use tessellation::Tessellation;
