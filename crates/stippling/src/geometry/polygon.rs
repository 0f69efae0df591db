//! Planar polygon predicates used by mass integration and relaxation.
//!
//! Polygons are plain vertex slices in order (either winding). A slice of one
//! vertex is a degenerate "point polygon" and encloses nothing but that point.
use glam::DVec2;

/// Absolute tolerance for on-edge tests, in domain units.
pub const BOUNDARY_EPSILON: f64 = 1e-9;

/// Axis-aligned rectangle in domain coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Bounds spanning `[0, extent.x] x [0, extent.y]`.
    pub fn from_extent(extent: DVec2) -> Self {
        Self {
            min: DVec2::ZERO,
            max: extent,
        }
    }

    pub fn extent(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// The rectangle as a counter-clockwise polygon.
    pub fn to_polygon(&self) -> Vec<DVec2> {
        vec![
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ]
    }
}

/// Bounding rectangle of a vertex set, `None` when empty or non-finite.
pub fn bounding_box(polygon: &[DVec2]) -> Option<Bounds> {
    let first = *polygon.first()?;
    let mut min = first;
    let mut max = first;
    for p in &polygon[1..] {
        min = min.min(*p);
        max = max.max(*p);
    }
    (min.is_finite() && max.is_finite()).then_some(Bounds { min, max })
}

/// Signed area (positive for counter-clockwise winding).
pub fn signed_area(polygon: &[DVec2]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        twice += a.perp_dot(b);
    }
    twice * 0.5
}

/// Area-weighted centroid.
///
/// Falls back to the vertex mean when the polygon has no area, so the result is
/// finite for any finite input. Returns `None` only for an empty slice.
pub fn centroid(polygon: &[DVec2]) -> Option<DVec2> {
    let n = polygon.len();
    if n == 0 {
        return None;
    }
    let mut twice_area = 0.0;
    let mut acc = DVec2::ZERO;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let cross = a.perp_dot(b);
        twice_area += cross;
        acc += (a + b) * cross;
    }
    if twice_area.abs() < 1e-12 {
        let sum: DVec2 = polygon.iter().copied().sum();
        return Some(sum / n as f64);
    }
    Some(acc / (3.0 * twice_area))
}

fn on_segment(a: DVec2, b: DVec2, p: DVec2) -> bool {
    let ab = b - a;
    let ap = p - a;
    let len = ab.length();
    if len <= BOUNDARY_EPSILON {
        return ap.length() <= BOUNDARY_EPSILON;
    }
    if (ab.perp_dot(ap) / len).abs() > BOUNDARY_EPSILON {
        return false;
    }
    let t = ab.dot(ap);
    t >= -BOUNDARY_EPSILON * len && t <= ab.length_squared() + BOUNDARY_EPSILON * len
}

/// Containment with the boundary counted as inside.
///
/// Points on any edge (within [`BOUNDARY_EPSILON`]) are inside; all other points
/// use the even-odd rule. Works for any simple polygon, convex or not.
pub fn contains(polygon: &[DVec2], p: DVec2) -> bool {
    let n = polygon.len();
    match n {
        0 => return false,
        1 => return (polygon[0] - p).length() <= BOUNDARY_EPSILON,
        _ => {}
    }

    for i in 0..n {
        if on_segment(polygon[i], polygon[(i + 1) % n], p) {
            return true;
        }
    }
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Counter-clockwise convex hull (Andrew's monotone chain).
///
/// Duplicate and collinear vertices are dropped, so a hull of fewer than three
/// vertices means the input spans no area.
pub fn convex_hull(points: &[DVec2]) -> Vec<DVec2> {
    let mut pts: Vec<DVec2> = points.iter().copied().filter(|p| p.is_finite()).collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup_by(|a, b| (*a - *b).length_squared() <= BOUNDARY_EPSILON * BOUNDARY_EPSILON);
    if pts.len() < 3 {
        return pts;
    }

    let turn = |o: DVec2, a: DVec2, b: DVec2| (a - o).perp_dot(b - o);
    let mut hull: Vec<DVec2> = Vec::with_capacity(pts.len() * 2);
    for &p in &pts {
        while hull.len() >= 2 && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Clips a convex polygon to the half-plane of points at least as close to
/// `site` as to `other` (the side of their perpendicular bisector holding `site`).
pub fn clip_to_bisector(polygon: &[DVec2], site: DVec2, other: DVec2) -> Vec<DVec2> {
    let normal = other - site;
    let mid = (site + other) * 0.5;
    let side = |p: DVec2| (p - mid).dot(normal);

    let n = polygon.len();
    let mut out = Vec::with_capacity(n + 1);
    for i in 0..n {
        let cur = polygon[i];
        let next = polygon[(i + 1) % n];
        let dc = side(cur);
        let dn = side(next);
        if dc <= 0.0 {
            out.push(cur);
        }
        if (dc < 0.0 && dn > 0.0) || (dc > 0.0 && dn < 0.0) {
            let t = dc / (dc - dn);
            out.push(cur + (next - cur) * t);
        }
    }
    out
}
