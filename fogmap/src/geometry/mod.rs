//! Polygon geometry over geographic points.
//!
//! Two routines back the coverage engine: even-odd ray-casting containment
//! and monotone-chain convex hull. Both treat longitude as the x axis and
//! latitude as the y axis and work on plain degree values; no projection is
//! applied here.

use crate::geo::GeoPoint;

/// Even-odd containment test for `point` against a closed ring.
///
/// The ring is implicitly closed (last vertex connects to the first). The
/// horizontal ray extends along the longitude axis; an edge counts as a
/// crossing when it straddles `point.longitude` and its latitude intercept at
/// that longitude lies below `point.latitude`.
///
/// Rings with fewer than 3 vertices never contain anything.
pub fn contains(point: GeoPoint, ring: &[GeoPoint]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let vi = ring[i];
        let vj = ring[j];

        if (vi.longitude > point.longitude) != (vj.longitude > point.longitude) {
            let dlon = vj.longitude - vi.longitude;
            // Edges with zero longitude delta cannot straddle the ray; the
            // guard keeps the intercept division well-defined regardless.
            if dlon != 0.0 {
                let intercept = vi.latitude
                    + (point.longitude - vi.longitude) * (vj.latitude - vi.latitude) / dlon;
                if intercept < point.latitude {
                    inside = !inside;
                }
            }
        }
        j = i;
    }
    inside
}

/// Convex hull of a point set via Andrew's monotone chain.
///
/// Input points are deduplicated first; if fewer than 3 distinct points
/// remain they are returned as-is (sorted), without computing a hull. The
/// result is a counter-clockwise ring in (longitude, latitude) space and is
/// invariant under permutation and duplication of the input.
pub fn convex_hull(points: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut pts: Vec<GeoPoint> = points.to_vec();
    pts.sort_by(|a, b| {
        a.longitude
            .total_cmp(&b.longitude)
            .then(a.latitude.total_cmp(&b.latitude))
    });
    pts.dedup_by(|a, b| a.longitude == b.longitude && a.latitude == b.latitude);

    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<GeoPoint> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<GeoPoint> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    // Each chain ends where the other begins; drop the duplicated endpoints.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Cross product of `(a - o)` and `(b - o)` in (longitude, latitude) space.
///
/// Positive for a left turn, negative for a right turn, zero for collinear.
fn cross(o: GeoPoint, a: GeoPoint, b: GeoPoint) -> f64 {
    (a.longitude - o.longitude) * (b.latitude - o.latitude)
        - (a.latitude - o.latitude) * (b.longitude - o.longitude)
}
