//! Buffer polygon generation around a geographic point.
//!
//! Converts a point plus a radius into a closed polygon ring approximating a
//! disc around that point. Longitude offsets are divided by the cosine of the
//! latitude so the buffer keeps a roughly constant metric width as the
//! meridians converge.
//!
//! The meters-to-degrees conversion uses a fixed `111 000 m/degree` factor.
//! This is not geodesically exact but the error is acceptable at non-polar
//! latitudes for buffers of tens of meters.

use thiserror::Error;

use crate::geo::GeoPoint;

/// Fixed conversion factor between meters and degrees of latitude.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Default number of vertices for circular buffers.
pub const DEFAULT_CIRCLE_POINTS: usize = 32;

/// Lower bound for the longitude scale factor.
///
/// `cos(latitude)` approaches zero at the poles, which would otherwise send
/// the longitude spread to infinity. Clamping keeps the output finite.
const MIN_LON_SCALE: f64 = 1e-6;

/// Errors from buffer polygon generation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BufferError {
    /// Radius was zero, negative, or non-finite.
    #[error("invalid buffer radius {0} (must be a positive, finite number of meters)")]
    InvalidRadius(f64),

    /// Circle shape requested with fewer than 3 vertices.
    #[error("circle buffer requires at least 3 points, got {0}")]
    InvalidPointCount(usize),
}

/// Shape of the buffer polygon generated around a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferShape {
    /// Axis-aligned square, ring ordered NW -> NE -> SE -> SW.
    Square,
    /// Regular polygon with `points` vertices approximating a circle.
    Circle {
        /// Number of vertices (minimum 3).
        points: usize,
    },
}

impl Default for BufferShape {
    fn default() -> Self {
        BufferShape::Square
    }
}

impl std::fmt::Display for BufferShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferShape::Square => write!(f, "square"),
            BufferShape::Circle { points } => write!(f, "circle({})", points),
        }
    }
}

/// Buffer generation parameters: radius in meters plus shape.
///
/// Pure mechanism: [`BufferSpec::generate`] has no side effects and depends
/// only on its inputs, so replaying a fix sequence regenerates identical
/// rings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferSpec {
    /// Buffer radius in meters.
    pub radius_meters: f64,
    /// Polygon shape.
    pub shape: BufferShape,
}

impl Default for BufferSpec {
    fn default() -> Self {
        Self {
            radius_meters: 15.0,
            shape: BufferShape::Square,
        }
    }
}

impl BufferSpec {
    /// Create a buffer spec.
    pub fn new(radius_meters: f64, shape: BufferShape) -> Self {
        Self {
            radius_meters,
            shape,
        }
    }

    /// Generate the buffer ring around `center`.
    ///
    /// The returned ring is closed implicitly: the last vertex connects back
    /// to the first.
    ///
    /// # Errors
    ///
    /// * [`BufferError::InvalidRadius`] if the radius is not a positive,
    ///   finite number.
    /// * [`BufferError::InvalidPointCount`] for `Circle` shapes with fewer
    ///   than 3 vertices.
    pub fn generate(&self, center: GeoPoint) -> Result<Vec<GeoPoint>, BufferError> {
        if !self.radius_meters.is_finite() || self.radius_meters <= 0.0 {
            return Err(BufferError::InvalidRadius(self.radius_meters));
        }

        let radius_deg = self.radius_meters / METERS_PER_DEGREE;
        let lon_scale = center.latitude.to_radians().cos().max(MIN_LON_SCALE);

        match self.shape {
            BufferShape::Square => Ok(square_ring(center, radius_deg, lon_scale)),
            BufferShape::Circle { points } => {
                if points < 3 {
                    return Err(BufferError::InvalidPointCount(points));
                }
                Ok(circle_ring(center, radius_deg, lon_scale, points))
            }
        }
    }
}

/// Four corners, ordered NW -> NE -> SE -> SW.
///
/// The winding is kept consistent so downstream containment and hull math
/// sees the same orientation for every generated ring.
fn square_ring(center: GeoPoint, radius_deg: f64, lon_scale: f64) -> Vec<GeoPoint> {
    let north = center.latitude + radius_deg;
    let south = center.latitude - radius_deg;
    let east = center.longitude + radius_deg / lon_scale;
    let west = center.longitude - radius_deg / lon_scale;

    vec![
        GeoPoint {
            latitude: north,
            longitude: west,
        },
        GeoPoint {
            latitude: north,
            longitude: east,
        },
        GeoPoint {
            latitude: south,
            longitude: east,
        },
        GeoPoint {
            latitude: south,
            longitude: west,
        },
    ]
}

/// `points` vertices evenly spaced by angle around the center.
fn circle_ring(center: GeoPoint, radius_deg: f64, lon_scale: f64, points: usize) -> Vec<GeoPoint> {
    let step = std::f64::consts::TAU / points as f64;

    (0..points)
        .map(|i| {
            let theta = step * i as f64;
            GeoPoint {
                latitude: center.latitude + radius_deg * theta.sin(),
                longitude: center.longitude + radius_deg * theta.cos() / lon_scale,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    /// Great-circle distance in meters (haversine), for distance bounds.
    fn great_circle_meters(a: GeoPoint, b: GeoPoint) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;
        let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (b.longitude - a.longitude).to_radians();
        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * h.sqrt().asin()
    }

    #[test]
    fn test_square_at_equator_exact_longitudes() {
        // cos(0) = 1, so east/west offsets equal the raw degree radius.
        let spec = BufferSpec::new(15.0, BufferShape::Square);
        let ring = spec.generate(point(0.0, 0.0)).unwrap();

        assert_eq!(ring.len(), 4);
        let expected = 15.0 / METERS_PER_DEGREE;
        assert!((ring[0].longitude - (-expected)).abs() < 1e-12); // NW
        assert!((ring[1].longitude - expected).abs() < 1e-12); // NE
        assert!((ring[2].longitude - expected).abs() < 1e-12); // SE
        assert!((ring[3].longitude - (-expected)).abs() < 1e-12); // SW
    }

    #[test]
    fn test_square_ring_winding() {
        let spec = BufferSpec::new(30.0, BufferShape::Square);
        let ring = spec.generate(point(53.5, 9.7)).unwrap();

        // NW, NE, SE, SW
        assert!(ring[0].latitude > ring[3].latitude);
        assert!(ring[0].longitude < ring[1].longitude);
        assert!(ring[1].latitude > ring[2].latitude);
        assert!(ring[2].longitude > ring[3].longitude);
    }

    #[test]
    fn test_square_longitude_widens_with_latitude() {
        let spec = BufferSpec::new(30.0, BufferShape::Square);
        let equator = spec.generate(point(0.0, 0.0)).unwrap();
        let north = spec.generate(point(60.0, 0.0)).unwrap();

        let width = |ring: &[GeoPoint]| ring[1].longitude - ring[0].longitude;
        // cos(60 deg) = 0.5, so the span should roughly double.
        assert!(width(&north) > 1.9 * width(&equator));
    }

    #[test]
    fn test_circle_vertex_count() {
        let spec = BufferSpec::new(20.0, BufferShape::Circle { points: 16 });
        let ring = spec.generate(point(10.0, 10.0)).unwrap();
        assert_eq!(ring.len(), 16);
    }

    #[test]
    fn test_invalid_radius() {
        for radius in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let spec = BufferSpec::new(radius, BufferShape::Square);
            assert!(matches!(
                spec.generate(point(0.0, 0.0)),
                Err(BufferError::InvalidRadius(_))
            ));
        }
    }

    #[test]
    fn test_invalid_point_count() {
        let spec = BufferSpec::new(15.0, BufferShape::Circle { points: 2 });
        assert_eq!(
            spec.generate(point(0.0, 0.0)).unwrap_err(),
            BufferError::InvalidPointCount(2)
        );
    }

    #[test]
    fn test_pole_clamp_keeps_output_finite() {
        // cos(90 deg) rounds to ~6e-17; without the clamp the longitude
        // offsets would be astronomically large or non-finite downstream.
        let spec = BufferSpec::new(15.0, BufferShape::Square);
        for lat in [90.0, -90.0, 89.999999] {
            let ring = spec.generate(point(lat, 0.0)).unwrap();
            for v in &ring {
                assert!(v.latitude.is_finite());
                assert!(v.longitude.is_finite());
            }
        }
    }

    #[test]
    fn test_generate_is_pure() {
        let spec = BufferSpec::new(25.0, BufferShape::Circle { points: 8 });
        let a = spec.generate(point(48.1, 11.5)).unwrap();
        let b = spec.generate(point(48.1, 11.5)).unwrap();
        assert_eq!(a, b);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Every square buffer vertex stays within radius * (1 + eps)
            /// great-circle distance of the center at moderate latitudes.
            #[test]
            fn test_square_vertices_within_radius_bound(
                lat in -80.0..80.0_f64,
                lon in -179.0..179.0_f64,
                radius in 1.0..500.0_f64
            ) {
                let center = GeoPoint::new(lat, lon).unwrap();
                let spec = BufferSpec::new(radius, BufferShape::Square);
                let ring = spec.generate(center).unwrap();

                // Corners sit at sqrt(2) * radius; allow slack for the fixed
                // meters-per-degree approximation.
                let bound = radius * std::f64::consts::SQRT_2 * 1.05;
                for v in &ring {
                    let dist = great_circle_meters(center, *v);
                    prop_assert!(
                        dist <= bound,
                        "vertex {} is {}m from center (bound {}m)",
                        v, dist, bound
                    );
                }
            }

            #[test]
            fn test_circle_vertices_within_radius_bound(
                lat in -80.0..80.0_f64,
                lon in -179.0..179.0_f64,
                radius in 1.0..500.0_f64,
                points in 3usize..64
            ) {
                let center = GeoPoint::new(lat, lon).unwrap();
                let spec = BufferSpec::new(radius, BufferShape::Circle { points });
                let ring = spec.generate(center).unwrap();

                let bound = radius * 1.05;
                for v in &ring {
                    let dist = great_circle_meters(center, *v);
                    prop_assert!(
                        dist <= bound,
                        "vertex {} is {}m from center (bound {}m)",
                        v, dist, bound
                    );
                }
            }
        }
    }
}
