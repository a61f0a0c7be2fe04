//! Local planar approximation of the WGS84 surface.
//!
//! Positions are flattened with an equirectangular projection around a fixed
//! origin. This is only accurate over small extents (a cemetery is well under
//! a kilometre across); it is not a geodesic solver.

use geo::Coord;
use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Meters per degree of latitude
pub const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Meters per degree of longitude at the given latitude
pub fn meters_per_deg_lng(lat_deg: f64) -> f64 {
    METERS_PER_DEG_LAT * lat_deg.to_radians().cos()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalProjection {
    origin: Coordinate,
    m_per_deg_lng: f64,
}

impl LocalProjection {
    pub fn new(origin: Coordinate) -> Self {
        Self {
            origin,
            m_per_deg_lng: meters_per_deg_lng(origin.lat),
        }
    }

    /// Projection centred on the bounding box of `coords`.
    /// Falls back to `(0, 0)` for an empty input.
    pub fn centered_on<'a>(coords: impl IntoIterator<Item = &'a Coordinate>) -> Self {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for c in coords {
            bounds = Some(match bounds {
                None => (c.lat, c.lat, c.lng, c.lng),
                Some((min_lat, max_lat, min_lng, max_lng)) => (
                    min_lat.min(c.lat),
                    max_lat.max(c.lat),
                    min_lng.min(c.lng),
                    max_lng.max(c.lng),
                ),
            });
        }
        let origin = bounds.map_or(Coordinate::new(0.0, 0.0), |(a, b, c, d)| {
            Coordinate::new((a + b) / 2.0, (c + d) / 2.0)
        });
        Self::new(origin)
    }

    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    /// Geodetic position to planar meters east (`x`) and north (`y`) of the origin
    pub fn project(&self, c: Coordinate) -> Coord<f64> {
        Coord {
            x: (c.lng - self.origin.lng) * self.m_per_deg_lng,
            y: (c.lat - self.origin.lat) * METERS_PER_DEG_LAT,
        }
    }

    /// Inverse of [`LocalProjection::project`]
    pub fn unproject(&self, p: Coord<f64>) -> Coordinate {
        // At the poles the longitude scale collapses; keep the origin longitude.
        let lng = if self.m_per_deg_lng.abs() > f64::EPSILON {
            self.origin.lng + p.x / self.m_per_deg_lng
        } else {
            self.origin.lng
        };
        Coordinate::new(self.origin.lat + p.y / METERS_PER_DEG_LAT, lng)
    }

    /// Planar distance in meters between two geodetic positions
    pub fn distance(&self, a: Coordinate, b: Coordinate) -> f64 {
        planar_distance(self.project(a), self.project(b))
    }
}

/// Euclidean distance between two projected points
pub fn planar_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_hundredths_of_a_millidegree_at_the_equator() {
        let proj = LocalProjection::new(Coordinate::new(0.0, 10.0));
        let d = proj.distance(Coordinate::new(0.0, 10.0), Coordinate::new(0.0, 10.00005));
        assert!((d - 5.566).abs() < 1e-3, "got {d}");
    }

    #[test]
    fn longitude_shrinks_with_latitude() {
        let proj = LocalProjection::new(Coordinate::new(60.0, 0.0));
        let d = proj.distance(Coordinate::new(60.0, 0.0), Coordinate::new(60.0, 0.001));
        assert!((d - 55.66).abs() < 0.01, "got {d}");
    }

    #[test]
    fn unproject_inverts_project() {
        let proj = LocalProjection::new(Coordinate::new(15.4948545, 120.5550455));
        let c = Coordinate::new(15.494175676617589, 120.55463847892524);
        let back = proj.unproject(proj.project(c));
        assert!((back.lat - c.lat).abs() < 1e-12);
        assert!((back.lng - c.lng).abs() < 1e-12);
    }

    #[test]
    fn centered_on_uses_bounding_box() {
        let pts = [Coordinate::new(0.0, 0.0), Coordinate::new(2.0, 4.0)];
        let proj = LocalProjection::centered_on(pts.iter());
        assert_eq!(proj.origin(), Coordinate::new(1.0, 2.0));
    }
}
