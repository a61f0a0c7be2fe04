//! Geodetic coordinates as consumed at the ingest boundary

use geo::{Coord, Point};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Rounding step for node deduplication, in degrees (about 1 cm)
pub const QUANTIZATION_STEP_DEG: f64 = 1e-7;

/// WGS84 position in decimal degrees.
///
/// The field order is always latitude first. Sources that store positions as
/// `(lng, lat)`, such as GeoJSON, must go through [`Coordinate::from_lng_lat`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate without validation
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Creates a coordinate from `(lat, lng)`, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGeometry`] when either component is not finite,
    /// `|lat| > 90` or `|lng| > 180`.
    pub fn try_new(lat: f64, lng: f64) -> Result<Self, Error> {
        let coord = Self { lat, lng };
        coord.validate()?;
        Ok(coord)
    }

    /// Creates a coordinate from a position stored longitude first
    ///
    /// # Errors
    ///
    /// Same conditions as [`Coordinate::try_new`].
    pub fn from_lng_lat(lng: f64, lat: f64) -> Result<Self, Error> {
        Self::try_new(lat, lng)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
    }

    /// Checks the coordinate invariant.
    ///
    /// A pair that only fits the ranges after swapping its axes is reported as
    /// a likely axis-order mix-up, never corrected.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(Error::InvalidGeometry(format!(
                "non-finite coordinate (lat={}, lng={})",
                self.lat, self.lng
            )));
        }
        if self.is_valid() {
            return Ok(());
        }
        let swapped = Self::new(self.lng, self.lat);
        if swapped.is_valid() {
            Err(Error::InvalidGeometry(format!(
                "coordinate out of range (lat={}, lng={}); axes look swapped, expected latitude first",
                self.lat, self.lng
            )))
        } else {
            Err(Error::InvalidGeometry(format!(
                "coordinate out of range (lat={}, lng={})",
                self.lat, self.lng
            )))
        }
    }

    /// Quantized identity used to merge exact repeats into one node
    #[allow(clippy::cast_possible_truncation)]
    pub fn key(&self) -> NodeKey {
        NodeKey(
            (self.lat / QUANTIZATION_STEP_DEG).round() as i64,
            (self.lng / QUANTIZATION_STEP_DEG).round() as i64,
        )
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(value: Coordinate) -> Self {
        Coord {
            x: value.lng,
            y: value.lat,
        }
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(value: Coordinate) -> Self {
        Point::new(value.lng, value.lat)
    }
}

impl From<Coord<f64>> for Coordinate {
    fn from(value: Coord<f64>) -> Self {
        Self::new(value.y, value.x)
    }
}

/// Quantized `(lat, lng)` in units of [`QUANTIZATION_STEP_DEG`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub i64, pub i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite() {
        assert!(matches!(
            Coordinate::try_new(f64::NAN, 0.0),
            Err(Error::InvalidGeometry(_))
        ));
        assert!(Coordinate::try_new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn reports_swapped_axes() {
        // A typical (lng, lat) pair passed as (lat, lng)
        let err = Coordinate::try_new(120.555, 15.494).unwrap_err();
        assert!(err.to_string().contains("swapped"));
    }

    #[test]
    fn lng_lat_constructor_keeps_order_explicit() {
        let c = Coordinate::from_lng_lat(120.555, 15.494).unwrap();
        assert_eq!(c.lat, 15.494);
        assert_eq!(c.lng, 120.555);
    }

    #[test]
    fn near_identical_points_share_a_key() {
        let a = Coordinate::new(15.494_175_6, 120.554_638_4);
        let b = Coordinate::new(15.494_175_600_01, 120.554_638_400_02);
        let c = Coordinate::new(15.494_176_0, 120.554_638_4);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn converts_to_geo_with_lng_as_x() {
        let p: Point<f64> = Coordinate::new(1.0, 2.0).into();
        assert_eq!(p.x(), 2.0);
        assert_eq!(p.y(), 1.0);
    }
}
