//! WGS84 coordinates and GeoJSON geometry helpers.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean Earth radius in metres (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that the coordinate is finite and inside the WGS84 ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(Error::invalid_input("origin coordinates must be finite"));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::invalid_input(format!(
                "latitude {} is outside [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::invalid_input(format!(
                "longitude {} is outside [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }

    /// Great-circle distance in metres (haversine).
    pub fn distance_to(&self, other: &Self) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let d_phi = (other.lat - self.lat).to_radians();
        let d_lambda = (other.lng - self.lng).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// Position on the unit sphere (ECEF direction), used for KD-tree lookups.
    pub fn to_unit_vector(&self) -> [f64; 3] {
        let phi = self.lat.to_radians();
        let lambda = self.lng.to_radians();
        [
            phi.cos() * lambda.cos(),
            phi.cos() * lambda.sin(),
            phi.sin(),
        ]
    }

    /// GeoJSON position order: `[lng, lat]`.
    pub fn to_position(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    /// Build from a GeoJSON `[lng, lat]` position.
    pub fn from_position(position: [f64; 2]) -> Self {
        Self {
            lat: position[1],
            lng: position[0],
        }
    }

    /// Point offset by the given metres north and east (small-distance approximation).
    pub fn offset_m(&self, north_m: f64, east_m: f64) -> Self {
        let d_lat = (north_m / EARTH_RADIUS_M).to_degrees();
        let d_lng = (east_m / (EARTH_RADIUS_M * self.lat.to_radians().cos())).to_degrees();
        Self {
            lat: self.lat + d_lat,
            lng: self.lng + d_lng,
        }
    }
}

/// GeoJSON `MultiLineString` carrying the merged per-edge geometry of a loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    #[serde(rename = "type")]
    kind: String,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl RouteGeometry {
    pub fn new() -> Self {
        Self {
            kind: "MultiLineString".to_string(),
            coordinates: Vec::new(),
        }
    }

    /// Append one line part. Parts with fewer than two points are ignored.
    pub fn push_line(&mut self, line: &[Coordinate]) {
        if line.len() < 2 {
            return;
        }
        self.coordinates
            .push(line.iter().map(Coordinate::to_position).collect());
    }

    pub fn part_count(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

impl Default for RouteGeometry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_out_of_range() {
        assert!(Coordinate::new(37.5665, 126.978).validate().is_ok());
        assert!(Coordinate::new(91.0, 0.0).validate().is_err());
        assert!(Coordinate::new(0.0, -180.5).validate().is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn haversine_matches_known_distance() {
        // One degree of latitude is ~111.2 km.
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        let d = a.distance_to(&b);
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn offset_round_trips_through_distance() {
        let origin = Coordinate::new(37.5665, 126.978);
        let moved = origin.offset_m(300.0, 400.0);
        let d = origin.distance_to(&moved);
        assert!((d - 500.0).abs() < 1.0, "got {d}");
    }

    #[test]
    fn geometry_serializes_as_geojson() {
        let mut geometry = RouteGeometry::new();
        geometry.push_line(&[Coordinate::new(1.0, 2.0), Coordinate::new(3.0, 4.0)]);
        geometry.push_line(&[Coordinate::new(5.0, 6.0)]);

        let json = serde_json::to_value(&geometry).unwrap();
        assert_eq!(json["type"], "MultiLineString");
        assert_eq!(json["coordinates"][0][0][0], 2.0);
        assert_eq!(json["coordinates"][0][0][1], 1.0);
        assert_eq!(geometry.part_count(), 1);
    }
}
