//! Great-circle distance and unit helpers.
//!
//! Perimeters are circles on the sphere, so a straight haversine distance
//! between centers is all the geometry the scene needs.

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const METERS_PER_MILE: f64 = 1609.34;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Builds a point from a raw `[lat, lon]` pair, rejecting anything that
    /// is not exactly two finite numbers inside the valid ranges.
    pub fn from_pair(raw: &[f64]) -> Option<Self> {
        match raw {
            [lat, lon]
                if lat.is_finite()
                    && lon.is_finite()
                    && (-90.0..=90.0).contains(lat)
                    && (-180.0..=180.0).contains(lon) =>
            {
                Some(Self::new(*lat, *lon))
            }
            _ => None,
        }
    }

    pub fn distance_km(&self, other: &LatLon) -> f64 {
        great_circle_distance(self.lat, self.lon, other.lat, other.lon)
    }

    pub fn distance_m(&self, other: &LatLon) -> f64 {
        self.distance_km(other) * 1_000.0
    }

    pub fn distance_miles(&self, other: &LatLon) -> f64 {
        meters_to_miles(self.distance_m(other))
    }
}

impl From<[f64; 2]> for LatLon {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<LatLon> for [f64; 2] {
    fn from(value: LatLon) -> Self {
        [value.lat, value.lon]
    }
}

/// Haversine distance in kilometers between two points given in degrees.
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();
    let dlat2 = (lat2 - lat1).to_radians() / 2.0;
    let dlon2 = (lon2 - lon1).to_radians() / 2.0;

    let a = dlat2.sin().powi(2) + lat1_r.cos() * lat2_r.cos() * dlon2.sin().powi(2);
    let arc = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    arc * EARTH_RADIUS_KM
}

pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}
