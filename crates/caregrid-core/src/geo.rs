//! Great-circle distance math over WGS84 lat/lng pairs.
//!
//! Pure functions; NaN inputs propagate NaN and are rejected upstream at
//! filter validation, not here.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_MILES: f64 = 3958.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

fn to_radians(degrees: f64) -> f64 {
    degrees * (std::f64::consts::PI / 180.0)
}

/// Haversine distance between two points, in miles.
#[must_use]
pub fn distance_miles(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = to_radians(a.lat);
    let lat2 = to_radians(b.lat);
    let delta_lat = to_radians(b.lat - a.lat);
    let delta_lng = to_radians(b.lng - a.lng);

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Whether `point` lies within `radius_miles` of `center`.
#[must_use]
pub fn within_radius(center: Coordinates, point: Coordinates, radius_miles: f64) -> bool {
    distance_miles(center, point) <= radius_miles
}

/// Axis-aligned lat/lng box enclosing the radius circle. Coarse prefilter for
/// stores that cannot evaluate haversine distance; exact filtering still runs
/// through [`within_radius`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

#[must_use]
pub fn bounding_box(center: Coordinates, radius_miles: f64) -> BoundingBox {
    let lat_delta = radius_miles / 69.0;
    // Longitude degrees shrink with latitude.
    let lng_delta = radius_miles / (69.0 * to_radians(center.lat).cos());

    BoundingBox {
        min_lat: center.lat - lat_delta,
        max_lat: center.lat + lat_delta,
        min_lng: center.lng - lng_delta,
        max_lng: center.lng + lng_delta,
    }
}
