//! Great-circle distance and bounds over route coordinates.

use geo::{BoundingRect as _, LineString};

use crate::models::{GeoPoint, RouteBounds};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in kilometers.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1_rad = a.lat.to_radians();
    let lat2_rad = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for near-antipodal pairs.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Bounding box of the given points, `None` when there are none.
pub fn route_bounds(points: &[GeoPoint]) -> Option<RouteBounds> {
    let line: LineString<f64> = points
        .iter()
        .map(|p| geo::Point::<f64>::from(*p))
        .collect::<Vec<_>>()
        .into();

    line.bounding_rect().map(|rect| RouteBounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}
