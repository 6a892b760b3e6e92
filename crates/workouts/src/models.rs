use std::{
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a point only if both coordinates are finite and in range.
    pub fn checked(lat: f64, lng: f64) -> Option<Self> {
        let in_range = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng);
        in_range.then(|| Self::new(lat, lng))
    }

    pub fn is_valid(&self) -> bool {
        Self::checked(self.lat, self.lng).is_some()
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.lng, p.lat)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(p: geo::Point<f64>) -> Self {
        GeoPoint::new(p.y(), p.x())
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

/// One point of a route together with the distance from its predecessor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePoint {
    pub point: GeoPoint,
    /// Great-circle distance from the previous point, 0 for the first one.
    pub segment_distance_km: f64,
}

impl RoutePoint {
    pub const fn new(point: GeoPoint, segment_distance_km: f64) -> Self {
        Self {
            point,
            segment_distance_km,
        }
    }
}

/// Sum of the segment distances of a route.
pub fn route_distance_km(route: &[RoutePoint]) -> f64 {
    route.iter().map(|p| p.segment_distance_km).sum()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for WorkoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for WorkoutId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for WorkoutId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Hiking,
}

impl WorkoutKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkoutKind::Running => "running",
            WorkoutKind::Hiking => "hiking",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkoutKind::Running => "Running",
            WorkoutKind::Hiking => "Hiking",
        }
    }
}

impl FromStr for WorkoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "running" | "run" => Ok(WorkoutKind::Running),
            "hiking" | "hike" => Ok(WorkoutKind::Hiking),
            other => Err(format!("unknown workout kind: {other}")),
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic bounds of a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl RouteBounds {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// Identifier of an artifact drawn on the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderId(pub u64);

impl fmt::Display for RenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Hands out render ids that are never reused. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct RenderIds {
    next: Arc<AtomicU64>,
}

impl RenderIds {
    pub fn next_id(&self) -> RenderId {
        RenderId(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
