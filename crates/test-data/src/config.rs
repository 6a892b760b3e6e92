//! Configuration types for test data generation.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use workouts::GeoPoint;

/// Geographic bounding box defined by southwest and northeast corners.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude (south)
    pub min_lat: f64,
    /// Minimum longitude (west)
    pub min_lng: f64,
    /// Maximum latitude (north)
    pub max_lat: f64,
    /// Maximum longitude (east)
    pub max_lng: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            min_lng,
            max_lat,
            max_lng,
        }
    }

    /// Returns a random point within the bounding box.
    pub fn random_point(&self, rng: &mut impl rand::Rng) -> GeoPoint {
        GeoPoint::new(
            rng.gen_range(self.min_lat..self.max_lat),
            rng.gen_range(self.min_lng..self.max_lng),
        )
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }
}

/// Pre-defined geographic regions for test data generation.
#[derive(Debug, Clone, Copy)]
pub struct Region;

impl Region {
    /// Reno/Tahoe area - mountain trails with significant elevation changes.
    pub const RENO_TAHOE: BoundingBox = BoundingBox::new(39.0, -120.5, 39.6, -119.5);

    /// Boulder, CO area - popular fitness trails with varied terrain.
    pub const BOULDER: BoundingBox = BoundingBox::new(39.9, -105.5, 40.1, -105.2);
}

/// Configuration for seeding a workout log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Number of workouts to generate.
    pub workout_count: usize,

    /// Target region for route generation.
    pub region: BoundingBox,

    /// Probability (0.0-1.0) that a workout is a hike rather than a run.
    pub hiking_share: f64,

    /// Route length range in kilometers.
    pub route_km: Range<f64>,

    /// RNG seed, for reproducible logs.
    pub seed: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            workout_count: 12,
            region: Region::BOULDER,
            hiking_share: 0.4,
            route_km: 2.0..12.0,
            seed: 12345,
        }
    }
}
