//! Procedural route generation.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use workouts::{GeoPoint, geo_math};

use crate::config::{BoundingBox, Region};

/// Closest spacing a generated route will use between waypoints.
pub const MIN_POINT_SPACING_M: f64 = 1.0;

/// Configuration for procedural route generation.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Target distance in kilometers.
    pub distance_km: f64,
    /// Starting point. If None, random within bounds.
    pub start_point: Option<GeoPoint>,
    /// Geographic bounds for the route.
    pub bounds: BoundingBox,
    /// Approximate distance between clicked waypoints in meters.
    pub point_spacing_m: f64,
    /// Standard deviation of the step-to-step grade change.
    pub grade_drift: f64,
    /// Steepest grade the terrain reaches, either way.
    pub max_grade: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            distance_km: 5.0,
            start_point: None,
            bounds: Region::BOULDER,
            point_spacing_m: 250.0,
            grade_drift: 0.01,
            max_grade: 0.15,
        }
    }
}

/// A generated route: waypoints plus the terrain grade of the segment
/// ending at each waypoint (0 for the first).
#[derive(Debug, Clone)]
pub struct GeneratedRoute {
    pub points: Vec<GeoPoint>,
    pub grades: Vec<f64>,
}

impl GeneratedRoute {
    /// Segment lengths in meters, paired with their grade.
    pub fn segments(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points
            .windows(2)
            .zip(&self.grades[1..])
            .map(|(pair, grade)| (geo_math::distance_km(pair[0], pair[1]) * 1000.0, *grade))
    }

    /// Total climb minus total descent, in meters.
    pub fn net_elevation_m(&self) -> f64 {
        self.segments().map(|(len, grade)| len * grade).sum()
    }
}

/// Generates synthetic routes the way a user would click them on the map.
pub struct ProceduralGenerator {
    config: RouteConfig,
}

impl ProceduralGenerator {
    pub fn new() -> Self {
        Self {
            config: RouteConfig::default(),
        }
    }

    /// Creates a generator for a specific region.
    pub fn for_region(bounds: BoundingBox) -> Self {
        Self {
            config: RouteConfig {
                bounds,
                ..Default::default()
            },
        }
    }

    /// Sets the target distance.
    pub fn with_distance(mut self, km: f64) -> Self {
        self.config.distance_km = km;
        self
    }

    /// Sets the starting point.
    pub fn with_start(mut self, start: GeoPoint) -> Self {
        self.config.start_point = Some(start);
        self
    }

    /// Sets point spacing, never below `MIN_POINT_SPACING_M`.
    pub fn with_point_spacing(mut self, meters: f64) -> Self {
        self.config.point_spacing_m = meters;
        self
    }

    fn point_spacing_m(&self) -> f64 {
        // NaN fails the comparison and falls back to the minimum too.
        if self.config.point_spacing_m >= MIN_POINT_SPACING_M {
            self.config.point_spacing_m
        } else {
            MIN_POINT_SPACING_M
        }
    }

    pub fn generate(&self, rng: &mut impl Rng) -> GeneratedRoute {
        let start = self
            .config
            .start_point
            .unwrap_or_else(|| self.config.bounds.random_point(rng));

        let points = self.generate_path(start, rng);
        let grades = self.generate_grades(points.len(), rng);
        GeneratedRoute { points, grades }
    }

    /// Random walk with some momentum to create natural-looking paths.
    /// Always yields at least two points.
    pub fn generate_path(&self, start: GeoPoint, rng: &mut impl Rng) -> Vec<GeoPoint> {
        let target_m = self.config.distance_km * 1000.0;
        let spacing_m = self.point_spacing_m();
        let mut path = vec![start];
        let mut current = start;
        let mut total_m = 0.0;
        let mut heading = rng.gen_range(0.0..std::f64::consts::TAU);

        while total_m < target_m || path.len() < 2 {
            heading += rng.gen_range(-0.3..0.3);
            let step = spacing_m * rng.gen_range(0.8..1.2);

            // 1 degree of latitude is ~111 km, longitude shrinks with latitude
            let lat_delta = (step * heading.cos()) / 111_000.0;
            let lng_delta = (step * heading.sin()) / (111_000.0 * current.lat.to_radians().cos());

            let (next, bounced_heading) = self.apply_bounds(
                GeoPoint::new(current.lat + lat_delta, current.lng + lng_delta),
                heading,
            );
            heading = bounced_heading;

            total_m += geo_math::distance_km(current, next) * 1000.0;
            current = next;
            path.push(current);
        }

        path
    }

    /// Applies bounds checking with heading reversal.
    fn apply_bounds(&self, point: GeoPoint, heading: f64) -> (GeoPoint, f64) {
        let b = &self.config.bounds;
        let mut new_heading = heading;

        let lat = if point.lat < b.min_lat {
            new_heading = std::f64::consts::PI - heading;
            b.min_lat + (b.min_lat - point.lat).min(0.001)
        } else if point.lat > b.max_lat {
            new_heading = std::f64::consts::PI - heading;
            b.max_lat - (point.lat - b.max_lat).min(0.001)
        } else {
            point.lat
        };

        let lng = if point.lng < b.min_lng {
            new_heading = -heading;
            b.min_lng + (b.min_lng - point.lng).min(0.001)
        } else if point.lng > b.max_lng {
            new_heading = -heading;
            b.max_lng - (point.lng - b.max_lng).min(0.001)
        } else {
            point.lng
        };

        (GeoPoint::new(lat, lng), new_heading)
    }

    fn generate_grades(&self, len: usize, rng: &mut impl Rng) -> Vec<f64> {
        let max = self.config.max_grade;
        let drift = Normal::new(0.0, self.config.grade_drift).ok();

        let mut grades = Vec::with_capacity(len);
        let mut grade = 0.0;
        for i in 0..len {
            if i > 0 {
                let change = drift.as_ref().map_or(0.0, |d| d.sample(rng));
                grade = (grade + change).clamp(-max, max);
            }
            grades.push(grade);
        }
        grades
    }
}

impl Default for ProceduralGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_route() {
        let route = ProceduralGenerator::new()
            .with_distance(3.0)
            .generate(&mut rand::thread_rng());

        assert!(route.points.len() > 10);
        assert_eq!(route.grades.len(), route.points.len());
        assert_eq!(route.grades[0], 0.0);

        let total_m: f64 = route.segments().map(|(len, _)| len).sum();
        assert!(total_m >= 3000.0);
        assert!(total_m < 3400.0);
    }

    #[test]
    fn test_stays_in_bounds() {
        let bounds = Region::BOULDER;
        let route = ProceduralGenerator::for_region(bounds)
            .with_start(GeoPoint::new(bounds.max_lat - 0.0005, bounds.max_lng - 0.0005))
            .with_distance(20.0)
            .generate(&mut rand::thread_rng());

        assert!(route.points.iter().all(|p| bounds.contains(*p)));
    }

    #[test]
    fn test_tiny_distance_still_has_segment() {
        let route = ProceduralGenerator::new()
            .with_distance(0.0)
            .generate(&mut rand::thread_rng());
        assert_eq!(route.points.len(), 2);
    }

    #[test]
    fn test_degenerate_spacing_is_clamped() {
        for spacing in [0.0, -25.0, f64::NAN] {
            let generator = ProceduralGenerator::new()
                .with_distance(0.01)
                .with_point_spacing(spacing);
            assert_eq!(generator.point_spacing_m(), MIN_POINT_SPACING_M);

            let route = generator.generate(&mut rand::thread_rng());
            assert!(route.points.len() >= 2);
        }
        let generator = ProceduralGenerator::new().with_point_spacing(80.0);
        assert_eq!(generator.point_spacing_m(), 80.0);
    }

    #[test]
    fn test_grades_bounded() {
        let route = ProceduralGenerator::new()
            .with_distance(10.0)
            .generate(&mut rand::thread_rng());
        assert!(route.grades.iter().all(|g| g.abs() <= 0.15));
    }
}
