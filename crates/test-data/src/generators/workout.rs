//! Workout generation from procedural routes.

use rand::{Rng, seq::SliceRandom};
use workouts::{
    AppError, FormSubmission, GeoPoint, RouteBuilder, Workout, WorkoutDetails, WorkoutStore,
    models::RenderId,
    surface::{MapSurface, MarkerStyle},
};

use crate::{
    config::SeedConfig,
    profiles::{self, AthleteProfile, HikerProfile, RunnerProfile},
    sources::{GeneratedRoute, ProceduralGenerator},
};

/// Map surface that draws nothing, for building routes off-screen.
#[derive(Debug, Default)]
pub struct NullMap;

impl MapSurface for NullMap {
    fn place_marker(&mut self, _id: RenderId, _point: GeoPoint, _style: MarkerStyle) {}
    fn remove_marker(&mut self, _id: RenderId) {}
    fn draw_segment(&mut self, _id: RenderId, _from: GeoPoint, _to: GeoPoint) {}
    fn remove_segment(&mut self, _id: RenderId) {}
    fn fit_to_bounds(&mut self, _points: &[GeoPoint]) {}
    fn center_on(&mut self, _point: GeoPoint) {}
}

/// Generates workouts with plausible durations and kind-specific values.
pub struct WorkoutGenerator {
    runners: Vec<RunnerProfile>,
    hikers: Vec<HikerProfile>,
}

impl WorkoutGenerator {
    pub fn new() -> Self {
        Self {
            runners: vec![
                RunnerProfile::default(),
                RunnerProfile::elite(),
                RunnerProfile::recreational(),
            ],
            hikers: vec![
                HikerProfile::default(),
                HikerProfile::fast(),
                HikerProfile::leisurely(),
            ],
        }
    }

    /// Picks a profile, hiking with probability `hiking_share`.
    pub fn pick_profile(&self, hiking_share: f64, rng: &mut impl Rng) -> &dyn AthleteProfile {
        let hike = rng.r#gen::<f64>() < hiking_share;
        let picked: Option<&dyn AthleteProfile> = if hike {
            self.hikers.choose(rng).map(|p| p as &dyn AthleteProfile)
        } else {
            self.runners.choose(rng).map(|p| p as &dyn AthleteProfile)
        };
        picked.unwrap_or(&self.runners[0])
    }

    /// Form values for covering `route` with `profile`.
    pub fn submission_for(
        &self,
        route: &GeneratedRoute,
        profile: &dyn AthleteProfile,
        rng: &mut impl Rng,
    ) -> FormSubmission {
        let variance = profiles::sample_variance(profile, rng);
        let seconds: f64 = route
            .segments()
            .map(|(len, grade)| len / profiles::speed_at_grade(profile, grade, variance))
            .sum();

        FormSubmission {
            kind: profile.kind(),
            duration_min: (seconds / 60.0).max(1.0).round(),
            extra: profile.extra_metric(route.net_elevation_m(), variance),
        }
    }

    /// Clicks the route into a builder and finishes it.
    pub fn build_route(&self, route: &GeneratedRoute) -> Result<RouteBuilder, AppError> {
        let mut map = NullMap;
        let mut builder = RouteBuilder::new();
        for point in &route.points {
            builder.add_point(*point, &mut map);
        }
        builder.finish()?;
        Ok(builder)
    }

    /// Generates and commits one workout.
    pub fn commit_one<'a>(
        &self,
        store: &'a mut WorkoutStore,
        config: &SeedConfig,
        rng: &mut impl Rng,
    ) -> Result<&'a Workout, AppError> {
        let profile = self.pick_profile(config.hiking_share, rng);
        let route = ProceduralGenerator::for_region(config.region)
            .with_distance(rng.gen_range(config.route_km.clone()))
            .generate(rng);

        let builder = self.build_route(&route)?;
        let submission = self.submission_for(&route, profile, rng);

        store.commit(
            builder.points(),
            builder.total_distance_km(),
            submission.duration_min,
            WorkoutDetails::from_kind(submission.kind, submission.extra),
        )
    }

    /// Commits `config.workout_count` workouts. Returns how many were added.
    pub fn seed(
        &self,
        store: &mut WorkoutStore,
        config: &SeedConfig,
        rng: &mut impl Rng,
    ) -> Result<usize, AppError> {
        for i in 0..config.workout_count {
            let workout = self.commit_one(store, config, rng)?;
            tracing::debug!(
                "Seeded workout {}/{}: {}",
                i + 1,
                config.workout_count,
                workout.title()
            );
        }
        Ok(config.workout_count)
    }
}

impl Default for WorkoutGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::{SeedableRng, rngs::StdRng};
    use workouts::{MemoryBlobStore, RouteState, WorkoutKind};

    use super::*;

    fn store() -> WorkoutStore {
        WorkoutStore::open(Arc::new(MemoryBlobStore::new())).unwrap()
    }

    #[test]
    fn test_build_route_is_finished() {
        let route = ProceduralGenerator::new()
            .with_distance(2.0)
            .generate(&mut rand::thread_rng());
        let builder = WorkoutGenerator::new().build_route(&route).unwrap();

        assert_eq!(builder.state(), RouteState::Finished);
        assert_eq!(builder.len(), route.points.len());
        assert!(builder.total_distance_km() > 1.99);
    }

    #[test]
    fn test_runner_submission() {
        let mut rng = StdRng::seed_from_u64(7);
        let route = ProceduralGenerator::new().with_distance(5.0).generate(&mut rng);
        let profile = RunnerProfile::default();

        let submission = WorkoutGenerator::new().submission_for(&route, &profile, &mut rng);

        assert_eq!(submission.kind, WorkoutKind::Running);
        assert!(submission.duration_min >= 1.0);
        assert!(submission.extra > 100.0 && submission.extra < 250.0);
    }

    #[test]
    fn test_hiker_submission_uses_net_elevation() {
        let mut rng = StdRng::seed_from_u64(7);
        let route = ProceduralGenerator::new().with_distance(5.0).generate(&mut rng);
        let profile = HikerProfile::default();

        let submission = WorkoutGenerator::new().submission_for(&route, &profile, &mut rng);

        assert_eq!(submission.kind, WorkoutKind::Hiking);
        assert_eq!(submission.extra, route.net_elevation_m().round());
    }

    #[test]
    fn test_seed_fills_store() {
        let mut store = store();
        let config = SeedConfig {
            workout_count: 6,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(config.seed);

        let added = WorkoutGenerator::new()
            .seed(&mut store, &config, &mut rng)
            .unwrap();

        assert_eq!(added, 6);
        assert_eq!(store.len(), 6);
        assert!(store.workouts().iter().all(|w| w.route().len() >= 2));
    }

    #[test]
    fn test_all_hikes() {
        let mut store = store();
        let config = SeedConfig {
            workout_count: 3,
            hiking_share: 1.0,
            ..Default::default()
        };

        WorkoutGenerator::new()
            .seed(&mut store, &config, &mut rand::thread_rng())
            .unwrap();

        assert!(store.workouts().iter().all(|w| w.kind() == WorkoutKind::Hiking));
    }
}
