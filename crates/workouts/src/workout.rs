//! Workout records built from a finished route.
//!
//! Workouts are immutable once created. The only public way to obtain one is
//! through the validating constructors, so the derived metrics never see a
//! zero distance or duration.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::{
    errors::{AppError, InvalidField, Violation, WorkoutField},
    models::{GeoPoint, RoutePoint, WorkoutId, WorkoutKind, route_distance_km},
};

/// Relative slack between a workout's distance and its summed route, covering
/// float summation order only.
const DISTANCE_EPSILON: f64 = 1e-9;

/// Kind-specific values entered alongside duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutDetails {
    Running { cadence_spm: f64 },
    Hiking { elevation_gain_m: f64 },
}

impl WorkoutDetails {
    /// Pairs a kind with the single extra value the form collects for it.
    pub fn from_kind(kind: WorkoutKind, extra: f64) -> Self {
        match kind {
            WorkoutKind::Running => WorkoutDetails::Running { cadence_spm: extra },
            WorkoutKind::Hiking => WorkoutDetails::Hiking {
                elevation_gain_m: extra,
            },
        }
    }

    pub fn kind(&self) -> WorkoutKind {
        match self {
            WorkoutDetails::Running { .. } => WorkoutKind::Running,
            WorkoutDetails::Hiking { .. } => WorkoutKind::Hiking,
        }
    }
}

/// Fields shared by every workout variant.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutBase {
    id: WorkoutId,
    created_at: OffsetDateTime,
    route: Arc<[RoutePoint]>,
    distance_km: f64,
    duration_min: f64,
}

impl WorkoutBase {
    pub fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn route(&self) -> &[RoutePoint] {
        &self.route
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_min
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunningWorkout {
    base: WorkoutBase,
    cadence_spm: f64,
}

impl RunningWorkout {
    pub fn create(
        route: &[RoutePoint],
        distance_km: f64,
        duration_min: f64,
        cadence_spm: f64,
    ) -> Result<Self, AppError> {
        let base = new_base(route)?;
        Self::restore(base, distance_km, duration_min, cadence_spm)
    }

    fn restore(
        base: PendingBase,
        distance_km: f64,
        duration_min: f64,
        cadence_spm: f64,
    ) -> Result<Self, AppError> {
        let mut errors = validate_common(&base, distance_km, duration_min);
        check(&mut errors, WorkoutField::Cadence, cadence_spm, true);
        if !errors.is_empty() {
            return Err(AppError::InvalidWorkoutInput(errors));
        }

        Ok(Self {
            base: base.complete(distance_km, duration_min),
            cadence_spm,
        })
    }

    pub fn base(&self) -> &WorkoutBase {
        &self.base
    }

    pub fn cadence_spm(&self) -> f64 {
        self.cadence_spm
    }

    /// Minutes per kilometer.
    pub fn pace_min_per_km(&self) -> f64 {
        self.base.duration_min / self.base.distance_km
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HikingWorkout {
    base: WorkoutBase,
    elevation_gain_m: f64,
}

impl HikingWorkout {
    pub fn create(
        route: &[RoutePoint],
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    ) -> Result<Self, AppError> {
        let base = new_base(route)?;
        Self::restore(base, distance_km, duration_min, elevation_gain_m)
    }

    fn restore(
        base: PendingBase,
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    ) -> Result<Self, AppError> {
        let mut errors = validate_common(&base, distance_km, duration_min);
        // Descents are valid, so only finiteness is required.
        check(&mut errors, WorkoutField::ElevationGain, elevation_gain_m, false);
        if !errors.is_empty() {
            return Err(AppError::InvalidWorkoutInput(errors));
        }

        Ok(Self {
            base: base.complete(distance_km, duration_min),
            elevation_gain_m,
        })
    }

    pub fn base(&self) -> &WorkoutBase {
        &self.base
    }

    pub fn elevation_gain_m(&self) -> f64 {
        self.elevation_gain_m
    }

    /// Kilometers per hour.
    pub fn speed_kmh(&self) -> f64 {
        self.base.distance_km / (self.base.duration_min / 60.0)
    }
}

/// A logged workout of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Workout {
    Running(RunningWorkout),
    Hiking(HikingWorkout),
}

impl Workout {
    pub fn create_running(
        route: &[RoutePoint],
        distance_km: f64,
        duration_min: f64,
        cadence_spm: f64,
    ) -> Result<Self, AppError> {
        RunningWorkout::create(route, distance_km, duration_min, cadence_spm).map(Workout::Running)
    }

    pub fn create_hiking(
        route: &[RoutePoint],
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    ) -> Result<Self, AppError> {
        HikingWorkout::create(route, distance_km, duration_min, elevation_gain_m)
            .map(Workout::Hiking)
    }

    pub fn create(
        route: &[RoutePoint],
        distance_km: f64,
        duration_min: f64,
        details: WorkoutDetails,
    ) -> Result<Self, AppError> {
        match details {
            WorkoutDetails::Running { cadence_spm } => {
                Self::create_running(route, distance_km, duration_min, cadence_spm)
            }
            WorkoutDetails::Hiking { elevation_gain_m } => {
                Self::create_hiking(route, distance_km, duration_min, elevation_gain_m)
            }
        }
    }

    /// Rebuilds a persisted workout, keeping its id and creation time.
    /// `rounding_km` is extra slack for records whose distance was stored
    /// rounded.
    pub(crate) fn restore(
        id: WorkoutId,
        created_at: OffsetDateTime,
        route: Vec<RoutePoint>,
        distance_km: f64,
        duration_min: f64,
        details: WorkoutDetails,
        rounding_km: f64,
    ) -> Result<Self, AppError> {
        if route.len() < 2 {
            return Err(AppError::InsufficientPoints { count: route.len() });
        }
        let base = PendingBase::new(id, created_at, route.into(), rounding_km);
        match details {
            WorkoutDetails::Running { cadence_spm } => {
                RunningWorkout::restore(base, distance_km, duration_min, cadence_spm)
                    .map(Workout::Running)
            }
            WorkoutDetails::Hiking { elevation_gain_m } => {
                HikingWorkout::restore(base, distance_km, duration_min, elevation_gain_m)
                    .map(Workout::Hiking)
            }
        }
    }

    pub fn base(&self) -> &WorkoutBase {
        match self {
            Workout::Running(w) => &w.base,
            Workout::Hiking(w) => &w.base,
        }
    }

    pub fn id(&self) -> &WorkoutId {
        &self.base().id
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.base().created_at
    }

    pub fn route(&self) -> &[RoutePoint] {
        &self.base().route
    }

    pub fn distance_km(&self) -> f64 {
        self.base().distance_km
    }

    pub fn duration_min(&self) -> f64 {
        self.base().duration_min
    }

    pub fn kind(&self) -> WorkoutKind {
        match self {
            Workout::Running(_) => WorkoutKind::Running,
            Workout::Hiking(_) => WorkoutKind::Hiking,
        }
    }

    pub fn details(&self) -> WorkoutDetails {
        match self {
            Workout::Running(w) => WorkoutDetails::Running {
                cadence_spm: w.cadence_spm,
            },
            Workout::Hiking(w) => WorkoutDetails::Hiking {
                elevation_gain_m: w.elevation_gain_m,
            },
        }
    }

    /// Pace for runs, speed for hikes.
    pub fn derived_metric(&self) -> f64 {
        match self {
            Workout::Running(w) => w.pace_min_per_km(),
            Workout::Hiking(w) => w.speed_kmh(),
        }
    }

    pub fn derived_unit(&self) -> &'static str {
        match self {
            Workout::Running(_) => "min/km",
            Workout::Hiking(_) => "km/h",
        }
    }

    pub fn display_icon(&self) -> &'static str {
        match self {
            Workout::Running(_) => "🏃",
            Workout::Hiking(_) => "🥾",
        }
    }

    /// Cadence for runs, elevation gain for hikes.
    pub fn extra_metric(&self) -> f64 {
        match self {
            Workout::Running(w) => w.cadence_spm,
            Workout::Hiking(w) => w.elevation_gain_m,
        }
    }

    pub fn extra_unit(&self) -> &'static str {
        match self {
            Workout::Running(_) => "spm",
            Workout::Hiking(_) => "m",
        }
    }

    pub fn extra_icon(&self) -> &'static str {
        match self {
            Workout::Running(_) => "🦶",
            Workout::Hiking(_) => "⛰",
        }
    }

    /// Heading shown in the workout list, e.g. "Running on October 18, 2026".
    pub fn title(&self) -> String {
        let date = self.created_at();
        format!(
            "{} on {} {}, {}",
            self.kind().label(),
            date.month(),
            date.day(),
            date.year()
        )
    }

    pub fn start(&self) -> GeoPoint {
        // Construction guarantees at least two points.
        self.route()[0].point
    }

    pub fn end(&self) -> GeoPoint {
        self.route()[self.route().len() - 1].point
    }
}

/// Identity and route of a workout whose numbers are not yet validated.
struct PendingBase {
    id: WorkoutId,
    created_at: OffsetDateTime,
    route: Arc<[RoutePoint]>,
    route_km: f64,
    tolerance_km: f64,
}

impl PendingBase {
    fn new(
        id: WorkoutId,
        created_at: OffsetDateTime,
        route: Arc<[RoutePoint]>,
        rounding_km: f64,
    ) -> Self {
        let route_km = route_distance_km(&route);
        Self {
            id,
            created_at,
            route,
            route_km,
            tolerance_km: DISTANCE_EPSILON * route_km.max(1.0) + rounding_km,
        }
    }

    fn complete(self, distance_km: f64, duration_min: f64) -> WorkoutBase {
        WorkoutBase {
            id: self.id,
            created_at: self.created_at,
            route: self.route,
            distance_km,
            duration_min,
        }
    }
}

fn new_base(route: &[RoutePoint]) -> Result<PendingBase, AppError> {
    if route.len() < 2 {
        return Err(AppError::InsufficientPoints { count: route.len() });
    }
    Ok(PendingBase::new(
        WorkoutId::new(),
        OffsetDateTime::now_utc(),
        Arc::from(route),
        0.0,
    ))
}

fn validate_common(base: &PendingBase, distance_km: f64, duration_min: f64) -> Vec<InvalidField> {
    let mut errors = Vec::new();
    check(&mut errors, WorkoutField::Distance, distance_km, true);
    let matches_route = (distance_km - base.route_km).abs() <= base.tolerance_km;
    if errors.is_empty() && !matches_route {
        errors.push(InvalidField {
            field: WorkoutField::Distance,
            violation: Violation::RouteMismatch,
        });
    }
    check(&mut errors, WorkoutField::Duration, duration_min, true);
    errors
}

fn check(errors: &mut Vec<InvalidField>, field: WorkoutField, value: f64, positive: bool) {
    let violation = if !value.is_finite() {
        Violation::NotFinite
    } else if positive && value <= 0.0 {
        Violation::NotPositive
    } else {
        return;
    };
    errors.push(InvalidField { field, violation });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_route() -> Vec<RoutePoint> {
        vec![
            RoutePoint::new(GeoPoint::new(0.0, 0.0), 0.0),
            RoutePoint::new(GeoPoint::new(0.0, 0.05), 5.56),
            RoutePoint::new(GeoPoint::new(0.0, 0.09), 4.44),
        ]
    }

    #[test]
    fn test_running_pace() {
        let workout = Workout::create_running(&sample_route(), 10.0, 50.0, 170.0).unwrap();
        assert_eq!(workout.kind(), WorkoutKind::Running);
        assert!((workout.derived_metric() - 5.0).abs() < 1e-9);
        assert_eq!(workout.derived_unit(), "min/km");
        assert_eq!(workout.extra_metric(), 170.0);
        assert_eq!(workout.extra_unit(), "spm");
    }

    #[test]
    fn test_hiking_speed_with_descent() {
        let workout = Workout::create_hiking(&sample_route(), 10.0, 120.0, -50.0).unwrap();
        assert_eq!(workout.kind(), WorkoutKind::Hiking);
        assert!((workout.derived_metric() - 5.0).abs() < 1e-9);
        assert_eq!(workout.derived_unit(), "km/h");
        assert_eq!(workout.extra_metric(), -50.0);
    }

    #[test]
    fn test_running_reports_every_invalid_field() {
        let err = Workout::create_running(&sample_route(), 0.0, f64::NAN, -1.0).unwrap_err();
        let fields: Vec<_> = err.invalid_fields().iter().map(|f| f.field).collect();
        assert_eq!(
            fields,
            vec![
                WorkoutField::Distance,
                WorkoutField::Duration,
                WorkoutField::Cadence
            ]
        );
        assert_eq!(err.invalid_fields()[1].violation, Violation::NotFinite);
    }

    #[test]
    fn test_running_validation_rules() {
        let route = sample_route();
        let bad = [0.0, -3.0, f64::NAN, f64::INFINITY];

        for value in bad {
            assert!(Workout::create_running(&route, value, 30.0, 170.0).is_err());
            assert!(Workout::create_running(&route, 10.0, value, 170.0).is_err());
            assert!(Workout::create_running(&route, 10.0, 30.0, value).is_err());
        }
        assert!(Workout::create_running(&route, 10.0, 0.5, 1.0).is_ok());
    }

    #[test]
    fn test_hiking_validation_rules() {
        let route = sample_route();

        for gain in [0.0, -120.0, 850.0] {
            assert!(Workout::create_hiking(&route, 10.0, 60.0, gain).is_ok());
        }
        for gain in [f64::NAN, f64::NEG_INFINITY] {
            let err = Workout::create_hiking(&route, 10.0, 60.0, gain).unwrap_err();
            assert_eq!(err.invalid_fields()[0].field, WorkoutField::ElevationGain);
        }
        assert!(Workout::create_hiking(&route, 0.0, 60.0, 10.0).is_err());
        assert!(Workout::create_hiking(&route, 10.0, -1.0, 10.0).is_err());
    }

    #[test]
    fn test_distance_must_match_route() {
        let route = sample_route();

        let err = Workout::create_running(&route, 1.11, 30.0, 170.0).unwrap_err();
        assert_eq!(
            err.invalid_fields(),
            &[InvalidField {
                field: WorkoutField::Distance,
                violation: Violation::RouteMismatch,
            }]
        );
        assert!(Workout::create_hiking(&route, 10.01, 60.0, 5.0).is_err());
        assert!(Workout::create_hiking(&route, route_distance_km(&route), 60.0, 5.0).is_ok());
    }

    #[test]
    fn test_restore_allows_rounding_slack() {
        let restore = |distance_km, rounding_km| {
            Workout::restore(
                WorkoutId::from("legacy"),
                OffsetDateTime::UNIX_EPOCH,
                sample_route(),
                distance_km,
                30.0,
                WorkoutDetails::Running { cadence_spm: 170.0 },
                rounding_km,
            )
        };

        assert!(restore(10.004, 0.0).is_err());
        assert!(restore(10.004, 0.005).is_ok());
        assert!(restore(10.02, 0.005).is_err());
    }

    #[test]
    fn test_non_finite_segments_never_match() {
        let mut route = sample_route();
        route[1].segment_distance_km = f64::NAN;
        assert!(Workout::create_running(&route, 10.0, 30.0, 170.0).is_err());
    }

    #[test]
    fn test_short_route_rejected() {
        let route = vec![RoutePoint::new(GeoPoint::new(1.0, 1.0), 0.0)];
        let err = Workout::create_running(&route, 5.0, 30.0, 170.0).unwrap_err();
        assert!(matches!(err, AppError::InsufficientPoints { count: 1 }));
    }

    #[test]
    fn test_route_is_copied() {
        let mut route = sample_route();
        let workout = Workout::create(
            &route,
            10.0,
            60.0,
            WorkoutDetails::Hiking {
                elevation_gain_m: 12.0,
            },
        )
        .unwrap();
        route.clear();

        assert_eq!(workout.route().len(), 3);
        assert_eq!(workout.start(), GeoPoint::new(0.0, 0.0));
        assert_eq!(workout.end(), GeoPoint::new(0.0, 0.09));
    }

    #[test]
    fn test_title() {
        let workout = Workout::create_running(&sample_route(), 10.0, 50.0, 170.0).unwrap();
        let date = workout.created_at();
        let expected = format!("Running on {} {}, {}", date.month(), date.day(), date.year());
        assert_eq!(workout.title(), expected);
    }

    #[test]
    fn test_details_from_kind() {
        assert_eq!(
            WorkoutDetails::from_kind(WorkoutKind::Hiking, 30.0),
            WorkoutDetails::Hiking {
                elevation_gain_m: 30.0
            }
        );
        assert_eq!(
            WorkoutDetails::from_kind(WorkoutKind::Running, 160.0).kind(),
            WorkoutKind::Running
        );
    }
}
