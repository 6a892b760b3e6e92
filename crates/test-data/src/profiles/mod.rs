//! Athletic performance profiles.
//!
//! Profiles define realistic speeds and grade factors for each workout kind.
//! They are used by the workout generator to turn a route into plausible
//! form values.

mod hiker;
mod runner;

pub use hiker::HikerProfile;
pub use runner::RunnerProfile;

use workouts::WorkoutKind;

/// Trait for athletic performance profiles.
///
/// Implementations should provide:
/// - Base speed on flat terrain
/// - Grade factor (speed multiplier based on slope)
/// - Day-to-day variance
/// - The kind-specific form value (cadence or elevation gain)
pub trait AthleteProfile: Send + Sync {
    fn kind(&self) -> WorkoutKind;

    /// Base speed on flat terrain in meters per second.
    fn base_speed_mps(&self) -> f64;

    /// Speed multiplier for a given grade (expressed as a fraction, e.g., 0.05 = 5% grade).
    ///
    /// Returns a value between 0 and 2+:
    /// - < 1.0 means slower than base (uphill)
    /// - > 1.0 means faster than base (downhill)
    fn grade_factor(&self, grade: f64) -> f64;

    /// Day-to-day performance variance as a coefficient of variation (0.0 - 1.0).
    ///
    /// A value of 0.1 means typical day-to-day variation of ±10%.
    fn variance(&self) -> f64;

    /// Value entered in the kind-specific form field for a route with the
    /// given net elevation change.
    fn extra_metric(&self, net_elevation_m: f64, variance_factor: f64) -> f64;
}

pub fn speed_at_grade(profile: &dyn AthleteProfile, grade: f64, variance_factor: f64) -> f64 {
    let base = profile.base_speed_mps();
    let factor = profile.grade_factor(grade);
    let target = base * factor;

    // Minimum 0.5 m/s to avoid division issues
    (target * variance_factor).max(0.5)
}

/// Samples a variance factor from normal distribution.
/// Returns a multiplier around 1.0.
pub fn sample_variance(profile: &dyn AthleteProfile, rng: &mut impl rand::Rng) -> f64 {
    use rand_distr::{Distribution, Normal};

    match Normal::new(1.0, profile.variance()) {
        Ok(normal) if profile.variance() > 0.0 => normal.sample(rng).clamp(0.7, 1.4),
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_floor() {
        let profile = HikerProfile::default();
        assert_eq!(speed_at_grade(&profile, 1.0, 0.7), 0.5);
    }

    #[test]
    fn test_sample_variance_bounds() {
        let profile = RunnerProfile::default();
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let v = sample_variance(&profile, &mut rng);
            assert!((0.7..=1.4).contains(&v));
        }
    }
}
