//! Runner athletic profile.

use workouts::WorkoutKind;

use super::AthleteProfile;

/// Athletic profile for running workouts.
///
/// Based on typical recreational to competitive runner performance:
/// - Base pace: ~5:00/km (3.5 m/s) at ~170 steps per minute
/// - Uphill: ~15% slower per 1% grade
/// - Downhill: ~8% faster per 1% grade (limited by safety)
#[derive(Debug, Clone)]
pub struct RunnerProfile {
    /// Base speed in m/s on flat terrain.
    base_speed: f64,
    /// Typical cadence in steps per minute.
    cadence_spm: f64,
    /// Performance variance (coefficient of variation).
    variance: f64,
}

impl Default for RunnerProfile {
    fn default() -> Self {
        Self {
            base_speed: 3.5, // ~5:00/km
            cadence_spm: 170.0,
            variance: 0.08,
        }
    }
}

impl RunnerProfile {
    /// Creates a runner profile with the given base pace in minutes per
    /// kilometer (e.g., 5.0 for 5:00/km).
    pub fn with_pace(pace_min_per_km: f64) -> Self {
        let base_speed = 1000.0 / (pace_min_per_km * 60.0);
        Self {
            base_speed,
            ..Default::default()
        }
    }

    /// Creates an elite runner profile (~3:30/km base pace).
    pub fn elite() -> Self {
        Self {
            cadence_spm: 182.0,
            ..Self::with_pace(3.5)
        }
    }

    /// Creates a recreational runner profile (~6:00/km base pace).
    pub fn recreational() -> Self {
        Self {
            cadence_spm: 162.0,
            ..Self::with_pace(6.0)
        }
    }
}

impl AthleteProfile for RunnerProfile {
    fn kind(&self) -> WorkoutKind {
        WorkoutKind::Running
    }

    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        if grade >= 0.0 {
            // Minimum 20% of base speed on steep climbs
            (1.0 - grade * 15.0).max(0.2)
        } else {
            // grade is negative, so this adds; capped at 150%
            (1.0 - grade * 8.0).min(1.5)
        }
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn extra_metric(&self, _net_elevation_m: f64, variance_factor: f64) -> f64 {
        // Cadence moves much less than speed from day to day.
        (self.cadence_spm * variance_factor.sqrt()).round()
    }
}
