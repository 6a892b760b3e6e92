//! Hiker athletic profile.

use workouts::WorkoutKind;

use super::AthleteProfile;

/// Athletic profile for hiking workouts.
///
/// Based on typical recreational hiker performance:
/// - Base speed: ~5.5 km/h (1.5 m/s) on flat terrain
/// - Uphill: ~12% slower per 1% grade
/// - Downhill: ~5% faster per 1% grade (conservative due to terrain)
#[derive(Debug, Clone)]
pub struct HikerProfile {
    /// Base speed in m/s on flat terrain.
    base_speed: f64,
    /// Performance variance (coefficient of variation).
    variance: f64,
}

impl Default for HikerProfile {
    fn default() -> Self {
        Self {
            base_speed: 1.5, // ~5.5 km/h
            variance: 0.12,
        }
    }
}

impl HikerProfile {
    /// Creates a hiker profile with the given base speed in km/h.
    pub fn with_speed(speed_kmh: f64) -> Self {
        Self {
            base_speed: speed_kmh / 3.6,
            ..Default::default()
        }
    }

    /// Creates a fast hiker profile (~6.5 km/h base).
    pub fn fast() -> Self {
        Self::with_speed(6.5)
    }

    /// Creates a leisurely hiker profile (~4.0 km/h base).
    pub fn leisurely() -> Self {
        Self::with_speed(4.0)
    }
}

impl AthleteProfile for HikerProfile {
    fn kind(&self) -> WorkoutKind {
        WorkoutKind::Hiking
    }

    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        if grade >= 0.0 {
            (1.0 - grade * 12.0).max(0.25)
        } else {
            // Careful on descents
            (1.0 - grade * 5.0).min(1.3)
        }
    }

    fn variance(&self) -> f64 {
        self.variance
    }

    fn extra_metric(&self, net_elevation_m: f64, _variance_factor: f64) -> f64 {
        net_elevation_m.round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = HikerProfile::default();
        assert!((profile.base_speed_mps() - 1.5).abs() < 0.01);
        assert_eq!(profile.kind(), WorkoutKind::Hiking);
    }

    #[test]
    fn test_moderate_climb() {
        let factor = HikerProfile::default().grade_factor(0.05);
        assert!(factor > 0.3 && factor < 0.8);
    }

    #[test]
    fn test_conservative_descent() {
        let factor = HikerProfile::default().grade_factor(-0.05);
        assert!(factor > 1.0 && factor < 1.3);
    }

    #[test]
    fn test_descent_keeps_sign() {
        assert_eq!(HikerProfile::fast().extra_metric(-42.4, 1.1), -42.0);
    }
}
