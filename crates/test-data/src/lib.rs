//! Test data generation for route-log.
//!
//! This crate generates realistic routes and workouts to fill a workout log
//! for manual verification and integration testing.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let config = SeedConfig { workout_count: 20, ..Default::default() };
//! let mut rng = StdRng::seed_from_u64(config.seed);
//! WorkoutGenerator::new().seed(&mut store, &config, &mut rng)?;
//! ```

pub mod config;
pub mod generators;
pub mod profiles;
pub mod sources;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{BoundingBox, Region, SeedConfig};
    pub use crate::generators::{NullMap, WorkoutGenerator};
    pub use crate::profiles::{
        AthleteProfile, HikerProfile, RunnerProfile, sample_variance, speed_at_grade,
    };
    pub use crate::sources::{GeneratedRoute, ProceduralGenerator, RouteConfig};
}
