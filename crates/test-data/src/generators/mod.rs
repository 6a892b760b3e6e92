//! Entity generators for test data.
//!
//! - [`WorkoutGenerator`]: Turn generated routes into form submissions and
//!   commit them to a workout log

pub mod workout;

pub use workout::{NullMap, WorkoutGenerator};
