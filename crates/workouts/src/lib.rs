pub mod config;
pub mod errors;
pub mod geo_math;
pub mod models;
pub mod route_builder;
pub mod session;
pub mod store;
pub mod surface;
pub mod workout;

pub use crate::{
    errors::AppError,
    models::{GeoPoint, RoutePoint, WorkoutId, WorkoutKind},
    route_builder::{RouteBuilder, RouteState},
    session::{FormSubmission, SessionController},
    store::{BlobStore, FileBlobStore, MemoryBlobStore, WorkoutStore},
    workout::{HikingWorkout, RunningWorkout, Workout, WorkoutDetails},
};
