//! Collaborators the session drives: map, form, workout list and geolocation.

use crate::{
    errors::AppError,
    models::{GeoPoint, RenderId, WorkoutId},
    workout::Workout,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerStyle {
    /// A point of the route being built.
    RoutePoint,
    /// Start of a committed workout.
    WorkoutStart,
    /// End of the selected workout's route.
    Finish,
}

/// Map rendering surface. Artifacts are addressed by id only.
pub trait MapSurface {
    fn place_marker(&mut self, id: RenderId, point: GeoPoint, style: MarkerStyle);
    fn remove_marker(&mut self, id: RenderId);
    fn draw_segment(&mut self, id: RenderId, from: GeoPoint, to: GeoPoint);
    fn remove_segment(&mut self, id: RenderId);
    fn fit_to_bounds(&mut self, points: &[GeoPoint]);
    fn center_on(&mut self, point: GeoPoint);
}

/// Workout entry form.
pub trait WorkoutForm {
    fn prefill_distance(&mut self, km: f64, locked: bool);
    fn show(&mut self);
    fn hide(&mut self);
    fn clear_fields(&mut self);
}

/// List of committed workouts.
pub trait WorkoutList {
    fn render_workout(&mut self, workout: &Workout);
    fn set_active(&mut self, id: &WorkoutId);
    fn set_instructions_visible(&mut self, visible: bool);
}

pub trait GeolocationProvider {
    fn current_position(&self) -> Result<GeoPoint, AppError>;
}
