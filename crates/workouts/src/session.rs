//! Session controller wiring the route builder and workout store to the
//! map, form and list collaborators.

use crate::{
    errors::AppError,
    geo_math,
    models::{GeoPoint, RenderId, RenderIds, RoutePoint, WorkoutId, WorkoutKind},
    route_builder::{RouteBuilder, RouteState},
    store::WorkoutStore,
    surface::{GeolocationProvider, MapSurface, MarkerStyle, WorkoutForm, WorkoutList},
    workout::{Workout, WorkoutDetails},
};

/// Values entered in the workout form. Distance is not part of it: the
/// finished route's total is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormSubmission {
    pub kind: WorkoutKind,
    pub duration_min: f64,
    /// Cadence for runs, elevation gain for hikes.
    pub extra: f64,
}

#[derive(Debug, Clone, Copy)]
enum Overlay {
    Marker(RenderId),
    Segment(RenderId),
}

pub struct SessionController<M, F, L> {
    map: M,
    form: F,
    list: L,
    builder: RouteBuilder,
    store: WorkoutStore,
    ids: RenderIds,
    overlay: Vec<Overlay>,
    start_markers: Vec<(WorkoutId, RenderId)>,
    selected: Option<WorkoutId>,
}

impl<M, F, L> SessionController<M, F, L>
where
    M: MapSurface,
    F: WorkoutForm,
    L: WorkoutList,
{
    pub fn new(map: M, form: F, list: L, store: WorkoutStore) -> Self {
        let ids = RenderIds::default();
        Self {
            map,
            form,
            list,
            builder: RouteBuilder::with_render_ids(ids.clone()),
            store,
            ids,
            overlay: Vec::new(),
            start_markers: Vec::new(),
            selected: None,
        }
    }

    /// Centers the map and renders the workouts loaded from the store.
    pub fn start(&mut self, geolocation: &dyn GeolocationProvider) {
        match geolocation.current_position() {
            Ok(position) => self.map.center_on(position),
            Err(e) => tracing::warn!("Could not get current position: {e}"),
        }

        for workout in self.store.workouts() {
            let marker = render_committed(&mut self.map, &mut self.list, &self.ids, workout);
            self.start_markers.push((workout.id().clone(), marker));
        }
        self.list.set_instructions_visible(self.store.is_empty());
    }

    /// Forwards a map click to the route builder. Points outside valid
    /// coordinates are ignored.
    pub fn point_clicked(&mut self, point: GeoPoint) -> bool {
        if !point.is_valid() {
            tracing::warn!("Ignoring click outside valid coordinates: {point}");
            return false;
        }
        let accepted = self.builder.add_point(point, &mut self.map);
        if accepted {
            self.clear_overlay();
        }
        accepted
    }

    pub fn undo(&mut self) -> Result<RoutePoint, AppError> {
        self.builder.undo_last(&mut self.map)
    }

    /// Discards the route in progress. A finished route also closes the form.
    pub fn cancel(&mut self) {
        if self.builder.state() == RouteState::Finished {
            self.abandon();
        } else {
            self.builder.cancel(&mut self.map);
        }
        self.clear_overlay();
    }

    /// Freezes the route and opens the form with the distance filled in.
    pub fn finish(&mut self) -> Result<f64, AppError> {
        let total = self.builder.finish()?;
        self.form.prefill_distance(total, true);
        self.form.show();
        Ok(total)
    }

    /// Commits the finished route with the form values. On failure nothing is
    /// cleared, so the user can correct the form and submit again.
    pub fn submit(&mut self, submission: FormSubmission) -> Result<&Workout, AppError> {
        if self.builder.state() != RouteState::Finished {
            return Err(AppError::NotFinished);
        }

        let details = WorkoutDetails::from_kind(submission.kind, submission.extra);
        let workout = self
            .store
            .commit(
                self.builder.points(),
                self.builder.total_distance_km(),
                submission.duration_min,
                details,
            )
            .inspect_err(|e| tracing::debug!("Workout submission rejected: {e}"))?;

        self.builder.reset(&mut self.map);
        let marker = render_committed(&mut self.map, &mut self.list, &self.ids, workout);
        self.start_markers.push((workout.id().clone(), marker));
        self.form.hide();
        self.form.clear_fields();
        self.list.set_instructions_visible(false);

        Ok(workout)
    }

    /// Throws away a finished route without committing it.
    pub fn abandon(&mut self) {
        self.builder.reset(&mut self.map);
        self.form.hide();
        self.form.clear_fields();
    }

    /// Highlights a committed workout and draws its route.
    pub fn select_workout(&mut self, id: &WorkoutId) -> Result<(), AppError> {
        let workout = self
            .store
            .find(id)
            .ok_or_else(|| AppError::UnknownWorkout(id.clone()))?;

        for item in self.overlay.drain(..) {
            remove_overlay(&mut self.map, item);
        }
        // A finished route is still waiting on the form, leave it in place.
        if self.builder.state() != RouteState::Finished {
            self.builder.cancel(&mut self.map);
        }

        self.list.set_active(id);

        let points: Vec<GeoPoint> = workout.route().iter().map(|p| p.point).collect();
        if let Some(bounds) = geo_math::route_bounds(&points) {
            tracing::debug!(
                "Fitting map to workout {} around {} ({:.4}..{:.4}, {:.4}..{:.4})",
                id,
                bounds.center(),
                bounds.min_lat,
                bounds.max_lat,
                bounds.min_lng,
                bounds.max_lng
            );
        }
        self.map.fit_to_bounds(&points);

        for pair in points.windows(2) {
            let segment = self.ids.next_id();
            self.map.draw_segment(segment, pair[0], pair[1]);
            self.overlay.push(Overlay::Segment(segment));
        }
        let finish = self.ids.next_id();
        self.map.place_marker(finish, workout.end(), MarkerStyle::Finish);
        self.overlay.push(Overlay::Marker(finish));

        self.selected = Some(id.clone());
        Ok(())
    }

    pub fn state(&self) -> RouteState {
        self.builder.state()
    }

    /// Render id of the start marker drawn for a committed workout.
    pub fn start_marker(&self, id: &WorkoutId) -> Option<RenderId> {
        self.start_markers
            .iter()
            .find(|(workout, _)| workout == id)
            .map(|(_, marker)| *marker)
    }

    pub fn selected(&self) -> Option<&WorkoutId> {
        self.selected.as_ref()
    }

    pub fn builder(&self) -> &RouteBuilder {
        &self.builder
    }

    pub fn store(&self) -> &WorkoutStore {
        &self.store
    }

    pub fn workouts(&self) -> &[Workout] {
        self.store.workouts()
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn list(&self) -> &L {
        &self.list
    }

    fn clear_overlay(&mut self) {
        for item in self.overlay.drain(..) {
            remove_overlay(&mut self.map, item);
        }
        self.selected = None;
    }
}

fn render_committed(
    map: &mut dyn MapSurface,
    list: &mut dyn WorkoutList,
    ids: &RenderIds,
    workout: &Workout,
) -> RenderId {
    let marker = ids.next_id();
    map.place_marker(marker, workout.start(), MarkerStyle::WorkoutStart);
    list.render_workout(workout);
    marker
}

fn remove_overlay(map: &mut dyn MapSurface, item: Overlay) {
    match item {
        Overlay::Marker(id) => map.remove_marker(id),
        Overlay::Segment(id) => map.remove_segment(id),
    }
}
