//! Route construction state machine.
//!
//! Points are accumulated while the builder is enabled. `finish` freezes the
//! route and reports its total distance; the points stay around until the
//! workout is committed (`reset`) or the session is thrown away (`cancel`).
//!
//! The builder never holds rendering handles. Every point owns a marker id,
//! and every point after the first also owns the id of the segment joining it
//! to its predecessor. Map artifacts are created and removed through those ids.

use crate::{
    errors::AppError,
    geo_math,
    models::{GeoPoint, RenderId, RenderIds, RoutePoint, route_distance_km},
    surface::{MapSurface, MarkerStyle},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    /// No points, accepting clicks.
    Idle,
    /// One or more points, accepting clicks.
    Building,
    /// Frozen, waiting for the workout to be committed.
    Finished,
}

#[derive(Debug, Clone, Copy)]
struct PointArtifacts {
    marker: RenderId,
    segment: Option<RenderId>,
}

#[derive(Debug)]
pub struct RouteBuilder {
    points: Vec<RoutePoint>,
    artifacts: Vec<PointArtifacts>,
    enabled: bool,
    ids: RenderIds,
}

impl RouteBuilder {
    pub fn new() -> Self {
        Self::with_render_ids(RenderIds::default())
    }

    /// Creates a builder that draws ids from a shared counter.
    pub fn with_render_ids(ids: RenderIds) -> Self {
        Self {
            points: Vec::new(),
            artifacts: Vec::new(),
            enabled: true,
            ids,
        }
    }

    pub fn state(&self) -> RouteState {
        if !self.enabled {
            RouteState::Finished
        } else if self.points.is_empty() {
            RouteState::Idle
        } else {
            RouteState::Building
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn total_distance_km(&self) -> f64 {
        route_distance_km(&self.points)
    }

    /// Appends a point. Returns `false` without touching anything while the
    /// route is finished.
    pub fn add_point(&mut self, point: GeoPoint, map: &mut dyn MapSurface) -> bool {
        if !self.enabled {
            tracing::debug!("Ignoring point {point}: route is finished");
            return false;
        }

        let marker = self.ids.next_id();
        map.place_marker(marker, point, MarkerStyle::RoutePoint);

        let (segment_distance_km, segment) = match self.points.last() {
            Some(prev) => {
                let segment = self.ids.next_id();
                map.draw_segment(segment, prev.point, point);
                (geo_math::distance_km(prev.point, point), Some(segment))
            }
            None => (0.0, None),
        };

        self.points.push(RoutePoint::new(point, segment_distance_km));
        self.artifacts.push(PointArtifacts { marker, segment });

        tracing::debug!(
            "Added point {} ({:.3} km from previous, {} points)",
            point,
            segment_distance_km,
            self.points.len()
        );
        true
    }

    /// Removes the most recent point along with its marker and segment.
    pub fn undo_last(&mut self, map: &mut dyn MapSurface) -> Result<RoutePoint, AppError> {
        if !self.enabled {
            return Err(AppError::RouteFinished);
        }
        let (Some(point), Some(artifacts)) = (self.points.pop(), self.artifacts.pop()) else {
            return Err(AppError::EmptyRoute);
        };

        remove_artifacts(map, artifacts);

        tracing::debug!("Removed point {} ({} left)", point.point, self.points.len());
        Ok(point)
    }

    /// Drops every point and returns to idle. A no-op on an empty route.
    pub fn cancel(&mut self, map: &mut dyn MapSurface) {
        if self.points.is_empty() && self.enabled {
            return;
        }
        self.clear(map);
        tracing::debug!("Route cancelled");
    }

    /// Freezes the route and returns its total distance in kilometers.
    pub fn finish(&mut self) -> Result<f64, AppError> {
        if self.points.len() < 2 {
            return Err(AppError::InsufficientPoints {
                count: self.points.len(),
            });
        }

        self.enabled = false;
        let total = self.total_distance_km();

        tracing::debug!(
            "Route finished: {} points, {:.3} km",
            self.points.len(),
            total
        );
        Ok(total)
    }

    /// Clears a committed or abandoned route and starts accepting points again.
    pub fn reset(&mut self, map: &mut dyn MapSurface) {
        self.clear(map);
    }

    fn clear(&mut self, map: &mut dyn MapSurface) {
        for artifacts in self.artifacts.drain(..) {
            remove_artifacts(map, artifacts);
        }
        self.points.clear();
        self.enabled = true;
    }
}

impl Default for RouteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_artifacts(map: &mut dyn MapSurface, artifacts: PointArtifacts) {
    map.remove_marker(artifacts.marker);
    if let Some(segment) = artifacts.segment {
        map.remove_segment(segment);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Map that keeps track of what is currently drawn.
    #[derive(Default)]
    struct TestMap {
        markers: HashMap<RenderId, GeoPoint>,
        segments: HashMap<RenderId, (GeoPoint, GeoPoint)>,
    }

    impl MapSurface for TestMap {
        fn place_marker(&mut self, id: RenderId, point: GeoPoint, _style: MarkerStyle) {
            assert!(self.markers.insert(id, point).is_none(), "duplicate id {id}");
        }

        fn remove_marker(&mut self, id: RenderId) {
            assert!(self.markers.remove(&id).is_some(), "unknown marker {id}");
        }

        fn draw_segment(&mut self, id: RenderId, from: GeoPoint, to: GeoPoint) {
            assert!(self.segments.insert(id, (from, to)).is_none(), "duplicate id {id}");
        }

        fn remove_segment(&mut self, id: RenderId) {
            assert!(self.segments.remove(&id).is_some(), "unknown segment {id}");
        }

        fn fit_to_bounds(&mut self, _points: &[GeoPoint]) {}

        fn center_on(&mut self, _point: GeoPoint) {}
    }

    fn points() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(40.0150, -105.2705),
            GeoPoint::new(40.0175, -105.2650),
            GeoPoint::new(40.0210, -105.2601),
            GeoPoint::new(40.0198, -105.2552),
        ]
    }

    #[test]
    fn test_first_point_has_zero_segment() {
        let mut map = TestMap::default();
        let mut builder = RouteBuilder::new();

        assert_eq!(builder.state(), RouteState::Idle);
        assert!(builder.add_point(GeoPoint::new(1.0, 1.0), &mut map));

        assert_eq!(builder.state(), RouteState::Building);
        assert_eq!(builder.points()[0].segment_distance_km, 0.0);
        assert_eq!(map.markers.len(), 1);
        assert!(map.segments.is_empty());
    }

    #[test]
    fn test_finish_total_matches_segment_sum() {
        let mut map = TestMap::default();
        let mut builder = RouteBuilder::new();
        let pts = points();
        for p in &pts {
            builder.add_point(*p, &mut map);
        }

        let expected: f64 = pts
            .windows(2)
            .map(|w| geo_math::distance_km(w[0], w[1]))
            .fold(0.0, |acc, d| acc + d);
        let total = builder.finish().unwrap();

        assert_eq!(total, expected);
        assert_eq!(builder.state(), RouteState::Finished);
        assert_eq!(builder.len(), 4);
        assert_eq!(map.segments.len(), 3);
    }

    #[test]
    fn test_one_degree_along_equator() {
        let mut map = TestMap::default();
        let mut builder = RouteBuilder::new();
        builder.add_point(GeoPoint::new(0.0, 0.0), &mut map);
        builder.add_point(GeoPoint::new(0.0, 1.0), &mut map);

        let total = builder.finish().unwrap();
        assert!((total - 111.2).abs() < 0.5, "got {total}");
    }

    #[test]
    fn test_undo_on_empty_route() {
        let mut map = TestMap::default();
        let mut builder = RouteBuilder::new();

        let err = builder.undo_last(&mut map).unwrap_err();
        assert!(matches!(err, AppError::EmptyRoute));
        assert_eq!(builder.state(), RouteState::Idle);
        assert!(builder.is_enabled());
    }

    #[test]
    fn test_undo_removes_marker_and_segment() {
        let mut map = TestMap::default();
        let mut builder = RouteBuilder::new();
        let pts = points();
        builder.add_point(pts[0], &mut map);
        builder.add_point(pts[1], &mut map);

        let removed = builder.undo_last(&mut map).unwrap();

        assert_eq!(removed.point, pts[1]);
        assert_eq!(builder.len(), 1);
        assert_eq!(map.markers.len(), 1);
        assert!(map.segments.is_empty());
    }

    #[test]
    fn test_undo_then_finish_needs_two_points() {
        let mut map = TestMap::default();
        let mut builder = RouteBuilder::new();
        let pts = points();
        builder.add_point(pts[0], &mut map);
        builder.add_point(pts[1], &mut map);
        builder.undo_last(&mut map).unwrap();

        let err = builder.finish().unwrap_err();
        assert!(matches!(err, AppError::InsufficientPoints { count: 1 }));
        assert_eq!(builder.state(), RouteState::Building);
    }

    #[test]
    fn test_finish_with_too_few_points() {
        let mut map = TestMap::default();
        let mut builder = RouteBuilder::new();
        assert!(matches!(
            builder.finish(),
            Err(AppError::InsufficientPoints { count: 0 })
        ));

        builder.add_point(GeoPoint::new(1.0, 1.0), &mut map);
        assert!(matches!(
            builder.finish(),
            Err(AppError::InsufficientPoints { count: 1 })
        ));
        assert!(builder.is_enabled());
    }

    #[test]
    fn test_finished_route_ignores_clicks_and_undo() {
        let mut map = TestMap::default();
        let mut builder = RouteBuilder::new();
        for p in points() {
            builder.add_point(p, &mut map);
        }
        builder.finish().unwrap();

        assert!(!builder.add_point(GeoPoint::new(0.0, 0.0), &mut map));
        assert!(matches!(
            builder.undo_last(&mut map),
            Err(AppError::RouteFinished)
        ));
        assert_eq!(builder.len(), 4);
    }

    #[test]
    fn test_cancel_clears_everything() {
        let mut map = TestMap::default();
        let mut builder = RouteBuilder::new();
        builder.cancel(&mut map);
        assert_eq!(builder.state(), RouteState::Idle);

        for p in points() {
            builder.add_point(p, &mut map);
        }
        builder.cancel(&mut map);

        assert_eq!(builder.state(), RouteState::Idle);
        assert!(map.markers.is_empty());
        assert!(map.segments.is_empty());
    }

    #[test]
    fn test_reset_after_finish() {
        let mut map = TestMap::default();
        let mut builder = RouteBuilder::new();
        for p in points() {
            builder.add_point(p, &mut map);
        }
        builder.finish().unwrap();
        builder.reset(&mut map);

        assert_eq!(builder.state(), RouteState::Idle);
        assert!(builder.is_enabled());
        assert!(map.markers.is_empty());
        assert!(builder.add_point(GeoPoint::new(2.0, 2.0), &mut map));
    }
}
