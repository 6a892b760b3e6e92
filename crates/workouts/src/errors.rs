use std::fmt;

use thiserror::Error;

use crate::models::WorkoutId;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Route has no points to undo")]
    EmptyRoute,

    #[error("Route needs at least 2 points, has {count}")]
    InsufficientPoints { count: usize },

    #[error("Invalid workout input: {}", join_fields(.0))]
    InvalidWorkoutInput(Vec<InvalidField>),

    #[error("Persisted workout log is corrupt: {0}")]
    CorruptPersistedState(String),

    #[error("Route is finished and awaiting commit")]
    RouteFinished,

    #[error("Route must be finished before submitting a workout")]
    NotFinished,

    #[error("Unknown workout: {0}")]
    UnknownWorkout(WorkoutId),

    #[error("Geolocation unavailable: {0}")]
    Geolocation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Everything except a corrupt store leaves the session usable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::CorruptPersistedState(_))
    }

    /// The offending fields of an `InvalidWorkoutInput`, empty for any other error.
    pub fn invalid_fields(&self) -> &[InvalidField] {
        match self {
            AppError::InvalidWorkoutInput(fields) => fields,
            _ => &[],
        }
    }
}

/// Numeric form field that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkoutField {
    Distance,
    Duration,
    Cadence,
    ElevationGain,
}

impl WorkoutField {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkoutField::Distance => "distance",
            WorkoutField::Duration => "duration",
            WorkoutField::Cadence => "cadence",
            WorkoutField::ElevationGain => "elevation gain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    NotFinite,
    NotPositive,
    /// Distance differs from the sum of the route's segments.
    RouteMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidField {
    pub field: WorkoutField,
    pub violation: Violation,
}

impl fmt::Display for InvalidField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.violation {
            Violation::NotFinite => "must be a finite number",
            Violation::NotPositive => "must be greater than zero",
            Violation::RouteMismatch => "must equal the route's total",
        };
        write!(f, "{} {}", self.field.as_str(), reason)
    }
}

fn join_fields(fields: &[InvalidField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_lists_every_field() {
        let err = AppError::InvalidWorkoutInput(vec![
            InvalidField {
                field: WorkoutField::Distance,
                violation: Violation::NotPositive,
            },
            InvalidField {
                field: WorkoutField::Cadence,
                violation: Violation::NotFinite,
            },
        ]);

        let msg = err.to_string();
        assert!(msg.contains("distance must be greater than zero"));
        assert!(msg.contains("cadence must be a finite number"));
        assert_eq!(err.invalid_fields().len(), 2);
    }

    #[test]
    fn test_only_corrupt_state_is_fatal() {
        assert!(AppError::EmptyRoute.is_recoverable());
        assert!(AppError::InsufficientPoints { count: 1 }.is_recoverable());
        assert!(!AppError::CorruptPersistedState("bad".into()).is_recoverable());
    }
}
