//! Workout log persistence.
//!
//! The whole log is stored as one JSON blob under a single key. Version 1 is
//! `{ "version": 1, "workouts": [...] }`; the unversioned bare array written
//! by the first release of the app is still accepted on load and rewritten
//! as version 1 on the next commit.

use std::{
    fs,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
};

use bytes::Bytes;
use futures::executor::block_on;
use object_store::{ObjectStore, local::LocalFileSystem, path::Path as ObjectPath};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    errors::AppError,
    models::{GeoPoint, RoutePoint, WorkoutId},
    workout::{Workout, WorkoutDetails},
};

pub const SCHEMA_VERSION: u64 = 1;

/// The unversioned format stored distances rounded to two decimals.
const LEGACY_DISTANCE_ROUNDING_KM: f64 = 0.005;

/// Single-key byte storage backing the workout log.
pub trait BlobStore: Send + Sync {
    fn get(&self) -> Result<Option<Bytes>, AppError>;
    fn set(&self, blob: Bytes) -> Result<(), AppError>;
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blob: Mutex<Option<Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<Bytes>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self) -> Result<Option<Bytes>, AppError> {
        Ok(self
            .blob
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set(&self, blob: Bytes) -> Result<(), AppError> {
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = Some(blob);
        Ok(())
    }
}

/// Stores the blob as `<dir>/<key>.json` in a local object store. Writes
/// are staged and renamed into place, so a failed write never truncates the
/// previous log.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    store: Arc<dyn ObjectStore>,
    location: ObjectPath,
    path: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>, key: &str) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let store = LocalFileSystem::new_with_prefix(&dir)?;
        let file = format!("{key}.json");

        Ok(Self {
            store: Arc::new(store),
            location: ObjectPath::from(file.as_str()),
            path: dir.join(file),
        })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self) -> Result<Option<Bytes>, AppError> {
        block_on(async {
            match self.store.get(&self.location).await {
                Ok(result) => Ok(Some(result.bytes().await?)),
                Err(object_store::Error::NotFound { .. }) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn set(&self, blob: Bytes) -> Result<(), AppError> {
        block_on(self.store.put(&self.location, blob.into()))?;
        Ok(())
    }
}

/// Ordered, append-only log of committed workouts.
pub struct WorkoutStore {
    workouts: Vec<Workout>,
    backend: Arc<dyn BlobStore>,
}

impl WorkoutStore {
    /// Loads the persisted log. A missing blob is an empty log; a malformed
    /// one is `CorruptPersistedState`.
    pub fn open(backend: Arc<dyn BlobStore>) -> Result<Self, AppError> {
        let workouts = match backend.get()? {
            Some(blob) => deserialize(&blob)?,
            None => Vec::new(),
        };

        tracing::info!("Loaded {} workouts", workouts.len());
        Ok(Self { workouts, backend })
    }

    /// Like `open`, but starts with an empty log when the stored blob is
    /// corrupt. The blob is left as-is until the next commit overwrites it.
    /// Backend failures are still returned.
    pub fn open_or_empty(backend: Arc<dyn BlobStore>) -> Result<Self, AppError> {
        match Self::open(backend.clone()) {
            Err(AppError::CorruptPersistedState(reason)) => {
                tracing::error!("Workout log is corrupt, starting empty: {reason}");
                Ok(Self {
                    workouts: Vec::new(),
                    backend,
                })
            }
            other => other,
        }
    }

    /// Creates a workout from a finished route, appends it and persists the
    /// log. On any failure the log is left exactly as it was.
    pub fn commit(
        &mut self,
        route: &[RoutePoint],
        distance_km: f64,
        duration_min: f64,
        details: WorkoutDetails,
    ) -> Result<&Workout, AppError> {
        let workout = Workout::create(route, distance_km, duration_min, details)?;

        self.workouts.push(workout);
        if let Err(e) = self.persist() {
            self.workouts.pop();
            tracing::error!("Failed to persist workout log: {e}");
            return Err(e);
        }

        let workout = &self.workouts[self.workouts.len() - 1];
        tracing::info!(
            "Committed {} workout {} ({:.2} km, {:.0} min)",
            workout.kind(),
            workout.id(),
            workout.distance_km(),
            workout.duration_min()
        );
        Ok(workout)
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn find(&self, id: &WorkoutId) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    fn persist(&self) -> Result<(), AppError> {
        let blob = serialize(&self.workouts)?;
        self.backend.set(blob)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PersistedLog {
    version: u64,
    workouts: Vec<PersistedWorkout>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PersistedWorkout {
    id: WorkoutId,
    kind: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    route: Vec<PersistedPoint>,
    distance_km: f64,
    duration_min: f64,
    cadence_spm: Option<f64>,
    elevation_gain_m: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PersistedPoint {
    lat: f64,
    lng: f64,
    segment_distance_km: f64,
}

/// Record layout of the unversioned blob.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyWorkout {
    id: Value,
    #[serde(with = "time::serde::rfc3339")]
    date: OffsetDateTime,
    #[serde(rename = "type")]
    kind: Option<String>,
    coords: Vec<LegacyPoint>,
    distance: f64,
    duration: f64,
    cadence: Option<f64>,
    elevation_gain: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyPoint {
    lat: f64,
    lng: f64,
    segment_distance: f64,
}

impl From<&Workout> for PersistedWorkout {
    fn from(workout: &Workout) -> Self {
        let (cadence_spm, elevation_gain_m) = match workout.details() {
            WorkoutDetails::Running { cadence_spm } => (Some(cadence_spm), None),
            WorkoutDetails::Hiking { elevation_gain_m } => (None, Some(elevation_gain_m)),
        };

        Self {
            id: workout.id().clone(),
            kind: workout.kind().as_str().to_string(),
            created_at: workout.created_at(),
            route: workout
                .route()
                .iter()
                .map(|p| PersistedPoint {
                    lat: p.point.lat,
                    lng: p.point.lng,
                    segment_distance_km: p.segment_distance_km,
                })
                .collect(),
            distance_km: workout.distance_km(),
            duration_min: workout.duration_min(),
            cadence_spm,
            elevation_gain_m,
        }
    }
}

impl TryFrom<PersistedWorkout> for Workout {
    type Error = AppError;

    fn try_from(record: PersistedWorkout) -> Result<Self, Self::Error> {
        let route = record
            .route
            .into_iter()
            .map(|p| RoutePoint::new(GeoPoint::new(p.lat, p.lng), p.segment_distance_km))
            .collect();
        let details = details_for(
            &record.id,
            Some(&record.kind),
            record.cadence_spm,
            record.elevation_gain_m,
        )?;

        restore(
            record.id,
            record.created_at,
            route,
            record.distance_km,
            record.duration_min,
            details,
            0.0,
        )
    }
}

impl TryFrom<LegacyWorkout> for Workout {
    type Error = AppError;

    fn try_from(record: LegacyWorkout) -> Result<Self, Self::Error> {
        let id = match record.id {
            Value::String(s) => WorkoutId::from(s),
            Value::Number(n) => WorkoutId::from(n.to_string()),
            other => return Err(corrupt(format!("invalid workout id {other}"))),
        };
        let route = record
            .coords
            .into_iter()
            .map(|p| RoutePoint::new(GeoPoint::new(p.lat, p.lng), p.segment_distance))
            .collect();
        let details = details_for(
            &id,
            record.kind.as_deref(),
            record.cadence,
            record.elevation_gain,
        )?;

        restore(
            id,
            record.date,
            route,
            record.distance,
            record.duration,
            details,
            LEGACY_DISTANCE_ROUNDING_KM,
        )
    }
}

fn details_for(
    id: &WorkoutId,
    kind: Option<&str>,
    cadence_spm: Option<f64>,
    elevation_gain_m: Option<f64>,
) -> Result<WorkoutDetails, AppError> {
    match (kind, cadence_spm, elevation_gain_m) {
        (Some("running"), Some(cadence_spm), None) => Ok(WorkoutDetails::Running { cadence_spm }),
        (Some("hiking"), None, Some(elevation_gain_m)) => {
            Ok(WorkoutDetails::Hiking { elevation_gain_m })
        }
        (Some(kind @ ("running" | "hiking")), _, _) => Err(corrupt(format!(
            "workout {id}: {kind} record has mismatched kind-specific fields"
        ))),
        (Some(kind), _, _) => Err(corrupt(format!("workout {id}: unknown kind '{kind}'"))),
        (None, _, _) => Err(corrupt(format!("workout {id}: missing kind"))),
    }
}

fn restore(
    id: WorkoutId,
    created_at: OffsetDateTime,
    route: Vec<RoutePoint>,
    distance_km: f64,
    duration_min: f64,
    details: WorkoutDetails,
    rounding_km: f64,
) -> Result<Workout, AppError> {
    let label = id.to_string();
    Workout::restore(
        id,
        created_at,
        route,
        distance_km,
        duration_min,
        details,
        rounding_km,
    )
    .map_err(|e| corrupt(format!("workout {label}: {e}")))
}

fn corrupt(msg: impl Into<String>) -> AppError {
    AppError::CorruptPersistedState(msg.into())
}

/// Encodes the whole log as one self-contained versioned blob.
pub fn serialize(workouts: &[Workout]) -> Result<Bytes, AppError> {
    let log = PersistedLog {
        version: SCHEMA_VERSION,
        workouts: workouts.iter().map(PersistedWorkout::from).collect(),
    };
    Ok(Bytes::from(serde_json::to_vec(&log)?))
}

/// Decodes a blob produced by `serialize`, or an unversioned legacy blob,
/// back into typed workouts in their original order.
pub fn deserialize(blob: &[u8]) -> Result<Vec<Workout>, AppError> {
    let value: Value =
        serde_json::from_slice(blob).map_err(|e| corrupt(format!("invalid JSON: {e}")))?;

    match value {
        Value::Array(_) => {
            let records: Vec<LegacyWorkout> = serde_json::from_value(value)
                .map_err(|e| corrupt(format!("invalid legacy record: {e}")))?;
            tracing::info!("Upgrading {} workouts from unversioned log", records.len());
            records.into_iter().map(Workout::try_from).collect()
        }
        Value::Object(ref map) => {
            match map.get("version").and_then(Value::as_u64) {
                Some(SCHEMA_VERSION) => {}
                Some(other) => return Err(corrupt(format!("unsupported version {other}"))),
                None => return Err(corrupt("missing version")),
            }
            let log: PersistedLog = serde_json::from_value(value)
                .map_err(|e| corrupt(format!("invalid record: {e}")))?;
            log.workouts.into_iter().map(Workout::try_from).collect()
        }
        _ => Err(corrupt("expected an object or an array")),
    }
}
