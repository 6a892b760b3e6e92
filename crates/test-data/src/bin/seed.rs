//! Default seed script - fills the configured workout log with generated
//! workouts.
//!
//! Run with:
//! ```
//! SEED_WORKOUTS=20 cargo run -p test-data --bin seed
//! ```

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};
use test_data::prelude::*;
use tracing_subscriber::EnvFilter;
use workouts::{FileBlobStore, WorkoutStore, config::AppConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app = AppConfig::from_env();
    let mut config = SeedConfig::default();
    if let Ok(count) = std::env::var("SEED_WORKOUTS") {
        config.workout_count = count.parse()?;
    }
    if let Some(start) = app.start_position {
        // Seed around the configured start so the map opens on the routes.
        config.region = BoundingBox::new(
            start.lat - 0.1,
            start.lng - 0.15,
            start.lat + 0.1,
            start.lng + 0.15,
        );
    }

    let backend = Arc::new(FileBlobStore::new(&app.data_dir, &app.storage_key)?);
    tracing::info!("Seeding {}", backend.path().display());
    let mut store = WorkoutStore::open(backend)?;
    let before = store.len();

    let mut rng = StdRng::seed_from_u64(config.seed); // Reproducible data
    let added = WorkoutGenerator::new().seed(&mut store, &config, &mut rng)?;

    tracing::info!("Seed completed!");
    tracing::info!("  Existing workouts: {before}");
    tracing::info!("  Added: {added}");
    tracing::info!("  Total: {}", store.len());

    Ok(())
}
