//! Runtime configuration read from the environment.

use std::{env, path::PathBuf};

use crate::models::GeoPoint;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_STORAGE_KEY: &str = "workouts";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding the persisted workout log.
    pub data_dir: PathBuf,
    /// Key the log is stored under; the file is `<data_dir>/<key>.json`.
    pub storage_key: String,
    /// Position reported by the terminal geolocation provider.
    pub start_position: Option<GeoPoint>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            start_position: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = env::var("ROUTE_LOG_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        let storage_key =
            env::var("ROUTE_LOG_KEY").unwrap_or_else(|_| DEFAULT_STORAGE_KEY.to_string());

        let start_position = env::var("ROUTE_LOG_START").ok().and_then(|raw| {
            let parsed = parse_position(&raw);
            if parsed.is_none() {
                tracing::warn!("Ignoring ROUTE_LOG_START={raw:?}, expected \"lat,lng\"");
            }
            parsed
        });

        Self {
            data_dir: PathBuf::from(data_dir),
            storage_key,
            start_position,
        }
    }
}

/// Parses `"lat,lng"` in degrees.
pub fn parse_position(raw: &str) -> Option<GeoPoint> {
    let (lat, lng) = raw.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    GeoPoint::checked(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        assert_eq!(
            parse_position("40.015, -105.27"),
            Some(GeoPoint::new(40.015, -105.27))
        );
        assert_eq!(parse_position("40.015"), None);
        assert_eq!(parse_position("north,east"), None);
        assert_eq!(parse_position("91,0"), None);
        assert_eq!(parse_position("NaN,0"), None);
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.storage_key, "workouts");
        assert!(config.start_position.is_none());
    }
}
