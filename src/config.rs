//! Tracker configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RideError};

/// Storage key under which the whole ride collection is kept.
pub const DEFAULT_STORAGE_KEY: &str = "cycle_rides";

/// Default Open-Elevation lookup endpoint.
pub const DEFAULT_ELEVATION_ENDPOINT: &str = "https://api.open-elevation.com/api/v1/lookup";

/// Options passed to the position source when a watch starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    /// Request the most accurate fixes the device can provide.
    /// Default: true
    pub high_accuracy: bool,

    /// Maximum age of a cached position the source may deliver.
    /// Default: 500 ms
    pub maximum_age_ms: u64,

    /// Time allowed for each fix before the source reports a timeout.
    /// Default: 10000 ms
    pub timeout_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age_ms: 500,
            timeout_ms: 10_000,
        }
    }
}

/// Elevation service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    /// Lookup endpoint; `?locations=lat,lon` is appended per request.
    pub endpoint: String,

    /// Upper bound on a single lookup. Default: 5000 ms
    pub timeout_ms: u64,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ELEVATION_ENDPOINT.to_string(),
            timeout_ms: 5_000,
        }
    }
}

/// Configuration for ride recording and storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Consecutive fixes closer than this are treated as GPS noise and do not
    /// add to the ride distance.
    /// Default: 0.5 meters
    pub jitter_threshold_m: f64,

    /// Position watch options.
    pub watch: WatchOptions,

    /// Blob store key for the ride collection.
    /// Default: "cycle_rides"
    pub storage_key: String,

    /// Elevation service settings.
    pub elevation: ElevationConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            jitter_threshold_m: 0.5,
            watch: WatchOptions::default(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            elevation: ElevationConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Parse a (possibly partial) JSON document over the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TrackerConfig =
            serde_json::from_str(json).map_err(|e| RideError::Config {
                message: e.to_string(),
            })?;
        if !config.jitter_threshold_m.is_finite() || config.jitter_threshold_m < 0.0 {
            return Err(RideError::Config {
                message: format!(
                    "jitter_threshold_m must be a non-negative number, got {}",
                    config.jitter_threshold_m
                ),
            });
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.jitter_threshold_m, 0.5);
        assert!(config.watch.high_accuracy);
        assert_eq!(config.watch.maximum_age_ms, 500);
        assert_eq!(config.watch.timeout_ms, 10_000);
        assert_eq!(config.storage_key, "cycle_rides");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            TrackerConfig::from_json(r#"{"storage_key": "rides_v2", "watch": {"timeout_ms": 3000}}"#)
                .unwrap();
        assert_eq!(config.storage_key, "rides_v2");
        assert_eq!(config.watch.timeout_ms, 3000);
        assert_eq!(config.watch.maximum_age_ms, 500);
        assert_eq!(config.jitter_threshold_m, 0.5);
        assert_eq!(config.elevation.endpoint, DEFAULT_ELEVATION_ENDPOINT);
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let result = TrackerConfig::from_json(r#"{"jitter_threshold_m": -1.0}"#);
        assert!(matches!(result, Err(RideError::Config { .. })));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(TrackerConfig::from_json("{not json").is_err());
    }
}
