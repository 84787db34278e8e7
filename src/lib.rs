//! # Ride Tracker
//!
//! GPS ride recording for cycling: live speed/distance metrics, local ride
//! storage and GPX export.
//!
//! This library provides:
//! - A ride recorder state machine fed by a position stream
//! - Jitter-filtered distance, speed derivation and elevation sampling
//! - A JSON ride collection persisted in any get/set blob store
//! - GPX 1.1 export and elevation summaries
//!
//! ## Features
//!
//! - **`http`** - Enable the Open-Elevation HTTP client
//! - **`persistence`** - Enable the SQLite-backed blob store
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use ride_tracker::{
//!     Coordinate, FixedElevation, MemoryBlobStore, PositionFix, RideTracker, SystemClock,
//!     TrackerConfig, WatchId, WatchOptions, PositionSource, Result,
//! };
//!
//! struct Gps;
//!
//! impl PositionSource for Gps {
//!     fn watch(&mut self, _options: &WatchOptions) -> Result<WatchId> {
//!         Ok(WatchId(1))
//!     }
//!     fn clear_watch(&mut self, _id: WatchId) {}
//! }
//!
//! # futures::executor::block_on(async {
//! let mut tracker = RideTracker::new(
//!     TrackerConfig::default(),
//!     Gps,
//!     FixedElevation(0.0),
//!     MemoryBlobStore::new(),
//!     SystemClock,
//! );
//!
//! tracker.start().unwrap();
//! tracker.on_position(PositionFix::new(Coordinate::new(22.0, 87.0), 0)).await;
//! tracker.on_position(PositionFix::new(Coordinate::new(22.0001, 87.0), 5_000)).await;
//! tracker.stop();
//!
//! let ride = tracker.save().unwrap();
//! let gpx = tracker.export(ride.id).unwrap();
//! assert_eq!(gpx.filename, format!("ride-{}.gpx", ride.id));
//! # });
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, ResultExt, RideError};

// Tracker configuration
pub mod config;
pub use config::{ElevationConfig, TrackerConfig, WatchOptions};

// Geographic utilities (distance, bounds, duration formatting)
pub mod geo_utils;
pub use geo_utils::{format_duration, haversine_distance};

// Elevation lookup with fallback
pub mod elevation;
pub use elevation::{ElevationResolver, ElevationSource, FixedElevation};

// HTTP elevation client
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::OpenElevationClient;

// Ride records and reports
pub mod ride;
pub use ride::{ElevationSummary, Ride, RideId, RideIdGenerator, RideSummary, TrackPoint};

// Recording state machine
pub mod recorder;
pub use recorder::{
    Clock, EventListener, LiveMetrics, PositionError, PositionErrorCode, PositionEvent,
    PositionFix, PositionSource, RecorderEvent, RecorderState, RideRecorder, SystemClock, WatchId,
};

// Ride collection storage
pub mod store;
pub use store::{BlobStore, MemoryBlobStore, RideStore};

// SQLite blob store
#[cfg(feature = "persistence")]
pub mod persistence;
#[cfg(feature = "persistence")]
pub use persistence::SqliteBlobStore;

// GPX export
pub mod gpx;
pub use crate::gpx::{gpx_filename, to_gpx, GpxFile, GPX_MIME_TYPE};

// User-controls facade
pub mod engine;
pub use engine::{RideTracker, RideView};

// Test doubles for the collaborator traits
#[cfg(test)]
pub(crate) mod test_utils;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude in degrees (WGS84).
///
/// Serialized as a `[lat, lon]` pair.
///
/// # Example
/// ```
/// use ride_tracker::Coordinate;
/// let point = Coordinate::new(22.432, 87.322);
/// assert_eq!(serde_json::to_string(&point).unwrap(), "[22.432,87.322]");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([latitude, longitude]: [f64; 2]) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.latitude, c.longitude]
    }
}

/// Bounding box of a track, used to fit a map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(22.432, 87.322).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_coordinate_serializes_as_pair() {
        let json = serde_json::to_string(&Coordinate::new(22.0001, 87.0)).unwrap();
        assert_eq!(json, "[22.0001,87.0]");

        let back: Coordinate = serde_json::from_str("[22.0001,87.0]").unwrap();
        assert_eq!(back, Coordinate::new(22.0001, 87.0));
    }
}
