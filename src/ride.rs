//! Completed ride records and derived reports.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::geo_utils::compute_bounds;
use crate::{Bounds, Coordinate};

/// Unique ride identifier, derived from the save timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RideId(pub u64);

impl fmt::Display for RideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates strictly increasing ride ids.
///
/// Ids follow the wall clock but never repeat: two saves within the same
/// millisecond (or a clock that steps backwards) get `last + 1`.
#[derive(Debug, Clone, Default)]
pub struct RideIdGenerator {
    last: u64,
}

impl RideIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after an id that is already in use.
    pub fn after(last: RideId) -> Self {
        Self { last: last.0 }
    }

    pub fn next(&mut self, now_ms: i64) -> RideId {
        let candidate = u64::try_from(now_ms).unwrap_or(0);
        self.last = candidate.max(self.last + 1);
        RideId(self.last)
    }
}

/// A point of a recorded track with its elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub coord: Coordinate,
    /// Elevation in meters, if one was recorded for this index.
    pub elevation: Option<f64>,
}

/// A completed, saved ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: RideId,
    /// Unix timestamp (ms) of the first position fix
    pub started_at: i64,
    pub duration_ms: u64,
    /// Rounded to 3 decimals
    pub distance_km: f64,
    /// Rounded to 2 decimals
    pub max_speed_kmh: f64,
    pub coords: Vec<Coordinate>,
    /// Index-aligned with `coords`; may be shorter in stored data
    #[serde(default)]
    pub elevations: Vec<f64>,
}

impl Ride {
    /// Elevation recorded for the point at `index`, 0 when missing.
    pub fn elevation_at(&self, index: usize) -> f64 {
        self.elevations.get(index).copied().unwrap_or(0.0)
    }

    /// Iterate the track with index-aligned elevations.
    pub fn track_points(&self) -> impl Iterator<Item = TrackPoint> + '_ {
        self.coords
            .iter()
            .enumerate()
            .map(|(i, &coord)| TrackPoint {
                coord,
                elevation: self.elevations.get(i).copied(),
            })
    }

    pub fn bounds(&self) -> Option<Bounds> {
        compute_bounds(&self.coords)
    }

    pub fn started_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.started_at).single()
    }

    pub fn summary(&self) -> RideSummary {
        RideSummary {
            id: self.id,
            distance_km: self.distance_km,
            started_at: self.started_at_utc(),
        }
    }

    pub fn elevation_summary(&self) -> Option<ElevationSummary> {
        ElevationSummary::from_elevations(&self.elevations)
    }
}

/// One entry of the saved-rides list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideSummary {
    pub id: RideId,
    pub distance_km: f64,
    pub started_at: Option<DateTime<Utc>>,
}

impl fmt::Display for RideSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.started_at {
            Some(t) => write!(f, "{} km ({})", self.distance_km, t.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "{} km", self.distance_km),
        }
    }
}

/// Min/max elevation and cumulative climbing of a ride.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElevationSummary {
    pub min: f64,
    pub max: f64,
    /// Sum of all positive consecutive deltas
    pub gain: f64,
}

impl ElevationSummary {
    /// Returns `None` when there are no samples.
    pub fn from_elevations(elevations: &[f64]) -> Option<Self> {
        let first = *elevations.first()?;
        let (min, max) = elevations
            .iter()
            .fold((first, first), |(lo, hi), &e| (lo.min(e), hi.max(e)));
        let gain = elevations
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|delta| *delta > 0.0)
            .sum();

        Some(Self { min, max, gain })
    }
}

impl fmt::Display for ElevationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Elevation Summary:\nMin: {} m\nMax: {} m\nTotal Gain: {:.1} m",
            self.min, self.max, self.gain
        )
    }
}
