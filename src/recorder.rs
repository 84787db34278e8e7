//! # Ride Recorder
//!
//! State machine that turns a stream of position fixes into a recorded track
//! plus live metrics.
//!
//! ```text
//! Idle --start--> Recording --stop / position error--> Stopped
//!                    ^                                    |
//!                    +---------------start----------------+
//! ```
//!
//! The recorder owns no runtime. Fixes are pushed in through
//! [`RideRecorder::on_position`] (or pumped from a stream with
//! [`RideRecorder::drive`]); every fix awaits one elevation lookup, so fixes
//! are processed strictly in order and the elevation samples stay
//! index-aligned with the track.

use std::fmt;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{TrackerConfig, WatchOptions};
use crate::elevation::{ElevationResolver, ElevationSource};
use crate::error::{OptionExt, Result, RideError};
use crate::geo_utils::{format_duration, haversine_distance, round_to};
use crate::ride::{Ride, RideId};
use crate::Coordinate;

const MS_TO_KMH: f64 = 3.6;

// ============================================================================
// Collaborators
// ============================================================================

/// Handle for an active position watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Device position source (e.g. the platform geolocation service).
///
/// The source only manages the subscription. Fixes and errors produced by the
/// watch are delivered to [`RideRecorder::on_position`] and
/// [`RideRecorder::on_position_error`] by the host.
pub trait PositionSource {
    /// Start watching the device position.
    ///
    /// Returns [`RideError::GeolocationUnsupported`] (or another error) when no
    /// watch can be started.
    fn watch(&mut self, options: &WatchOptions) -> Result<WatchId>;

    /// Stop a watch started by [`PositionSource::watch`].
    fn clear_watch(&mut self, id: WatchId);
}

/// Wall-clock time source.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

// ============================================================================
// Position stream types
// ============================================================================

/// One position update from the watch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub coord: Coordinate,
    /// Unix timestamp of the fix in milliseconds
    pub timestamp_ms: i64,
    /// Device-reported ground speed in m/s, if available
    pub speed_ms: Option<f64>,
}

impl PositionFix {
    pub fn new(coord: Coordinate, timestamp_ms: i64) -> Self {
        Self {
            coord,
            timestamp_ms,
            speed_ms: None,
        }
    }

    pub fn with_speed(mut self, speed_ms: f64) -> Self {
        self.speed_ms = Some(speed_ms);
        self
    }
}

/// Why the position watch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionErrorCode {
    PermissionDenied = 1,
    PositionUnavailable = 2,
    Timeout = 3,
}

/// Failure reported by the position watch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionError {
    pub code: PositionErrorCode,
    pub message: String,
}

impl PositionError {
    pub fn new(code: PositionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code as u8)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

/// Item of a position stream consumed by [`RideRecorder::drive`].
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Fix(PositionFix),
    Error(PositionError),
}

// ============================================================================
// Recorder output
// ============================================================================

/// Recorder lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopped,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecorderState::Idle => "idle",
            RecorderState::Recording => "recording",
            RecorderState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Display values recomputed on every fix. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveMetrics {
    pub current_speed_kmh: f64,
    pub total_distance_km: f64,
    pub elapsed_ms: u64,
    /// `elapsed_ms` as `HH:MM:SS`
    pub elapsed: String,
    pub max_speed_kmh: f64,
}

impl fmt::Display for LiveMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} km/h | {:.3} km | {} | max {:.1} km/h",
            self.current_speed_kmh, self.total_distance_km, self.elapsed, self.max_speed_kmh
        )
    }
}

/// Events emitted to registered listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    Started,
    Metrics(LiveMetrics),
    /// User-visible failure notice; the recorder stops right after.
    PositionFailed(PositionError),
    Stopped,
}

/// Listener callback for recorder events.
pub type EventListener = Arc<dyn Fn(&RecorderEvent) + Send + Sync>;

// ============================================================================
// Ride Recorder
// ============================================================================

/// Records one ride at a time from position fixes.
pub struct RideRecorder<P, E, C> {
    source: P,
    elevation: ElevationResolver<E>,
    clock: C,

    // Configuration
    jitter_threshold_m: f64,
    watch_options: WatchOptions,

    // Lifecycle
    state: RecorderState,
    watch_id: Option<WatchId>,

    // Accumulators, reset on start
    track: Vec<Coordinate>,
    elevations: Vec<f64>,
    total_distance_m: f64,
    current_speed_kmh: f64,
    max_speed_kmh: f64,
    start_time: Option<i64>,
    last_fix_time: Option<i64>,
    stopped_at: Option<i64>,

    listeners: Vec<EventListener>,
}

impl<P, E, C> RideRecorder<P, E, C>
where
    P: PositionSource,
    E: ElevationSource,
    C: Clock,
{
    pub fn new(config: &TrackerConfig, source: P, elevation: E, clock: C) -> Self {
        Self {
            source,
            elevation: ElevationResolver::new(elevation),
            clock,
            jitter_threshold_m: config.jitter_threshold_m,
            watch_options: config.watch.clone(),
            state: RecorderState::Idle,
            watch_id: None,
            track: Vec::new(),
            elevations: Vec::new(),
            total_distance_m: 0.0,
            current_speed_kmh: 0.0,
            max_speed_kmh: 0.0,
            start_time: None,
            last_fix_time: None,
            stopped_at: None,
            listeners: Vec::new(),
        }
    }

    /// Register a listener for [`RecorderEvent`]s.
    pub fn add_listener(&mut self, listener: EventListener) {
        self.listeners.push(listener);
    }

    fn emit(&self, event: RecorderEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Reset all accumulators and start watching the position source.
    pub fn start(&mut self) -> Result<()> {
        if self.state == RecorderState::Recording {
            return Err(RideError::invalid_state("start", self.state));
        }

        let watch_id = self.source.watch(&self.watch_options)?;

        self.track.clear();
        self.elevations.clear();
        self.total_distance_m = 0.0;
        self.current_speed_kmh = 0.0;
        self.max_speed_kmh = 0.0;
        self.start_time = None;
        self.last_fix_time = None;
        self.stopped_at = None;

        self.watch_id = Some(watch_id);
        self.state = RecorderState::Recording;
        info!("[RideRecorder] Recording started (watch {:?})", watch_id);
        self.emit(RecorderEvent::Started);
        Ok(())
    }

    /// Stop watching the position source. Recorded data is kept.
    ///
    /// No-op unless recording.
    pub fn stop(&mut self) {
        if self.state != RecorderState::Recording {
            debug!("[RideRecorder] stop() ignored while {}", self.state);
            return;
        }

        if let Some(id) = self.watch_id.take() {
            self.source.clear_watch(id);
        }
        self.stopped_at = Some(self.clock.now_ms());
        self.state = RecorderState::Stopped;
        info!(
            "[RideRecorder] Recording stopped: {} points, {:.3} km",
            self.track.len(),
            self.total_distance_m / 1000.0
        );
        self.emit(RecorderEvent::Stopped);
    }

    /// Handle one position fix. Returns the updated metrics, or `None` when the
    /// recorder is not recording or the coordinate is non-finite or out of
    /// range.
    pub async fn on_position(&mut self, fix: PositionFix) -> Option<LiveMetrics> {
        if self.state != RecorderState::Recording {
            debug!("[RideRecorder] Fix ignored while {}", self.state);
            return None;
        }
        if !fix.coord.is_valid() {
            debug!(
                "[RideRecorder] Dropping invalid fix ({}, {})",
                fix.coord.latitude, fix.coord.longitude
            );
            return None;
        }

        // Resolved before any mutation so a dropped future leaves the
        // track and elevations aligned.
        let elevation = self.elevation.resolve(fix.coord).await;

        let start = *self.start_time.get_or_insert(fix.timestamp_ms);

        if let Some(&last) = self.track.last() {
            let d = haversine_distance(&last, &fix.coord);
            if d > self.jitter_threshold_m {
                self.total_distance_m += d;
            } else {
                debug!("[RideRecorder] Ignoring {:.2} m jitter", d);
            }
        }

        self.track.push(fix.coord);
        self.elevations.push(elevation);
        self.last_fix_time = Some(fix.timestamp_ms);

        let elapsed_ms = elapsed_between(start, fix.timestamp_ms);
        let speed_ms = fix
            .speed_ms
            .unwrap_or_else(|| self.derived_speed_ms(elapsed_ms));
        let speed_kmh = speed_ms * MS_TO_KMH;
        self.current_speed_kmh = if speed_kmh.is_finite() { speed_kmh } else { 0.0 };

        if self.current_speed_kmh > self.max_speed_kmh {
            self.max_speed_kmh = self.current_speed_kmh;
        }

        let metrics = self.metrics();
        self.emit(RecorderEvent::Metrics(metrics.clone()));
        Some(metrics)
    }

    /// Distance between the last two track points over the time since the
    /// ride started. Zero elapsed time counts as one second.
    fn derived_speed_ms(&self, elapsed_ms: u64) -> f64 {
        let n = self.track.len();
        if n < 2 {
            return 0.0;
        }

        let d = haversine_distance(&self.track[n - 2], &self.track[n - 1]);
        let secs = elapsed_ms as f64 / 1000.0;
        d / if secs == 0.0 { 1.0 } else { secs }
    }

    /// Handle a failure from the position watch: notify listeners and stop.
    /// The session is not retried. Ignored unless recording.
    pub fn on_position_error(&mut self, error: PositionError) {
        if self.state != RecorderState::Recording {
            debug!("[RideRecorder] Geolocation error while {}: {}", self.state, error);
            return;
        }
        warn!("[RideRecorder] Geolocation error: {}", error);
        self.emit(RecorderEvent::PositionFailed(error));
        self.stop();
    }

    /// Feed a position stream into the recorder until the stream ends or the
    /// recorder stops recording.
    ///
    /// A stream error stops the recording and is returned as
    /// [`RideError::PositionSource`].
    pub async fn drive<S>(&mut self, events: S) -> Result<()>
    where
        S: Stream<Item = PositionEvent>,
    {
        futures::pin_mut!(events);

        while self.state == RecorderState::Recording {
            match events.next().await {
                Some(PositionEvent::Fix(fix)) => {
                    self.on_position(fix).await;
                }
                Some(PositionEvent::Error(error)) => {
                    self.on_position_error(error.clone());
                    return Err(RideError::PositionSource(error));
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Package the stopped recording into a [`Ride`].
    pub fn build_ride(&self, id: RideId) -> Result<Ride> {
        if self.state != RecorderState::Stopped {
            return Err(RideError::invalid_state("build a ride", self.state));
        }
        let started_at = self.start_time.ok_or_no_fix()?;
        let stopped_at = self.stopped_at.unwrap_or(started_at);

        Ok(Ride {
            id,
            started_at,
            duration_ms: elapsed_between(started_at, stopped_at),
            distance_km: round_to(self.total_distance_m / 1000.0, 3),
            max_speed_kmh: round_to(self.max_speed_kmh, 2),
            coords: self.track.clone(),
            elevations: self.elevations.clone(),
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Snapshot of the live metrics as of the latest fix.
    pub fn metrics(&self) -> LiveMetrics {
        let elapsed_ms = match (self.start_time, self.last_fix_time) {
            (Some(start), Some(last)) => elapsed_between(start, last),
            _ => 0,
        };
        LiveMetrics {
            current_speed_kmh: self.current_speed_kmh,
            total_distance_km: self.total_distance_m / 1000.0,
            elapsed_ms,
            elapsed: format_duration(elapsed_ms),
            max_speed_kmh: self.max_speed_kmh,
        }
    }

    /// Most recent recorded coordinate.
    pub fn last_position(&self) -> Option<Coordinate> {
        self.track.last().copied()
    }

    pub fn track(&self) -> &[Coordinate] {
        &self.track
    }

    pub fn elevations(&self) -> &[f64] {
        &self.elevations
    }

    pub fn total_distance_m(&self) -> f64 {
        self.total_distance_m
    }

    pub fn max_speed_kmh(&self) -> f64 {
        self.max_speed_kmh
    }

    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    pub fn elevation_source(&self) -> &E {
        self.elevation.source()
    }
}

fn elapsed_between(start_ms: i64, end_ms: i64) -> u64 {
    u64::try_from(end_ms - start_ms).unwrap_or(0)
}

// ============================================================================
// Tests
// ============================================================================
