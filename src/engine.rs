//! # Ride Tracker
//!
//! Ties the recorder, the ride store and the id generator together behind the
//! actions a user has: start, stop, save, list, view, export, elevation
//! summary and "locate me".
//!
//! Actions on an unknown ride id return `None`; they are informational, not
//! errors.

use futures::Stream;
use log::info;

use crate::config::TrackerConfig;
use crate::elevation::ElevationSource;
use crate::error::{Result, RideError};
use crate::gpx::GpxFile;
use crate::recorder::{
    Clock, EventListener, LiveMetrics, PositionError, PositionEvent, PositionFix, PositionSource,
    RecorderState, RideRecorder,
};
use crate::ride::{ElevationSummary, Ride, RideId, RideIdGenerator, RideSummary};
use crate::store::{BlobStore, RideStore};
use crate::{Bounds, Coordinate};

/// A saved ride's track prepared for display on a map.
#[derive(Debug, Clone, PartialEq)]
pub struct RideView {
    pub id: RideId,
    pub coords: Vec<Coordinate>,
    /// Region to fit the map to; `None` for an empty track
    pub bounds: Option<Bounds>,
}

/// The stateful tracker behind the app's controls.
pub struct RideTracker<P, E, S, C> {
    recorder: RideRecorder<P, E, C>,
    store: RideStore<S>,
    ids: RideIdGenerator,
    /// Set once the current recording has been saved
    saved: bool,
}

impl<P, E, S, C> RideTracker<P, E, S, C>
where
    P: PositionSource,
    E: ElevationSource,
    S: BlobStore,
    C: Clock,
{
    pub fn new(config: TrackerConfig, source: P, elevation: E, blobs: S, clock: C) -> Self {
        let store = RideStore::new(blobs, config.storage_key.clone());
        let ids = store
            .max_id()
            .map(RideIdGenerator::after)
            .unwrap_or_default();

        Self {
            recorder: RideRecorder::new(&config, source, elevation, clock),
            store,
            ids,
            saved: false,
        }
    }

    pub fn add_listener(&mut self, listener: EventListener) {
        self.recorder.add_listener(listener);
    }

    // ========================================================================
    // Recording
    // ========================================================================

    pub fn start(&mut self) -> Result<()> {
        self.recorder.start()?;
        self.saved = false;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.recorder.stop();
    }

    pub async fn on_position(&mut self, fix: PositionFix) -> Option<LiveMetrics> {
        self.recorder.on_position(fix).await
    }

    pub fn on_position_error(&mut self, error: PositionError) {
        self.recorder.on_position_error(error);
    }

    pub async fn drive<St>(&mut self, events: St) -> Result<()>
    where
        St: Stream<Item = PositionEvent>,
    {
        self.recorder.drive(events).await
    }

    /// Save the stopped recording under a fresh id.
    pub fn save(&mut self) -> Result<Ride> {
        if self.saved {
            return Err(RideError::AlreadySaved);
        }
        if self.recorder.state() != RecorderState::Stopped {
            return Err(RideError::invalid_state("save", self.recorder.state()));
        }

        let id = self.ids.next(self.recorder.clock().now_ms());
        let ride = self.recorder.build_ride(id)?;
        self.store.append(ride.clone())?;
        self.saved = true;
        Ok(ride)
    }

    /// Latest recorded position, to center the map on.
    pub fn locate(&self) -> Option<Coordinate> {
        self.recorder.last_position()
    }

    pub fn metrics(&self) -> LiveMetrics {
        self.recorder.metrics()
    }

    pub fn state(&self) -> RecorderState {
        self.recorder.state()
    }

    pub fn recorder(&self) -> &RideRecorder<P, E, C> {
        &self.recorder
    }

    // ========================================================================
    // Saved rides
    // ========================================================================

    pub fn rides(&self) -> Vec<RideSummary> {
        self.store.summaries()
    }

    pub fn ride(&self, id: RideId) -> Option<Ride> {
        let ride = self.store.find(id);
        if ride.is_none() {
            info!("[RideTracker] No saved ride {}", id);
        }
        ride
    }

    pub fn view(&self, id: RideId) -> Option<RideView> {
        self.ride(id).map(|ride| RideView {
            id: ride.id,
            bounds: ride.bounds(),
            coords: ride.coords,
        })
    }

    pub fn export(&self, id: RideId) -> Option<GpxFile> {
        self.ride(id).map(|ride| GpxFile::from_ride(&ride))
    }

    /// `None` for an unknown ride or one without elevation data.
    pub fn elevation_summary(&self, id: RideId) -> Option<ElevationSummary> {
        let summary = self.ride(id)?.elevation_summary();
        if summary.is_none() {
            info!("[RideTracker] No elevation data for ride {}", id);
        }
        summary
    }

    pub fn store(&self) -> &RideStore<S> {
        &self.store
    }
}
