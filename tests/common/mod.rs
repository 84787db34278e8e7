//! Shared doubles for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use ride_tracker::{
    Clock, Coordinate, ElevationSource, PositionFix, PositionSource, Result, RideError, WatchId,
    WatchOptions,
};

/// Geolocation stand-in that always grants a watch.
#[derive(Debug, Default)]
pub struct FakeGps {
    pub watches: u64,
    pub active: Option<WatchId>,
}

impl PositionSource for FakeGps {
    fn watch(&mut self, _options: &WatchOptions) -> Result<WatchId> {
        self.watches += 1;
        let id = WatchId(self.watches);
        self.active = Some(id);
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        if self.active == Some(id) {
            self.active = None;
        }
    }
}

/// Clock shared between the test and the tracker.
#[derive(Debug, Clone, Default)]
pub struct TestClock(Arc<AtomicI64>);

impl TestClock {
    pub fn at(now_ms: i64) -> Self {
        Self(Arc::new(AtomicI64::new(now_ms)))
    }

    pub fn set(&self, now_ms: i64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Elevation rising 1 m per 0.0001 degrees of latitude above 22 N.
#[derive(Debug, Default)]
pub struct SlopeElevation;

impl ElevationSource for SlopeElevation {
    async fn lookup(&self, coord: Coordinate) -> Result<f64> {
        Ok(((coord.latitude - 22.0) * 10_000.0).round())
    }
}

/// Elevation service that is always down.
#[derive(Debug, Default)]
pub struct OfflineElevation;

impl ElevationSource for OfflineElevation {
    async fn lookup(&self, _coord: Coordinate) -> Result<f64> {
        Err(RideError::Http {
            message: "offline".to_string(),
            status_code: None,
        })
    }
}

pub fn fix(lat: f64, lon: f64, t: i64) -> PositionFix {
    PositionFix::new(Coordinate::new(lat, lon), t)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
