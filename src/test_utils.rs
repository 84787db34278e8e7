//! Test doubles for the recorder's collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::WatchOptions;
use crate::elevation::ElevationSource;
use crate::error::{Result, RideError};
use crate::recorder::{Clock, PositionSource, WatchId};
use crate::Coordinate;

/// Position source that records watch/clear calls.
#[derive(Debug, Default)]
pub struct MockPositionSource {
    supported: bool,
    next_id: u64,
    active: Option<WatchId>,
    watch_calls: Vec<WatchOptions>,
    cleared: Vec<WatchId>,
}

impl MockPositionSource {
    pub fn new() -> Self {
        Self {
            supported: true,
            ..Default::default()
        }
    }

    /// A device without geolocation.
    pub fn unsupported() -> Self {
        Self::default()
    }

    pub fn watch_calls(&self) -> &[WatchOptions] {
        &self.watch_calls
    }

    pub fn cleared(&self) -> &[WatchId] {
        &self.cleared
    }

    pub fn active(&self) -> Option<WatchId> {
        self.active
    }
}

impl PositionSource for MockPositionSource {
    fn watch(&mut self, options: &WatchOptions) -> Result<WatchId> {
        if !self.supported {
            return Err(RideError::GeolocationUnsupported);
        }
        self.next_id += 1;
        let id = WatchId(self.next_id);
        self.watch_calls.push(options.clone());
        self.active = Some(id);
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        self.cleared.push(id);
        if self.active == Some(id) {
            self.active = None;
        }
    }
}

/// Clock set by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self(Arc::new(AtomicI64::new(now_ms)))
    }

    pub fn set(&self, now_ms: i64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Elevation source answering from a script; `Err(())` simulates a failed
/// lookup and an exhausted script answers 0.
#[derive(Debug, Default)]
pub struct ScriptedElevation {
    script: Mutex<VecDeque<std::result::Result<f64, ()>>>,
    calls: AtomicUsize,
}

impl ScriptedElevation {
    pub fn new(script: Vec<std::result::Result<f64, ()>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ElevationSource for ScriptedElevation {
    async fn lookup(&self, _coord: Coordinate) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .map_err(|_| RideError::parse("script", "poisoned"))?
            .pop_front();
        match next {
            Some(Ok(elevation)) => Ok(elevation),
            Some(Err(())) => Err(RideError::Http {
                message: "scripted failure".to_string(),
                status_code: Some(503),
            }),
            None => Ok(0.0),
        }
    }
}
