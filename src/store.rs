//! # Ride Store
//!
//! Completed rides live in a single JSON array (newest first) under one key of
//! a get/set [`BlobStore`]. Every append rewrites the whole blob.
//!
//! Reads fail soft: a missing, unreadable or corrupt blob is an empty
//! collection. Appends do not: a collection that cannot be read is never
//! overwritten.

use std::collections::HashMap;

use log::{info, warn};

use crate::error::{Result, RideError};
use crate::ride::{Ride, RideId, RideSummary};

/// Named blob storage (e.g. browser localStorage, a key/value table).
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process [`BlobStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Saved ride collection on top of a [`BlobStore`].
pub struct RideStore<S> {
    blobs: S,
    key: String,
}

impl<S: BlobStore> RideStore<S> {
    pub fn new(blobs: S, key: impl Into<String>) -> Self {
        Self {
            blobs,
            key: key.into(),
        }
    }

    /// All saved rides, newest first. Never fails.
    pub fn load_all(&self) -> Vec<Ride> {
        self.try_load_all().unwrap_or_else(|e| {
            warn!("[RideStore] Treating '{}' as empty: {}", self.key, e);
            Vec::new()
        })
    }

    /// All saved rides, failing on a read error or a corrupt blob.
    pub fn try_load_all(&self) -> Result<Vec<Ride>> {
        let raw = match self.blobs.get(&self.key)? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };

        serde_json::from_str(&raw).map_err(|e| RideError::parse("ride collection", e))
    }

    /// Insert `ride` at the front and persist the whole collection.
    ///
    /// Nothing is written if the existing collection cannot be read.
    pub fn append(&mut self, ride: Ride) -> Result<()> {
        let mut rides = self.try_load_all()?;
        let id = ride.id;
        rides.insert(0, ride);

        let json = serde_json::to_string(&rides)
            .map_err(|e| RideError::persistence(format!("Failed to serialize rides: {}", e)))?;
        self.blobs.set(&self.key, &json)?;

        info!("[RideStore] Saved ride {} ({} total)", id, rides.len());
        Ok(())
    }

    pub fn find(&self, id: RideId) -> Option<Ride> {
        self.load_all().into_iter().find(|r| r.id == id)
    }

    /// List entries for the saved-rides view, newest first.
    pub fn summaries(&self) -> Vec<RideSummary> {
        self.load_all().iter().map(Ride::summary).collect()
    }

    /// Largest stored id, used to seed the id generator.
    pub fn max_id(&self) -> Option<RideId> {
        self.load_all().iter().map(|r| r.id).max()
    }

    pub fn blobs(&self) -> &S {
        &self.blobs
    }
}
