//! Saved rides survive reopening a SQLite-backed store.
//!
//! Run with: `cargo test --features persistence --test sqlite_store`

mod common;

use common::{fix, init_logging, FakeGps, SlopeElevation, TestClock};
use ride_tracker::{BlobStore, RideId, RideStore, RideTracker, SqliteBlobStore, TrackerConfig};
use tempfile::TempDir;

#[tokio::test]
async fn test_rides_survive_reopen() {
    init_logging();
    let tmp_dir = TempDir::new().expect("failed to create temp dir");
    let db_path = tmp_dir.path().join("rides.db");
    let db_path = db_path.to_str().unwrap();

    let first_id = {
        let blobs = SqliteBlobStore::new(db_path).expect("failed to open store");
        let mut tracker = RideTracker::new(
            TrackerConfig::default(),
            FakeGps::default(),
            SlopeElevation,
            blobs,
            TestClock::at(60_000),
        );
        tracker.start().unwrap();
        tracker.on_position(fix(22.0, 87.0, 0)).await;
        tracker.on_position(fix(22.0001, 87.0, 5_000)).await;
        tracker.on_position(fix(22.0003, 87.0, 10_000)).await;
        tracker.stop();
        tracker.save().unwrap().id
    };

    // Reopen: the saved ride is there and new ids continue after it
    let blobs = SqliteBlobStore::new(db_path).expect("failed to reopen store");
    let mut tracker = RideTracker::new(
        TrackerConfig::default(),
        FakeGps::default(),
        SlopeElevation,
        blobs,
        TestClock::at(1_000),
    );

    let ride = tracker.ride(first_id).expect("ride should persist");
    assert_eq!(ride.coords.len(), 3);
    assert_eq!(ride.elevations, vec![0.0, 1.0, 3.0]);

    let summary = tracker.elevation_summary(first_id).unwrap();
    assert_eq!(summary.gain, 3.0);

    tracker.start().unwrap();
    tracker.on_position(fix(22.0, 87.0, 0)).await;
    tracker.stop();
    let second = tracker.save().unwrap();
    assert_eq!(second.id, RideId(first_id.0 + 1));
    assert_eq!(tracker.rides().len(), 2);
}

#[test]
fn test_corrupt_blob_in_sqlite() {
    let mut blobs = SqliteBlobStore::in_memory().unwrap();
    blobs.set("cycle_rides", "[{\"id\": \"oops\"}]").unwrap();

    let store = RideStore::new(blobs, "cycle_rides");
    assert!(store.load_all().is_empty());
}
