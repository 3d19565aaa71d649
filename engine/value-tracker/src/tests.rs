//! Capture policy and query tests for ValueTracker

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use history_store::{
    create_local_store, Breakdown, HistoryStore, InMemoryHistoryStore, ItemValuation,
    LocalHistoryStore, StoreError,
};
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

use crate::{CaptureOutcome, ManualClock, TrackerConfig, TrackerError, ValueTracker};

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_600_000_000, 0).unwrap()
}

async fn in_memory_tracker(
    config: TrackerConfig,
) -> (ValueTracker<InMemoryHistoryStore>, Arc<ManualClock>) {
    let mut store = InMemoryHistoryStore::with_default_config();
    store.initialize().await.unwrap();

    let clock = Arc::new(ManualClock::new(epoch()));
    let tracker = ValueTracker::with_clock(config, Arc::new(store), clock.clone()).unwrap();
    (tracker, clock)
}

async fn local_tracker(
    temp_dir: &TempDir,
    clock: Arc<ManualClock>,
) -> ValueTracker<LocalHistoryStore> {
    let mut store = create_local_store(temp_dir.path()).unwrap();
    store.initialize().await.unwrap();
    ValueTracker::with_clock(TrackerConfig::default(), Arc::new(store), clock).unwrap()
}

#[cfg(test)]
mod capture_tests {
    use super::*;

    #[tokio::test]
    async fn test_dedup_window_scenario() {
        let (tracker, clock) = in_memory_tracker(TrackerConfig::default()).await;

        let first = assert_ok!(tracker.record_snapshot("alice", 1000, None).await);
        assert!(first.is_recorded());

        clock.advance(Duration::seconds(600));
        let second = assert_ok!(tracker.record_snapshot("alice", 1200, None).await);
        assert!(second.is_recorded());

        clock.advance(Duration::seconds(10));
        let third = assert_ok!(tracker.record_snapshot("alice", 1300, None).await);
        assert_eq!(
            third,
            CaptureOutcome::Suppressed { last_captured: epoch() + Duration::seconds(600) }
        );

        let series = tracker.get_series_for("alice").await;
        let points: Vec<(DateTime<Utc>, i64)> =
            series.iter().map(|s| (s.timestamp, s.total_value)).collect();
        assert_eq!(
            points,
            vec![(epoch(), 1000), (epoch() + Duration::seconds(600), 1200)]
        );
    }

    #[tokio::test]
    async fn test_spaced_captures_all_recorded_in_order() {
        let (tracker, clock) = in_memory_tracker(TrackerConfig::default()).await;

        let values = [5, 50, 500, 5_000, 50_000, 0];
        for value in values {
            assert!(tracker.record_snapshot("alice", value, None).await.unwrap().is_recorded());
            clock.advance(Duration::seconds(301));
        }

        let recorded: Vec<i64> =
            tracker.get_series_for("alice").await.iter().map(|s| s.total_value).collect();
        assert_eq!(recorded, values.to_vec());
    }

    #[tokio::test]
    async fn test_capture_exactly_at_window_edge_is_recorded() {
        let (tracker, clock) = in_memory_tracker(TrackerConfig::default()).await;

        tracker.record_snapshot("alice", 1, None).await.unwrap();
        clock.advance(Duration::seconds(300));
        assert!(tracker.record_snapshot("alice", 2, None).await.unwrap().is_recorded());
    }

    #[tokio::test]
    async fn test_remove_account_releases_capture_lock() {
        let (tracker, _clock) = in_memory_tracker(TrackerConfig::default()).await;

        tracker.record_snapshot("alice", 1, None).await.unwrap();
        tracker.record_snapshot("bob", 1, None).await.unwrap();
        assert_eq!(tracker.capture_lock_count(), 2);

        tracker.remove_account("alice").await.unwrap();
        assert_eq!(tracker.capture_lock_count(), 1);

        // Removing an account that was never captured leaves nothing behind
        tracker.remove_account("carol").await.unwrap();
        assert_eq!(tracker.capture_lock_count(), 1);
    }

    #[tokio::test]
    async fn test_burst_within_window_does_not_grow_series() {
        let (tracker, clock) = in_memory_tracker(TrackerConfig::default()).await;

        tracker.record_snapshot("alice", 1, None).await.unwrap();
        for i in 0..20 {
            clock.advance(Duration::seconds(5));
            let outcome = tracker.record_snapshot("alice", 100 + i, None).await.unwrap();
            assert!(!outcome.is_recorded());
        }

        assert_eq!(tracker.get_series_for("alice").await.len(), 1);
    }

    #[tokio::test]
    async fn test_window_is_per_account() {
        let (tracker, clock) = in_memory_tracker(TrackerConfig::default()).await;

        tracker.record_snapshot("alice", 1, None).await.unwrap();
        clock.advance(Duration::seconds(10));
        assert!(tracker.record_snapshot("bob", 2, None).await.unwrap().is_recorded());
    }

    #[tokio::test]
    async fn test_zero_interval_records_everything() {
        let config = TrackerConfig { min_capture_interval_secs: 0, ..Default::default() };
        let (tracker, _clock) = in_memory_tracker(config).await;

        for value in 0..3 {
            assert!(tracker.record_snapshot("alice", value, None).await.unwrap().is_recorded());
        }
        assert_eq!(tracker.get_series_for("alice").await.len(), 3);
    }

    #[tokio::test]
    async fn test_negative_value_rejected() {
        let (tracker, _clock) = in_memory_tracker(TrackerConfig::default()).await;

        let err = assert_err!(tracker.record_snapshot("alice", -1, None).await);
        assert!(matches!(err, TrackerError::Store(StoreError::InvalidInput(_))));
        assert!(tracker.get_series_for("alice").await.is_empty());
        assert!(tracker.get_available_users().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_account_never_written() {
        let (tracker, _clock) = in_memory_tracker(TrackerConfig::default()).await;

        let outcome = assert_ok!(tracker.record_snapshot("", 1000, None).await);
        assert_eq!(outcome, CaptureOutcome::NoAccount);
        assert!(tracker.get_series_for("").await.is_empty());
        assert!(!tracker.has_account_data().await);
    }

    #[tokio::test]
    async fn test_disabled_tracking_records_nothing() {
        let config = TrackerConfig { enabled: false, ..Default::default() };
        let (tracker, _clock) = in_memory_tracker(config).await;

        let outcome = assert_ok!(tracker.record_snapshot("alice", 1000, None).await);
        assert_eq!(outcome, CaptureOutcome::Disabled);
        assert!(tracker.get_series_for("alice").await.is_empty());
    }

    #[tokio::test]
    async fn test_breakdown_retention_follows_config() {
        let mut breakdown = Breakdown::new();
        breakdown.insert("coins".to_string(), ItemValuation { quantity: 1000, value: 1000 });

        let (keeps, _clock) = in_memory_tracker(TrackerConfig::default()).await;
        keeps.record_snapshot("alice", 1000, Some(breakdown.clone())).await.unwrap();
        assert_eq!(keeps.get_series_for("alice").await[0].breakdown, Some(breakdown.clone()));

        let config = TrackerConfig { store_breakdown: false, ..Default::default() };
        let (drops, _clock) = in_memory_tracker(config).await;
        drops.record_snapshot("alice", 1000, Some(breakdown)).await.unwrap();
        assert_eq!(drops.get_series_for("alice").await[0].breakdown, None);
    }
}

#[cfg(test)]
mod query_tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_account_has_empty_series() {
        let (tracker, _clock) = in_memory_tracker(TrackerConfig::default()).await;
        assert!(tracker.get_series_for("nobody").await.is_empty());
    }

    #[tokio::test]
    async fn test_available_users_tracks_records_and_removals() {
        let (tracker, _clock) = in_memory_tracker(TrackerConfig::default()).await;

        tracker.record_snapshot("alice", 1, None).await.unwrap();
        tracker.record_snapshot("bob", 2, None).await.unwrap();

        let users: Vec<String> = tracker.get_available_users().await.into_iter().collect();
        assert_eq!(users, vec!["alice".to_string(), "bob".to_string()]);

        assert_ok!(tracker.remove_account("alice").await);
        assert_ok!(tracker.remove_account("alice").await);

        let users: Vec<String> = tracker.get_available_users().await.into_iter().collect();
        assert_eq!(users, vec!["bob".to_string()]);
        assert!(tracker.has_account_data().await);
    }

    #[tokio::test]
    async fn test_removed_account_can_record_again_immediately() {
        let (tracker, _clock) = in_memory_tracker(TrackerConfig::default()).await;

        tracker.record_snapshot("alice", 1, None).await.unwrap();
        tracker.remove_account("alice").await.unwrap();
        assert!(tracker.record_snapshot("alice", 2, None).await.unwrap().is_recorded());
    }

    #[tokio::test]
    async fn test_uninitialized_store_degrades_to_empty() {
        let store = Arc::new(InMemoryHistoryStore::with_default_config());
        let tracker = ValueTracker::new(TrackerConfig::default(), store).unwrap();

        assert!(tracker.get_available_users().await.is_empty());
        assert!(tracker.get_series_for("alice").await.is_empty());
        assert!(tracker.record_snapshot("alice", 1, None).await.is_err());
    }
}

#[cfg(test)]
mod persistence_tests {
    use super::*;

    #[tokio::test]
    async fn test_history_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(epoch()));

        let recorded = {
            let tracker = local_tracker(&temp_dir, clock.clone()).await;
            for value in [1000, 1200, 900, 4000] {
                tracker.record_snapshot("alice", value, None).await.unwrap();
                clock.advance(Duration::seconds(3600));
            }
            tracker.get_series_for("alice").await
        };
        assert_eq!(recorded.len(), 4);

        let tracker = local_tracker(&temp_dir, clock.clone()).await;
        assert_eq!(tracker.get_series_for("alice").await, recorded);

        // The window is measured against persisted history, not process lifetime
        clock.set(recorded[3].timestamp + Duration::seconds(30));
        let outcome = tracker.record_snapshot("alice", 5000, None).await.unwrap();
        assert!(!outcome.is_recorded());
    }

    #[tokio::test]
    async fn test_concurrent_captures_same_account_respect_window() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(epoch()));
        let tracker = Arc::new(local_tracker(&temp_dir, clock).await);

        let mut handles = Vec::new();
        for value in 0..16 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                tracker.record_snapshot("alice", value, None).await.unwrap()
            }));
        }

        let mut recorded = 0;
        for handle in handles {
            if handle.await.unwrap().is_recorded() {
                recorded += 1;
            }
        }

        assert_eq!(recorded, 1);
        assert_eq!(tracker.get_series_for("alice").await.len(), 1);
    }
}
