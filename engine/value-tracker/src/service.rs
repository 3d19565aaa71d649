//! Value tracker implementation
//!
//! The tracker sits between whatever signals a bank opening and the history
//! store. It decides whether a capture is worth keeping and answers the two
//! questions the presentation layer asks: who has history, and what is it.

use crate::clock::{Clock, SystemClock};
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::types::CaptureOutcome;
use dashmap::DashMap;
use history_store::{Breakdown, HistoryStore, Snapshot};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Bank value tracker - records snapshots and serves per-account series
pub struct ValueTracker<S: HistoryStore> {
    config: TrackerConfig,
    store: Arc<S>,
    clock: Arc<dyn Clock>,

    /// Resolved from config once so every capture uses the same window
    min_interval: chrono::Duration,

    // Check-then-append for one account must not interleave
    capture_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: HistoryStore> ValueTracker<S> {
    /// Create a tracker stamping snapshots with the wall clock
    pub fn new(config: TrackerConfig, store: Arc<S>) -> Result<Self> {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Create a tracker with an explicit time source
    pub fn with_clock(config: TrackerConfig, store: Arc<S>, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let min_interval = chrono::Duration::from_std(config.min_capture_interval())
            .map_err(|e| TrackerError::Configuration(e.to_string()))?;

        Ok(Self { config, store, clock, min_interval, capture_locks: DashMap::new() })
    }

    /// Record the value an account's bank holds right now
    pub async fn record_snapshot(
        &self,
        account: &str,
        total_value: i64,
        breakdown: Option<Breakdown>,
    ) -> Result<CaptureOutcome> {
        if account.is_empty() {
            tracing::debug!("Ignoring capture without an account");
            return Ok(CaptureOutcome::NoAccount);
        }

        let now = self.clock.now();
        let mut snapshot = Snapshot::new(now, total_value);
        snapshot.validate()?;

        if !self.config.enabled {
            tracing::trace!("Tracking disabled, dropping capture for {:?}", account);
            return Ok(CaptureOutcome::Disabled);
        }

        if self.config.store_breakdown {
            snapshot.breakdown = breakdown;
        }

        let lock = self.capture_lock(account);
        let _guard = lock.lock().await;

        if let Some(last) = self.store.last_snapshot(account).await? {
            let elapsed = now - last.timestamp;
            if elapsed < self.min_interval {
                tracing::debug!(
                    "Suppressing capture for {:?}: last capture {}s ago, window {}s",
                    account,
                    elapsed.num_seconds(),
                    self.min_interval.num_seconds()
                );
                return Ok(CaptureOutcome::Suppressed { last_captured: last.timestamp });
            }
        }

        self.store.append(account, snapshot.clone()).await?;

        tracing::info!("Recorded bank value {} for {:?}", total_value, account);

        Ok(CaptureOutcome::Recorded { snapshot })
    }

    /// Accounts with at least one recorded snapshot
    pub async fn get_available_users(&self) -> BTreeSet<String> {
        match self.store.list_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::error!("Failed to list accounts with history: {}", e);
                BTreeSet::new()
            }
        }
    }

    /// Whether any account has history at all
    pub async fn has_account_data(&self) -> bool {
        !self.get_available_users().await.is_empty()
    }

    /// An account's series, oldest first; empty when there is none
    pub async fn get_series_for(&self, account: &str) -> Vec<Snapshot> {
        if account.is_empty() {
            return Vec::new();
        }

        match self.store.get_series(account).await {
            Ok(series) => series,
            Err(e) => {
                tracing::error!("Failed to read history for {:?}: {}", account, e);
                Vec::new()
            }
        }
    }

    /// Delete an account's history
    pub async fn remove_account(&self, account: &str) -> Result<()> {
        let lock = self.capture_lock(account);
        let _guard = lock.lock().await;

        self.store.remove_account(account).await?;

        // Held only by the map and by us: no capture is queued behind it
        self.capture_locks.remove_if(account, |_, held| Arc::strong_count(held) <= 2);
        Ok(())
    }

    /// Tracker configuration
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn capture_lock(&self, account: &str) -> Arc<Mutex<()>> {
        self.capture_locks.entry(account.to_string()).or_default().value().clone()
    }

    #[cfg(test)]
    pub(crate) fn capture_lock_count(&self) -> usize {
        self.capture_locks.len()
    }
}
