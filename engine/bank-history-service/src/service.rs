//! Service state management and component initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::ServiceConfig;
use history_store::{HistoryStore, LocalHistoryStore};
use value_tracker::ValueTracker;

/// Tracker wired to the on-disk store
pub type Tracker = ValueTracker<LocalHistoryStore>;

/// Service state owning the single tracker instance
pub struct ServiceState {
    /// Service configuration
    pub config: ServiceConfig,

    /// The tracker every consumer is handed explicitly
    pub tracker: Arc<Tracker>,
}

impl ServiceState {
    /// Create the store and tracker from configuration
    pub async fn new(config: ServiceConfig) -> Result<Self> {
        info!("Initializing history store at {:?}...", config.store.data_dir);
        let mut store = LocalHistoryStore::new(config.store.clone())
            .context("Failed to create history store")?;

        store.initialize().await.context("Failed to initialize history store")?;

        let tracker = ValueTracker::new(config.tracker.clone(), Arc::new(store))
            .context("Failed to create value tracker")?;

        info!(
            "Value tracker ready (enabled={}, min interval={}s, breakdowns={})",
            config.tracker.enabled,
            config.tracker.min_capture_interval_secs,
            config.tracker.store_breakdown
        );

        Ok(Self { config, tracker: Arc::new(tracker) })
    }

    /// Shutdown service components
    pub async fn shutdown(&self) -> Result<()> {
        self.tracker.store().shutdown().await.context("Failed to shutdown history store")?;
        info!("Service components shutdown complete");
        Ok(())
    }
}
