//! Configuration for the value tracker

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default minimum spacing between two captures of the same account
pub const DEFAULT_MIN_CAPTURE_INTERVAL_SECS: u64 = 300;

/// Configuration for the value tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Whether captures are recorded at all
    pub enabled: bool,

    /// Captures closer than this to the previous one are suppressed
    pub min_capture_interval_secs: u64,

    /// Whether per-item breakdowns are persisted with each snapshot
    pub store_breakdown: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_capture_interval_secs: DEFAULT_MIN_CAPTURE_INTERVAL_SECS,
            store_breakdown: true,
        }
    }
}

impl TrackerConfig {
    /// Minimum capture interval as a duration
    pub fn min_capture_interval(&self) -> Duration {
        Duration::from_secs(self.min_capture_interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if chrono::Duration::from_std(self.min_capture_interval()).is_err() {
            return Err(format!(
                "min_capture_interval_secs out of range: {}",
                self.min_capture_interval_secs
            ));
        }

        Ok(())
    }
}
