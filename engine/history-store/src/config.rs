//! Configuration for the history store

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the history store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryStoreConfig {
    /// Base directory for history files
    pub data_dir: PathBuf,

    /// Whether to fsync the journal after every append
    pub fsync_every_write: bool,
}

impl Default for HistoryStoreConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("./data"), fsync_every_write: true }
    }
}

impl HistoryStoreConfig {
    /// Create a new configuration with custom data directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), ..Default::default() }
    }

    /// Get the directory holding one journal per account
    pub fn accounts_dir(&self) -> PathBuf {
        self.data_dir.join("accounts")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.data_dir.as_os_str().is_empty() {
            return Err("data_dir must not be empty".to_string());
        }

        Ok(())
    }
}
