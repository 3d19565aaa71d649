//! Error types for the value tracker

use history_store::StoreError;
use thiserror::Error;

/// Result type for value tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors that can occur in the value tracker
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<String> for TrackerError {
    fn from(err: String) -> Self {
        TrackerError::Configuration(err)
    }
}
