//! Bank Value Tracker - records bank value snapshots per account
//!
//! The tracker is the application-facing side of the history store. Callers
//! hand it an account and a computed total whenever a bank is opened; it
//! applies the capture policy (minimum interval, tracking switch, breakdown
//! retention) and persists what survives. Queries never fail: an account
//! without history simply has an empty series.

mod clock;
mod config;
mod error;
mod service;
mod types;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{TrackerConfig, DEFAULT_MIN_CAPTURE_INTERVAL_SECS};
pub use error::{Result, TrackerError};
pub use service::ValueTracker;
pub use types::CaptureOutcome;

/// Re-export commonly used types
pub use history_store::{Breakdown, HistoryStore, ItemValuation, Snapshot, StoreError};
