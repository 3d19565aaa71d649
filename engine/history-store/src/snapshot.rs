//! Bank value snapshots
//!
//! A snapshot is one immutable observation of an account's total bank value.
//! The optional breakdown is whatever the valuation layer handed over; the
//! store keeps it verbatim and never interprets it.

use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current on-disk record version
pub const RECORD_VERSION: u32 = 1;

/// Per-item breakdown of a captured value, keyed by item identifier
pub type Breakdown = BTreeMap<String, ItemValuation>;

/// Quantity and value of one item at capture time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemValuation {
    pub quantity: u64,
    pub value: i64,
}

/// One timestamped bank value observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the value was captured
    pub timestamp: DateTime<Utc>,

    /// Total bank value, never negative once stored
    pub total_value: i64,

    /// Optional per-item breakdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Breakdown>,
}

impl Snapshot {
    /// Create a snapshot without a breakdown
    pub fn new(timestamp: DateTime<Utc>, total_value: i64) -> Self {
        Self { timestamp, total_value, breakdown: None }
    }

    /// Attach a breakdown
    pub fn with_breakdown(mut self, breakdown: Breakdown) -> Self {
        self.breakdown = Some(breakdown);
        self
    }

    /// Check the snapshot can be stored
    pub fn validate(&self) -> Result<()> {
        if self.total_value < 0 {
            return Err(StoreError::invalid_input(format!(
                "total value must not be negative, got {}",
                self.total_value
            )));
        }
        Ok(())
    }
}

/// A snapshot as written to a journal line
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SnapshotRecord {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub total_value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Breakdown>,
}

impl From<&Snapshot> for SnapshotRecord {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            version: RECORD_VERSION,
            timestamp: snapshot.timestamp,
            total_value: snapshot.total_value,
            breakdown: snapshot.breakdown.clone(),
        }
    }
}

impl TryFrom<SnapshotRecord> for Snapshot {
    type Error = StoreError;

    fn try_from(record: SnapshotRecord) -> Result<Self> {
        if record.version != RECORD_VERSION {
            return Err(StoreError::corruption(format!(
                "unsupported record version {}",
                record.version
            )));
        }

        let snapshot = Snapshot {
            timestamp: record.timestamp,
            total_value: record.total_value,
            breakdown: record.breakdown,
        };

        snapshot
            .validate()
            .map_err(|_| StoreError::corruption(format!("negative value {}", record.total_value)))?;

        Ok(snapshot)
    }
}
