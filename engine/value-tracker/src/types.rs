//! Type definitions for the value tracker

use chrono::{DateTime, Utc};
use history_store::Snapshot;
use serde::Serialize;

/// What happened to a capture request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// A new snapshot was stored
    Recorded { snapshot: Snapshot },

    /// The previous capture is too recent; nothing was stored
    Suppressed { last_captured: DateTime<Utc> },

    /// No account was given; nothing was stored
    NoAccount,

    /// Tracking is switched off; nothing was stored
    Disabled,
}

impl CaptureOutcome {
    /// Whether a snapshot was written
    pub fn is_recorded(&self) -> bool {
        matches!(self, CaptureOutcome::Recorded { .. })
    }
}
