//! Panel selection state
//!
//! Decides whether the presentation layer should show the history panel or
//! the placeholder panel, and whether its "add dataset" button is live. This
//! is state only; rendering belongs to whoever consumes [`PanelState`].

use history_store::{Breakdown, HistoryStore};
use serde::Serialize;
use std::sync::Arc;
use value_tracker::{CaptureOutcome, ValueTracker};

use crate::events::GameEvent;

/// Panel currently shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum ActivePanel {
    /// "No data yet" placeholder
    Default,

    /// History panel, opened for the account it was first created with
    History { account: String },
}

/// Observable panel state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelState {
    pub active: ActivePanel,
    pub dataset_button: bool,
}

/// Drives panel state from game events
pub struct PanelController<S: HistoryStore> {
    tracker: Arc<ValueTracker<S>>,
    active: ActivePanel,

    /// Account the history panel was created for; the panel is built once
    history_account: Option<String>,

    dataset_button: bool,
}

impl<S: HistoryStore> PanelController<S> {
    /// Create a controller showing the default panel
    pub fn new(tracker: Arc<ValueTracker<S>>) -> Self {
        Self { tracker, active: ActivePanel::Default, history_account: None, dataset_button: false }
    }

    /// Create a controller and pick the initial panel with no active account
    pub async fn start(tracker: Arc<ValueTracker<S>>) -> Self {
        let mut controller = Self::new(tracker);
        controller.refresh("").await;
        controller
    }

    /// Current state
    pub fn state(&self) -> PanelState {
        PanelState { active: self.active.clone(), dataset_button: self.dataset_button }
    }

    /// Whether the history panel is the one on screen
    pub fn is_history_active(&self) -> bool {
        matches!(self.active, ActivePanel::History { .. })
    }

    /// Re-evaluate which panel to show
    ///
    /// The history panel appears once there is an account to show or any
    /// stored history at all; otherwise the placeholder is shown.
    pub async fn refresh(&mut self, username: &str) {
        if !username.is_empty() || self.tracker.has_account_data().await {
            let account = self.history_account.get_or_insert_with(|| {
                tracing::trace!("Creating the bank history panel for {:?}", username);
                username.to_string()
            });

            let next = ActivePanel::History { account: account.clone() };
            if self.active != next {
                tracing::trace!("Setting the active panel to the bank history panel");
                self.active = next;
            }
        } else if self.active != ActivePanel::Default {
            tracing::trace!("Setting the active panel to the default panel");
            self.active = ActivePanel::Default;
        }
    }

    /// The player opened their bank
    ///
    /// A supplied valuation is captured first; a failed capture is logged and
    /// the interaction carries on as if nothing had been recorded.
    pub async fn on_bank_opened(
        &mut self,
        account: &str,
        valuation: Option<(i64, Option<Breakdown>)>,
    ) -> Option<CaptureOutcome> {
        tracing::trace!("Player opened the bank");

        let outcome = match valuation {
            Some((total_value, breakdown)) => {
                match self.tracker.record_snapshot(account, total_value, breakdown).await {
                    Ok(outcome) => Some(outcome),
                    Err(e) => {
                        tracing::error!("Failed to capture bank value for {:?}: {}", account, e);
                        None
                    }
                }
            }
            None => None,
        };

        self.refresh(account).await;
        if self.is_history_active() {
            self.dataset_button = true;
        }

        outcome
    }

    /// The bank interface was closed
    pub fn on_bank_closed(&mut self) {
        if self.history_account.is_some() {
            self.dataset_button = false;
        }
    }

    /// The game connection dropped
    pub fn on_connection_lost(&mut self) {
        if self.history_account.is_some() {
            self.dataset_button = false;
        }
    }

    /// Dispatch a game event and return the resulting state
    pub async fn handle(&mut self, event: GameEvent) -> (Option<CaptureOutcome>, PanelState) {
        let outcome = match event {
            GameEvent::BankOpened { account, total_value, breakdown } => {
                self.on_bank_opened(&account, total_value.map(|v| (v, breakdown))).await
            }
            GameEvent::BankClosed => {
                self.on_bank_closed();
                None
            }
            GameEvent::ConnectionLost => {
                self.on_connection_lost();
                None
            }
        };

        (outcome, self.state())
    }
}
