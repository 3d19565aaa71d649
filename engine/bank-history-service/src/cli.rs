//! # Command Line Interface
//!
//! Record captures, inspect and prune account histories, and replay game
//! event streams through the panel controller.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use history_store::{Breakdown, HistoryStore};
use value_tracker::CaptureOutcome;

use crate::config::render_config;
use crate::events::GameEvent;
use crate::panel::{PanelController, PanelState};
use crate::service::ServiceState;
use crate::signals::setup_signal_handlers;

/// Bank value history tracker
#[derive(Parser)]
#[command(name = "bank-history")]
#[command(about = "Track the value of your bank over time")]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the history data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture a bank value for an account
    Record {
        #[arg(long)]
        account: String,

        /// Total bank value
        #[arg(long, allow_negative_numbers = true)]
        value: i64,

        /// JSON file with a per-item breakdown
        #[arg(long)]
        breakdown: Option<PathBuf>,
    },
    /// List accounts with recorded history
    Accounts,
    /// Show an account's history, oldest first
    Series {
        #[arg(long)]
        account: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an account's history
    Remove {
        #[arg(long)]
        account: String,
    },
    /// Show store counters
    Stats,
    /// Feed JSON-line game events through the panel controller
    Replay {
        /// Event file (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// One line of replay output
#[derive(Serialize)]
struct ReplayStep<'a> {
    line: usize,
    event: &'a GameEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    capture: Option<CaptureOutcome>,
    state: PanelState,
}

/// CLI handler
pub struct CliHandler {
    state: ServiceState,
}

impl CliHandler {
    /// Create new CLI handler
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    /// Handle CLI commands
    pub async fn handle_command<W: Write>(&self, command: Commands, out: &mut W) -> Result<()> {
        match command {
            Commands::Record { account, value, breakdown } => {
                self.record(&account, value, breakdown.as_deref(), out).await?;
            }
            Commands::Accounts => {
                self.show_accounts(out).await?;
            }
            Commands::Series { account, json } => {
                self.show_series(&account, json, out).await?;
            }
            Commands::Remove { account } => {
                self.state.tracker.remove_account(&account).await?;
                writeln!(out, "removed history for {account}")?;
            }
            Commands::Stats => {
                self.show_stats(out).await?;
            }
            Commands::Replay { file } => {
                let shutdown = setup_signal_handlers()?;
                let replay = async {
                    match file {
                        Some(path) => {
                            let file = tokio::fs::File::open(&path)
                                .await
                                .with_context(|| format!("Failed to open {path:?}"))?;
                            self.replay(BufReader::new(file), out).await
                        }
                        None => self.replay(BufReader::new(tokio::io::stdin()), out).await,
                    }
                };

                tokio::select! {
                    result = replay => result?,
                    _ = shutdown => info!("Replay interrupted"),
                }
            }
            Commands::Config => {
                write!(out, "{}", render_config(&self.state.config)?)?;
            }
        }
        Ok(())
    }

    /// Release the store
    pub async fn shutdown(&self) -> Result<()> {
        self.state.shutdown().await
    }

    /// Replay game events from a reader, writing one JSON line per event
    pub async fn replay<R, W>(&self, reader: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut controller = PanelController::start(self.state.tracker.clone()).await;
        let mut lines = reader.lines();
        let mut line_no = 0usize;
        let mut handled = 0usize;
        let mut rejected = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;

            let event = match GameEvent::parse_line(&line) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping line {}: {:#}", line_no, e);
                    rejected += 1;
                    continue;
                }
            };

            let (capture, state) = controller.handle(event.clone()).await;
            let step = ReplayStep { line: line_no, event: &event, capture, state };
            writeln!(out, "{}", serde_json::to_string(&step)?)?;
            handled += 1;
        }

        info!("Replay finished: {} events handled, {} rejected", handled, rejected);
        Ok(())
    }

    async fn record<W: Write>(
        &self,
        account: &str,
        value: i64,
        breakdown: Option<&Path>,
        out: &mut W,
    ) -> Result<()> {
        let breakdown = match breakdown {
            Some(path) => Some(read_breakdown(path)?),
            None => None,
        };

        match self.state.tracker.record_snapshot(account, value, breakdown).await? {
            CaptureOutcome::Recorded { snapshot } => writeln!(
                out,
                "recorded {} for {} at {}",
                snapshot.total_value,
                account,
                snapshot.timestamp.to_rfc3339()
            )?,
            CaptureOutcome::Suppressed { last_captured } => writeln!(
                out,
                "suppressed: {} was last captured at {}",
                account,
                last_captured.to_rfc3339()
            )?,
            CaptureOutcome::NoAccount => writeln!(out, "no account given; nothing recorded")?,
            CaptureOutcome::Disabled => writeln!(out, "tracking disabled; nothing recorded")?,
        }

        Ok(())
    }

    async fn show_accounts<W: Write>(&self, out: &mut W) -> Result<()> {
        let accounts = self.state.tracker.get_available_users().await;
        if accounts.is_empty() {
            writeln!(out, "no bank history recorded yet")?;
        }
        for account in accounts {
            writeln!(out, "{account}")?;
        }
        Ok(())
    }

    async fn show_series<W: Write>(&self, account: &str, json: bool, out: &mut W) -> Result<()> {
        let series = self.state.tracker.get_series_for(account).await;

        if json {
            writeln!(out, "{}", serde_json::to_string_pretty(&series)?)?;
            return Ok(());
        }

        for snapshot in &series {
            match &snapshot.breakdown {
                Some(items) => writeln!(
                    out,
                    "{}\t{}\t{} items",
                    snapshot.timestamp.to_rfc3339(),
                    snapshot.total_value,
                    items.len()
                )?,
                None => {
                    writeln!(out, "{}\t{}", snapshot.timestamp.to_rfc3339(), snapshot.total_value)?
                }
            }
        }
        Ok(())
    }

    async fn show_stats<W: Write>(&self, out: &mut W) -> Result<()> {
        let stats = self.state.tracker.store().stats().await?;
        writeln!(out, "accounts: {}", stats.accounts)?;
        writeln!(out, "snapshots: {}", stats.snapshots)?;
        writeln!(out, "corrupt journals: {}", stats.corrupt_journals)?;
        Ok(())
    }
}

fn read_breakdown(path: &Path) -> Result<Breakdown> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {path:?}"))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid breakdown in {path:?}"))
}
