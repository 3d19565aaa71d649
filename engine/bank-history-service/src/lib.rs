//! Bank History Service Library
//!
//! Wires the on-disk history store and the value tracker together behind a
//! command line front end, and drives panel state from game events.

use anyhow::{Context, Result};
use std::path::Path;

pub mod cli;
pub mod config;
pub mod events;
pub mod logging;
pub mod panel;
pub mod service;
pub mod signals;

pub use cli::{Cli, CliHandler, Commands};
pub use config::{LoggingConfig, ServiceConfig};
pub use events::GameEvent;
pub use logging::{initialize_logging, initialize_logging_with_config};
pub use panel::{ActivePanel, PanelController, PanelState};
pub use service::{ServiceState, Tracker};
pub use signals::setup_signal_handlers;

/// Load configuration from an optional file and environment variables
pub fn load_configuration(file: Option<&Path>) -> Result<ServiceConfig> {
    config::load_config(file).context("Failed to load service configuration")
}
