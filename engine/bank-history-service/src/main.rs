//! Bank History Service
//!
//! Command line entry point: loads configuration, opens the history store
//! and runs a single command against it.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use bank_history_service::{
    initialize_logging_with_config, load_configuration, Cli, CliHandler, ServiceState,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let mut config = load_configuration(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.store.data_dir = data_dir;
    }

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = initialize_logging_with_config(&config.logging)?;
    info!("Starting Bank History Service v{}", env!("CARGO_PKG_VERSION"));

    let state = ServiceState::new(config).await.context("Failed to start service")?;
    let handler = CliHandler::new(state);

    let mut stdout = std::io::stdout().lock();
    let result = handler.handle_command(cli.command, &mut stdout).await;
    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }

    handler.shutdown().await?;
    result
}
