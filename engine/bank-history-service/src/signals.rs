//! Signal handling for graceful shutdown

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Poll interval for the SIGTERM flag
const TERMINATE_POLL: Duration = Duration::from_millis(100);

/// Setup signal handlers for graceful shutdown
///
/// The receiver completes on Ctrl+C or, on Unix, SIGTERM.
pub fn setup_signal_handlers() -> Result<oneshot::Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let terminate = Arc::new(AtomicBool::new(false));

    #[cfg(unix)]
    signal_hook::flag::register(signal_hook::consts::SIGTERM, terminate.clone())?;

    tokio::spawn(async move {
        let sigterm = async {
            while !terminate.load(Ordering::Relaxed) {
                tokio::time::sleep(TERMINATE_POLL).await;
            }
        };
        tokio::pin!(sigterm);

        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Ctrl+C signal received"),
                Err(e) => {
                    error!("Failed to listen for Ctrl+C signal: {}", e);
                    (&mut sigterm).await;
                    info!("SIGTERM signal received");
                }
            },
            _ = &mut sigterm => info!("SIGTERM signal received"),
        }

        let _ = shutdown_tx.send(());
    });

    Ok(shutdown_rx)
}
