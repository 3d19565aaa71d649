//! Logging and tracing setup

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, prelude::*, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// File name prefix of rotated log files
const LOG_FILE_PREFIX: &str = "bank-history.log";

/// Initialize logging with default settings
pub fn initialize_logging() -> Result<Option<WorkerGuard>> {
    initialize_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging from configuration
///
/// `RUST_LOG` takes precedence over the configured level. Console output goes
/// to stderr so command output on stdout stays machine-readable. The returned
/// guard must be kept alive while file logging is in use.
pub fn initialize_logging_with_config(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    // Set up environment filter
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (writer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (fmt::writer::BoxMakeWriter::new(writer), Some(guard))
        }
        None => (fmt::writer::BoxMakeWriter::new(std::io::stderr), None),
    };
    let ansi = config.directory.is_none();

    // Set up formatting layer based on format
    let fmt_layer = match config.format.as_str() {
        "json" => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(writer)
            .boxed(),
        "pretty" => fmt::layer()
            .pretty()
            .with_target(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
        _ => fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    };

    // Initialize the subscriber
    tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init()?;

    Ok(guard)
}
