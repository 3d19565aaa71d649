//! Service configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use history_store::HistoryStoreConfig;
use value_tracker::TrackerConfig;

/// Prefix of environment variables overriding configuration
pub const ENV_PREFIX: &str = "BANK_HISTORY";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// History store configuration
    pub store: HistoryStoreConfig,

    /// Value tracker configuration
    pub tracker: TrackerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,

    /// Directory for daily-rotated log files (if None, logs to stderr)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "compact".to_string(), directory: None }
    }
}

/// Load configuration from defaults, an optional TOML file and the environment
///
/// Environment variables use double underscores between sections, e.g.
/// `BANK_HISTORY__TRACKER__MIN_CAPTURE_INTERVAL_SECS=60`.
pub fn load_config(file: Option<&Path>) -> Result<ServiceConfig> {
    let mut builder = config::Config::builder();

    if let Some(path) = file {
        tracing::debug!("Loading configuration from file: {:?}", path);
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let config: ServiceConfig = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read configuration sources")?
        .try_deserialize()
        .context("Failed to parse configuration")?;

    validate_config(&config)?;

    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &ServiceConfig) -> Result<()> {
    config.store.validate().map_err(|e| anyhow::anyhow!("Invalid store configuration: {e}"))?;
    config
        .tracker
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid tracker configuration: {e}"))?;

    // Validate log level
    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    // Validate log format
    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    Ok(())
}

/// Render configuration as TOML
pub fn render_config(config: &ServiceConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to render configuration")
}

/// Save configuration to a file
pub fn save_config(config: &ServiceConfig, path: &Path) -> Result<()> {
    let rendered = render_config(config)?;
    std::fs::write(path, rendered)
        .with_context(|| format!("Failed to write configuration to {path:?}"))?;
    Ok(())
}
