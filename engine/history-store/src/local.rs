//! Local file-based history store construction

use crate::backend::LocalHistoryStore;
use crate::config::HistoryStoreConfig;
use crate::error::Result;

/// Create a new local history store with default configuration
pub fn create_local_store(data_dir: impl Into<std::path::PathBuf>) -> Result<LocalHistoryStore> {
    LocalHistoryStore::with_default_config(data_dir)
}

/// Create a new local history store with custom configuration
pub fn create_local_store_with_config(config: HistoryStoreConfig) -> Result<LocalHistoryStore> {
    LocalHistoryStore::new(config)
}
