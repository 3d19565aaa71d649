//! History store trait and implementations

use crate::config::HistoryStoreConfig;
use crate::error::{Result, StoreError};
use crate::journal::{decode_account, AccountJournal, JOURNAL_EXTENSION};
use crate::snapshot::Snapshot;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Counters describing what a store currently holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Accounts with at least one snapshot
    pub accounts: usize,

    /// Snapshots across all accounts
    pub snapshots: usize,

    /// Journals that could not be read
    pub corrupt_journals: usize,
}

/// Abstract trait for history storage backends
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    /// Initialize the store and load existing history
    async fn initialize(&mut self) -> Result<()>;

    /// Shutdown the store
    async fn shutdown(&self) -> Result<()>;

    /// Append a snapshot to an account's series
    async fn append(&self, account: &str, snapshot: Snapshot) -> Result<()>;

    /// Every account with at least one stored snapshot
    async fn list_accounts(&self) -> Result<BTreeSet<String>>;

    /// An account's series, oldest first; empty for unknown accounts
    async fn get_series(&self, account: &str) -> Result<Vec<Snapshot>>;

    /// Most recent snapshot of an account
    async fn last_snapshot(&self, account: &str) -> Result<Option<Snapshot>>;

    /// Delete an account's entire series
    async fn remove_account(&self, account: &str) -> Result<()>;

    /// Summary counters
    async fn stats(&self) -> Result<StoreStats>;

    /// Get the configuration
    fn config(&self) -> &HistoryStoreConfig;
}

fn validate_append(account: &str, snapshot: &Snapshot) -> Result<()> {
    if account.is_empty() {
        return Err(StoreError::invalid_input("account must not be empty"));
    }
    snapshot.validate()
}

/// Local file-based history store
pub struct LocalHistoryStore {
    config: HistoryStoreConfig,
    journals: DashMap<String, Arc<RwLock<AccountJournal>>>,
    initialized: AtomicBool,
}

impl LocalHistoryStore {
    /// Create a new local history store
    pub fn new(config: HistoryStoreConfig) -> Result<Self> {
        config.validate().map_err(StoreError::invalid_operation)?;

        Ok(Self { config, journals: DashMap::new(), initialized: AtomicBool::new(false) })
    }

    /// Create a new local history store with default config
    pub fn with_default_config(data_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::new(HistoryStoreConfig::new(data_dir))
    }

    fn ensure_initialized(&self) -> Result<()> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(StoreError::not_initialized());
        }
        Ok(())
    }

    /// Existing journal handle, if the account has ever been seen
    fn existing(&self, account: &str) -> Option<Arc<RwLock<AccountJournal>>> {
        self.journals.get(account).map(|entry| entry.value().clone())
    }

    /// Journal handle for a write, creating an empty one when needed
    fn for_write(&self, account: &str) -> Arc<RwLock<AccountJournal>> {
        let accounts_dir = self.config.accounts_dir();
        self.journals
            .entry(account.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(AccountJournal::empty(account, &accounts_dir))))
            .value()
            .clone()
    }

    fn all_journals(&self) -> Vec<Arc<RwLock<AccountJournal>>> {
        self.journals.iter().map(|entry| entry.value().clone()).collect()
    }

    fn load_journals(&self) -> Result<usize> {
        let accounts_dir = self.config.accounts_dir();
        let mut loaded = 0usize;

        for entry in std::fs::read_dir(&accounts_dir)? {
            let path = entry?.path();

            if path.extension().and_then(|s| s.to_str()) != Some(JOURNAL_EXTENSION) {
                continue;
            }

            let Some(account) =
                path.file_stem().and_then(|s| s.to_str()).and_then(decode_account)
            else {
                tracing::warn!("Ignoring journal with unrecognised name: {:?}", path);
                continue;
            };

            let journal = AccountJournal::load(&account, path);
            tracing::debug!(
                "Loaded journal for {:?}: {} snapshots",
                account,
                journal.series().len()
            );
            self.journals.insert(account, Arc::new(RwLock::new(journal)));
            loaded += 1;
        }

        Ok(loaded)
    }
}

#[async_trait::async_trait]
impl HistoryStore for LocalHistoryStore {
    async fn initialize(&mut self) -> Result<()> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        std::fs::create_dir_all(self.config.accounts_dir())?;

        self.journals.clear();
        let loaded = self.load_journals()?;

        self.initialized.store(true, Ordering::Release);

        tracing::info!(
            "Local history store initialized at {:?} with {} account journals",
            self.config.data_dir,
            loaded
        );

        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        if !self.initialized.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        // Appends are flushed before they return; only the handles go
        self.journals.clear();

        tracing::info!("Local history store shutdown complete");

        Ok(())
    }

    async fn append(&self, account: &str, snapshot: Snapshot) -> Result<()> {
        self.ensure_initialized()?;
        validate_append(account, &snapshot)?;

        let journal = self.for_write(account);
        let mut journal = journal.write().await;

        let value = snapshot.total_value;
        journal.append(snapshot, self.config.fsync_every_write)?;

        tracing::debug!(
            "Appended snapshot for {:?}: value={}, series length={}",
            account,
            value,
            journal.series().len()
        );

        Ok(())
    }

    async fn list_accounts(&self) -> Result<BTreeSet<String>> {
        self.ensure_initialized()?;

        let mut accounts = BTreeSet::new();
        for journal in self.all_journals() {
            let journal = journal.read().await;
            if !journal.series().is_empty() {
                accounts.insert(journal.account().to_string());
            }
        }

        Ok(accounts)
    }

    async fn get_series(&self, account: &str) -> Result<Vec<Snapshot>> {
        self.ensure_initialized()?;

        match self.existing(account) {
            Some(journal) => Ok(journal.read().await.series().to_vec()),
            None => Ok(Vec::new()),
        }
    }

    async fn last_snapshot(&self, account: &str) -> Result<Option<Snapshot>> {
        self.ensure_initialized()?;

        match self.existing(account) {
            Some(journal) => Ok(journal.read().await.last().cloned()),
            None => Ok(None),
        }
    }

    async fn remove_account(&self, account: &str) -> Result<()> {
        self.ensure_initialized()?;

        // The entry stays in the map so a concurrent append for the same
        // account serializes on the same lock
        if let Some(journal) = self.existing(account) {
            let mut journal = journal.write().await;
            let removed = journal.series().len();
            journal.remove()?;
            tracing::info!("Removed history for {:?} ({} snapshots)", account, removed);
        }

        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        self.ensure_initialized()?;

        let mut stats = StoreStats::default();
        for journal in self.all_journals() {
            let journal = journal.read().await;
            if journal.is_corrupt() {
                stats.corrupt_journals += 1;
            }
            if !journal.series().is_empty() {
                stats.accounts += 1;
                stats.snapshots += journal.series().len();
            }
        }

        Ok(stats)
    }

    fn config(&self) -> &HistoryStoreConfig {
        &self.config
    }
}

/// In-memory history store (for testing)
pub struct InMemoryHistoryStore {
    config: HistoryStoreConfig,
    series: DashMap<String, Vec<Snapshot>>,
    initialized: AtomicBool,
}

impl InMemoryHistoryStore {
    /// Create a new in-memory history store
    pub fn new(config: HistoryStoreConfig) -> Self {
        Self { config, series: DashMap::new(), initialized: AtomicBool::new(false) }
    }

    /// Create a new in-memory history store with default config
    pub fn with_default_config() -> Self {
        Self::new(HistoryStoreConfig::default())
    }

    fn ensure_initialized(&self) -> Result<()> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(StoreError::not_initialized());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn initialize(&mut self) -> Result<()> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        self.initialized.store(true, Ordering::Release);

        tracing::info!("In-memory history store initialized");

        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        if !self.initialized.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        tracing::info!("In-memory history store shutdown complete");

        Ok(())
    }

    async fn append(&self, account: &str, snapshot: Snapshot) -> Result<()> {
        self.ensure_initialized()?;
        validate_append(account, &snapshot)?;

        let mut series = self.series.entry(account.to_string()).or_default();
        let at = series.partition_point(|s| s.timestamp <= snapshot.timestamp);
        series.insert(at, snapshot);

        Ok(())
    }

    async fn list_accounts(&self) -> Result<BTreeSet<String>> {
        self.ensure_initialized()?;

        Ok(self
            .series
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn get_series(&self, account: &str) -> Result<Vec<Snapshot>> {
        self.ensure_initialized()?;

        Ok(self.series.get(account).map(|s| s.value().clone()).unwrap_or_default())
    }

    async fn last_snapshot(&self, account: &str) -> Result<Option<Snapshot>> {
        self.ensure_initialized()?;

        Ok(self.series.get(account).and_then(|s| s.value().last().cloned()))
    }

    async fn remove_account(&self, account: &str) -> Result<()> {
        self.ensure_initialized()?;

        self.series.remove(account);

        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        self.ensure_initialized()?;

        let mut stats = StoreStats::default();
        for entry in self.series.iter() {
            if !entry.value().is_empty() {
                stats.accounts += 1;
                stats.snapshots += entry.value().len();
            }
        }

        Ok(stats)
    }

    fn config(&self) -> &HistoryStoreConfig {
        &self.config
    }
}
