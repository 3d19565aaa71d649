//! # History Store
//!
//! Durable storage for bank value snapshots, partitioned by account.
//!
//! ## Architecture
//!
//! - **HistoryStore**: Abstract trait for storage backends
//! - **LocalHistoryStore**: One append-only JSON-lines journal per account
//! - **InMemoryHistoryStore**: Non-durable backend for tests
//! - **Snapshot**: Immutable timestamped value observation
//!
//! ## Usage
//!
//! ```rust
//! use history_store::{create_local_store, HistoryStore, Snapshot, Utc};
//! use tempfile::TempDir;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let temp_dir = TempDir::new()?;
//!     let mut store = create_local_store(temp_dir.path())?;
//!     store.initialize().await?;
//!
//!     store.append("alice", Snapshot::new(Utc::now(), 1_000_000)).await?;
//!     assert_eq!(store.get_series("alice").await?.len(), 1);
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod journal;
pub mod local;
pub mod snapshot;

pub use backend::{HistoryStore, InMemoryHistoryStore, LocalHistoryStore, StoreStats};
pub use config::HistoryStoreConfig;
pub use error::{Result, StoreError};
pub use local::{create_local_store, create_local_store_with_config};
pub use snapshot::{Breakdown, ItemValuation, Snapshot};

/// Re-export common types for convenience
pub use chrono::{DateTime, Utc};
