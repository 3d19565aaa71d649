//! Error types for the history store

use thiserror::Error;

/// Result type alias for history store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in the history store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing medium could not complete a read or write
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller supplied an account or snapshot the store refuses to write
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored data is damaged
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Invalid operation for current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl StoreError {
    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new corruption error
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    /// Create a new invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub(crate) fn not_initialized() -> Self {
        Self::invalid_operation("History store not initialized")
    }
}
