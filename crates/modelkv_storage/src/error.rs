//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// A missing key is not an error: [`crate::OrderedStore::get`] returns
/// `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store's persisted data is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the store's lock.
    #[error("store locked: another process has exclusive access")]
    Locked,

    /// A keyspace name is empty or contains the separator.
    #[error("invalid keyspace name {name:?}: {reason}")]
    InvalidKeyspace {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Creates a generic backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}
