//! Error types for modelkv core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in collection operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] modelkv_storage::StorageError),

    /// Encoding, decoding or encryption error.
    #[error("codec error: {0}")]
    Codec(#[from] modelkv_codec::CodecError),

    /// The system clock reads before the Unix epoch.
    #[error("system clock is before the Unix epoch; cannot issue index keys")]
    ClockUnavailable,

    /// A collection was opened without a backing store.
    #[error("a collection needs a backing store")]
    MissingStore,

    /// A collection was opened outside a tokio runtime.
    #[error("collections must be opened inside a tokio runtime")]
    RuntimeUnavailable,

    /// Invalid collection configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// The collection's operation worker has stopped.
    #[error("operation queue closed")]
    QueueClosed,

    /// An index record does not hold a valid idx.
    #[error("corrupt index record for key {key:?}: {message}")]
    CorruptIndex {
        /// The index key, lossily decoded.
        key: String,
        /// What was wrong with the stored value.
        message: String,
    },
}

impl CoreError {
    /// Create an invalid config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a corrupt index error.
    pub fn corrupt_index(key: &[u8], message: impl Into<String>) -> Self {
        Self::CorruptIndex {
            key: String::from_utf8_lossy(key).into_owned(),
            message: message.into(),
        }
    }

    /// Whether this error came from decoding or decrypting a stored record.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Codec(e) if e.is_decode())
    }
}
