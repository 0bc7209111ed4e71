//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding stored entities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to serialize an entity.
    #[error("encoding failed: {message}")]
    Encode {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to deserialize stored bytes into an entity.
    #[error("decoding failed: {message}")]
    Decode {
        /// Description of the decoding error.
        message: String,
    },

    /// The encrypted envelope is not valid base64 or its frame is malformed.
    #[error("malformed envelope: {message}")]
    MalformedEnvelope {
        /// Description of the framing error.
        message: String,
    },

    /// Decryption failed: wrong password or corrupted ciphertext.
    #[error("decryption failed")]
    Decryption,

    /// The crypto configuration is inconsistent.
    #[error("invalid crypto configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CodecError {
    /// Create an encode error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a malformed envelope error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            message: message.into(),
        }
    }

    /// Create an invalid config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error came from reading stored bytes back.
    ///
    /// Malformed frames, failed decryption and failed deserialization all
    /// count; encoding and configuration errors do not.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::MalformedEnvelope { .. } | Self::Decryption
        )
    }
}
