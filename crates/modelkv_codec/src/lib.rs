//! # modelkv Codec
//!
//! The envelope codec for modelkv.
//!
//! This crate turns entities into the bytes stored in the ordered store and
//! back again:
//! - Entities are serialized through `serde` to JSON text
//! - With a password configured, each record is encrypted under a key
//!   derived by PBKDF2 from the password and a fresh random salt
//! - The salt and ciphertext are framed with explicit 4-byte big-endian
//!   length prefixes and stored as base64 text
//! - Identifiers used as index keys are hashed so they are not stored in clear
//!
//! ## Stored Record Layout (encrypted)
//!
//! ```text
//! base64( | salt_len (u32 BE) | salt | ct_len (u32 BE) | ciphertext | )
//! ```
//!
//! ## Usage
//!
//! ```
//! use modelkv_codec::{CryptoOptions, Envelope};
//!
//! let options: CryptoOptions =
//!     serde_json::from_str(r#"{"password":"pw","keyIterations":16}"#).unwrap();
//! let envelope = Envelope::encrypted(options.normalize().unwrap());
//!
//! let stored = envelope.dehydrate(&vec![1, 2, 3]).unwrap();
//! let back: Vec<u32> = envelope.hydrate(&stored).unwrap();
//! assert_eq!(back, vec![1, 2, 3]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cipher;
mod config;
mod envelope;
mod error;
pub mod frame;
mod kdf;

pub use config::{CipherAlgorithm, CryptoConfig, CryptoOptions, KdfHash, DEFAULT_KEY_ITERATIONS};
pub use envelope::Envelope;
pub use error::{CodecError, CodecResult};
pub use kdf::{digest_hex, DerivedKey};
