//! # modelkv Core
//!
//! Insertion-ordered entity collections on top of an ordered key-value store.
//!
//! An ordered store sorts keys lexicographically, which says nothing about
//! when an entity was written. modelkv keeps insertion order anyway:
//!
//! - **Index keys**: every entity gets a monotonic [`Idx`] at creation. Data
//!   records are keyed by idx; a secondary index maps id to idx.
//! - **Operation queue**: `save`, `load` and `destroy` complete in the order
//!   they were called, one storage interaction at a time per collection.
//! - **Pagination**: [`Collection::head`] and [`Collection::tail`] walk the
//!   data keyspace forwards or backwards with offset and limit, returning a
//!   [`Page`] that can fetch the next one.
//! - **Envelope encryption**: with a password configured, records are
//!   encrypted individually and ids are hashed before use as keys.
//!
//! ## Quick Start
//!
//! ```rust
//! use modelkv_core::{Collection, CollectionOptions, Record};
//! use modelkv_storage::MemoryStore;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let options: CollectionOptions =
//!     serde_json::from_str(r#"{"name":"notes","password":"s3cret"}"#).unwrap();
//! let notes = Collection::<Record>::open(Arc::new(MemoryStore::new()), options).unwrap();
//!
//! // Not awaited yet: both operations are already queued, in this order.
//! let first = notes.save(Record::new("a"));
//! let second = notes.save(Record::new("b"));
//! first.await.unwrap();
//! second.await.unwrap();
//!
//! let newest: Vec<String> = notes
//!     .tail(0, Some(1))
//!     .await
//!     .unwrap()
//!     .into_iter()
//!     .map(|r| r.id)
//!     .collect();
//! assert_eq!(newest, vec!["b"]);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod entity;
mod error;
mod idx;
mod paging;
mod queue;
mod records;

pub use collection::{Collection, CollectionBuilder};
pub use config::{CollectionConfig, CollectionOptions, DEFAULT_COLLECTION_NAME};
pub use entity::{Entity, Record};
pub use error::{CoreError, CoreResult};
pub use idx::{Idx, IdxGenerator, IndexKeys, ParseIdxError, IDX_LEN};
pub use paging::{Cursor, Direction, Page};
pub use queue::Completion;
pub use records::{DATA_KEYSPACE, INDEX_KEYSPACE};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export the pieces callers need to configure a collection.
pub use modelkv_codec::{CipherAlgorithm, CryptoConfig, CryptoOptions, KdfHash};
pub use modelkv_storage::{FileStore, MemoryStore, OrderedStore};
