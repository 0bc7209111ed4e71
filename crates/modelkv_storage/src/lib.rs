//! # modelkv Storage
//!
//! Ordered key-value store abstraction for modelkv.
//!
//! Stores are **opaque byte maps** sorted by raw key bytes. They do not
//! know about entities, revisions or encryption; the core crate owns all
//! interpretation of keys and values.
//!
//! ## Design Principles
//!
//! - Point reads, point writes and deletes
//! - Atomic multi-key batches
//! - Ordered range scans, ascending or descending, with an optional row cap
//! - Async by default, `Send + Sync` for sharing across tasks
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral collections
//! - [`FileStore`] - Durable store backed by an append-only log
//!
//! ## Example
//!
//! ```rust
//! use modelkv_storage::{Keyspace, MemoryStore, OrderedStore, ScanOptions};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = MemoryStore::new();
//! let users = Keyspace::new("users").unwrap();
//!
//! store.put(users.key(b"b"), b"2".to_vec()).await.unwrap();
//! store.put(users.key(b"a"), b"1".to_vec()).await.unwrap();
//!
//! let rows = store.scan(users.range(), ScanOptions::default()).await.unwrap();
//! assert_eq!(users.strip(&rows[0].key), Some(&b"a"[..]));
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod error;
mod file;
mod keyspace;
mod memory;
mod store;

pub use batch::{BatchOp, WriteBatch};
pub use error::{StorageError, StorageResult};
pub use file::{FileStore, FileStoreOptions};
pub use keyspace::{KeyRange, Keyspace, SEPARATOR};
pub use memory::MemoryStore;
pub use store::{KeyValue, OrderedStore, ScanOptions};
