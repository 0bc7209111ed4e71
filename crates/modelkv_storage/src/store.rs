//! Ordered store trait definition.

use crate::batch::WriteBatch;
use crate::error::StorageResult;
use crate::keyspace::KeyRange;
use async_trait::async_trait;
use bytes::Bytes;

/// Key-value pair returned from range scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// The full stored key.
    pub key: Bytes,
    /// The value stored at this key.
    pub value: Bytes,
}

impl KeyValue {
    /// Creates a new key-value pair.
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}

/// Options for [`OrderedStore::scan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Iterate from the largest key down.
    pub reverse: bool,
    /// Stop after this many rows.
    pub limit: Option<usize>,
}

impl ScanOptions {
    /// Ascending scan without a row cap.
    #[must_use]
    pub const fn forward() -> Self {
        Self {
            reverse: false,
            limit: None,
        }
    }

    /// Descending scan without a row cap.
    #[must_use]
    pub const fn reverse() -> Self {
        Self {
            reverse: true,
            limit: None,
        }
    }

    /// Caps the scan at `limit` rows.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// An ordered key-value store.
///
/// Stores are **opaque byte maps**. Keys sort by raw byte comparison, which
/// is the only ordering callers may rely on.
///
/// # Invariants
///
/// - `get` returns `Ok(None)` for a missing key, never an error
/// - `write_batch` applies every operation or none of them
/// - `scan` yields rows inside the half-open range, in key order
///   (descending when `reverse`), at most `limit` of them
/// - Stores must be `Send + Sync` so collections can share them across tasks
///
/// # Implementors
///
/// - [`crate::MemoryStore`] - For testing
/// - [`crate::FileStore`] - For persistent storage
#[async_trait]
pub trait OrderedStore: Send + Sync {
    /// Reads the value at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend fails; a missing key is `Ok(None)`.
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Stores `value` at `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()>;

    /// Removes `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Applies all operations in `batch` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails; no operation is applied then.
    async fn write_batch(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Returns rows whose keys fall inside `range`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn scan(&self, range: KeyRange, options: ScanOptions) -> StorageResult<Vec<KeyValue>>;
}
