//! In-memory ordered store for testing.

use crate::batch::{BatchOp, WriteBatch};
use crate::error::StorageResult;
use crate::keyspace::KeyRange;
use crate::store::{KeyValue, OrderedStore, ScanOptions};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

pub(crate) type OrderedMap = BTreeMap<Vec<u8>, Bytes>;

/// An in-memory ordered store.
///
/// This store keeps all data in a `BTreeMap` and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral collections that don't need persistence
///
/// Clones share the same map.
///
/// # Example
///
/// ```rust
/// use modelkv_storage::{MemoryStore, OrderedStore};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = MemoryStore::new();
/// store.put(b"key".to_vec(), b"value".to_vec()).await.unwrap();
/// assert_eq!(store.len(), 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<OrderedMap>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Returns a copy of every stored key, in order.
    ///
    /// Useful for asserting on the physical layout in tests.
    #[must_use]
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.data.read().keys().cloned().collect()
    }
}

pub(crate) fn apply_ops(map: &mut OrderedMap, ops: impl IntoIterator<Item = BatchOp>) {
    for op in ops {
        match op {
            BatchOp::Put { key, value } => {
                map.insert(key, Bytes::from(value));
            }
            BatchOp::Delete { key } => {
                map.remove(&key);
            }
        }
    }
}

pub(crate) fn scan_map(map: &OrderedMap, range: &KeyRange, options: ScanOptions) -> Vec<KeyValue> {
    if range.start >= range.end {
        return Vec::new();
    }
    let rows = map.range::<[u8], _>((
        std::ops::Bound::Included(range.start.as_slice()),
        std::ops::Bound::Excluded(range.end.as_slice()),
    ));
    let limit = options.limit.unwrap_or(usize::MAX);
    let to_kv = |(k, v): (&Vec<u8>, &Bytes)| KeyValue::new(Bytes::copy_from_slice(k), v.clone());

    if options.reverse {
        rows.rev().take(limit).map(to_kv).collect()
    } else {
        rows.take(limit).map(to_kv).collect()
    }
}

#[async_trait]
impl OrderedStore for MemoryStore {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        self.data.write().insert(key, Bytes::from(value));
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.data.write().remove(key);
        Ok(())
    }

    async fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        // One write guard for the whole batch: readers see all or nothing.
        let mut data = self.data.write();
        apply_ops(&mut data, batch.into_ops());
        Ok(())
    }

    async fn scan(&self, range: KeyRange, options: ScanOptions) -> StorageResult<Vec<KeyValue>> {
        Ok(scan_map(&self.data.read(), &range, options))
    }
}
