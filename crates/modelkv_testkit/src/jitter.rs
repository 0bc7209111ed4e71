//! A store wrapper that delays every call by a random amount.
//!
//! Wrapping a store in [`JitterStore`] makes backend completions arrive out
//! of order whenever callers issue overlapping requests, which is exactly
//! what the collection's operation queue must hide. It also tracks how many
//! calls were in flight at once.

use async_trait::async_trait;
use bytes::Bytes;
use modelkv_storage::{KeyRange, KeyValue, OrderedStore, ScanOptions, StorageResult, WriteBatch};
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Random-latency wrapper around another store.
pub struct JitterStore {
    inner: Arc<dyn OrderedStore>,
    max_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl JitterStore {
    /// Wraps `inner`, delaying each call by up to `max_delay`.
    pub fn new(inner: Arc<dyn OrderedStore>, max_delay: Duration) -> Self {
        Self {
            inner,
            max_delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Highest number of simultaneous calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Total calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Resets the in-flight high-water mark.
    pub fn reset_max_in_flight(&self) {
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    async fn enter(&self) -> FlightGuard<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let max_micros = u64::try_from(self.max_delay.as_micros()).unwrap_or(u64::MAX);
        let delay = rand::thread_rng().gen_range(0..=max_micros);
        tokio::time::sleep(Duration::from_micros(delay)).await;

        FlightGuard {
            in_flight: &self.in_flight,
        }
    }
}

struct FlightGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderedStore for JitterStore {
    async fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        let _guard = self.enter().await;
        self.inner.get(key).await
    }

    async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> StorageResult<()> {
        let _guard = self.enter().await;
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &[u8]) -> StorageResult<()> {
        let _guard = self.enter().await;
        self.inner.delete(key).await
    }

    async fn write_batch(&self, batch: WriteBatch) -> StorageResult<()> {
        let _guard = self.enter().await;
        self.inner.write_batch(batch).await
    }

    async fn scan(&self, range: KeyRange, options: ScanOptions) -> StorageResult<Vec<KeyValue>> {
        let _guard = self.enter().await;
        self.inner.scan(range, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelkv_storage::MemoryStore;

    #[tokio::test]
    async fn overlapping_calls_are_counted() {
        let store = Arc::new(JitterStore::new(
            Arc::new(MemoryStore::new()),
            Duration::from_millis(5),
        ));
        let a = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.put(b"a".to_vec(), b"1".to_vec()).await })
        };
        let b = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.put(b"b".to_vec(), b"2".to_vec()).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(store.calls(), 2);
        assert!(store.max_in_flight() >= 1);
        assert_eq!(store.get(b"b").await.unwrap(), Some(Bytes::from_static(b"2")));
    }
}
