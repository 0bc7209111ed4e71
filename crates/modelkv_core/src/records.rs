//! Storage-facing operations of a collection.
//!
//! A collection named `N` owns two keyspaces in the shared store:
//!
//! ```text
//! !N!!data!<idx>          -> encoded entity
//! !N!!index!<id or hash>  -> idx
//! ```
//!
//! Creating or destroying an entity touches both keyspaces in one atomic
//! batch. Re-saving rewrites the data record only.

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::idx::{Idx, IndexKeys};
use crate::paging::Cursor;
use modelkv_codec::Envelope;
use modelkv_storage::{Keyspace, OrderedStore, ScanOptions, WriteBatch};
use std::sync::Arc;
use tracing::{debug, warn};

/// Keyspace holding encoded entities, keyed by idx.
pub const DATA_KEYSPACE: &str = "data";
/// Keyspace mapping ids to idx values.
pub const INDEX_KEYSPACE: &str = "index";

pub(crate) struct RecordStore {
    name: String,
    store: Arc<dyn OrderedStore>,
    data: Keyspace,
    index: Keyspace,
    envelope: Envelope,
    keys: IndexKeys,
}

impl RecordStore {
    pub(crate) fn new(
        name: String,
        store: Arc<dyn OrderedStore>,
        envelope: Envelope,
    ) -> CoreResult<Self> {
        let root = Keyspace::new(&name)?;
        Ok(Self {
            data: root.sub(DATA_KEYSPACE)?,
            index: root.sub(INDEX_KEYSPACE)?,
            keys: IndexKeys::new(envelope.clone()),
            name,
            store,
            envelope,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    fn index_key(&self, id: &str) -> Vec<u8> {
        self.index.key(self.keys.key_for(id).as_bytes())
    }

    fn data_key(&self, idx: Idx) -> Vec<u8> {
        self.data.key(idx.to_string().as_bytes())
    }

    async fn lookup(&self, index_key: &[u8]) -> CoreResult<Option<Idx>> {
        match self.store.get(index_key).await? {
            Some(raw) => Idx::from_key(&raw).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) async fn save<E: Entity>(&self, mut entity: E) -> CoreResult<E> {
        let index_key = self.index_key(entity.id());

        // The index decides whether the id exists; `rev` and a carried idx
        // can both be stale.
        let (idx, create) = match self.lookup(&index_key).await? {
            Some(idx) => {
                entity.set_idx(idx);
                (idx, false)
            }
            None => (self.keys.assign(&mut entity)?, true),
        };

        let bytes = self.envelope.dehydrate(&entity)?;
        let data_key = self.data_key(idx);

        if create {
            let batch = WriteBatch::new()
                .put(index_key, idx.to_string().into_bytes())
                .put(data_key, bytes);
            self.store.write_batch(batch).await?;
        } else {
            self.store.put(data_key, bytes).await?;
        }

        debug!(collection = %self.name, %idx, rev = entity.rev(), create, "saved entity");
        Ok(entity)
    }

    pub(crate) async fn load<E: Entity>(&self, id: &str) -> CoreResult<Option<E>> {
        let Some(idx) = self.lookup(&self.index_key(id)).await? else {
            return Ok(None);
        };
        match self.store.get(&self.data_key(idx)).await? {
            Some(bytes) => Ok(Some(self.envelope.hydrate(&bytes)?)),
            None => {
                warn!(collection = %self.name, %idx, "index record points at missing data");
                Ok(None)
            }
        }
    }

    pub(crate) async fn destroy(&self, id: &str) -> CoreResult<()> {
        let index_key = self.index_key(id);
        let Some(idx) = self.lookup(&index_key).await? else {
            debug!(collection = %self.name, "destroy of absent entity");
            return Ok(());
        };
        let batch = WriteBatch::new()
            .delete(index_key)
            .delete(self.data_key(idx));
        self.store.write_batch(batch).await?;
        debug!(collection = %self.name, %idx, "destroyed entity");
        Ok(())
    }

    /// Range-scans the data keyspace for one page.
    ///
    /// At most `offset + limit` rows are read. Skipped rows are never
    /// decoded, and a decode failure aborts the whole page.
    pub(crate) async fn scan<E: Entity>(&self, cursor: &Cursor) -> CoreResult<Vec<E>> {
        if cursor.limit == Some(0) {
            return Ok(Vec::new());
        }

        let mut options = if cursor.direction.is_reverse() {
            ScanOptions::reverse()
        } else {
            ScanOptions::forward()
        };
        if let Some(limit) = cursor.limit {
            options = options.with_limit(cursor.offset.saturating_add(limit));
        }

        let rows = self.store.scan(self.data.range(), options).await?;
        debug!(
            collection = %self.name,
            direction = ?cursor.direction,
            offset = cursor.offset,
            limit = ?cursor.limit,
            rows = rows.len(),
            "scanned page"
        );

        rows.iter()
            .skip(cursor.offset)
            .take(cursor.limit.unwrap_or(usize::MAX))
            .map(|row| self.envelope.hydrate(&row.value).map_err(CoreError::from))
            .collect()
    }
}
