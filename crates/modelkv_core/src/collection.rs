//! The collection facade.

use crate::config::{CollectionConfig, CollectionOptions};
use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::paging::{Cursor, Direction, Page, Pager};
use crate::queue::{Completion, Executor, OperationQueue};
use crate::records::RecordStore;
use async_trait::async_trait;
use modelkv_codec::{CryptoConfig, Envelope};
use modelkv_storage::OrderedStore;
use std::fmt;
use std::sync::Arc;
use tracing::info;

#[async_trait]
impl<E: Entity> Executor<E> for RecordStore {
    async fn save(&self, entity: E) -> CoreResult<E> {
        RecordStore::save(self, entity).await
    }

    async fn load(&self, id: &str) -> CoreResult<Option<E>> {
        RecordStore::load(self, id).await
    }

    async fn destroy(&self, id: &str) -> CoreResult<()> {
        RecordStore::destroy(self, id).await
    }
}

/// An insertion-ordered collection of entities in an ordered store.
///
/// `save`, `load` and `destroy` are queued: each call enqueues its operation
/// immediately and returns a [`Completion`], and completions resolve in the
/// order the calls were made. A `load` issued right after a `save` of the
/// same id therefore observes that save, even if neither was awaited yet.
///
/// `head`, `tail` and `list_ids` read the store directly and do not wait for
/// queued operations.
///
/// Cloning is cheap; clones share the queue.
///
/// # Example
///
/// ```rust
/// use modelkv_core::{Collection, Record};
/// use modelkv_storage::MemoryStore;
/// use std::sync::Arc;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let notes = Collection::<Record>::builder()
///     .store(Arc::new(MemoryStore::new()))
///     .name("notes")
///     .open()
///     .unwrap();
///
/// let saved = notes.save(Record::new("n1").with_field("text", "hi")).await.unwrap();
/// let loaded = notes.load("n1").await.unwrap();
/// assert_eq!(loaded, Some(saved));
/// # });
/// ```
pub struct Collection<E: Entity> {
    records: Arc<RecordStore>,
    queue: OperationQueue<E>,
    pager: Pager<E>,
}

impl<E: Entity> Clone for Collection<E> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            queue: self.queue.clone(),
            pager: self.pager.clone(),
        }
    }
}

impl<E: Entity> Collection<E> {
    /// Starts building a collection.
    #[must_use]
    pub fn builder() -> CollectionBuilder<E> {
        CollectionBuilder::new()
    }

    /// Opens a collection from raw options.
    ///
    /// # Errors
    ///
    /// See [`CollectionBuilder::open`].
    pub fn open(store: Arc<dyn OrderedStore>, options: CollectionOptions) -> CoreResult<Self> {
        Self::builder().store(store).options(options).open()
    }

    /// Namespace of this collection.
    #[must_use]
    pub fn name(&self) -> &str {
        self.records.name()
    }

    /// Whether records are encrypted at rest.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.records.envelope().is_encrypted()
    }

    /// Closes this handle and waits until the operation worker has drained
    /// its queue and released the store.
    ///
    /// Waits for every clone of the collection to be closed or dropped.
    /// A [`Page`] still alive keeps its own handle on the store, so drop
    /// pages first when the store must be released (a `FileStore` lock, for
    /// instance).
    pub async fn close(self) {
        let Self {
            records,
            queue,
            pager,
        } = self;
        drop(pager);
        drop(records);
        queue.close().await;
    }

    /// Queued plus running point operations.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Whether the worker is executing an operation right now.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.queue.is_busy()
    }

    /// Saves an entity.
    ///
    /// A first save (`rev <= 1`) assigns the idx and writes the index and
    /// data records atomically. Later saves rewrite the data record and keep
    /// the idx, so the entity keeps its place in listing order. The
    /// completion yields the entity as stored, idx included.
    pub fn save(&self, entity: E) -> Completion<E> {
        self.queue.save(entity)
    }

    /// Loads an entity by id. Absent ids yield `Ok(None)`.
    pub fn load(&self, id: impl Into<String>) -> Completion<Option<E>> {
        self.queue.load(id.into())
    }

    /// Deletes an entity's index and data records atomically. Absent ids
    /// succeed without writing.
    pub fn destroy(&self, id: impl Into<String>) -> Completion<()> {
        self.queue.destroy(id.into())
    }

    /// Lists entities oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan fails or any entity on the page cannot
    /// be decoded.
    pub async fn head(&self, offset: usize, limit: Option<usize>) -> CoreResult<Page<E>> {
        self.page(Cursor::head(offset, limit)).await
    }

    /// Lists entities newest first.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::head`].
    pub async fn tail(&self, offset: usize, limit: Option<usize>) -> CoreResult<Page<E>> {
        self.page(Cursor::tail(offset, limit)).await
    }

    /// Fetches the page at `cursor`.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::head`].
    pub async fn page(&self, cursor: Cursor) -> CoreResult<Page<E>> {
        self.pager.fetch(cursor).await
    }

    /// Ids of a page of entities, in listing order.
    ///
    /// Under encryption index keys are hashed, so ids are read from the
    /// decoded entities.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::head`].
    pub async fn list_ids(
        &self,
        direction: Direction,
        offset: usize,
        limit: Option<usize>,
    ) -> CoreResult<Vec<String>> {
        let page = self
            .page(Cursor {
                direction,
                offset,
                limit,
            })
            .await?;
        Ok(page.into_iter().map(|e| e.id().to_owned()).collect())
    }
}

impl<E: Entity> fmt::Debug for Collection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name())
            .field("encrypted", &self.is_encrypted())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Collection`].
pub struct CollectionBuilder<E: Entity> {
    store: Option<Arc<dyn OrderedStore>>,
    config: CollectionConfig,
    options: Option<CollectionOptions>,
    _marker: std::marker::PhantomData<fn() -> E>,
}

impl<E: Entity> Default for CollectionBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> CollectionBuilder<E> {
    /// Creates a builder with default configuration and no store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: None,
            config: CollectionConfig::default(),
            options: None,
            _marker: std::marker::PhantomData,
        }
    }

    /// Sets the backing store. Several collections may share one store
    /// under different names.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn OrderedStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the namespace.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.name(name);
        self
    }

    /// Enables encryption.
    #[must_use]
    pub fn crypto(mut self, crypto: CryptoConfig) -> Self {
        self.config = self.config.crypto(crypto);
        self
    }

    /// Uses a validated configuration.
    #[must_use]
    pub fn config(mut self, config: CollectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses raw options, normalized when the collection opens. Replaces any
    /// name or crypto settings given to the builder.
    #[must_use]
    pub fn options(mut self, options: CollectionOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Opens the collection and starts its operation worker.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingStore`] if no store was given
    /// - [`CoreError::InvalidConfig`] or [`CoreError::Codec`] for bad settings
    /// - [`CoreError::RuntimeUnavailable`] outside a tokio runtime
    pub fn open(self) -> CoreResult<Collection<E>> {
        let store = self.store.ok_or(CoreError::MissingStore)?;
        let config = match self.options {
            Some(options) => options.normalize()?,
            None => {
                self.config.validate()?;
                self.config
            }
        };
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| CoreError::RuntimeUnavailable)?;

        let encrypted = config.crypto.is_some();
        let envelope = Envelope::new(config.crypto);
        let records = Arc::new(RecordStore::new(config.name, store, envelope)?);
        let queue = OperationQueue::spawn(
            records.name().to_owned(),
            Arc::clone(&records),
            &runtime,
        );

        info!(collection = %records.name(), encrypted, "opened collection");
        Ok(Collection {
            pager: Pager::new(Arc::clone(&records)),
            records,
            queue,
        })
    }
}

impl<E: Entity> fmt::Debug for CollectionBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionBuilder")
            .field("has_store", &self.store.is_some())
            .field("config", &self.config)
            .field("options", &self.options)
            .finish()
    }
}
