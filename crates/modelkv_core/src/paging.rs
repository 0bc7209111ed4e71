//! Paginated listing in insertion order.
//!
//! Pages are read straight from the store, outside the operation queue.
//! There is no snapshot: entities saved or destroyed between two pages may
//! shift later pages, and a page may observe writes that were queued after
//! it was requested.

use crate::entity::Entity;
use crate::error::CoreResult;
use crate::records::RecordStore;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Listing direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Oldest first.
    #[default]
    Head,
    /// Newest first.
    Tail,
}

impl Direction {
    /// Whether the store should be scanned in descending key order.
    #[must_use]
    pub const fn is_reverse(self) -> bool {
        matches!(self, Self::Tail)
    }
}

/// Position and size of a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Cursor {
    /// Listing direction.
    pub direction: Direction,
    /// Entities to skip.
    pub offset: usize,
    /// Maximum entities to return; `None` means all remaining.
    pub limit: Option<usize>,
}

impl Cursor {
    /// A cursor over the oldest entities.
    #[must_use]
    pub const fn head(offset: usize, limit: Option<usize>) -> Self {
        Self {
            direction: Direction::Head,
            offset,
            limit,
        }
    }

    /// A cursor over the newest entities.
    #[must_use]
    pub const fn tail(offset: usize, limit: Option<usize>) -> Self {
        Self {
            direction: Direction::Tail,
            offset,
            limit,
        }
    }

    /// The same window shifted past `consumed` entities.
    #[must_use]
    pub const fn advance(self, consumed: usize) -> Self {
        Self {
            offset: self.offset.saturating_add(consumed),
            ..self
        }
    }
}

/// Runs page scans for one collection.
pub(crate) struct Pager<E> {
    records: Arc<RecordStore>,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Clone for Pager<E> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            _marker: PhantomData,
        }
    }
}

impl<E: Entity> Pager<E> {
    pub(crate) fn new(records: Arc<RecordStore>) -> Self {
        Self {
            records,
            _marker: PhantomData,
        }
    }

    pub(crate) async fn fetch(&self, cursor: Cursor) -> CoreResult<Page<E>> {
        let items = self.records.scan(&cursor).await?;
        Ok(Page {
            items,
            cursor,
            pager: self.clone(),
        })
    }
}

/// One page of entities plus the means to fetch the next.
///
/// # Example
///
/// ```rust,ignore
/// let mut page = notes.head(0, Some(20)).await?;
/// while !page.is_empty() {
///     for note in page.items() {
///         println!("{}", note.id);
///     }
///     page = page.next_page().await?;
/// }
/// ```
pub struct Page<E> {
    items: Vec<E>,
    cursor: Cursor,
    pager: Pager<E>,
}

impl<E: Entity> Page<E> {
    /// The entities on this page.
    #[must_use]
    pub fn items(&self) -> &[E] {
        &self.items
    }

    /// Takes the entities, discarding the continuation.
    #[must_use]
    pub fn into_items(self) -> Vec<E> {
        self.items
    }

    /// Number of entities on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The cursor this page was fetched with.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// The cursor of the following page.
    #[must_use]
    pub fn next_cursor(&self) -> Cursor {
        self.cursor.advance(self.items.len())
    }

    /// Whether this page came back short, so a following page would be
    /// empty unless new entities arrive.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.cursor.limit.map_or(true, |limit| self.items.len() < limit)
    }

    /// Fetches the following page in the same direction with the same limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan fails or an entity cannot be decoded.
    pub async fn next_page(&self) -> CoreResult<Page<E>> {
        self.pager.fetch(self.next_cursor()).await
    }
}

impl<E> IntoIterator for Page<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<E: fmt::Debug> fmt::Debug for Page<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("cursor", &self.cursor)
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}
