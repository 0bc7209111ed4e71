//! The entity contract and a schemaless entity type.

use crate::idx::Idx;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Trait for types that can be stored in a [`Collection`](crate::Collection).
///
/// Implementors must provide:
/// - `id()`: the caller-assigned identifier, unique within a collection
/// - `rev()`: the revision counter; `1` marks the first save
/// - `idx()` / `set_idx()`: the insertion-order token, assigned by the
///   collection on first save and never changed afterwards
///
/// The idx must be part of the serialized form so a loaded entity carries
/// the same idx it was saved with.
///
/// # Example
///
/// ```rust
/// use modelkv_core::{Entity, Idx};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     id: String,
///     rev: u64,
///     idx: Option<Idx>,
///     name: String,
/// }
///
/// impl Entity for User {
///     fn id(&self) -> &str { &self.id }
///     fn rev(&self) -> u64 { self.rev }
///     fn idx(&self) -> Option<Idx> { self.idx }
///     fn set_idx(&mut self, idx: Idx) { self.idx = Some(idx); }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The entity's identifier.
    fn id(&self) -> &str;

    /// The entity's revision. Values of `1` or less mean "not yet saved".
    fn rev(&self) -> u64;

    /// The insertion-order token, if one has been assigned.
    fn idx(&self) -> Option<Idx>;

    /// Records the insertion-order token.
    fn set_idx(&mut self, idx: Idx);
}

const fn first_rev() -> u64 {
    1
}

/// An entity with arbitrary JSON fields.
///
/// Serializes as a flat JSON object: `{"id": ..., "rev": ..., "idx": ..., ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier.
    pub id: String,
    /// Revision; defaults to `1` when absent.
    #[serde(default = "first_rev")]
    pub rev: u64,
    /// Insertion-order token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<Idx>,
    /// All other fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Creates an unsaved record with no fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rev: first_rev(),
            idx: None,
            fields: Map::new(),
        }
    }

    /// Creates an unsaved record with a random UUID as its id.
    #[must_use]
    pub fn with_generated_id() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Sets a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Reads a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns the record with its revision incremented, ready to re-save.
    #[must_use]
    pub fn bump(mut self) -> Self {
        self.rev = self.rev.saturating_add(1);
        self
    }
}

impl Entity for Record {
    fn id(&self) -> &str {
        &self.id
    }

    fn rev(&self) -> u64 {
        self.rev
    }

    fn idx(&self) -> Option<Idx> {
        self.idx
    }

    fn set_idx(&mut self, idx: Idx) {
        self.idx = Some(idx);
    }
}
