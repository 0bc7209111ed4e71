//! Test fixtures and collection helpers.

use modelkv_codec::CryptoConfig;
use modelkv_core::{Collection, Entity, Idx};
use modelkv_storage::{FileStore, MemoryStore, OrderedStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// PBKDF2 iterations used by test collections. Low so tests stay fast.
pub const TEST_KEY_ITERATIONS: u32 = 8;

/// A small typed entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Identifier.
    pub id: String,
    /// Revision.
    pub rev: u64,
    /// Insertion-order token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<Idx>,
    /// Payload.
    pub text: String,
}

impl Note {
    /// An unsaved note.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rev: 1,
            idx: None,
            text: text.into(),
        }
    }

    /// A copy with new text and the next revision.
    #[must_use]
    pub fn revised(&self, text: impl Into<String>) -> Self {
        Self {
            rev: self.rev + 1,
            text: text.into(),
            ..self.clone()
        }
    }

    /// Equality ignoring the idx.
    pub fn same_content(&self, other: &Self) -> bool {
        self.id == other.id && self.rev == other.rev && self.text == other.text
    }
}

impl Entity for Note {
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

/// `count` notes with ids `note-000`, `note-001`, ...
pub fn numbered_notes(count: usize) -> Vec<Note> {
    (0..count)
        .map(|i| Note::new(format!("note-{i:03}"), format!("body {i}")))
        .collect()
}

/// A fast crypto configuration for tests.
pub fn test_crypto(password: &str) -> CryptoConfig {
    CryptoConfig::with_password(password)
        .expect("Failed to build crypto config")
        .key_iterations(TEST_KEY_ITERATIONS)
}

/// Opens a plain `notes` collection over `store`.
///
/// Must be called inside a tokio runtime.
pub fn notes_over(store: Arc<dyn OrderedStore>) -> Collection<Note> {
    Collection::builder()
        .store(store)
        .name("notes")
        .open()
        .expect("Failed to open collection")
}

/// Opens an encrypted `notes` collection over `store`.
pub fn encrypted_notes_over(store: Arc<dyn OrderedStore>, password: &str) -> Collection<Note> {
    Collection::builder()
        .store(store)
        .name("notes")
        .crypto(test_crypto(password))
        .open()
        .expect("Failed to open collection")
}

/// A plain collection over a fresh memory store, plus the store.
pub fn memory_notes() -> (Collection<Note>, MemoryStore) {
    let store = MemoryStore::new();
    (notes_over(Arc::new(store.clone())), store)
}

/// Saves every note in order, awaiting each, and returns the stored copies.
pub async fn save_all(collection: &Collection<Note>, notes: Vec<Note>) -> Vec<Note> {
    let mut saved = Vec::with_capacity(notes.len());
    for note in notes {
        saved.push(collection.save(note).await.expect("Failed to save note"));
    }
    saved
}

/// A file store in a temporary directory that is removed on drop.
pub struct TestFileStore {
    /// The store.
    pub store: Arc<FileStore>,
    dir: TempDir,
}

impl TestFileStore {
    /// Opens a store in a new temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::open(dir.path()).expect("Failed to open file store");
        Self {
            store: Arc::new(store),
            dir,
        }
    }

    /// Closes and reopens the store in the same directory.
    ///
    /// Collections over the store must be dropped first. Their workers
    /// release the store shortly after, so this waits for the last other
    /// handle to go away before reopening.
    pub async fn reopen(self) -> Self {
        let Self { store, dir } = self;
        for _ in 0..1_000 {
            if Arc::strong_count(&store) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        drop(store);
        let store = FileStore::open(dir.path()).expect("Failed to reopen file store");
        Self {
            store: Arc::new(store),
            dir,
        }
    }

    /// The store's directory.
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

impl Default for TestFileStore {
    fn default() -> Self {
        Self::new()
    }
}
