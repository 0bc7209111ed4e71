//! Key prefixing for logical namespaces inside one ordered store.
//!
//! A keyspace named `notes` owns every key starting with `!notes!`. Nested
//! keyspaces concatenate: the `data` child of `notes` owns `!notes!!data!`.
//! Because the prefix always ends in [`SEPARATOR`], the exclusive end of a
//! keyspace's range is the prefix with its final byte incremented.

use crate::error::{StorageError, StorageResult};

/// Byte that delimits keyspace names.
pub const SEPARATOR: u8 = b'!';

/// A half-open key range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    /// Inclusive lower bound.
    pub start: Vec<u8>,
    /// Exclusive upper bound.
    pub end: Vec<u8>,
}

impl KeyRange {
    /// Creates a range.
    pub fn new(start: Vec<u8>, end: Vec<u8>) -> Self {
        Self { start, end }
    }

    /// Whether `key` lies inside the range.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start.as_slice() && key < self.end.as_slice()
    }
}

/// A named, prefixed region of an ordered store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyspace {
    prefix: Vec<u8>,
}

impl Keyspace {
    /// Creates a top-level keyspace.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKeyspace`] if `name` is empty or
    /// contains the separator byte.
    pub fn new(name: &str) -> StorageResult<Self> {
        validate(name)?;
        let mut prefix = Vec::with_capacity(name.len() + 2);
        push_level(&mut prefix, name);
        Ok(Self { prefix })
    }

    /// Creates a child keyspace nested inside this one.
    ///
    /// # Errors
    ///
    /// Same rules as [`Keyspace::new`].
    pub fn sub(&self, name: &str) -> StorageResult<Self> {
        validate(name)?;
        let mut prefix = self.prefix.clone();
        push_level(&mut prefix, name);
        Ok(Self { prefix })
    }

    /// The raw prefix shared by all keys in this keyspace.
    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Builds the full store key for `suffix`.
    #[must_use]
    pub fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.prefix.len() + suffix.len());
        key.extend_from_slice(&self.prefix);
        key.extend_from_slice(suffix);
        key
    }

    /// Returns the suffix of `key` if it belongs to this keyspace.
    #[must_use]
    pub fn strip<'a>(&self, key: &'a [u8]) -> Option<&'a [u8]> {
        key.strip_prefix(self.prefix.as_slice())
    }

    /// The range covering every key in this keyspace, children included.
    #[must_use]
    pub fn range(&self) -> KeyRange {
        let mut end = self.prefix.clone();
        // The prefix always ends in SEPARATOR, which is far below 0xFF.
        if let Some(last) = end.last_mut() {
            *last += 1;
        }
        KeyRange::new(self.prefix.clone(), end)
    }
}

fn validate(name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::InvalidKeyspace {
            name: name.to_string(),
            reason: "name must not be empty",
        });
    }
    if name.as_bytes().contains(&SEPARATOR) {
        return Err(StorageError::InvalidKeyspace {
            name: name.to_string(),
            reason: "name must not contain '!'",
        });
    }
    Ok(())
}

fn push_level(prefix: &mut Vec<u8>, name: &str) {
    prefix.push(SEPARATOR);
    prefix.extend_from_slice(name.as_bytes());
    prefix.push(SEPARATOR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nested_prefix_layout() {
        let data = Keyspace::new("notes").unwrap().sub("data").unwrap();
        assert_eq!(data.prefix(), b"!notes!!data!");
        assert_eq!(data.key(b"0001"), b"!notes!!data!0001".to_vec());
    }

    #[test]
    fn strip_rejects_foreign_keys() {
        let ks = Keyspace::new("a").unwrap();
        assert_eq!(ks.strip(b"!a!xyz"), Some(&b"xyz"[..]));
        assert_eq!(ks.strip(b"!ab!xyz"), None);
    }

    #[test]
    fn invalid_names() {
        assert!(matches!(
            Keyspace::new(""),
            Err(StorageError::InvalidKeyspace { .. })
        ));
        assert!(Keyspace::new("a!b").is_err());
        assert!(Keyspace::new("ok").unwrap().sub("").is_err());
    }

    #[test]
    fn sibling_keyspaces_do_not_overlap() {
        let root = Keyspace::new("notes").unwrap();
        let data = root.sub("data").unwrap();
        let index = root.sub("index").unwrap();

        assert!(!data.range().contains(&index.key(b"x")));
        assert!(!index.range().contains(&data.key(b"x")));
        assert!(root.range().contains(&data.key(b"x")));
    }

    proptest! {
        #[test]
        fn every_suffix_is_inside_range(
            name in "[a-z]{1,8}",
            suffix in prop::collection::vec(any::<u8>(), 0..32),
        ) {
            let ks = Keyspace::new(&name).unwrap();
            let key = ks.key(&suffix);
            prop_assert!(ks.range().contains(&key));
            prop_assert_eq!(ks.strip(&key), Some(suffix.as_slice()));
        }
    }
}
