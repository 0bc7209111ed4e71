//! Insertion-order tokens and the index key manager.
//!
//! The store sorts keys by raw bytes, not by write time. Every entity is
//! therefore given an [`Idx`] at creation: a microsecond timestamp rendered
//! as 16 lowercase hex digits, so byte order equals numeric order equals
//! creation order. Data records are keyed by idx; a secondary index maps the
//! entity id (hashed under encryption) to its idx.

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use modelkv_codec::Envelope;
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Width of an encoded idx in bytes.
pub const IDX_LEN: usize = 16;

/// A sortable insertion-order token.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Idx(u64);

impl Idx {
    /// Creates an idx from microseconds since the Unix epoch.
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Microseconds since the Unix epoch.
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Parses the stored form of an idx.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CorruptIndex`] unless `bytes` is exactly 16
    /// lowercase hex digits.
    pub fn from_key(bytes: &[u8]) -> CoreResult<Self> {
        std::str::from_utf8(bytes)
            .map_err(|_| CoreError::corrupt_index(bytes, "idx is not UTF-8"))?
            .parse()
            .map_err(|_| CoreError::corrupt_index(bytes, "idx is not 16 lowercase hex digits"))
    }
}

impl fmt::Display for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Idx({self})")
    }
}

/// Error returned when parsing an [`Idx`] fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdxError;

impl fmt::Display for ParseIdxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected 16 lowercase hex digits")
    }
}

impl std::error::Error for ParseIdxError {}

impl FromStr for Idx {
    type Err = ParseIdxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = s.len() == IDX_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !canonical {
            return Err(ParseIdxError);
        }
        u64::from_str_radix(s, 16).map(Self).map_err(|_| ParseIdxError)
    }
}

impl Serialize for Idx {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Idx {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = Cow::<'de, str>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Issues strictly increasing [`Idx`] values from the system clock.
///
/// Each value is `max(now, last + 1)`, so two calls within the same
/// microsecond, or after the clock steps back, still sort in call order.
#[derive(Debug, Default)]
pub struct IdxGenerator {
    last: Mutex<u64>,
}

impl IdxGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new idx.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ClockUnavailable`] if the clock reads before
    /// the Unix epoch.
    pub fn issue(&self) -> CoreResult<Idx> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| CoreError::ClockUnavailable)?;
        let micros = u64::try_from(now.as_micros()).unwrap_or(u64::MAX);
        Ok(self.next_at(micros))
    }

    fn next_at(&self, now_micros: u64) -> Idx {
        let mut last = self.last.lock();
        let value = now_micros.max(last.saturating_add(1));
        *last = value;
        Idx(value)
    }
}

/// Assigns idx values and maps ids to index keys.
#[derive(Debug, Default)]
pub struct IndexKeys {
    generator: IdxGenerator,
    envelope: Envelope,
}

impl IndexKeys {
    /// Creates a manager that hashes ids whenever `envelope` encrypts.
    #[must_use]
    pub fn new(envelope: Envelope) -> Self {
        Self {
            generator: IdxGenerator::new(),
            envelope,
        }
    }

    /// Returns the entity's idx, issuing and storing a fresh one if unset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ClockUnavailable`] if a new idx is needed and
    /// the clock is unusable.
    pub fn assign<E: Entity>(&self, entity: &mut E) -> CoreResult<Idx> {
        if let Some(idx) = entity.idx() {
            return Ok(idx);
        }
        let idx = self.generator.issue()?;
        entity.set_idx(idx);
        Ok(idx)
    }

    /// The key under which `id` is stored in the index namespace.
    #[must_use]
    pub fn key_for<'a>(&self, id: &'a str) -> Cow<'a, str> {
        self.envelope.hash_id(id)
    }
}
