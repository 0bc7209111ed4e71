//! The envelope codec: entity ↔ stored bytes.

use crate::cipher;
use crate::config::CryptoConfig;
use crate::error::{CodecError, CodecResult};
use crate::frame::{decode_frame, encode_frame};
use crate::kdf::{digest_hex, DerivedKey};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;

/// Converts entities to storable bytes and back.
///
/// Without a [`CryptoConfig`] the stored form is the entity's JSON text.
/// With one, every record gets a fresh random salt, a key derived from the
/// password and that salt, and is stored as base64 text of the frame
/// `[salt, ciphertext]`.
///
/// Cloning is cheap; clones share the configuration.
///
/// # Example
///
/// ```rust
/// use modelkv_codec::{CryptoConfig, Envelope};
/// use serde_json::json;
///
/// let envelope = Envelope::encrypted(CryptoConfig::with_password("s3cret").unwrap());
/// let stored = envelope.dehydrate(&json!({"id": "a", "rev": 1})).unwrap();
/// let back: serde_json::Value = envelope.hydrate(&stored).unwrap();
/// assert_eq!(back["id"], "a");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    crypto: Option<Arc<CryptoConfig>>,
}

impl Envelope {
    /// An envelope that stores plain JSON.
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    /// An envelope that encrypts every record.
    #[must_use]
    pub fn encrypted(config: CryptoConfig) -> Self {
        Self {
            crypto: Some(Arc::new(config)),
        }
    }

    /// Builds from an optional configuration.
    #[must_use]
    pub fn new(config: Option<CryptoConfig>) -> Self {
        config.map_or_else(Self::plain, Self::encrypted)
    }

    /// Whether records are encrypted.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.crypto.is_some()
    }

    /// The active crypto configuration, if any.
    #[must_use]
    pub fn crypto(&self) -> Option<&CryptoConfig> {
        self.crypto.as_deref()
    }

    /// Serializes `value` and seals it for storage.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if serialization or encryption fails.
    pub fn dehydrate<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<Vec<u8>> {
        let json = serde_json::to_vec(value).map_err(|e| CodecError::encode(e.to_string()))?;
        self.seal(json)
    }

    /// Opens stored bytes and deserializes them.
    ///
    /// # Errors
    ///
    /// Returns a decode-class error ([`CodecError::is_decode`]) when the
    /// base64, the frame, the decryption or the JSON is invalid.
    pub fn hydrate<T: DeserializeOwned>(&self, stored: &[u8]) -> CodecResult<T> {
        let json = self.open(stored)?;
        serde_json::from_slice(&json).map_err(|e| CodecError::decode(e.to_string()))
    }

    /// Seals already-serialized bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if encryption or framing fails.
    pub fn seal(&self, plaintext: Vec<u8>) -> CodecResult<Vec<u8>> {
        let Some(config) = self.crypto.as_deref() else {
            return Ok(plaintext);
        };

        let mut salt = vec![0u8; config.salt_bytes()];
        rand::thread_rng().fill_bytes(&mut salt);
        let key = DerivedKey::derive(config, &salt);
        let ciphertext = cipher::encrypt(config.cipher(), key.as_bytes(), &salt, &plaintext)?;

        let frame = encode_frame(&[&salt, &ciphertext])?;
        Ok(BASE64.encode(frame).into_bytes())
    }

    /// Reverses [`Envelope::seal`].
    ///
    /// # Errors
    ///
    /// See [`Envelope::hydrate`].
    pub fn open<'a>(&self, stored: &'a [u8]) -> CodecResult<Cow<'a, [u8]>> {
        let Some(config) = self.crypto.as_deref() else {
            return Ok(Cow::Borrowed(stored));
        };

        let frame = BASE64
            .decode(stored)
            .map_err(|e| CodecError::malformed(format!("invalid base64: {e}")))?;
        let parts = decode_frame(&frame, 2)?;
        let (salt, ciphertext) = (parts[0], parts[1]);
        if salt.len() != config.salt_bytes() {
            return Err(CodecError::malformed(format!(
                "salt of {} bytes, expected {}",
                salt.len(),
                config.salt_bytes()
            )));
        }

        let key = DerivedKey::derive(config, salt);
        cipher::decrypt(config.cipher(), key.as_bytes(), salt, ciphertext).map(Cow::Owned)
    }

    /// Maps an identifier to the key used in the index namespace.
    ///
    /// Encrypted envelopes return the hex digest of the id so plaintext
    /// identifiers never appear in storage keys; plain envelopes return the
    /// id unchanged.
    #[must_use]
    pub fn hash_id<'a>(&self, id: &'a str) -> Cow<'a, str> {
        match self.crypto.as_deref() {
            Some(config) => Cow::Owned(digest_hex(config.hash_fn(), id.as_bytes())),
            None => Cow::Borrowed(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CipherAlgorithm, KdfHash};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        id: String,
        rev: u64,
        body: String,
    }

    fn doc() -> Doc {
        Doc {
            id: "doc-1".into(),
            rev: 1,
            body: "hello".into(),
        }
    }

    fn fast(password: &str) -> CryptoConfig {
        CryptoConfig::with_password(password).unwrap().key_iterations(16)
    }

    #[test]
    fn plain_is_json_text() {
        let envelope = Envelope::plain();
        let stored = envelope.dehydrate(&doc()).unwrap();
        assert_eq!(stored, br#"{"id":"doc-1","rev":1,"body":"hello"}"#.to_vec());
        assert_eq!(envelope.hydrate::<Doc>(&stored).unwrap(), doc());
    }

    #[test]
    fn encrypted_roundtrip() {
        let envelope = Envelope::encrypted(fast("pw"));
        let stored = envelope.dehydrate(&doc()).unwrap();
        assert!(!String::from_utf8_lossy(&stored).contains("hello"));
        assert_eq!(envelope.hydrate::<Doc>(&stored).unwrap(), doc());
    }

    #[test]
    fn encrypted_output_is_base64_frame_with_salt() {
        let envelope = Envelope::encrypted(fast("pw"));
        let stored = envelope.dehydrate(&doc()).unwrap();
        let frame = BASE64.decode(&stored).unwrap();
        let parts = decode_frame(&frame, 2).unwrap();
        assert_eq!(parts[0].len(), 16);
        assert_eq!(parts[1].len() % 16, 0);
    }

    #[test]
    fn identical_plaintexts_differ_when_stored() {
        let envelope = Envelope::encrypted(fast("pw"));
        let a = envelope.dehydrate(&doc()).unwrap();
        let b = envelope.dehydrate(&doc()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_password_is_a_decode_error() {
        let stored = Envelope::encrypted(fast("right")).dehydrate(&doc()).unwrap();
        let err = Envelope::encrypted(fast("wrong"))
            .hydrate::<Doc>(&stored)
            .unwrap_err();
        assert!(err.is_decode(), "unexpected error {err:?}");
    }

    #[test]
    fn gcm_roundtrip_and_wrong_password() {
        let config = fast("pw").algorithm(CipherAlgorithm::Aes256Gcm);
        let envelope = Envelope::encrypted(config);
        let stored = envelope.dehydrate(&doc()).unwrap();
        assert_eq!(envelope.hydrate::<Doc>(&stored).unwrap(), doc());

        let other = Envelope::encrypted(fast("nope").algorithm(CipherAlgorithm::Aes256Gcm));
        assert_eq!(
            other.hydrate::<Doc>(&stored).unwrap_err(),
            CodecError::Decryption
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let envelope = Envelope::encrypted(fast("pw"));
        assert!(matches!(
            envelope.hydrate::<Doc>(b"not base64!!"),
            Err(CodecError::MalformedEnvelope { .. })
        ));
        let short = BASE64.encode([0u8, 0, 0, 3, 1, 2, 3]);
        assert!(matches!(
            envelope.hydrate::<Doc>(short.as_bytes()),
            Err(CodecError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn plain_rejects_bad_json() {
        let err = Envelope::plain().hydrate::<Doc>(b"{\"id\":").unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }

    #[test]
    fn hash_id_is_deterministic_and_opaque() {
        let envelope = Envelope::encrypted(fast("pw"));
        let a = envelope.hash_id("user-42");
        assert_eq!(a, envelope.hash_id("user-42"));
        assert_ne!(a, envelope.hash_id("user-43"));
        assert!(!a.contains("user"));
        assert_eq!(a.len(), 64);

        let sha512 = Envelope::encrypted(fast("pw").hash(KdfHash::Sha512));
        assert_eq!(sha512.hash_id("user-42").len(), 128);

        assert_eq!(Envelope::plain().hash_id("user-42"), "user-42");
    }
}
