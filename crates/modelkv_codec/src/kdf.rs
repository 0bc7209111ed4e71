//! Password-based key derivation and identifier hashing.

use crate::config::{CryptoConfig, KdfHash};
use sha2::{Digest, Sha256, Sha512};
use std::fmt::Write;
use zeroize::Zeroizing;

/// A symmetric key derived from the password and a record's salt.
///
/// Zeroized on drop.
pub struct DerivedKey(Zeroizing<Vec<u8>>);

impl DerivedKey {
    /// Runs PBKDF2-HMAC with the configured hash, iterations and key length.
    #[must_use]
    pub fn derive(config: &CryptoConfig, salt: &[u8]) -> Self {
        let mut key = Zeroizing::new(vec![0u8; config.key_bytes()]);
        match config.hash_fn() {
            KdfHash::Sha256 => {
                pbkdf2::pbkdf2_hmac::<Sha256>(config.password(), salt, config.iterations(), &mut key);
            }
            KdfHash::Sha512 => {
                pbkdf2::pbkdf2_hmac::<Sha512>(config.password(), salt, config.iterations(), &mut key);
            }
        }
        Self(key)
    }

    /// The raw key bytes.
    ///
    /// # Security
    ///
    /// Don't log or persist the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Lowercase hex digest of `data`.
#[must_use]
pub fn digest_hex(hash: KdfHash, data: &[u8]) -> String {
    match hash {
        KdfHash::Sha256 => to_hex(&Sha256::digest(data)),
        KdfHash::Sha512 => to_hex(&Sha512::digest(data)),
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_key() {
        let config = CryptoConfig::with_password("pw").unwrap();
        let a = DerivedKey::derive(&config, b"0123456789abcdef");
        let b = DerivedKey::derive(&config, b"0123456789abcdef");
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.as_bytes().len(), 16);
    }

    #[test]
    fn salt_and_password_change_key() {
        let config = CryptoConfig::with_password("pw").unwrap();
        let other = CryptoConfig::with_password("pw2").unwrap();
        let base = DerivedKey::derive(&config, b"salt-a");
        assert_ne!(base.as_bytes(), DerivedKey::derive(&config, b"salt-b").as_bytes());
        assert_ne!(base.as_bytes(), DerivedKey::derive(&other, b"salt-a").as_bytes());
    }

    #[test]
    fn pbkdf2_sha256_known_vector() {
        // RFC 7914 section 11: PBKDF2-HMAC-SHA256("passwd", "salt", 1, 64).
        let mut out = [0u8; 64];
        pbkdf2::pbkdf2_hmac::<Sha256>(b"passwd", b"salt", 1, &mut out);
        assert_eq!(
            to_hex(&out[..8]),
            "55ac046e56e3089f"
        );
    }

    #[test]
    fn digest_hex_sha256() {
        assert_eq!(
            digest_hex(KdfHash::Sha256, b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(digest_hex(KdfHash::Sha512, b"abc").len(), 128);
    }

    #[test]
    fn debug_redacts_key() {
        let config = CryptoConfig::with_password("pw").unwrap();
        let key = DerivedKey::derive(&config, b"salt");
        assert!(format!("{key:?}").contains("REDACTED"));
    }
}
