//! Encryption configuration and its normalization.
//!
//! Callers describe encryption either with a bare password or with a partial
//! [`CryptoOptions`] record. Both are normalized into a complete
//! [`CryptoConfig`] before an envelope is built, so the rest of the crate
//! never deals with missing fields.

use crate::error::{CodecError, CodecResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Default PBKDF2 iteration count.
pub const DEFAULT_KEY_ITERATIONS: u32 = 1024;

/// Symmetric cipher used to encrypt entity bytes.
///
/// Deserialization goes through [`FromStr`], so configuration files and
/// command-line values accept the same names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum CipherAlgorithm {
    /// AES-128 in CBC mode with PKCS#7 padding.
    #[default]
    #[serde(rename = "aes-128-cbc")]
    Aes128Cbc,
    /// AES-192 in CBC mode with PKCS#7 padding.
    #[serde(rename = "aes-192-cbc")]
    Aes192Cbc,
    /// AES-256 in CBC mode with PKCS#7 padding.
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,
    /// AES-256 in GCM mode (authenticated).
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
}

impl CipherAlgorithm {
    /// Key length in bytes.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes128Cbc => 16,
            Self::Aes192Cbc => 24,
            Self::Aes256Cbc | Self::Aes256Gcm => 32,
        }
    }

    /// IV (or nonce) length in bytes. The per-record salt doubles as the IV,
    /// so this is also the required salt length.
    #[must_use]
    pub const fn iv_len(self) -> usize {
        match self {
            Self::Aes128Cbc | Self::Aes192Cbc | Self::Aes256Cbc => 16,
            Self::Aes256Gcm => 12,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Aes128Cbc => "aes-128-cbc",
            Self::Aes192Cbc => "aes-192-cbc",
            Self::Aes256Cbc => "aes-256-cbc",
            Self::Aes256Gcm => "aes-256-gcm",
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherAlgorithm {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes-128-cbc" | "aes128" => Ok(Self::Aes128Cbc),
            "aes-192-cbc" | "aes192" => Ok(Self::Aes192Cbc),
            "aes-256-cbc" | "aes256" => Ok(Self::Aes256Cbc),
            "aes-256-gcm" => Ok(Self::Aes256Gcm),
            other => Err(CodecError::invalid_config(format!(
                "unknown cipher algorithm {other:?}"
            ))),
        }
    }
}

impl TryFrom<String> for CipherAlgorithm {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Hash function used for key derivation and identifier hashing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum KdfHash {
    /// SHA-256.
    #[default]
    Sha256,
    /// SHA-512.
    Sha512,
}

impl KdfHash {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for KdfHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KdfHash {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            other => Err(CodecError::invalid_config(format!(
                "unknown hash function {other:?}"
            ))),
        }
    }
}

impl TryFrom<String> for KdfHash {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Partial encryption settings, as read from configuration.
///
/// Every field is optional; [`CryptoOptions::normalize`] fills the gaps.
/// Field names follow the camelCase keys of the configuration surface
/// (`saltBytes`, `keyBytes`, `keyIterations`).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CryptoOptions {
    /// Cipher to use.
    #[serde(default)]
    pub algorithm: Option<CipherAlgorithm>,
    /// Random salt length per record.
    #[serde(default)]
    pub salt_bytes: Option<usize>,
    /// Derived key length.
    #[serde(default)]
    pub key_bytes: Option<usize>,
    /// PBKDF2 iteration count.
    #[serde(default)]
    pub key_iterations: Option<u32>,
    /// Hash function for PBKDF2 and identifier hashing.
    #[serde(default)]
    pub hash: Option<KdfHash>,
    /// The password. Required once normalized.
    #[serde(default)]
    pub password: Option<String>,
}

impl CryptoOptions {
    /// Fills defaults and validates.
    ///
    /// `saltBytes` and `keyBytes` default to the chosen algorithm's IV and
    /// key lengths, which for the default AES-128-CBC are both 16.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidConfig`] if the password is missing or
    /// empty, if `keyBytes`/`saltBytes` do not fit the algorithm, or if
    /// `keyIterations` is zero.
    pub fn normalize(self) -> CodecResult<CryptoConfig> {
        let password = self
            .password
            .ok_or_else(|| CodecError::invalid_config("password is required"))?;
        let algorithm = self.algorithm.unwrap_or_default();

        let config = CryptoConfig {
            algorithm,
            salt_bytes: self.salt_bytes.unwrap_or(algorithm.iv_len()),
            key_bytes: self.key_bytes.unwrap_or(algorithm.key_len()),
            key_iterations: self.key_iterations.unwrap_or(DEFAULT_KEY_ITERATIONS),
            hash: self.hash.unwrap_or_default(),
            password: Zeroizing::new(password),
        };
        config.validate()?;
        Ok(config)
    }
}

impl fmt::Debug for CryptoOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoOptions")
            .field("algorithm", &self.algorithm)
            .field("salt_bytes", &self.salt_bytes)
            .field("key_bytes", &self.key_bytes)
            .field("key_iterations", &self.key_iterations)
            .field("hash", &self.hash)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Complete, validated encryption settings.
#[derive(Clone)]
pub struct CryptoConfig {
    algorithm: CipherAlgorithm,
    salt_bytes: usize,
    key_bytes: usize,
    key_iterations: u32,
    hash: KdfHash,
    password: Zeroizing<String>,
}

impl CryptoConfig {
    /// Expands a bare password into a configuration with all defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidConfig`] if the password is empty.
    pub fn with_password(password: impl Into<String>) -> CodecResult<Self> {
        CryptoOptions {
            password: Some(password.into()),
            ..CryptoOptions::default()
        }
        .normalize()
    }

    /// Switches cipher, resetting key and salt lengths to the cipher's own.
    #[must_use]
    pub fn algorithm(mut self, algorithm: CipherAlgorithm) -> Self {
        self.algorithm = algorithm;
        self.key_bytes = algorithm.key_len();
        self.salt_bytes = algorithm.iv_len();
        self
    }

    /// Sets the PBKDF2 iteration count (must be non-zero).
    #[must_use]
    pub fn key_iterations(mut self, iterations: u32) -> Self {
        self.key_iterations = iterations.max(1);
        self
    }

    /// Sets the hash function.
    #[must_use]
    pub fn hash(mut self, hash: KdfHash) -> Self {
        self.hash = hash;
        self
    }

    /// The configured cipher.
    #[must_use]
    pub fn cipher(&self) -> CipherAlgorithm {
        self.algorithm
    }

    /// Salt length per record.
    #[must_use]
    pub fn salt_bytes(&self) -> usize {
        self.salt_bytes
    }

    /// Derived key length.
    #[must_use]
    pub fn key_bytes(&self) -> usize {
        self.key_bytes
    }

    /// PBKDF2 iteration count.
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.key_iterations
    }

    /// Hash function.
    #[must_use]
    pub fn hash_fn(&self) -> KdfHash {
        self.hash
    }

    pub(crate) fn password(&self) -> &[u8] {
        self.password.as_bytes()
    }

    fn validate(&self) -> CodecResult<()> {
        if self.password.is_empty() {
            return Err(CodecError::invalid_config("password must not be empty"));
        }
        if self.key_bytes != self.algorithm.key_len() {
            return Err(CodecError::invalid_config(format!(
                "{} needs keyBytes = {}, got {}",
                self.algorithm,
                self.algorithm.key_len(),
                self.key_bytes
            )));
        }
        if self.salt_bytes != self.algorithm.iv_len() {
            return Err(CodecError::invalid_config(format!(
                "{} uses the salt as its IV and needs saltBytes = {}, got {}",
                self.algorithm,
                self.algorithm.iv_len(),
                self.salt_bytes
            )));
        }
        if self.key_iterations == 0 {
            return Err(CodecError::invalid_config("keyIterations must be at least 1"));
        }
        Ok(())
    }
}

impl fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoConfig")
            .field("algorithm", &self.algorithm)
            .field("salt_bytes", &self.salt_bytes)
            .field("key_bytes", &self.key_bytes)
            .field("key_iterations", &self.key_iterations)
            .field("hash", &self.hash)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_expands_to_defaults() {
        let config = CryptoConfig::with_password("hunter2").unwrap();
        assert_eq!(config.cipher(), CipherAlgorithm::Aes128Cbc);
        assert_eq!(config.salt_bytes(), 16);
        assert_eq!(config.key_bytes(), 16);
        assert_eq!(config.iterations(), 1024);
        assert_eq!(config.hash_fn(), KdfHash::Sha256);
    }

    #[test]
    fn options_from_json() {
        let options: CryptoOptions = serde_json::from_str(
            r#"{"algorithm":"aes-256-cbc","keyIterations":10,"hash":"sha512","password":"pw"}"#,
        )
        .unwrap();
        let config = options.normalize().unwrap();
        assert_eq!(config.cipher(), CipherAlgorithm::Aes256Cbc);
        assert_eq!(config.key_bytes(), 32);
        assert_eq!(config.salt_bytes(), 16);
        assert_eq!(config.iterations(), 10);
        assert_eq!(config.hash_fn(), KdfHash::Sha512);
    }

    #[test]
    fn unknown_option_rejected() {
        let parsed: Result<CryptoOptions, _> = serde_json::from_str(r#"{"rounds":3}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_or_empty_password() {
        assert!(CryptoOptions::default().normalize().is_err());
        assert!(CryptoConfig::with_password("").is_err());
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let options = CryptoOptions {
            key_bytes: Some(32),
            password: Some("pw".into()),
            ..CryptoOptions::default()
        };
        assert!(matches!(
            options.normalize(),
            Err(CodecError::InvalidConfig { .. })
        ));

        let options = CryptoOptions {
            algorithm: Some(CipherAlgorithm::Aes256Gcm),
            salt_bytes: Some(16),
            password: Some("pw".into()),
            ..CryptoOptions::default()
        };
        assert!(options.normalize().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let options = CryptoOptions {
            key_iterations: Some(0),
            password: Some("pw".into()),
            ..CryptoOptions::default()
        };
        assert!(options.normalize().is_err());
    }

    #[test]
    fn builder_switches_lengths_with_algorithm() {
        let config = CryptoConfig::with_password("pw")
            .unwrap()
            .algorithm(CipherAlgorithm::Aes256Gcm);
        assert_eq!(config.key_bytes(), 32);
        assert_eq!(config.salt_bytes(), 12);
    }

    #[test]
    fn algorithm_names_parse() {
        for alg in [
            CipherAlgorithm::Aes128Cbc,
            CipherAlgorithm::Aes192Cbc,
            CipherAlgorithm::Aes256Cbc,
            CipherAlgorithm::Aes256Gcm,
        ] {
            assert_eq!(alg.name().parse::<CipherAlgorithm>().unwrap(), alg);
        }
        assert!("des".parse::<CipherAlgorithm>().is_err());
        assert_eq!("SHA512".parse::<KdfHash>().unwrap(), KdfHash::Sha512);
    }

    #[test]
    fn json_and_from_str_accept_the_same_names() {
        for name in ["aes128", "AES-256-GCM", "aes-192-cbc", "des"] {
            let json: Result<CipherAlgorithm, _> = serde_json::from_value(name.into());
            assert_eq!(json.ok(), name.parse::<CipherAlgorithm>().ok(), "{name}");
        }
        for name in ["sha-512", "SHA256", "md5"] {
            let json: Result<KdfHash, _> = serde_json::from_value(name.into());
            assert_eq!(json.ok(), name.parse::<KdfHash>().ok(), "{name}");
        }

        let options: CryptoOptions =
            serde_json::from_str(r#"{"algorithm":"aes256","hash":"sha-512"}"#).unwrap();
        assert_eq!(options.algorithm, Some(CipherAlgorithm::Aes256Cbc));
        assert_eq!(options.hash, Some(KdfHash::Sha512));

        // Serialization keeps the canonical names.
        assert_eq!(
            serde_json::to_value(CipherAlgorithm::Aes256Gcm).unwrap(),
            serde_json::json!("aes-256-gcm")
        );
        assert_eq!(
            serde_json::to_value(KdfHash::Sha512).unwrap(),
            serde_json::json!("sha512")
        );
    }

    #[test]
    fn debug_redacts_password() {
        let config = CryptoConfig::with_password("topsecret").unwrap();
        assert!(!format!("{config:?}").contains("topsecret"));
        let options = CryptoOptions {
            password: Some("topsecret".into()),
            ..CryptoOptions::default()
        };
        assert!(!format!("{options:?}").contains("topsecret"));
    }
}
