//! Collection configuration.
//!
//! [`CollectionOptions`] mirrors the loosely-typed option record callers
//! pass in (and what the CLI reads from JSON). [`CollectionOptions::normalize`]
//! turns it into a [`CollectionConfig`], expanding a bare `password` into a
//! complete crypto record.

use crate::error::{CoreError, CoreResult};
use modelkv_codec::{CryptoConfig, CryptoOptions};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name used when none is configured.
pub const DEFAULT_COLLECTION_NAME: &str = "models";

/// Raw collection options.
///
/// The backing store is not part of this record; it is handed to the
/// [`CollectionBuilder`](crate::CollectionBuilder) directly.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CollectionOptions {
    /// Namespace within the store. Defaults to `"models"`.
    #[serde(default)]
    pub name: Option<String>,
    /// Shortcut for `crypto: { password }`.
    #[serde(default)]
    pub password: Option<String>,
    /// Full encryption settings.
    #[serde(default)]
    pub crypto: Option<CryptoOptions>,
}

impl CollectionOptions {
    /// Validates the options and fills defaults.
    ///
    /// When both `crypto` and `password` are given, `crypto.password` wins
    /// and `password` only fills it in if absent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for an unusable name and
    /// [`CoreError::Codec`] for invalid crypto settings.
    pub fn normalize(self) -> CoreResult<CollectionConfig> {
        let name = self
            .name
            .unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_string());
        validate_name(&name)?;

        let crypto = match (self.crypto, self.password) {
            (Some(mut crypto), password) => {
                if crypto.password.is_none() {
                    crypto.password = password;
                }
                Some(crypto.normalize()?)
            }
            (None, Some(password)) => Some(CryptoConfig::with_password(password)?),
            (None, None) => None,
        };

        Ok(CollectionConfig { name, crypto })
    }
}

impl fmt::Debug for CollectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionOptions")
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("crypto", &self.crypto)
            .finish()
    }
}

/// Validated collection configuration.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Namespace within the store.
    pub name: String,
    /// Encryption settings; `None` stores plain JSON.
    pub crypto: Option<CryptoConfig>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COLLECTION_NAME.to_string(),
            crypto: None,
        }
    }
}

impl CollectionConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the namespace.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enables encryption.
    #[must_use]
    pub fn crypto(mut self, crypto: CryptoConfig) -> Self {
        self.crypto = Some(crypto);
        self
    }

    pub(crate) fn validate(&self) -> CoreResult<()> {
        validate_name(&self.name)
    }
}

fn validate_name(name: &str) -> CoreResult<()> {
    modelkv_storage::Keyspace::new(name)
        .map(drop)
        .map_err(|e| CoreError::invalid_config(format!("collection name: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelkv_codec::CipherAlgorithm;

    #[test]
    fn defaults() {
        let config = CollectionOptions::default().normalize().unwrap();
        assert_eq!(config.name, "models");
        assert!(config.crypto.is_none());
    }

    #[test]
    fn password_shortcut_expands() {
        let options: CollectionOptions =
            serde_json::from_str(r#"{"name":"notes","password":"pw"}"#).unwrap();
        let config = options.normalize().unwrap();
        assert_eq!(config.name, "notes");
        let crypto = config.crypto.unwrap();
        assert_eq!(crypto.cipher(), CipherAlgorithm::Aes128Cbc);
        assert_eq!(crypto.iterations(), 1024);
    }

    #[test]
    fn crypto_record_takes_password_from_shortcut() {
        let options: CollectionOptions = serde_json::from_str(
            r#"{"password":"pw","crypto":{"algorithm":"aes-256-gcm","keyIterations":2}}"#,
        )
        .unwrap();
        let crypto = options.normalize().unwrap().crypto.unwrap();
        assert_eq!(crypto.cipher(), CipherAlgorithm::Aes256Gcm);
        assert_eq!(crypto.salt_bytes(), 12);
        assert_eq!(crypto.iterations(), 2);
    }

    #[test]
    fn crypto_without_any_password_fails() {
        let options: CollectionOptions =
            serde_json::from_str(r#"{"crypto":{"hash":"sha512"}}"#).unwrap();
        assert!(matches!(options.normalize(), Err(CoreError::Codec(_))));
    }

    #[test]
    fn bad_names_rejected() {
        for name in ["", "a!b"] {
            let options = CollectionOptions {
                name: Some(name.into()),
                ..CollectionOptions::default()
            };
            assert!(matches!(
                options.normalize(),
                Err(CoreError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn unknown_keys_rejected() {
        let parsed: Result<CollectionOptions, _> = serde_json::from_str(r#"{"db":1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let options = CollectionOptions {
            password: Some("hunter2".into()),
            ..CollectionOptions::default()
        };
        let rendered = format!("{options:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("REDACTED"));
    }
}
