//! CLI command implementations.

pub mod delete;
pub mod get;
pub mod list;
pub mod put;

use modelkv_core::{Collection, CollectionOptions, Record};
use modelkv_storage::FileStore;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Which collection a command operates on.
#[derive(Debug, Clone)]
pub struct Target {
    /// Store directory.
    pub path: PathBuf,
    /// Collection name; the default name when `None`.
    pub name: Option<String>,
    /// Password for encrypted collections.
    pub password: Option<String>,
}

impl Target {
    /// Opens the store and the collection.
    pub fn open(&self) -> Result<Collection<Record>, Box<dyn std::error::Error>> {
        let store = FileStore::open(&self.path)?;
        let options = CollectionOptions {
            name: self.name.clone(),
            password: self.password.clone(),
            crypto: None,
        };
        Ok(Collection::open(Arc::new(store), options)?)
    }
}

/// Writes `value` as one line of JSON.
pub fn emit<W: Write, T: Serialize + ?Sized>(
    out: &mut W,
    value: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Target;
    use tempfile::TempDir;

    pub fn target(dir: &TempDir) -> Target {
        Target {
            path: dir.path().to_path_buf(),
            name: Some("cli".into()),
            password: None,
        }
    }

    pub fn lines(out: &[u8]) -> Vec<serde_json::Value> {
        String::from_utf8_lossy(out)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}
