//! Benchmark utilities for modelkv.

#![warn(missing_docs)]

use modelkv_core::Record;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Random alphanumeric text of `len` characters.
pub fn random_text(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Unsaved records with ids `r-000000`, `r-000001`, ... and a text payload
/// of `payload_size` characters.
pub fn generate_records(count: usize, payload_size: usize) -> Vec<Record> {
    (0..count)
        .map(|i| Record::new(format!("r-{i:06}")).with_field("body", random_text(payload_size)))
        .collect()
}

/// A current-thread runtime for async benchmarks.
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime")
}
