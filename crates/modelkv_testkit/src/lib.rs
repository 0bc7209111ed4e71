//! # modelkv Testkit
//!
//! Test utilities for modelkv.
//!
//! This crate provides:
//! - Fixtures: the [`Note`] entity and collection constructors
//! - [`JitterStore`], a random-latency store wrapper for ordering tests
//! - Property-based test generators using proptest
//!
//! The cross-crate integration suites live in this crate's `tests/`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use modelkv_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn saves_in_order() {
//!     let (notes, _store) = memory_notes();
//!     save_all(&notes, numbered_notes(3)).await;
//!     assert_eq!(notes.head(0, None).await.unwrap().len(), 3);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod jitter;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::jitter::*;
}

pub use fixtures::*;
pub use generators::*;
pub use jitter::*;
