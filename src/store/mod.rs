//! Key-value store subsystem for lightdb
//!
//! A single JSON document on disk mirrors an in-memory mapping.
//!
//! # Design Principles
//!
//! - Load once on open; a missing file is an empty store
//! - Every mutation rewrites the whole file before returning
//! - Insertion order is preserved in memory and on disk
//! - Non-ASCII text is written literally
//! - Single process, single writer

mod config;
mod errors;
mod handle;
mod store;

pub use config::StoreConfig;
pub use errors::{StoreError, StoreResult};
pub use handle::{CurrentStoreGuard, StoreHandle};
pub use store::Store;
