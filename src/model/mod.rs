//! Model subsystem for lightdb
//!
//! Maps typed records onto rows of a named table inside a store.
//!
//! # Design Principles
//!
//! - One immutable schema per model, declared through a builder
//! - Explicit store binding, or an explicitly installed current store
//! - Every record owns its field values
//! - Save replaces the whole row by `_id`; there is no partial update
//! - Every save and delete rewrites the store file

mod errors;
mod model;
mod record;

pub use errors::{ModelError, ModelResult};
pub use model::{Model, ModelBuilder};
pub use record::Record;

/// Name of the implicit identifier field.
pub const ID_FIELD: &str = "_id";
