//! lightdb - A lightweight file-persisted JSON key-value store
//!
//! A [`Store`] mirrors one JSON file in memory and rewrites it after every
//! mutation. On top of it, a [`Model`] maps typed records onto rows of a
//! named table, and a [`Query`] filters those rows by field conditions.
//!
//! Single process, single writer: there is no locking, no transaction
//! spanning multiple keys and no crash-safe write.

pub mod model;
pub mod query;
pub mod schema;
pub mod store;

pub use model::{Model, ModelBuilder, ModelError, ModelResult, Record, ID_FIELD};
pub use query::{Condition, Operator, Query};
pub use schema::{Field, FieldType, ValidationError};
pub use store::{Store, StoreConfig, StoreError, StoreHandle, StoreResult};
