//! Field schema subsystem for lightdb
//!
//! A field pairs a name with an optional type annotation, a current value
//! and a default. Every assignment is validated against the annotation.
//!
//! # Design Principles
//!
//! - Validation on every write
//! - No implicit coercion
//! - Null means unset and is always accepted

mod errors;
mod field;
mod types;

pub use errors::{SchemaResult, ValidationError};
pub use field::Field;
pub use types::{json_type_name, FieldType};
