//! Query subsystem for lightdb
//!
//! Filters a model's rows by field conditions.
//!
//! # Design Principles
//!
//! - Full table scan, no indexes
//! - Snapshot rows before filtering
//! - AND semantics across conditions
//! - No type coercion in comparisons

mod condition;
mod query;

pub use condition::{compare_values, Condition, Operator};
pub use query::Query;
