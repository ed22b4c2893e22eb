//! Model error types
//!
//! Error codes:
//! - LIGHTDB_VALIDATION_FAILED / LIGHTDB_UNSUPPORTED_ANNOTATION (from schema)
//! - LIGHTDB_STORE_* / LIGHTDB_KEY_NOT_FOUND (from store)
//! - LIGHTDB_CONFIGURATION_ERROR
//! - LIGHTDB_NO_ARGS_PROVIDED
//! - LIGHTDB_AMBIGUOUS_MATCH
//! - LIGHTDB_FIELD_NOT_FOUND
//! - LIGHTDB_UNKNOWN_OPERATOR
//! - LIGHTDB_MALFORMED_ROW
//! - LIGHTDB_CONVERSION_FAILED

use thiserror::Error;

use crate::schema::ValidationError;
use crate::store::StoreError;

/// Errors from model, record and query operations
#[derive(Debug, Error)]
pub enum ModelError {
    /// A value failed its field's annotation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The underlying store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Model declared without a table name
    #[error("model `{model}` requires a non-empty table name")]
    MissingTable {
        /// Model name
        model: String,
    },

    /// Model declared without a store and no current store is installed
    #[error("model `{model}` has no store: pass one to the builder or install a current store")]
    NoActiveStore {
        /// Model name
        model: String,
    },

    /// The same field name was declared twice
    #[error("field `{field}` is declared more than once on model `{model}`")]
    DuplicateField {
        /// Model name
        model: String,
        /// Field name
        field: String,
    },

    /// `create`, `get` or `filter` called without any values or conditions
    #[error("no arguments provided to `{operation}`")]
    NoArgsProvided {
        /// Operation name
        operation: &'static str,
    },

    /// `get` matched more than one row
    #[error("multiple instances of `{model}` found by the specified filters ({matches} matches)")]
    Ambiguous {
        /// Model name
        model: String,
        /// Number of matching rows
        matches: usize,
    },

    /// A field name that the model does not declare
    #[error("model `{model}` has no field `{field}`")]
    UnknownField {
        /// Model name
        model: String,
        /// Field name
        field: String,
    },

    /// An operator symbol outside `==, !=, <, <=, >, >=`
    #[error("unknown comparison operator `{0}`")]
    UnknownOperator(String),

    /// A stored row is not a mapping
    #[error("row {index} of table `{table}` is not a mapping")]
    MalformedRow {
        /// Table name
        table: String,
        /// Row position
        index: usize,
    },

    /// Converting between a record and a Rust value failed
    #[error("failed to convert `{model}` record: {source}")]
    Conversion {
        /// Model name
        model: String,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },
}

impl ModelError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::Validation(e) => e.code(),
            ModelError::Store(e) => e.code(),
            ModelError::MissingTable { .. }
            | ModelError::NoActiveStore { .. }
            | ModelError::DuplicateField { .. } => "LIGHTDB_CONFIGURATION_ERROR",
            ModelError::NoArgsProvided { .. } => "LIGHTDB_NO_ARGS_PROVIDED",
            ModelError::Ambiguous { .. } => "LIGHTDB_AMBIGUOUS_MATCH",
            ModelError::UnknownField { .. } => "LIGHTDB_FIELD_NOT_FOUND",
            ModelError::UnknownOperator(_) => "LIGHTDB_UNKNOWN_OPERATOR",
            ModelError::MalformedRow { .. } => "LIGHTDB_MALFORMED_ROW",
            ModelError::Conversion { .. } => "LIGHTDB_CONVERSION_FAILED",
        }
    }

    /// Returns true for errors raised while declaring a model
    pub fn is_configuration(&self) -> bool {
        self.code() == "LIGHTDB_CONFIGURATION_ERROR"
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
