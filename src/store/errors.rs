//! Store error types
//!
//! Error codes:
//! - LIGHTDB_STORE_IO_ERROR
//! - LIGHTDB_STORE_PARSE_ERROR
//! - LIGHTDB_KEY_NOT_FOUND
//! - LIGHTDB_NOT_A_TABLE

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Store error type
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// Backing file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The backing file exists but does not contain valid JSON
    #[error("failed to parse '{}': {source}", .path.display())]
    Parse {
        /// Backing file path
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The backing file holds valid JSON whose root is not an object
    #[error("'{}' does not contain a mapping (found {found})", .path.display())]
    NotAMapping {
        /// Backing file path
        path: PathBuf,
        /// JSON type found at the root
        found: &'static str,
    },

    /// The mapping could not be encoded
    #[error("failed to encode store contents: {0}")]
    Encode(#[source] serde_json::Error),

    /// Top-level key is absent
    #[error("key '{key}' not found")]
    KeyNotFound {
        /// Missing key
        key: String,
    },

    /// Key is absent from the nested mapping at `name`, or `name` itself is absent
    #[error("key '{key}' not found in '{name}'")]
    NestedKeyNotFound {
        /// Outer key
        name: String,
        /// Inner key
        key: String,
    },

    /// The value stored under a table name is not an array of rows
    #[error("value at '{table}' is not a table (found {found})")]
    NotATable {
        /// Table name
        table: String,
        /// JSON type found
        found: &'static str,
    },
}

impl StoreError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Io { .. } => "LIGHTDB_STORE_IO_ERROR",
            StoreError::Parse { .. } | StoreError::NotAMapping { .. } => {
                "LIGHTDB_STORE_PARSE_ERROR"
            }
            StoreError::Encode(_) => "LIGHTDB_STORE_ENCODE_ERROR",
            StoreError::KeyNotFound { .. } | StoreError::NestedKeyNotFound { .. } => {
                "LIGHTDB_KEY_NOT_FOUND"
            }
            StoreError::NotATable { .. } => "LIGHTDB_NOT_A_TABLE",
        }
    }

    /// Returns true for missing-key errors
    pub fn is_key_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::KeyNotFound { .. } | StoreError::NestedKeyNotFound { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn key_not_found(key: impl Into<String>) -> Self {
        StoreError::KeyNotFound { key: key.into() }
    }

    pub(crate) fn nested_key_not_found(name: impl Into<String>, key: impl Into<String>) -> Self {
        StoreError::NestedKeyNotFound {
            name: name.into(),
            key: key.into(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
