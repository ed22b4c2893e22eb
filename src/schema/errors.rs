//! Validation error types
//!
//! Error codes:
//! - LIGHTDB_VALIDATION_FAILED
//! - LIGHTDB_UNSUPPORTED_ANNOTATION

use thiserror::Error;

/// A value failed its field's declared annotation, or the annotation itself is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Value does not match a scalar or container annotation
    #[error("expected value of type `{expected}` for field `{field}`, got `{actual}`")]
    TypeMismatch {
        /// Field name
        field: String,
        /// Declared type
        expected: String,
        /// JSON type found
        actual: &'static str,
    },

    /// A list element does not match the element type
    #[error("expected element of type `{expected}` at index {index} in list for field `{field}`, got `{actual}`")]
    ElementMismatch {
        /// Field name
        field: String,
        /// Element position
        index: usize,
        /// Declared element type
        expected: String,
        /// JSON type found
        actual: &'static str,
    },

    /// A mapping value does not match the value type
    #[error("expected value of type `{expected}` at key `{key}` in dict for field `{field}`, got `{actual}`")]
    EntryMismatch {
        /// Field name
        field: String,
        /// Mapping key
        key: String,
        /// Declared value type
        expected: String,
        /// JSON type found
        actual: &'static str,
    },

    /// The annotation has a shape that JSON data can never satisfy
    #[error("unsupported type annotation `{annotation}` for field `{field}`")]
    UnsupportedAnnotation {
        /// Field name
        field: String,
        /// Offending annotation
        annotation: String,
    },

    /// Annotation text could not be parsed
    #[error("unsupported type annotation `{annotation}`")]
    UnknownAnnotation {
        /// Text that failed to parse
        annotation: String,
    },
}

impl ValidationError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::UnsupportedAnnotation { .. }
            | ValidationError::UnknownAnnotation { .. } => "LIGHTDB_UNSUPPORTED_ANNOTATION",
            _ => "LIGHTDB_VALIDATION_FAILED",
        }
    }

    /// Returns the field the failure is attributed to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::TypeMismatch { field, .. }
            | ValidationError::ElementMismatch { field, .. }
            | ValidationError::EntryMismatch { field, .. }
            | ValidationError::UnsupportedAnnotation { field, .. } => Some(field),
            ValidationError::UnknownAnnotation { .. } => None,
        }
    }
}

/// Result type for validation
pub type SchemaResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ValidationError::TypeMismatch {
            field: "age".into(),
            expected: "int".into(),
            actual: "str",
        };
        assert_eq!(err.code(), "LIGHTDB_VALIDATION_FAILED");

        let err = ValidationError::UnknownAnnotation {
            annotation: "decimal".into(),
        };
        assert_eq!(err.code(), "LIGHTDB_UNSUPPORTED_ANNOTATION");
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_display_names_field_and_types() {
        let err = ValidationError::ElementMismatch {
            field: "items".into(),
            index: 1,
            expected: "int".into(),
            actual: "str",
        };
        let display = err.to_string();
        assert!(display.contains("items"));
        assert!(display.contains("index 1"));
        assert!(display.contains("`int`"));
        assert!(display.contains("`str`"));
        assert_eq!(err.field(), Some("items"));
    }
}
