//! Typed, validated attribute slots
//!
//! Validation semantics:
//! - A field with no annotation accepts anything
//! - Null is always accepted (an unset field)
//! - Scalars must match exactly; `int` never matches `bool`
//! - `List[T]` checks every element, `Dict[K, V]` checks every value
//! - Failed assignments leave the previous value in place

use std::fmt;

use serde_json::Value;

use super::errors::{SchemaResult, ValidationError};
use super::types::{json_type_name, FieldType};
use crate::query::{Condition, Operator};

/// A single typed attribute of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    annotation: Option<FieldType>,
    value: Value,
    default: Value,
}

impl Field {
    /// Create a field with the given annotation.
    pub fn new(name: impl Into<String>, annotation: FieldType) -> Self {
        Self {
            name: name.into(),
            annotation: Some(annotation),
            value: Value::Null,
            default: Value::Null,
        }
    }

    /// Create a field without an annotation; every value is accepted.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            value: Value::Null,
            default: Value::Null,
        }
    }

    /// Set the value used when a record is built without one.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    /// Set the current value without validation (templates only).
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared annotation, if any
    pub fn annotation(&self) -> Option<&FieldType> {
        self.annotation.as_ref()
    }

    /// Current value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Default value
    pub fn default(&self) -> &Value {
        &self.default
    }

    /// Value a fresh record starts from: the current value, else the default.
    pub(crate) fn initial_value(&self) -> Value {
        if self.value.is_null() {
            self.default.clone()
        } else {
            self.value.clone()
        }
    }

    /// Validates `value`, or the current value when `value` is `None` or null.
    pub fn validate(&self, value: Option<&Value>) -> SchemaResult<()> {
        let annotation = match &self.annotation {
            Some(annotation) => annotation,
            None => return Ok(()),
        };

        if let Some(part) = annotation.unsupported_part() {
            return Err(ValidationError::UnsupportedAnnotation {
                field: self.name.clone(),
                annotation: part.to_string(),
            });
        }

        let value = match value {
            Some(v) if !v.is_null() => v,
            _ => &self.value,
        };

        if value.is_null() {
            return Ok(());
        }

        match annotation {
            FieldType::List { element } => {
                let items = value
                    .as_array()
                    .ok_or_else(|| self.type_error(annotation, value))?;
                for (index, item) in items.iter().enumerate() {
                    if !element.matches(item) {
                        return Err(ValidationError::ElementMismatch {
                            field: self.name.clone(),
                            index,
                            expected: element.to_string(),
                            actual: json_type_name(item),
                        });
                    }
                }
            }
            FieldType::Dict { value: inner, .. } => {
                let entries = value
                    .as_object()
                    .ok_or_else(|| self.type_error(annotation, value))?;
                for (key, entry) in entries {
                    if !inner.matches(entry) {
                        return Err(ValidationError::EntryMismatch {
                            field: self.name.clone(),
                            key: key.clone(),
                            expected: inner.to_string(),
                            actual: json_type_name(entry),
                        });
                    }
                }
            }
            scalar => {
                if !scalar.matches(value) {
                    return Err(self.type_error(scalar, value));
                }
            }
        }

        Ok(())
    }

    /// Validates and assigns. On failure the previous value is kept.
    pub fn set_value(&mut self, value: impl Into<Value>) -> SchemaResult<()> {
        let value = value.into();
        if !value.is_null() {
            self.validate(Some(&value))?;
        } else if let Some(part) = self.annotation.as_ref().and_then(FieldType::unsupported_part) {
            return Err(ValidationError::UnsupportedAnnotation {
                field: self.name.clone(),
                annotation: part.to_string(),
            });
        }
        self.value = value;
        Ok(())
    }

    /// Builds a condition `self <op> value`.
    pub fn condition(&self, op: Operator, value: impl Into<Value>) -> Condition {
        Condition::new(self.name.clone(), op, value)
    }

    /// `field == value`
    pub fn equals(&self, value: impl Into<Value>) -> Condition {
        self.condition(Operator::Eq, value)
    }

    /// `field != value`
    pub fn not_equals(&self, value: impl Into<Value>) -> Condition {
        self.condition(Operator::Ne, value)
    }

    /// `field < value`
    pub fn less_than(&self, value: impl Into<Value>) -> Condition {
        self.condition(Operator::Lt, value)
    }

    /// `field <= value`
    pub fn less_or_equal(&self, value: impl Into<Value>) -> Condition {
        self.condition(Operator::Le, value)
    }

    /// `field > value`
    pub fn greater_than(&self, value: impl Into<Value>) -> Condition {
        self.condition(Operator::Gt, value)
    }

    /// `field >= value`
    pub fn greater_or_equal(&self, value: impl Into<Value>) -> Condition {
        self.condition(Operator::Ge, value)
    }

    fn type_error(&self, expected: &FieldType, actual: &Value) -> ValidationError {
        ValidationError::TypeMismatch {
            field: self.name.clone(),
            expected: expected.to_string(),
            actual: json_type_name(actual),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field(name={}, annotation=", self.name)?;
        match &self.annotation {
            Some(annotation) => write!(f, "{}", annotation)?,
            None => f.write_str("None")?,
        }
        write!(f, ", value={}, default={})", self.value, self.default)
    }
}
