//! Field type annotations
//!
//! Supported annotations:
//! - `Any`: any JSON value
//! - `str`, `int`, `float`, `bool`: scalars
//! - `List[T]`: array whose elements all match `T`
//! - `Dict[K, V]`: object whose keys match `K` and values match `V`
//!
//! JSON object keys are always strings, so `K` must be `str` or `Any`.
//!
//! Matching follows JSON kinds rather than a host-language `isinstance`:
//! `float` accepts integers, and `int` rejects booleans and floats.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::errors::ValidationError;

/// Declared type of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Matches every value
    Any,
    /// UTF-8 string
    String,
    /// Integer (signed or unsigned 64-bit)
    Int,
    /// Any number; integers are accepted as floats
    Float,
    /// Boolean
    Bool,
    /// Sequence with a single element type
    List {
        /// Element type (boxed to allow recursive types)
        element: Box<FieldType>,
    },
    /// Mapping with declared key and value types
    Dict {
        /// Key type
        key: Box<FieldType>,
        /// Value type
        value: Box<FieldType>,
    },
}

impl FieldType {
    /// Create a `List[element]` annotation
    pub fn list(element: FieldType) -> Self {
        FieldType::List {
            element: Box::new(element),
        }
    }

    /// Create a `Dict[key, value]` annotation
    pub fn dict(key: FieldType, value: FieldType) -> Self {
        FieldType::Dict {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Any => "Any",
            FieldType::String => "str",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::List { .. } => "list",
            FieldType::Dict { .. } => "dict",
        }
    }

    /// Returns the first nested annotation that cannot be checked against JSON data.
    ///
    /// The only such shape is a `Dict` whose key type is neither `str` nor `Any`.
    pub fn unsupported_part(&self) -> Option<&FieldType> {
        match self {
            FieldType::List { element } => element.unsupported_part(),
            FieldType::Dict { key, value } => {
                if !matches!(**key, FieldType::String | FieldType::Any) {
                    return Some(self);
                }
                value.unsupported_part()
            }
            _ => None,
        }
    }

    /// Checks a value against this annotation, recursing into containers.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::Any => true,
            FieldType::String => value.is_string(),
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::List { element } => value
                .as_array()
                .map_or(false, |items| items.iter().all(|item| element.matches(item))),
            FieldType::Dict { key, value: inner } => {
                matches!(**key, FieldType::String | FieldType::Any)
                    && value
                        .as_object()
                        .map_or(false, |obj| obj.values().all(|v| inner.matches(v)))
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::List { element } => write!(f, "List[{}]", element),
            FieldType::Dict { key, value } => write!(f, "Dict[{}, {}]", key, value),
            other => f.write_str(other.type_name()),
        }
    }
}

impl FromStr for FieldType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unknown = || ValidationError::UnknownAnnotation {
            annotation: s.to_string(),
        };

        let (head, params) = match s.find('[') {
            Some(open) => {
                let inner = s[open + 1..].strip_suffix(']').ok_or_else(unknown)?;
                (s[..open].trim(), Some(inner))
            }
            None => (s, None),
        };

        match (head, params) {
            ("Any" | "any", None) => Ok(FieldType::Any),
            ("str" | "string", None) => Ok(FieldType::String),
            ("int", None) => Ok(FieldType::Int),
            ("float", None) => Ok(FieldType::Float),
            ("bool", None) => Ok(FieldType::Bool),
            ("List" | "list", None) => Ok(FieldType::list(FieldType::Any)),
            ("Dict" | "dict", None) => Ok(FieldType::dict(FieldType::Any, FieldType::Any)),
            ("List" | "list", Some(inner)) => Ok(FieldType::list(inner.parse()?)),
            ("Dict" | "dict", Some(inner)) => {
                let (key, value) = split_top_level(inner).ok_or_else(unknown)?;
                Ok(FieldType::dict(key.parse()?, value.parse()?))
            }
            _ => Err(unknown()),
        }
    }
}

/// Splits `K, V` at the first comma that is not nested inside brackets.
fn split_top_level(params: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in params.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => return Some((&params[..i], &params[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
