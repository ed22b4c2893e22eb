//! Comparison conditions
//!
//! A condition compares a record's current field value against a literal.
//! No type coercion: values of different JSON kinds are never ordered, and
//! only compare equal when they are the same value.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde_json::{Number, Value};

use crate::model::{ModelError, ModelResult, Record};

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Operator {
    /// Returns the operator symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }

    /// Applies `actual <op> expected`.
    pub fn apply(&self, actual: &Value, expected: &Value) -> bool {
        let ordering = compare_values(actual, expected);
        match self {
            Operator::Eq => values_equal(actual, expected),
            Operator::Ne => !values_equal(actual, expected),
            Operator::Lt => ordering == Some(Ordering::Less),
            Operator::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Operator::Gt => ordering == Some(Ordering::Greater),
            Operator::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            other => Err(ModelError::UnknownOperator(other.to_string())),
        }
    }
}

/// A single `field <op> value` comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    field: String,
    op: Operator,
    value: Value,
}

impl Condition {
    /// Create a condition on the named field.
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Create a condition from an operator symbol such as `">="`.
    pub fn parse(field: impl Into<String>, symbol: &str, value: impl Into<Value>) -> ModelResult<Self> {
        Ok(Self::new(field, symbol.parse()?, value))
    }

    /// Field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Operator
    pub fn op(&self) -> Operator {
        self.op
    }

    /// Literal compared against
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Evaluates against the record's current value for the field.
    ///
    /// A field the record does not have reads as null.
    pub fn evaluate(&self, record: &Record) -> bool {
        self.matches_value(record.get(&self.field).unwrap_or(&Value::Null))
    }

    /// Evaluates against a bare value.
    pub fn matches_value(&self, actual: &Value) -> bool {
        self.op.apply(actual, &self.value)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Condition(field={}, operator='{}', value={})",
            self.field, self.op, self.value
        )
    }
}

/// Orders two JSON values of the same kind.
///
/// Numbers compare numerically across integer and float forms, strings
/// lexicographically, booleans with `false < true`, arrays element by
/// element. Objects and mixed kinds are unordered.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y) {
                match compare_values(left, right)? {
                    Ordering::Equal => continue,
                    unequal => return Some(unequal),
                }
            }
            Some(x.len().cmp(&y.len()))
        }
        _ => None,
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match compare_values(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_symbols() {
        for symbol in ["==", "!=", "<", "<=", ">", ">="] {
            let op: Operator = symbol.parse().unwrap();
            assert_eq!(op.symbol(), symbol);
        }
        assert!(matches!(
            "=~".parse::<Operator>(),
            Err(ModelError::UnknownOperator(ref s)) if s == "=~"
        ));
    }

    #[test]
    fn test_equality_match() {
        let doc = json!("Alice");
        assert!(Condition::new("name", Operator::Eq, "Alice").matches_value(&doc));
        assert!(!Condition::new("name", Operator::Eq, "Bob").matches_value(&doc));
        assert!(Condition::new("name", Operator::Ne, "Bob").matches_value(&doc));
    }

    #[test]
    fn test_no_type_coercion() {
        let value = json!(123);
        assert!(!Operator::Eq.apply(&value, &json!("123")));
        assert!(Operator::Eq.apply(&value, &json!(123)));
        assert!(!Operator::Lt.apply(&value, &json!("200")));
        assert!(!Operator::Eq.apply(&json!(1), &json!(true)));
    }

    #[test]
    fn test_numeric_forms_compare_numerically() {
        assert!(Operator::Eq.apply(&json!(30), &json!(30.0)));
        assert!(Operator::Lt.apply(&json!(2), &json!(2.5)));
        assert!(Operator::Gt.apply(&json!(u64::MAX), &json!(-1)));
    }

    #[test]
    fn test_range_predicates() {
        let age = json!(25);
        assert!(Operator::Ge.apply(&age, &json!(18)));
        assert!(Operator::Le.apply(&age, &json!(30)));
        assert!(Operator::Ge.apply(&age, &json!(25)));
        assert!(!Operator::Gt.apply(&age, &json!(25)));
        assert!(!Operator::Lt.apply(&age, &json!(25)));
    }

    #[test]
    fn test_string_and_array_ordering() {
        assert!(Operator::Lt.apply(&json!("apple"), &json!("banana")));
        assert!(Operator::Lt.apply(&json!([1, 2]), &json!([1, 3])));
        assert!(Operator::Lt.apply(&json!([1]), &json!([1, 0])));
        assert!(!Operator::Lt.apply(&json!([1, "a"]), &json!([1, 2])));
    }

    #[test]
    fn test_null_and_objects() {
        assert!(Operator::Eq.apply(&Value::Null, &Value::Null));
        assert!(!Operator::Lt.apply(&Value::Null, &json!(1)));
        assert!(Operator::Ne.apply(&Value::Null, &json!(1)));
        assert!(Operator::Eq.apply(&json!({"a": 1}), &json!({"a": 1})));
        assert!(!Operator::Le.apply(&json!({"a": 1}), &json!({"a": 1})));
    }

    #[test]
    fn test_parse_condition() {
        let condition = Condition::parse("age", ">=", 20).unwrap();
        assert_eq!(condition.op(), Operator::Ge);
        assert!(Condition::parse("age", "=>", 20).is_err());
    }

    #[test]
    fn test_display() {
        let condition = Condition::new("age", Operator::Ge, 20);
        assert_eq!(
            condition.to_string(),
            "Condition(field=age, operator='>=', value=20)"
        );
    }
}
