//! Query building and execution
//!
//! A query scans every row of one model's table. Rows are materialized
//! into records before any condition runs, so the store is never borrowed
//! while filtering. All conditions must hold (AND semantics); row order
//! is preserved and there is no limit.

use std::fmt;

use serde_json::Value;
use tracing::trace;

use super::condition::Condition;
use crate::model::{Model, ModelResult, Record};

/// An ordered set of conditions against one model
#[derive(Debug, Clone)]
pub struct Query {
    model: Model,
    conditions: Vec<Condition>,
}

impl Query {
    /// Create an empty query; with no conditions every row matches.
    pub fn new(model: &Model) -> Self {
        Self {
            model: model.clone(),
            conditions: Vec::new(),
        }
    }

    /// Appends `conditions`, then one equality condition per `(field, value)` filter.
    ///
    /// # Errors
    ///
    /// `UnknownField` if a condition or filter names a field the model does
    /// not declare.
    pub fn filter(mut self, conditions: &[Condition], filters: &[(&str, Value)]) -> ModelResult<Self> {
        for condition in conditions {
            self = self.condition(condition.clone())?;
        }
        for (name, value) in filters {
            let condition = self.model.field(name)?.equals(value.clone());
            self.conditions.push(condition);
        }
        Ok(self)
    }

    /// Appends a single condition.
    ///
    /// # Errors
    ///
    /// `UnknownField` if the condition names a field the model does not declare.
    pub fn condition(mut self, condition: Condition) -> ModelResult<Self> {
        self.model.field(condition.field())?;
        self.conditions.push(condition);
        Ok(self)
    }

    /// Model being queried
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Conditions in the order they were added
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns true if every condition holds for `record`.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|condition| condition.evaluate(record))
    }

    /// Loads all rows of the model's table and keeps the matching ones.
    pub fn execute(&self) -> ModelResult<Vec<Record>> {
        let records = self.model.all()?;
        let scanned = records.len();

        let matched: Vec<Record> = records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect();

        trace!(
            table = self.model.table(),
            conditions = self.conditions.len(),
            scanned,
            matched = matched.len(),
            "query executed"
        );
        Ok(matched)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query(model={}, conditions=[", self.model.name())?;
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", condition)?;
        }
        f.write_str("])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelError;
    use crate::query::Operator;
    use crate::schema::FieldType;
    use crate::store::StoreHandle;
    use serde_json::json;
    use tempfile::TempDir;

    fn user_model() -> (TempDir, Model) {
        let temp_dir = TempDir::new().unwrap();
        let store = StoreHandle::open(temp_dir.path().join("db.json")).unwrap();
        let model = Model::builder("User")
            .table("users")
            .store(&store)
            .field("name", FieldType::String)
            .field("age", FieldType::Int)
            .build()
            .unwrap();
        (temp_dir, model)
    }

    #[test]
    fn test_query_initialization() {
        let (_temp_dir, users) = user_model();
        let query = Query::new(&users);
        assert_eq!(query.model().name(), "User");
        assert!(query.conditions().is_empty());
    }

    #[test]
    fn test_filter_adds_equality_conditions() {
        let (_temp_dir, users) = user_model();
        let query = Query::new(&users)
            .filter(&[], &[("name", json!("John")), ("age", json!(30))])
            .unwrap();

        assert_eq!(query.conditions().len(), 2);
        assert_eq!(query.conditions()[0].field(), "name");
        assert_eq!(query.conditions()[0].op(), Operator::Eq);
        assert_eq!(query.conditions()[0].value(), &json!("John"));
    }

    #[test]
    fn test_filter_unknown_field() {
        let (_temp_dir, users) = user_model();
        let err = Query::new(&users)
            .filter(&[], &[("email", json!("a@b"))])
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownField { .. }));
    }

    #[test]
    fn test_condition_on_unknown_field() {
        let (_temp_dir, users) = user_model();
        users.create([("name", json!("John")), ("age", json!(30))]).unwrap();

        let err = Query::new(&users)
            .condition(Condition::new("agee", Operator::Ne, 30))
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownField { ref field, .. } if field == "agee"));

        let err = Query::new(&users)
            .filter(&[Condition::new("agee", Operator::Eq, 30)], &[])
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownField { .. }));
    }

    #[test]
    fn test_execute() {
        let (_temp_dir, users) = user_model();
        users.create([("name", json!("John")), ("age", json!(30))]).unwrap();
        users.create([("name", json!("Jane")), ("age", json!(25))]).unwrap();

        let results = Query::new(&users)
            .filter(&[], &[("age", json!(30))])
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get("name"), Some(&json!("John")));
    }

    #[test]
    fn test_empty_query_returns_all_in_row_order() {
        let (_temp_dir, users) = user_model();
        for (name, age) in [("a", 1), ("b", 2), ("c", 3)] {
            users.create([("name", json!(name)), ("age", json!(age))]).unwrap();
        }

        let names: Vec<Value> = Query::new(&users)
            .execute()
            .unwrap()
            .iter()
            .map(|r| r.get("name").cloned().unwrap())
            .collect();
        assert_eq!(names, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn test_conditions_and_together() {
        let (_temp_dir, users) = user_model();
        users.create([("name", json!("John")), ("age", json!(30))]).unwrap();
        users.create([("name", json!("Jane")), ("age", json!(35))]).unwrap();

        let age = users.field("age").unwrap();
        let results = Query::new(&users)
            .condition(age.greater_or_equal(30))
            .unwrap()
            .condition(age.less_than(35))
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get("name"), Some(&json!("John")));
    }

    #[test]
    fn test_display() {
        let (_temp_dir, users) = user_model();
        let query = Query::new(&users)
            .condition(Condition::new("age", Operator::Gt, 1))
            .unwrap();
        assert_eq!(
            query.to_string(),
            "Query(model=User, conditions=[Condition(field=age, operator='>', value=1)])"
        );
    }
}
