//! Record instances
//!
//! A record owns its own copy of every field, so instances never share
//! mutable state. Each record maps to one row of its model's table.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::errors::ModelResult;
use super::model::Model;
use super::ID_FIELD;
use crate::schema::Field;

/// One row of a model's table
#[derive(Debug, Clone)]
pub struct Record {
    model: Model,
    fields: Vec<Field>,
}

impl Record {
    pub(crate) fn new(model: Model, fields: Vec<Field>) -> Self {
        Self { model, fields }
    }

    /// Model this record belongs to
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Field values in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The `_id` value as a string, if it is one
    pub fn id(&self) -> Option<&str> {
        self.id_value().as_str()
    }

    /// The `_id` value
    pub fn id_value(&self) -> &Value {
        self.get(ID_FIELD).unwrap_or(&Value::Null)
    }

    /// Current value of the named field, or `None` if the model lacks it.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field(name).map(Field::value)
    }

    /// The named field
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Deserializes the named field's current value.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> ModelResult<T> {
        let value = self
            .get(name)
            .ok_or_else(|| self.model.unknown_field(name))?;
        serde_json::from_value(value.clone()).map_err(|e| self.model.conversion_error(e))
    }

    /// Validates and assigns a field value.
    ///
    /// On failure the previous value is kept and nothing is persisted.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        let model = &self.model;
        let field = self
            .fields
            .iter_mut()
            .find(|field| field.name() == name)
            .ok_or_else(|| model.unknown_field(name))?;
        field.set_value(value)?;
        Ok(())
    }

    /// The row mapping `save` writes: field name to value, in declaration order.
    pub fn to_row(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|field| (field.name().to_string(), field.value().clone()))
            .collect()
    }

    /// Deserializes the whole record into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> ModelResult<T> {
        serde_json::from_value(Value::Object(self.to_row()))
            .map_err(|e| self.model.conversion_error(e))
    }

    /// Writes this record's row, replacing any row with the same `_id`, and persists.
    ///
    /// The replaced row is removed and the new one appended, so a saved
    /// record moves to the end of the table.
    pub fn save(&self) -> ModelResult<()> {
        let id = self.id_value();
        let row = Value::Object(self.to_row());
        let table = self.model.table();

        let mut store = self.model.store().borrow_mut();
        let rows = store.table_mut(table)?;
        let before = rows.len();
        rows.retain(|existing| existing.get(ID_FIELD) != Some(id));
        let replaced = before - rows.len();
        rows.push(row);
        store.save()?;

        debug!(table, id = %id, replaced, "record saved");
        Ok(())
    }

    /// Removes the first row whose `_id` matches this record and persists.
    ///
    /// Returns false, without writing, if no row matches.
    pub fn delete(&self) -> ModelResult<bool> {
        let id = self.id_value();
        let table = self.model.table();

        let mut store = self.model.store().borrow_mut();
        let removed = match store.existing_table_mut(table)? {
            Some(rows) => match rows.iter().position(|row| row.get(ID_FIELD) == Some(id)) {
                Some(index) => {
                    rows.remove(index);
                    true
                }
                None => false,
            },
            None => false,
        };

        if removed {
            store.save()?;
        }
        debug!(table, id = %id, removed, "record deleted");
        Ok(removed)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.model.name())?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", field.name(), field.value())?;
        }
        f.write_str(")")
    }
}
