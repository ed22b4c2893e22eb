//! Model declaration and table-level operations
//!
//! A [`Model`] is the immutable schema shared by all records of one type:
//! a name, a table, a bound store and one field template per attribute.
//! It is built once through [`ModelBuilder`] and cloned cheaply.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use serde::ser::Error as _;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::errors::{ModelError, ModelResult};
use super::record::Record;
use super::ID_FIELD;
use crate::query::{Condition, Query};
use crate::schema::{json_type_name, Field, FieldType};
use crate::store::StoreHandle;

struct ModelSchema {
    name: String,
    table: String,
    store: StoreHandle,
    fields: Vec<Field>,
}

/// Schema descriptor for one record type, bound to a table and a store.
#[derive(Clone)]
pub struct Model {
    inner: Rc<ModelSchema>,
}

/// Declares a [`Model`].
///
/// ```ignore
/// let users = Model::builder("User")
///     .table("users")
///     .store(&store)
///     .field("name", FieldType::String)
///     .field("age", FieldType::Int)
///     .field_with_default("items", FieldType::list(FieldType::String), json!([]))
///     .build()?;
/// ```
pub struct ModelBuilder {
    name: String,
    table: Option<String>,
    store: Option<StoreHandle>,
    fields: Vec<Field>,
}

impl ModelBuilder {
    /// Sets the table that holds this model's rows.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Binds the model to `store` instead of the current default store.
    pub fn store(mut self, store: &StoreHandle) -> Self {
        self.store = Some(store.clone());
        self
    }

    /// Declares a typed field.
    pub fn field(self, name: impl Into<String>, annotation: FieldType) -> Self {
        self.with_field(Field::new(name, annotation))
    }

    /// Declares a typed field with a default value.
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        annotation: FieldType,
        default: impl Into<Value>,
    ) -> Self {
        self.with_field(Field::new(name, annotation).with_default(default))
    }

    /// Declares a field that accepts any value.
    pub fn untyped_field(self, name: impl Into<String>) -> Self {
        self.with_field(Field::untyped(name))
    }

    /// Declares a prepared field template.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Finishes the declaration.
    ///
    /// An `_id` string field is prepended unless one was declared.
    ///
    /// # Errors
    ///
    /// - `MissingTable` if no table, or an empty one, was given
    /// - `NoActiveStore` if no store was given and none is current
    /// - `DuplicateField` if a field name repeats
    pub fn build(self) -> ModelResult<Model> {
        let name = self.name;

        let table = self
            .table
            .filter(|table| !table.is_empty())
            .ok_or_else(|| ModelError::MissingTable {
                model: name.clone(),
            })?;

        let store = self
            .store
            .or_else(StoreHandle::current)
            .ok_or_else(|| ModelError::NoActiveStore {
                model: name.clone(),
            })?;

        let has_id = {
            let mut seen = HashSet::new();
            for field in &self.fields {
                if !seen.insert(field.name()) {
                    return Err(ModelError::DuplicateField {
                        model: name.clone(),
                        field: field.name().to_string(),
                    });
                }
            }
            seen.contains(ID_FIELD)
        };

        let mut fields = self.fields;
        if !has_id {
            fields.insert(0, Field::new(ID_FIELD, FieldType::String));
        }

        debug!(model = %name, table = %table, fields = fields.len(), "model declared");
        Ok(Model {
            inner: Rc::new(ModelSchema {
                name,
                table,
                store,
                fields,
            }),
        })
    }
}

impl Model {
    /// Starts declaring a model called `name`.
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            table: None,
            store: None,
            fields: Vec::new(),
        }
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Table name
    pub fn table(&self) -> &str {
        &self.inner.table
    }

    /// Bound store
    pub fn store(&self) -> &StoreHandle {
        &self.inner.store
    }

    /// Field templates in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.inner.fields
    }

    /// Returns the template of the named field.
    pub fn field(&self, name: &str) -> ModelResult<&Field> {
        self.inner
            .fields
            .iter()
            .find(|field| field.name() == name)
            .ok_or_else(|| self.unknown_field(name))
    }

    /// Returns true if both handles describe the same declaration.
    pub fn ptr_eq(&self, other: &Model) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Builds a record without saving it.
    ///
    /// Each field takes the supplied value, else the template's value, else
    /// its default. A fresh `_id` is generated when none is supplied.
    /// Values for undeclared names are ignored.
    pub fn construct<I, K, V>(&self, values: I) -> ModelResult<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut supplied: Map<String, Value> = values
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        if !supplied.contains_key(ID_FIELD) {
            supplied.insert(ID_FIELD.to_string(), Value::String(Uuid::new_v4().to_string()));
        }

        let mut fields = Vec::with_capacity(self.inner.fields.len());
        for template in &self.inner.fields {
            let mut field = template.clone();
            let value = supplied
                .remove(template.name())
                .unwrap_or_else(|| template.initial_value());
            field.set_value(value)?;
            fields.push(field);
        }

        if !supplied.is_empty() {
            debug!(
                model = %self.inner.name,
                ignored = ?supplied.keys().collect::<Vec<_>>(),
                "ignoring undeclared values"
            );
        }

        Ok(Record::new(self.clone(), fields))
    }

    /// Builds a record from any value that serializes to a mapping.
    pub fn construct_from<T: Serialize + ?Sized>(&self, value: &T) -> ModelResult<Record> {
        let map = self.to_mapping(value)?;
        self.construct(map)
    }

    /// Builds a record and saves it.
    ///
    /// # Errors
    ///
    /// `NoArgsProvided` if `values` is empty.
    pub fn create<I, K, V>(&self, values: I) -> ModelResult<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let values: Vec<(String, Value)> = values
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        if values.is_empty() {
            return Err(ModelError::NoArgsProvided { operation: "create" });
        }

        let record = self.construct(values)?;
        record.save()?;
        Ok(record)
    }

    /// Serializes `value` to a mapping, then behaves like [`Model::create`].
    pub fn create_from<T: Serialize + ?Sized>(&self, value: &T) -> ModelResult<Record> {
        let map = self.to_mapping(value)?;
        self.create(map)
    }

    /// Returns the single record matching all conditions and filters.
    ///
    /// # Errors
    ///
    /// - `NoArgsProvided` if both `conditions` and `filters` are empty
    /// - `Ambiguous` if more than one row matches
    pub fn get(&self, conditions: &[Condition], filters: &[(&str, Value)]) -> ModelResult<Option<Record>> {
        if conditions.is_empty() && filters.is_empty() {
            return Err(ModelError::NoArgsProvided { operation: "get" });
        }

        let mut matches = self.filter(conditions, filters)?;
        match matches.len() {
            0 | 1 => Ok(matches.pop()),
            n => Err(ModelError::Ambiguous {
                model: self.inner.name.clone(),
                matches: n,
            }),
        }
    }

    /// Returns every record matching all conditions and filters, in row order.
    ///
    /// Each `(field, value)` filter is an equality condition.
    ///
    /// # Errors
    ///
    /// `NoArgsProvided` if both `conditions` and `filters` are empty.
    pub fn filter(&self, conditions: &[Condition], filters: &[(&str, Value)]) -> ModelResult<Vec<Record>> {
        if conditions.is_empty() && filters.is_empty() {
            return Err(ModelError::NoArgsProvided { operation: "filter" });
        }

        self.query().filter(conditions, filters)?.execute()
    }

    /// Returns a record for every row of the table in the bound store.
    pub fn all(&self) -> ModelResult<Vec<Record>> {
        self.all_in(&self.inner.store)
    }

    /// Returns a record for every row of this model's table in `store`.
    pub fn all_in(&self, store: &StoreHandle) -> ModelResult<Vec<Record>> {
        let rows = store.borrow().rows(&self.inner.table)?;

        rows.into_iter()
            .enumerate()
            .map(|(index, row)| match row {
                Value::Object(map) => self.construct(map),
                _ => Err(ModelError::MalformedRow {
                    table: self.inner.table.clone(),
                    index,
                }),
            })
            .collect()
    }

    /// Starts an empty query against this model.
    pub fn query(&self) -> Query {
        Query::new(self)
    }

    pub(crate) fn unknown_field(&self, name: &str) -> ModelError {
        ModelError::UnknownField {
            model: self.inner.name.clone(),
            field: name.to_string(),
        }
    }

    pub(crate) fn conversion_error(&self, source: serde_json::Error) -> ModelError {
        ModelError::Conversion {
            model: self.inner.name.clone(),
            source,
        }
    }

    fn to_mapping<T: Serialize + ?Sized>(&self, value: &T) -> ModelResult<Map<String, Value>> {
        match serde_json::to_value(value).map_err(|e| self.conversion_error(e))? {
            Value::Object(map) => Ok(map),
            other => Err(self.conversion_error(serde_json::Error::custom(format!(
                "expected a mapping, got {}",
                json_type_name(&other)
            )))),
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.inner.name)
            .field("table", &self.inner.table)
            .field(
                "fields",
                &self.inner.fields.iter().map(Field::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
