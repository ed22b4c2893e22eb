//! File-backed key-value store
//!
//! The whole mapping lives in memory and is written back to a single JSON
//! file after every mutation. There is no partial write, no write-ahead
//! log and no atomic rename: a crash mid-write may truncate the file.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::config::StoreConfig;
use super::errors::{StoreError, StoreResult};
use crate::schema::json_type_name;

/// A string-keyed mapping of JSON values persisted to one file.
///
/// Keys keep insertion order in memory and on disk. Every key argument is
/// converted with [`ToString`], so `store.set(1, ..)` and `store.get("1")`
/// address the same entry.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    config: StoreConfig,
    data: Map<String, Value>,
}

impl Store {
    /// Opens the store at `path` with the default configuration.
    ///
    /// A missing file yields an empty store; nothing is written until the
    /// first mutation.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Opens the store at `path` with an explicit configuration.
    ///
    /// # Errors
    ///
    /// - `Parse` / `NotAMapping` if the file exists but is not a JSON object
    /// - `Io` if the file exists but cannot be read
    pub fn open_with_config(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let mut store = Self {
            path: path.as_ref().to_path_buf(),
            config,
            data: Map::new(),
        };
        store.data = store.load()?;
        debug!(path = %store.path.display(), keys = store.data.len(), "store opened");
        Ok(store)
    }

    /// Reads and parses the backing file without touching the in-memory mapping.
    pub fn load(&self) -> StoreResult<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let value: Value = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::NotAMapping {
                path: self.path.clone(),
                found: json_type_name(&other),
            }),
        }
    }

    /// Writes the entire mapping to the backing file, replacing its content.
    pub fn save(&self) -> StoreResult<()> {
        if self.config.create_parent_dirs {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let indent = self.config.indent_bytes();
        let mut buf = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&indent));
        self.data
            .serialize(&mut serializer)
            .map_err(StoreError::Encode)?;

        fs::write(&self.path, &buf).map_err(|e| StoreError::io(&self.path, e))?;
        debug!(path = %self.path.display(), keys = self.data.len(), bytes = buf.len(), "store saved");
        Ok(())
    }

    /// Assigns `value` at `key`, replacing any previous value, and persists.
    pub fn set(&mut self, key: impl ToString, value: impl Into<Value>) -> StoreResult<()> {
        self.data.insert(key.to_string(), value.into());
        self.save()
    }

    /// Returns the value at `key`.
    pub fn get(&self, key: impl ToString) -> Option<&Value> {
        self.data.get(&key.to_string())
    }

    /// Returns a copy of the value at `key`, or `default` if absent.
    pub fn get_or(&self, key: impl ToString, default: impl Into<Value>) -> Value {
        self.get(key).cloned().unwrap_or_else(|| default.into())
    }

    /// Removes `key` and persists, returning the removed value.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if `key` is absent; the file is not rewritten.
    pub fn pop(&mut self, key: impl ToString) -> StoreResult<Value> {
        let key = key.to_string();
        let value = self
            .data
            .shift_remove(&key)
            .ok_or_else(|| StoreError::key_not_found(&key))?;
        self.save()?;
        Ok(value)
    }

    /// Sets `key` inside the nested mapping at `name` and persists.
    ///
    /// The nested mapping is created when `name` is absent, and replaced by
    /// an empty one when `name` holds something other than a mapping.
    pub fn set_key(
        &mut self,
        name: impl ToString,
        key: impl ToString,
        value: impl Into<Value>,
    ) -> StoreResult<()> {
        let name = name.to_string();
        let entry = self
            .data
            .entry(name.clone())
            .or_insert_with(|| Value::Object(Map::new()));

        if !entry.is_object() {
            warn!(name = %name, found = json_type_name(entry), "replacing non-mapping value with a mapping");
            *entry = Value::Object(Map::new());
        }

        if let Value::Object(nested) = entry {
            nested.insert(key.to_string(), value.into());
        }
        self.save()
    }

    /// Returns `key` from the nested mapping at `name`.
    pub fn get_key(&self, name: impl ToString, key: impl ToString) -> Option<&Value> {
        self.data
            .get(&name.to_string())
            .and_then(Value::as_object)
            .and_then(|nested| nested.get(&key.to_string()))
    }

    /// Returns a copy of `key` from the nested mapping at `name`, or `default`.
    pub fn get_key_or(
        &self,
        name: impl ToString,
        key: impl ToString,
        default: impl Into<Value>,
    ) -> Value {
        self.get_key(name, key)
            .cloned()
            .unwrap_or_else(|| default.into())
    }

    /// Removes `key` from the nested mapping at `name` and persists.
    ///
    /// # Errors
    ///
    /// `NestedKeyNotFound` if `name` is absent, is not a mapping, or lacks `key`.
    pub fn pop_key(&mut self, name: impl ToString, key: impl ToString) -> StoreResult<Value> {
        let name = name.to_string();
        let key = key.to_string();

        let value = self
            .data
            .get_mut(&name)
            .and_then(Value::as_object_mut)
            .and_then(|nested| nested.shift_remove(&key))
            .ok_or_else(|| StoreError::nested_key_not_found(&name, &key))?;

        self.save()?;
        Ok(value)
    }

    /// Clears the mapping and persists an empty document.
    pub fn reset(&mut self) -> StoreResult<()> {
        self.data.clear();
        self.save()
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: impl ToString) -> bool {
        self.data.contains_key(&key.to_string())
    }

    /// Iterates over top-level keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the mapping has no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The in-memory mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns a snapshot of the rows stored under `table`.
    ///
    /// An absent table is empty.
    pub(crate) fn rows(&self, table: &str) -> StoreResult<Vec<Value>> {
        match self.data.get(table) {
            None => Ok(Vec::new()),
            Some(Value::Array(rows)) => Ok(rows.clone()),
            Some(other) => Err(StoreError::NotATable {
                table: table.to_string(),
                found: json_type_name(other),
            }),
        }
    }

    /// Returns the row array under `table`, creating an empty one if absent.
    pub(crate) fn table_mut(&mut self, table: &str) -> StoreResult<&mut Vec<Value>> {
        let entry = self
            .data
            .entry(table.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        let found = json_type_name(entry);
        entry.as_array_mut().ok_or_else(|| StoreError::NotATable {
            table: table.to_string(),
            found,
        })
    }

    /// Returns the row array under `table` if it exists.
    pub(crate) fn existing_table_mut(&mut self, table: &str) -> StoreResult<Option<&mut Vec<Value>>> {
        match self.data.get_mut(table) {
            None => Ok(None),
            Some(Value::Array(rows)) => Ok(Some(rows)),
            Some(other) => Err(StoreError::NotATable {
                table: table.to_string(),
                found: json_type_name(other),
            }),
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Store: {}>", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::open(temp_dir.path().join("db.json")).unwrap();
        (temp_dir, store)
    }

    fn read_file(store: &Store) -> String {
        fs::read_to_string(store.path()).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_temp_dir, store) = open_temp();
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_set_get() {
        let (_temp_dir, mut store) = open_temp();
        store.set("key1", "value1").unwrap();
        assert_eq!(store.get("key1"), Some(&json!("value1")));
        assert!(store.path().exists());
    }

    #[test]
    fn test_set_overwrites_without_merge() {
        let (_temp_dir, mut store) = open_temp();
        store.set("cfg", json!({"a": 1, "b": 2})).unwrap();
        store.set("cfg", json!({"c": 3})).unwrap();
        assert_eq!(store.get("cfg"), Some(&json!({"c": 3})));
    }

    #[test]
    fn test_keys_are_stringified() {
        let (_temp_dir, mut store) = open_temp();
        store.set(42, true).unwrap();
        assert_eq!(store.get("42"), Some(&json!(true)));
        assert!(store.contains_key(42));

        store.set_key(7, 8, "x").unwrap();
        assert_eq!(store.get_key("7", "8"), Some(&json!("x")));
        assert_eq!(store.pop_key("7", 8).unwrap(), json!("x"));
    }

    #[test]
    fn test_get_default() {
        let (_temp_dir, store) = open_temp();
        assert_eq!(store.get("nonexistent"), None);
        assert_eq!(store.get_or("nonexistent", "fallback"), json!("fallback"));
    }

    #[test]
    fn test_pop() {
        let (_temp_dir, mut store) = open_temp();
        store.set("key1", "value1").unwrap();
        assert_eq!(store.pop("key1").unwrap(), json!("value1"));
        assert_eq!(store.get("key1"), None);
        assert_eq!(read_file(&store), "{}");
    }

    #[test]
    fn test_pop_missing_key_fails() {
        let (_temp_dir, mut store) = open_temp();
        let err = store.pop("absent").unwrap_err();
        assert!(matches!(err, StoreError::KeyNotFound { ref key } if key == "absent"));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_pop_keeps_remaining_order() {
        let (_temp_dir, mut store) = open_temp();
        for key in ["a", "b", "c", "d"] {
            store.set(key, 1).unwrap();
        }
        store.pop("b").unwrap();
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_nested_set_get() {
        let (_temp_dir, mut store) = open_temp();
        store.set_key("nested_dict", "key1", "value1").unwrap();
        assert_eq!(store.get_key("nested_dict", "key1"), Some(&json!("value1")));
        assert_eq!(store.get_key("nested_dict", "other"), None);
        assert_eq!(store.get_key("missing", "key1"), None);
        assert_eq!(store.get_key_or("missing", "key1", 0), json!(0));
    }

    #[test]
    fn test_set_key_replaces_non_mapping() {
        let (_temp_dir, mut store) = open_temp();
        store.set("name", "scalar").unwrap();
        store.set_key("name", "key", 1).unwrap();
        assert_eq!(store.get("name"), Some(&json!({"key": 1})));
    }

    #[test]
    fn test_pop_key() {
        let (_temp_dir, mut store) = open_temp();
        store.set_key("nested_dict", "key1", "value1").unwrap();
        assert_eq!(store.pop_key("nested_dict", "key1").unwrap(), json!("value1"));
        assert_eq!(store.get_key("nested_dict", "key1"), None);
        assert_eq!(store.get("nested_dict"), Some(&json!({})));
    }

    #[test]
    fn test_pop_key_missing_fails() {
        let (_temp_dir, mut store) = open_temp();
        assert!(store.pop_key("nope", "key").unwrap_err().is_key_not_found());

        store.set_key("present", "a", 1).unwrap();
        assert!(store.pop_key("present", "b").unwrap_err().is_key_not_found());

        store.set("scalar", 1).unwrap();
        assert!(store.pop_key("scalar", "a").unwrap_err().is_key_not_found());
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, mut store) = open_temp();
        store.set("key1", "value1").unwrap();
        store.reset().unwrap();
        assert_eq!(store.get("key1"), None);
        assert_eq!(read_file(&store), "{}");
    }

    #[test]
    fn test_file_format() {
        let (_temp_dir, mut store) = open_temp();
        store.set("zeta", "Привет").unwrap();
        store.set("alpha", json!([1, 2])).unwrap();

        let content = read_file(&store);
        assert!(content.contains("Привет"));
        assert!(!content.contains("\\u"));
        assert!(content.find("zeta").unwrap() < content.find("alpha").unwrap());
        assert!(content.contains("\n    \"zeta\": \"Привет\""));
    }

    #[test]
    fn test_custom_indent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        let mut store = Store::open_with_config(&path, StoreConfig::with_indent(2)).unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n  \"k\": \"v\"\n}");
    }

    #[test]
    fn test_create_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("db.json");

        let mut store = Store::open(&path).unwrap();
        assert!(matches!(store.set("k", 1).unwrap_err(), StoreError::Io { .. }));

        let mut store = Store::open_with_config(&path, StoreConfig::creating_dirs()).unwrap();
        store.set("k", 1).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_reload_round_trip() {
        let (temp_dir, mut store) = open_temp();
        store.set("b", json!({"x": [1, 2.5, null, true]})).unwrap();
        store.set("a", "ü").unwrap();

        let reopened = Store::open(temp_dir.path().join("db.json")).unwrap();
        assert_eq!(reopened.as_map(), store.as_map());
        assert_eq!(reopened.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_malformed_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        fs::write(&path, "{not json").unwrap();

        let err = Store::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert_eq!(err.code(), "LIGHTDB_STORE_PARSE_ERROR");
    }

    #[test]
    fn test_non_object_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db.json");
        fs::write(&path, "[1, 2]").unwrap();

        let err = Store::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::NotAMapping { found: "list", .. }));
    }

    #[test]
    fn test_table_access() {
        let (_temp_dir, mut store) = open_temp();
        assert!(store.rows("users").unwrap().is_empty());
        assert!(store.existing_table_mut("users").unwrap().is_none());

        store.table_mut("users").unwrap().push(json!({"_id": "1"}));
        assert_eq!(store.rows("users").unwrap(), vec![json!({"_id": "1"})]);

        store.set("settings", json!({})).unwrap();
        assert!(matches!(
            store.table_mut("settings").unwrap_err(),
            StoreError::NotATable { found: "dict", .. }
        ));
        assert!(store.rows("settings").is_err());
    }

    #[test]
    fn test_display() {
        let (_temp_dir, store) = open_temp();
        let display = store.to_string();
        assert!(display.starts_with("<Store: "));
        assert!(display.ends_with("db.json>"));
    }
}
