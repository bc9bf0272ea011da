//! In-memory storage, used for synthetic pages and load failures.

use std::path::Path;

use indexmap::IndexMap;

use crate::error::{DockconfError, Result};
use crate::key::Key;
use crate::storage::Storage;
use crate::value::{Value, ValueKind};

/// Ordered `group → name → value` cells plus a catalogue of declared keys.
#[derive(Debug, Default)]
pub struct VirtualStorage {
    cells: IndexMap<String, IndexMap<String, Value>>,
    catalogue: Vec<Key>,
}

impl VirtualStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a key and its initial value.
    pub fn add_key(&mut self, key: Key, value: impl Into<Value>) {
        self.set(&key.group, &key.name, value.into());
        self.catalogue.push(key);
    }

    /// Consuming variant of [`add_key`](Self::add_key).
    pub fn with_key(mut self, key: Key, value: impl Into<Value>) -> Self {
        self.add_key(key, value);
        self
    }
}

impl Storage for VirtualStorage {
    fn file_path(&self) -> Option<&Path> {
        None
    }

    fn file_default(&self) -> Option<&Path> {
        None
    }

    fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        let declared = self.catalogue.iter().map(|k| &k.group);
        for group in declared.chain(self.cells.keys()) {
            if !groups.contains(group) {
                groups.push(group.clone());
            }
        }
        groups
    }

    fn list(&self, group: &str) -> Vec<Key> {
        self.catalogue
            .iter()
            .filter(|k| k.group == group)
            .cloned()
            .collect()
    }

    fn to_data(&self) -> Result<String> {
        Ok(String::new())
    }

    fn get(&self, group: &str, name: &str, kind: ValueKind) -> Result<Value> {
        let value = self
            .cells
            .get(group)
            .and_then(|g| g.get(name))
            .ok_or_else(|| DockconfError::KeyMissing {
                group: group.into(),
                name: name.into(),
            })?;
        value
            .clone()
            .coerce(kind)
            .ok_or_else(|| DockconfError::TypeMismatch {
                key: format!("{group}/{name}"),
                expected: kind,
            })
    }

    fn default_value(&self, group: &str, name: &str, _kind: ValueKind) -> Result<Value> {
        Err(DockconfError::DefaultUnavailable {
            reason: format!("in-memory storage has no default for {group}/{name}"),
        })
    }

    fn set(&mut self, group: &str, name: &str, value: Value) {
        self.cells
            .entry(group.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }

    fn close(&mut self) {
        self.cells.clear();
        self.catalogue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyType;

    #[test]
    fn groups_in_first_seen_order() {
        let mut s = VirtualStorage::new()
            .with_key(Key::new("b", "x", KeyType::BoolButton), true)
            .with_key(Key::new("a", "y", KeyType::StringEntry), "text")
            .with_key(Key::new("b", "z", KeyType::IntSpin), 3);
        s.set("c", "loose", Value::Int(1));
        assert_eq!(s.groups(), vec!["b", "a", "c"]);
        let names: Vec<String> = s.list("b").into_iter().map(|k| k.name).collect();
        assert_eq!(names, vec!["x", "z"]);
    }

    #[test]
    fn typed_access_and_coercion() {
        let mut s = VirtualStorage::new();
        s.set("g", "n", Value::Int(4));
        assert_eq!(s.int("g", "n").unwrap(), 4);
        assert_eq!(s.list_int("g", "n").unwrap(), vec![4]);
        assert!(matches!(
            s.string("g", "n"),
            Err(DockconfError::TypeMismatch { .. })
        ));
        assert!(matches!(
            s.int("g", "other"),
            Err(DockconfError::KeyMissing { .. })
        ));
    }

    #[test]
    fn no_file_no_default() {
        let s = VirtualStorage::new();
        assert!(s.file_path().is_none());
        assert_eq!(s.to_data().unwrap(), "");
        assert!(matches!(
            s.default_value("g", "n", ValueKind::Int),
            Err(DockconfError::DefaultUnavailable { .. })
        ));
    }
}
