//! The storage contract and its file-backed implementation.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::comment::parse_key_comment;
use crate::error::{DockconfError, Result};
use crate::key::Key;
use crate::keyfile::KeyFile;
use crate::value::{FromValue, Value, ValueKind, Valuer};

/// Typed access to grouped configuration values plus a read-only default shadow.
///
/// Cross-kind reads only convert between a scalar and a one-item list; any
/// other mismatch is a [`DockconfError::TypeMismatch`].
pub trait Storage {
    /// Path of the primary document, `None` for in-memory storage.
    fn file_path(&self) -> Option<&Path>;

    /// Path of the default document, if any.
    fn file_default(&self) -> Option<&Path>;

    /// Group names in document order.
    fn groups(&self) -> Vec<String>;

    /// Keys of a group in document order. Keys whose comment cannot be
    /// parsed are skipped.
    fn list(&self, group: &str) -> Vec<Key>;

    /// Textual image of the primary document.
    fn to_data(&self) -> Result<String>;

    fn get(&self, group: &str, name: &str, kind: ValueKind) -> Result<Value>;

    /// Read from the default shadow, loading it on first use.
    fn default_value(&self, group: &str, name: &str, kind: ValueKind) -> Result<Value>;

    fn set(&mut self, group: &str, name: &str, value: Value);

    /// Release the default shadow, then the primary document.
    fn close(&mut self);

    fn valuer(&self, group: &str, name: &str, kind: ValueKind) -> Valuer {
        let value = self
            .get(group, name, kind)
            .inspect_err(|e| debug!(group, name, error = %e, "empty valuer"))
            .ok();
        Valuer::new(format!("{group}/{name}"), value)
    }

    fn bool(&self, group: &str, name: &str) -> Result<bool> {
        typed(self.get(group, name, ValueKind::Bool), group, name)
    }

    fn int(&self, group: &str, name: &str) -> Result<i64> {
        typed(self.get(group, name, ValueKind::Int), group, name)
    }

    fn float(&self, group: &str, name: &str) -> Result<f64> {
        typed(self.get(group, name, ValueKind::Float), group, name)
    }

    fn string(&self, group: &str, name: &str) -> Result<String> {
        typed(self.get(group, name, ValueKind::String), group, name)
    }

    fn list_bool(&self, group: &str, name: &str) -> Result<Vec<bool>> {
        typed(self.get(group, name, ValueKind::ListBool), group, name)
    }

    fn list_int(&self, group: &str, name: &str) -> Result<Vec<i64>> {
        typed(self.get(group, name, ValueKind::ListInt), group, name)
    }

    fn list_float(&self, group: &str, name: &str) -> Result<Vec<f64>> {
        typed(self.get(group, name, ValueKind::ListFloat), group, name)
    }

    fn list_string(&self, group: &str, name: &str) -> Result<Vec<String>> {
        typed(self.get(group, name, ValueKind::ListString), group, name)
    }
}

fn typed<T: FromValue>(value: Result<Value>, group: &str, name: &str) -> Result<T> {
    T::from_value(&value?).ok_or_else(|| DockconfError::TypeMismatch {
        key: format!("{group}/{name}"),
        expected: T::KIND,
    })
}

/// Storage over a [`KeyFile`] document on disk.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    default_path: Option<PathBuf>,
    doc: KeyFile,
    default: OnceCell<std::result::Result<KeyFile, String>>,
}

impl FileStorage {
    pub fn load(path: impl Into<PathBuf>, default_path: Option<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = KeyFile::load(&path)?;
        debug!(path = %path.display(), groups = doc.groups().len(), "loaded config");
        Ok(Self::with_document(path, default_path, doc))
    }

    /// Storage over an already parsed document.
    pub fn with_document(path: PathBuf, default_path: Option<PathBuf>, doc: KeyFile) -> Self {
        Self {
            path,
            default_path,
            doc,
            default: OnceCell::new(),
        }
    }

    pub fn document(&self) -> &KeyFile {
        &self.doc
    }

    fn default_doc(&self) -> Result<&KeyFile> {
        let Some(path) = &self.default_path else {
            return Err(DockconfError::DefaultUnavailable {
                reason: format!("no default file for {}", self.path.display()),
            });
        };
        self.default
            .get_or_init(|| {
                debug!(path = %path.display(), "loading default config");
                KeyFile::load(path).map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|reason| DockconfError::DefaultUnavailable {
                reason: reason.clone(),
            })
    }
}

impl Storage for FileStorage {
    fn file_path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn file_default(&self) -> Option<&Path> {
        self.default_path.as_deref()
    }

    fn groups(&self) -> Vec<String> {
        self.doc.groups().into_iter().map(str::to_string).collect()
    }

    fn list(&self, group: &str) -> Vec<Key> {
        self.doc
            .keys(group)
            .into_iter()
            .filter_map(|name| {
                let Some(comment) = self.doc.comment(group, name) else {
                    debug!(group, name, "key without comment skipped");
                    return None;
                };
                let key = parse_key_comment(&comment).and_then(|base| Key::from_base(group, name, base));
                if key.is_none() {
                    debug!(group, name, comment = %comment, "key comment not parsed");
                }
                key
            })
            .collect()
    }

    fn to_data(&self) -> Result<String> {
        Ok(self.doc.to_data())
    }

    fn get(&self, group: &str, name: &str, kind: ValueKind) -> Result<Value> {
        self.doc.get(group, name, kind)
    }

    fn default_value(&self, group: &str, name: &str, kind: ValueKind) -> Result<Value> {
        self.default_doc()?.get(group, name, kind)
    }

    fn set(&mut self, group: &str, name: &str, value: Value) {
        self.doc.set(group, name, &value);
    }

    fn close(&mut self) {
        self.default.take();
        self.doc = KeyFile::new();
        debug!(path = %self.path.display(), "config closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{DEFAULT_CONF, DOCK_CONF, write_conf};
    use crate::types::KeyType;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> FileStorage {
        let path = write_conf(dir, "dock.conf", DOCK_CONF);
        let default = write_conf(dir, "default.conf", DEFAULT_CONF);
        FileStorage::load(path, Some(default)).unwrap()
    }

    #[test]
    fn groups_and_list_keep_file_order() {
        let dir = TempDir::new().unwrap();
        let s = storage(&dir);
        assert_eq!(s.groups(), vec!["Display", "Colours", "Icons"]);
        let names: Vec<String> = s.list("Display").into_iter().map(|k| k.name).collect();
        assert_eq!(names, vec!["frame", "enabled", "size", "style", "effect"]);
    }

    #[test]
    fn list_skips_uncommented_and_unparsed_keys() {
        let dir = TempDir::new().unwrap();
        let s = storage(&dir);
        let icons = s.list("Icons");
        let names: Vec<&str> = icons.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["order", "dock", "secret"]);
        assert_eq!(icons[0].key_type, KeyType::TreeViewSortModify);
    }

    #[test]
    fn list_reads_real_dock_comments() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(
            &dir,
            "dock.conf",
            "[A]\n#i[-2000;2000] Offset from the edge\n#{Gap from the edge, in pixels.}\n\
             x=1\n#j9223372036854775808 Huge\ny=1\n[B]\n#b Two\ntwo=true\n\
             [A]\n#b Three\nthree=false\n",
        );
        let s = FileStorage::load(path, None).unwrap();
        assert_eq!(s.groups(), vec!["A", "B"]);

        let keys = s.list("A");
        let names: Vec<&str> = keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["x", "three"]);
        assert_eq!(keys[0].text, "Offset from the edge");
        assert_eq!(keys[0].tooltip, "Gap from the edge, in pixels.");
        assert!(!s.bool("A", "three").unwrap());
    }

    #[test]
    fn typed_getters() {
        let dir = TempDir::new().unwrap();
        let s = storage(&dir);
        assert!(!s.bool("Display", "enabled").unwrap());
        assert_eq!(s.list_int("Display", "size").unwrap(), vec![48, 48]);
        assert_eq!(s.int("Display", "style").unwrap(), 1);
        assert_eq!(
            s.list_float("Colours", "outline").unwrap(),
            vec![0.1, 0.2, 0.3, 1.0]
        );
        assert!(matches!(
            s.int("Display", "missing"),
            Err(DockconfError::KeyMissing { .. })
        ));
    }

    #[test]
    fn mutation_symmetry() {
        let dir = TempDir::new().unwrap();
        let mut s = storage(&dir);
        s.set("Display", "enabled", Value::Bool(true));
        s.set("Display", "style", Value::Int(-3));
        s.set("Colours", "alpha", Value::Float(0.25));
        s.set("Icons", "dock", Value::from("Second dock"));
        s.set("Icons", "flags", Value::ListBool(vec![true, false]));
        s.set("Icons", "order", Value::from(vec!["b;c", "a"]));

        assert!(s.bool("Display", "enabled").unwrap());
        assert_eq!(s.int("Display", "style").unwrap(), -3);
        assert_eq!(s.float("Colours", "alpha").unwrap(), 0.25);
        assert_eq!(s.string("Icons", "dock").unwrap(), "Second dock");
        assert_eq!(s.list_bool("Icons", "flags").unwrap(), vec![true, false]);
        assert_eq!(s.list_string("Icons", "order").unwrap(), vec!["b;c", "a"]);
    }

    #[test]
    fn default_shadow_is_read_only_and_lazy() {
        let dir = TempDir::new().unwrap();
        let s = storage(&dir);
        assert!(s.default.get().is_none());
        assert_eq!(
            s.default_value("Display", "enabled", ValueKind::Bool).unwrap(),
            Value::Bool(true)
        );
        assert!(s.default.get().is_some());
    }

    #[test]
    fn default_unavailable_without_file() {
        let dir = TempDir::new().unwrap();
        let path = write_conf(&dir, "dock.conf", DOCK_CONF);
        let s = FileStorage::load(&path, None).unwrap();
        assert!(matches!(
            s.default_value("Display", "enabled", ValueKind::Bool),
            Err(DockconfError::DefaultUnavailable { .. })
        ));

        let s = FileStorage::load(&path, Some(dir.path().join("gone.conf"))).unwrap();
        assert!(matches!(
            s.default_value("Display", "enabled", ValueKind::Bool),
            Err(DockconfError::DefaultUnavailable { .. })
        ));
    }

    #[test]
    fn round_trip_after_load() {
        let dir = TempDir::new().unwrap();
        let s = storage(&dir);
        assert_eq!(s.to_data().unwrap(), DOCK_CONF);
    }

    #[test]
    fn close_releases_documents() {
        let dir = TempDir::new().unwrap();
        let mut s = storage(&dir);
        s.default_value("Display", "enabled", ValueKind::Bool).unwrap();
        s.close();
        assert!(s.default.get().is_none());
        assert!(s.groups().is_empty());
    }
}
