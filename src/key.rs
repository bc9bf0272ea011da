//! Configuration keys, value routing and per-value diffs.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::builder::Builder;
use crate::comment::KeyBase;
use crate::error::{DockconfError, Result};
use crate::source::Source;
use crate::types::{DisplayMode, KeyType};
use crate::value::{FromValue, Value, ValueKind, Valuer};
use crate::view::{MakeView, ViewBinding};

/// Index of a key in its builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct KeyId(pub(crate) usize);

/// A typed configuration key and its metadata.
#[derive(Clone)]
pub struct Key {
    pub group: String,
    pub name: String,
    pub key_type: KeyType,
    pub nb_elements: usize,
    pub authorised_values: Vec<String>,
    pub text: String,
    pub tooltip: String,
    pub aligned_vertical: bool,
    pub display_mode: DisplayMode,
    /// Sign modifiers from the comment, passed through to view factories.
    pub modifiers: String,
    pub label_selectable: bool,
    pub(crate) binding: Option<Rc<ViewBinding>>,
    pub(crate) make_view: Option<MakeView>,
}

impl Key {
    pub fn new(group: &str, name: &str, key_type: KeyType) -> Self {
        let nb_elements = match key_type {
            KeyType::IntSize => 2,
            KeyType::ColorRGB => 3,
            KeyType::ColorRGBA => 4,
            _ => 1,
        };
        Self {
            group: group.to_string(),
            name: name.to_string(),
            key_type,
            nb_elements,
            authorised_values: Vec::new(),
            text: String::new(),
            tooltip: String::new(),
            aligned_vertical: false,
            display_mode: DisplayMode::All,
            modifiers: String::new(),
            label_selectable: false,
            binding: None,
            make_view: None,
        }
    }

    /// Build a key from parsed comment metadata.
    pub fn from_base(group: &str, name: &str, base: KeyBase) -> Option<Self> {
        let mut key = Self::new(group, name, base.key_type?);
        key.nb_elements = base.nb_elements.max(1);
        key.authorised_values = base.authorised_values;
        key.text = base.text;
        key.tooltip = base.tooltip;
        key.aligned_vertical = base.aligned_vertical;
        key.display_mode = base.display_mode;
        key.modifiers = base.modifiers;
        Some(key)
    }

    pub fn is_type(&self, types: &[KeyType]) -> bool {
        types.contains(&self.key_type)
    }

    /// The kind of the key's value: a list when the type or cardinality asks for one.
    pub fn value_kind(&self) -> ValueKind {
        let kind = self.key_type.value_kind();
        if self.nb_elements > 1 || self.key_type.is_always_list() {
            kind.as_list()
        } else {
            kind
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// `group/name`, used to label logs and errors.
    pub fn path(&self) -> String {
        format!("{}/{}", self.group, self.name)
    }

    /// Compare two snapshots of this key's value, index by index.
    pub fn compare(&self, previous: &Valuer, current: &Valuer) -> ValueStateList {
        let (a, b) = (previous.count(), current.count());
        if a == 0 && b == 0 {
            return ValueStateList {
                fields: vec![ValueStateField::new(ValueState::BothEmpty, "", "")],
                coarse: false,
            };
        }

        if a.max(b) > self.nb_elements && !self.key_type.is_tree_view() {
            debug!(key = %self.path(), count = a.max(b), nb_elements = self.nb_elements, "coarse diff");
            let (old, new) = (previous.sprint(), current.sprint());
            let state = match (a, b) {
                (0, _) => ValueState::Added,
                (_, 0) => ValueState::Removed,
                _ if old == new => ValueState::Unchanged,
                _ => ValueState::Edited,
            };
            return ValueStateList {
                fields: vec![ValueStateField::new(state, old, new)],
                coarse: true,
            };
        }

        let fields = (0..a.max(b))
            .map(|i| {
                if i >= a {
                    ValueStateField::new(ValueState::Added, "", current.sprint_i(i))
                } else if i >= b {
                    ValueStateField::new(ValueState::Removed, previous.sprint_i(i), "")
                } else {
                    let (old, new) = (previous.sprint_i(i), current.sprint_i(i));
                    let state = if old == new {
                        ValueState::Unchanged
                    } else {
                        ValueState::Edited
                    };
                    ValueStateField::new(state, old, new)
                }
            })
            .collect();
        ValueStateList {
            fields,
            coarse: false,
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("group", &self.group)
            .field("name", &self.name)
            .field("key_type", &self.key_type)
            .field("nb_elements", &self.nb_elements)
            .field("authorised_values", &self.authorised_values)
            .field("text", &self.text)
            .field("bound", &self.is_bound())
            .field("custom_view", &self.make_view.is_some())
            .finish_non_exhaustive()
    }
}

/// Outcome of comparing one value element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueState {
    BothEmpty,
    Unchanged,
    Added,
    Removed,
    Edited,
}

impl ValueState {
    pub fn is_changed(self) -> bool {
        matches!(
            self,
            ValueState::Added | ValueState::Removed | ValueState::Edited
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueStateField {
    pub state: ValueState,
    pub old: String,
    pub new: String,
}

impl ValueStateField {
    fn new(state: ValueState, old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            state,
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Per-index comparison of a key's value.
///
/// `coarse` is set when the value held more elements than the key declares
/// and the whole printed values were compared instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueStateList {
    pub fields: Vec<ValueStateField>,
    pub coarse: bool,
}

impl ValueStateList {
    pub fn is_changed(&self) -> bool {
        self.fields.iter().any(|f| f.state.is_changed())
    }

    pub fn states(&self) -> Vec<ValueState> {
        self.fields.iter().map(|f| f.state).collect()
    }
}

/// Read access to a key in its builder.
#[derive(Clone, Copy)]
pub struct KeyRef<'a> {
    builder: &'a Builder,
    id: KeyId,
}

impl<'a> KeyRef<'a> {
    pub(crate) fn new(builder: &'a Builder, id: KeyId) -> Self {
        Self { builder, id }
    }

    pub fn id(&self) -> KeyId {
        self.id
    }

    pub fn builder(&self) -> &'a Builder {
        self.builder
    }

    pub fn source(&self) -> &'a Rc<dyn Source> {
        self.builder.source()
    }

    pub fn translate(&self, text: &str) -> String {
        self.builder.translate(text)
    }

    /// The current value: from the view once bound, else from storage.
    pub fn value(&self) -> Valuer {
        match &self.binding {
            Some(binding) => Valuer::new(self.path(), Some(binding.get())),
            None => self.storage_value(),
        }
    }

    /// The value held by storage, decrypted for password keys.
    pub fn storage_value(&self) -> Valuer {
        let value = match self
            .builder
            .storage()
            .get(&self.group, &self.name, self.value_kind())
        {
            Ok(v) => Some(self.decrypt(v)),
            Err(e) => {
                debug!(key = %self.path(), error = %e, "no storage value");
                None
            }
        };
        Valuer::new(self.path(), value)
    }

    /// The value held by the default shadow, decrypted for password keys.
    pub fn default_value(&self) -> Result<Valuer> {
        let storage = self.builder.storage();
        match storage.default_value(&self.group, &self.name, self.value_kind()) {
            Ok(v) => Ok(Valuer::new(self.path(), Some(self.decrypt(v)))),
            Err(DockconfError::KeyMissing { .. } | DockconfError::TypeMismatch { .. }) => {
                Ok(Valuer::empty(self.path()))
            }
            Err(e) => Err(e),
        }
    }

    fn decrypt(&self, value: Value) -> Value {
        match value {
            Value::String(s) if self.key_type == KeyType::PasswordEntry => {
                Value::String(self.source().decrypt_string(&s))
            }
            other => other,
        }
    }

    /// Typed read through the value routing.
    pub fn value_get<T: FromValue>(&self) -> Result<T> {
        let Some(binding) = &self.binding else {
            let value = self.storage_value();
            return value
                .into_value()
                .and_then(|v| v.coerce(T::KIND))
                .and_then(|v| T::from_value(&v))
                .ok_or_else(|| DockconfError::TypeMismatch {
                    key: self.path(),
                    expected: T::KIND,
                });
        };
        binding
            .get()
            .coerce(T::KIND)
            .and_then(|v| T::from_value(&v))
            .ok_or_else(|| {
                warn!(key = %self.path(), bound = %binding.kind(), expected = %T::KIND, "bad target");
                DockconfError::BadTarget {
                    key: self.path(),
                    expected: T::KIND,
                }
            })
    }

    /// Compare `previous` with the current value.
    pub fn value_state(&self, previous: &Valuer) -> ValueStateList {
        self.compare(previous, &self.value())
    }
}

impl Deref for KeyRef<'_> {
    type Target = Key;

    fn deref(&self) -> &Key {
        self.builder.key_data(self.id)
    }
}

/// Write access to a key in its builder.
pub struct KeyMut<'a> {
    builder: &'a mut Builder,
    id: KeyId,
}

impl<'a> KeyMut<'a> {
    pub(crate) fn new(builder: &'a mut Builder, id: KeyId) -> Self {
        Self { builder, id }
    }

    pub fn id(&self) -> KeyId {
        self.id
    }

    pub fn as_key_ref(&self) -> KeyRef<'_> {
        KeyRef::new(self.builder, self.id)
    }

    /// Write a value: to the view once bound, else to storage. Never writes the file.
    pub fn value_set(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let key = self.builder.key_data(self.id);
        if let Some(binding) = key.binding.clone() {
            return binding.set(value).map_err(|offered| {
                warn!(key = %key.path(), %offered, bound = %binding.kind(), "bad target");
                DockconfError::BadTarget {
                    key: key.path(),
                    expected: binding.kind(),
                }
            });
        }

        let kind = key.value_kind();
        let value = value
            .coerce(kind)
            .ok_or_else(|| DockconfError::TypeMismatch {
                key: key.path(),
                expected: kind,
            })?;
        let value = match value {
            Value::String(s) if key.key_type == KeyType::PasswordEntry => {
                Value::String(self.builder.source().encrypt_string(&s))
            }
            v => v,
        };
        let (group, name) = (key.group.clone(), key.name.clone());
        self.builder.storage_mut().set(&group, &name, value);
        Ok(())
    }

    /// Commit the bound view value to storage.
    pub fn update_storage(&mut self) -> Result<()> {
        self.builder.update_storage(self.id)
    }
}

impl Deref for KeyMut<'_> {
    type Target = Key;

    fn deref(&self) -> &Key {
        self.builder.key_data(self.id)
    }
}

impl DerefMut for KeyMut<'_> {
    fn deref_mut(&mut self) -> &mut Key {
        self.builder.key_data_mut(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key_type: KeyType, nb: usize) -> Key {
        let mut k = Key::new("G", "k", key_type);
        k.nb_elements = nb;
        k
    }

    fn strings(items: &[&str]) -> Valuer {
        Valuer::new("G/k", Some(Value::from(items.to_vec())))
    }

    #[test]
    fn classification_per_index() {
        let k = key(KeyType::StringEntry, 3);
        let list = k.compare(&strings(&["a", "b"]), &strings(&["a", "c", "d"]));
        assert!(!list.coarse);
        assert_eq!(
            list.fields,
            vec![
                ValueStateField::new(ValueState::Unchanged, "a", "a"),
                ValueStateField::new(ValueState::Edited, "b", "c"),
                ValueStateField::new(ValueState::Added, "", "d"),
            ]
        );
    }

    #[test]
    fn removed_elements() {
        let k = key(KeyType::IntSpin, 2);
        let prev = Valuer::new("G/k", Some(Value::ListInt(vec![1, 2])));
        let cur = Valuer::new("G/k", Some(Value::ListInt(vec![1])));
        assert_eq!(
            k.compare(&prev, &cur).states(),
            vec![ValueState::Unchanged, ValueState::Removed]
        );
    }

    #[test]
    fn both_empty() {
        let k = key(KeyType::StringEntry, 1);
        let empty = Valuer::new("G/k", Some(Value::from("")));
        let list = k.compare(&Valuer::empty("G/k"), &empty);
        assert_eq!(list.states(), vec![ValueState::BothEmpty]);
        assert!(!list.is_changed());
    }

    #[test]
    fn over_cardinal_collapses_and_is_marked() {
        let k = key(KeyType::StringEntry, 1);
        let list = k.compare(&strings(&["a"]), &strings(&["a", "b"]));
        assert!(list.coarse);
        assert_eq!(list.fields.len(), 1);
        assert_eq!(list.fields[0].state, ValueState::Edited);
        assert_eq!(list.fields[0].old, "[a]");
        assert_eq!(list.fields[0].new, "[a b]");
    }

    #[test]
    fn tree_views_are_never_coarse() {
        let k = key(KeyType::TreeViewSortModify, 1);
        let list = k.compare(&strings(&["x", "y", "z"]), &strings(&["x", "y", "z", "w"]));
        assert!(!list.coarse);
        assert_eq!(
            list.states(),
            vec![
                ValueState::Unchanged,
                ValueState::Unchanged,
                ValueState::Unchanged,
                ValueState::Added
            ]
        );
    }

    #[test]
    fn value_kind_follows_cardinality() {
        assert_eq!(key(KeyType::IntSpin, 1).value_kind(), ValueKind::Int);
        assert_eq!(key(KeyType::IntSpin, 3).value_kind(), ValueKind::ListInt);
        assert_eq!(
            Key::new("G", "c", KeyType::ColorRGB).value_kind(),
            ValueKind::ListFloat
        );
        assert_eq!(Key::new("G", "s", KeyType::IntSize).nb_elements, 2);
    }

    #[test]
    fn is_type_membership() {
        let k = key(KeyType::Frame, 1);
        assert!(k.is_type(&[KeyType::Frame, KeyType::Expander]));
        assert!(!k.is_type(&[KeyType::Separator]));
    }
}
