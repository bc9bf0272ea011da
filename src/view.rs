//! View bindings, the factory table and the page layout model.
//!
//! The core never touches a widget toolkit. A host registers one
//! [`MakeView`] factory per [`KeyType`]; when a page is built, each key's
//! factory returns a [`ViewBinding`], a typed get/set pair over whatever the
//! host displays. From then on the key reads and writes through the binding.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use crate::key::{KeyId, KeyRef};
use crate::types::KeyType;
use crate::value::{FromValue, Value, ValueKind};

type Getter = Box<dyn Fn() -> Value>;
type Setter = Box<dyn Fn(Value)>;

/// Typed accessors over a displayed value.
pub struct ViewBinding {
    kind: ValueKind,
    get: Getter,
    set: Setter,
    is_default: Option<Box<dyn Fn() -> bool>>,
}

impl ViewBinding {
    /// Bind a view holding values of type `T`.
    pub fn typed<T>(get: impl Fn() -> T + 'static, set: impl Fn(T) + 'static) -> Self
    where
        T: FromValue + Into<Value> + 'static,
    {
        Self {
            kind: T::KIND,
            get: Box::new(move || get().into()),
            set: Box::new(move |value| {
                if let Some(v) = T::from_value(&value) {
                    set(v)
                }
            }),
            is_default: None,
        }
    }

    /// Flag the view as showing placeholder text: while `hint` returns true,
    /// reads yield the empty value of the bound kind.
    pub fn default_hint(mut self, hint: impl Fn() -> bool + 'static) -> Self {
        self.is_default = Some(Box::new(hint));
        self
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_default(&self) -> bool {
        self.is_default.as_ref().is_some_and(|hint| hint())
    }

    pub fn get(&self) -> Value {
        if self.is_default() {
            return Value::empty(self.kind);
        }
        (self.get)()
    }

    /// Push a value to the view. Fails with the offered kind when it cannot
    /// be converted to the bound kind.
    pub fn set(&self, value: Value) -> Result<(), ValueKind> {
        let offered = value.kind();
        let v = value.coerce(self.kind).ok_or(offered)?;
        (self.set)(v);
        Ok(())
    }
}

impl fmt::Debug for ViewBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBinding")
            .field("kind", &self.kind)
            .field("is_default", &self.is_default())
            .finish()
    }
}

/// A headless view: one shared value cell.
#[derive(Debug, Clone)]
pub struct ViewCell(Rc<RefCell<Value>>);

impl ViewCell {
    pub fn new(value: Value) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn get(&self) -> Value {
        self.0.borrow().clone()
    }

    pub fn set(&self, value: Value) {
        *self.0.borrow_mut() = value;
    }

    /// A binding reading and writing this cell, pinned to the cell's kind.
    pub fn binding(&self) -> ViewBinding {
        let (read, write) = (self.clone(), self.clone());
        ViewBinding {
            kind: self.0.borrow().kind(),
            get: Box::new(move || read.get()),
            set: Box::new(move |v| write.set(v)),
            is_default: None,
        }
    }
}

/// Builds the view for one key. Returning `None` means the key has no value
/// to bind (labels, frames, buttons).
pub type MakeView = Rc<dyn Fn(&KeyRef<'_>) -> Option<ViewBinding>>;

/// The `KeyType → MakeView` table, resolved once per builder.
#[derive(Clone, Default)]
pub struct ViewFactories {
    table: HashMap<KeyType, MakeView>,
}

impl ViewFactories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factories for every type, backed by [`ViewCell`]s seeded from storage.
    pub fn headless() -> Self {
        let make: MakeView = Rc::new(|key: &KeyRef<'_>| {
            if key.key_type.is_display_only() {
                return None;
            }
            let kind = key.value_kind();
            let seed = key
                .storage_value()
                .into_value()
                .and_then(|v| v.coerce(kind))
                .or_else(|| {
                    let default = key.default_value().ok()?.into_value()?;
                    debug!(key = %key.path(), "view seeded from default");
                    default.coerce(kind)
                })
                .unwrap_or_else(|| Value::empty(kind));
            Some(ViewCell::new(seed).binding())
        });
        KeyType::all().fold(Self::new(), |f, t| f.register(t, make.clone()))
    }

    pub fn register(mut self, key_type: KeyType, make: MakeView) -> Self {
        self.table.insert(key_type, make);
        self
    }

    pub fn get(&self, key_type: KeyType) -> Option<&MakeView> {
        self.table.get(&key_type)
    }
}

impl fmt::Debug for ViewFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<char> = self.table.keys().map(|t| t.glyph()).collect();
        types.sort_unstable();
        f.debug_struct("ViewFactories").field("types", &types).finish()
    }
}

/// Toolkit-agnostic layout of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub group: String,
    pub items: Vec<PageItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageItem {
    /// A frame or expander, holding the rows that follow it.
    Section {
        key: KeyId,
        expander: bool,
        title: String,
        icon: String,
        items: Vec<PageItem>,
    },
    Separator {
        key: KeyId,
    },
    Row {
        key: KeyId,
        label: String,
        tooltip: String,
        vertical: bool,
        full_size: bool,
        selectable: bool,
    },
}

impl Page {
    /// Keys of the page in display order, sections included.
    pub fn keys(&self) -> Vec<KeyId> {
        fn walk(items: &[PageItem], out: &mut Vec<KeyId>) {
            for item in items {
                match item {
                    PageItem::Section { key, items, .. } => {
                        out.push(*key);
                        walk(items, out);
                    }
                    PageItem::Separator { key } | PageItem::Row { key, .. } => out.push(*key),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.items, &mut out);
        out
    }
}
