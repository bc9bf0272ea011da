//! Runtime values and the [`Valuer`] accessor.
//!
//! Every storage cell and every view holds one of eight cardinal types: four
//! scalars and their homogeneous lists. [`Valuer`] wraps an optional cell and
//! exposes strict typed extraction plus the printing helpers the diff walker
//! relies on (`count`, `sprint`, `sprint_i`).

use std::fmt;

use serde::Serialize;

use crate::error::{DockconfError, Result};

/// The cardinal type of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    ListBool,
    ListInt,
    ListFloat,
    ListString,
}

impl ValueKind {
    pub fn is_list(self) -> bool {
        matches!(
            self,
            ValueKind::ListBool | ValueKind::ListInt | ValueKind::ListFloat | ValueKind::ListString
        )
    }

    /// The list kind holding elements of this scalar kind (lists map to themselves).
    pub fn as_list(self) -> ValueKind {
        match self {
            ValueKind::Bool => ValueKind::ListBool,
            ValueKind::Int => ValueKind::ListInt,
            ValueKind::Float => ValueKind::ListFloat,
            ValueKind::String => ValueKind::ListString,
            list => list,
        }
    }

    /// The element kind of this list kind (scalars map to themselves).
    pub fn as_scalar(self) -> ValueKind {
        match self {
            ValueKind::ListBool => ValueKind::Bool,
            ValueKind::ListInt => ValueKind::Int,
            ValueKind::ListFloat => ValueKind::Float,
            ValueKind::ListString => ValueKind::String,
            scalar => scalar,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::ListBool => "bool list",
            ValueKind::ListInt => "int list",
            ValueKind::ListFloat => "float list",
            ValueKind::ListString => "string list",
        };
        f.write_str(name)
    }
}

/// A typed configuration value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    ListBool(Vec<bool>),
    ListInt(Vec<i64>),
    ListFloat(Vec<f64>),
    ListString(Vec<String>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::ListBool(_) => ValueKind::ListBool,
            Value::ListInt(_) => ValueKind::ListInt,
            Value::ListFloat(_) => ValueKind::ListFloat,
            Value::ListString(_) => ValueKind::ListString,
        }
    }

    /// The zero value of `kind`: `false`, `0`, `0.0`, `""` or an empty list.
    pub fn empty(kind: ValueKind) -> Value {
        match kind {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int => Value::Int(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::String => Value::String(String::new()),
            ValueKind::ListBool => Value::ListBool(Vec::new()),
            ValueKind::ListInt => Value::ListInt(Vec::new()),
            ValueKind::ListFloat => Value::ListFloat(Vec::new()),
            ValueKind::ListString => Value::ListString(Vec::new()),
        }
    }

    /// Convert to `kind`. Only scalar to singleton list and singleton list to
    /// scalar conversions are allowed; anything else returns `None`.
    pub fn coerce(self, kind: ValueKind) -> Option<Value> {
        if self.kind() == kind {
            return Some(self);
        }
        match (self, kind) {
            (Value::Bool(b), ValueKind::ListBool) => Some(Value::ListBool(vec![b])),
            (Value::Int(i), ValueKind::ListInt) => Some(Value::ListInt(vec![i])),
            (Value::Float(x), ValueKind::ListFloat) => Some(Value::ListFloat(vec![x])),
            (Value::String(s), ValueKind::ListString) => Some(Value::ListString(vec![s])),
            (Value::ListBool(mut l), ValueKind::Bool) if l.len() == 1 => l.pop().map(Value::Bool),
            (Value::ListInt(mut l), ValueKind::Int) if l.len() == 1 => l.pop().map(Value::Int),
            (Value::ListFloat(mut l), ValueKind::Float) if l.len() == 1 => {
                l.pop().map(Value::Float)
            }
            (Value::ListString(mut l), ValueKind::String) if l.len() == 1 => {
                l.pop().map(Value::String)
            }
            _ => None,
        }
    }

    /// Number of elements: list length, 0 for an empty string, else 1.
    pub fn count(&self) -> usize {
        match self {
            Value::String(s) if s.is_empty() => 0,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_) => 1,
            Value::ListBool(l) => l.len(),
            Value::ListInt(l) => l.len(),
            Value::ListFloat(l) => l.len(),
            Value::ListString(l) => l.len(),
        }
    }

    pub fn sprint(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(x) => x.to_string(),
            Value::String(s) => s.clone(),
            Value::ListBool(l) => bracket(l),
            Value::ListInt(l) => bracket(l),
            Value::ListFloat(l) => bracket(l),
            Value::ListString(l) => bracket(l),
        }
    }

    /// Print element `i` of a list. Scalars print whole; out of range is empty.
    pub fn sprint_i(&self, i: usize) -> String {
        fn at<T: ToString>(l: &[T], i: usize) -> String {
            l.get(i).map(ToString::to_string).unwrap_or_default()
        }
        match self {
            Value::ListBool(l) => at(l, i),
            Value::ListInt(l) => at(l, i),
            Value::ListFloat(l) => at(l, i),
            Value::ListString(l) => at(l, i),
            scalar => scalar.sprint(),
        }
    }
}

fn bracket<T: ToString>(items: &[T]) -> String {
    let inner: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("[{}]", inner.join(" "))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sprint())
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        })*
    };
}

value_from! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => String,
    Vec<bool> => ListBool,
    Vec<i64> => ListInt,
    Vec<f64> => ListFloat,
    Vec<String> => ListString,
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::ListString(v.into_iter().map(str::to_string).collect())
    }
}

/// Rust types that can be extracted from a [`Value`] of a fixed kind.
pub trait FromValue: Sized {
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl FromValue for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        })*
    };
}

from_value! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => String,
    Vec<bool> => ListBool,
    Vec<i64> => ListInt,
    Vec<f64> => ListFloat,
    Vec<String> => ListString,
}

/// An owned snapshot of one cell, read from a storage or a view.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuer {
    key: String,
    value: Option<Value>,
}

impl Valuer {
    pub fn new(key: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn empty(key: impl Into<String>) -> Self {
        Self::new(key, None)
    }

    /// The `group/name` label used in error messages.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    /// Strict typed extraction; an empty cell or another kind is a mismatch.
    pub fn get<T: FromValue>(&self) -> Result<T> {
        self.value
            .as_ref()
            .and_then(T::from_value)
            .ok_or_else(|| DockconfError::TypeMismatch {
                key: self.key.clone(),
                expected: T::KIND,
            })
    }

    pub fn bool(&self) -> Result<bool> {
        self.get()
    }

    pub fn int(&self) -> Result<i64> {
        self.get()
    }

    pub fn float(&self) -> Result<f64> {
        self.get()
    }

    pub fn string(&self) -> Result<String> {
        self.get()
    }

    pub fn list_bool(&self) -> Result<Vec<bool>> {
        self.get()
    }

    pub fn list_int(&self) -> Result<Vec<i64>> {
        self.get()
    }

    pub fn list_float(&self) -> Result<Vec<f64>> {
        self.get()
    }

    pub fn list_string(&self) -> Result<Vec<String>> {
        self.get()
    }

    pub fn count(&self) -> usize {
        self.value.as_ref().map_or(0, Value::count)
    }

    pub fn sprint(&self) -> String {
        self.value.as_ref().map(Value::sprint).unwrap_or_default()
    }

    pub fn sprint_i(&self, i: usize) -> String {
        self.value
            .as_ref()
            .map(|v| v.sprint_i(i))
            .unwrap_or_default()
    }

    pub fn set(&mut self, value: impl Into<Value>) {
        self.value = Some(value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_per_kind() {
        assert_eq!(Value::Bool(false).count(), 1);
        assert_eq!(Value::String(String::new()).count(), 0);
        assert_eq!(Value::String("x".into()).count(), 1);
        assert_eq!(Value::ListInt(vec![1, 2, 3]).count(), 3);
        assert_eq!(Valuer::empty("g/n").count(), 0);
    }

    #[test]
    fn sprint_formats_lists_with_brackets() {
        let v = Value::from(vec!["a", "b", "c"]);
        assert_eq!(v.sprint(), "[a b c]");
        assert_eq!(Value::ListFloat(vec![0.5, 1.0]).sprint(), "[0.5 1]");
    }

    #[test]
    fn sprint_i_picks_element_or_falls_back() {
        let list = Value::ListFloat(vec![0.1, 0.2]);
        assert_eq!(list.sprint_i(1), "0.2");
        assert_eq!(list.sprint_i(5), "");
        assert_eq!(Value::Int(7).sprint_i(3), "7");
    }

    #[test]
    fn coerce_scalar_and_singleton() {
        assert_eq!(
            Value::Int(4).coerce(ValueKind::ListInt),
            Some(Value::ListInt(vec![4]))
        );
        assert_eq!(
            Value::ListString(vec!["x".into()]).coerce(ValueKind::String),
            Some(Value::String("x".into()))
        );
        assert_eq!(Value::ListInt(vec![1, 2]).coerce(ValueKind::Int), None);
        assert_eq!(Value::Bool(true).coerce(ValueKind::Int), None);
    }

    #[test]
    fn valuer_strict_extraction() {
        let v = Valuer::new("Icons/size", Some(Value::Int(48)));
        assert_eq!(v.int().unwrap(), 48);
        let err = v.string().unwrap_err();
        assert!(matches!(
            err,
            DockconfError::TypeMismatch {
                expected: ValueKind::String,
                ..
            }
        ));
    }

    #[test]
    fn valuer_set_replaces_cell() {
        let mut v = Valuer::empty("g/n");
        assert!(v.bool().is_err());
        v.set(true);
        assert!(v.bool().unwrap());
    }

    #[test]
    fn empty_values_match_kind() {
        for kind in [
            ValueKind::Bool,
            ValueKind::Int,
            ValueKind::Float,
            ValueKind::String,
            ValueKind::ListBool,
            ValueKind::ListInt,
            ValueKind::ListFloat,
            ValueKind::ListString,
        ] {
            assert_eq!(Value::empty(kind).kind(), kind);
        }
    }
}
