//! Typed value definitions
//!
//! This module provides the self-describing value graph exchanged with
//! callers. It mirrors the canonical JSON data model: null, number, string,
//! bool, struct and list.

use crate::errors::ConversionError;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

/// Dynamic value used on the wire
///
/// Serializes to plain JSON, so `{"name": "Ada", "tags": ["x"]}` decodes into
/// a `Struct` holding a `String` and a `List`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum TypedValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<TypedValue>),
    Struct(TypedStruct),
}

impl TypedValue {
    /// Name of the variant, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypedValue::Null => "null",
            TypedValue::Bool(_) => "bool",
            TypedValue::Number(_) => "number",
            TypedValue::String(_) => "string",
            TypedValue::List(_) => "list",
            TypedValue::Struct(_) => "struct",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&TypedStruct> {
        match self {
            TypedValue::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TypedValue]> {
        match self {
            TypedValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Struct of named values
///
/// Keys are unique and their order carries no meaning; iteration is in key
/// order so conversions are deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypedStruct {
    fields: BTreeMap<String, TypedValue>,
}

impl TypedStruct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a struct from entries, rejecting repeated keys
    pub fn from_entries<I, K>(entries: I) -> Result<Self, ConversionError>
    where
        I: IntoIterator<Item = (K, TypedValue)>,
        K: Into<String>,
    {
        let mut strukt = Self::new();
        for (key, value) in entries {
            strukt.try_insert(key, value)?;
        }
        Ok(strukt)
    }

    /// Insert a field, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TypedValue>) -> Option<TypedValue> {
        self.fields.insert(key.into(), value.into())
    }

    /// Insert a field, failing if the key is already present
    pub fn try_insert(&mut self, key: impl Into<String>, value: TypedValue) -> Result<(), ConversionError> {
        match self.fields.entry(key.into()) {
            btree_map::Entry::Occupied(entry) => Err(ConversionError::DuplicateKey(entry.key().clone())),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        self.fields.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<TypedValue> {
        self.fields.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, TypedValue> {
        self.fields.iter()
    }
}

impl<'a> IntoIterator for &'a TypedStruct {
    type Item = (&'a String, &'a TypedValue);
    type IntoIter = btree_map::Iter<'a, String, TypedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl IntoIterator for TypedStruct {
    type Item = (String, TypedValue);
    type IntoIter = btree_map::IntoIter<String, TypedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl TryFrom<TypedValue> for TypedStruct {
    type Error = ConversionError;

    fn try_from(value: TypedValue) -> Result<Self, Self::Error> {
        match value {
            TypedValue::Struct(s) => Ok(s),
            other => Err(ConversionError::NotAStruct {
                found: other.kind_name(),
            }),
        }
    }
}

/// Convert basic Rust types to TypedValue
impl From<String> for TypedValue {
    fn from(val: String) -> Self {
        TypedValue::String(val)
    }
}

impl From<&str> for TypedValue {
    fn from(val: &str) -> Self {
        TypedValue::String(val.to_string())
    }
}

impl From<f64> for TypedValue {
    fn from(val: f64) -> Self {
        TypedValue::Number(val)
    }
}

impl From<i32> for TypedValue {
    fn from(val: i32) -> Self {
        TypedValue::Number(f64::from(val))
    }
}

// Lossy above 2^53, same as every other integer entering the wire format
impl From<i64> for TypedValue {
    fn from(val: i64) -> Self {
        TypedValue::Number(val as f64)
    }
}

impl From<bool> for TypedValue {
    fn from(val: bool) -> Self {
        TypedValue::Bool(val)
    }
}

impl From<TypedStruct> for TypedValue {
    fn from(val: TypedStruct) -> Self {
        TypedValue::Struct(val)
    }
}

impl From<Vec<TypedValue>> for TypedValue {
    fn from(val: Vec<TypedValue>) -> Self {
        TypedValue::List(val)
    }
}

impl<T> From<Option<T>> for TypedValue
where
    T: Into<TypedValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => TypedValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_insert_rejects_duplicates() {
        let mut strukt = TypedStruct::new();
        strukt.try_insert("name", "Ada".into()).unwrap();

        let err = strukt.try_insert("name", "Grace".into()).unwrap_err();
        assert_eq!(err, ConversionError::DuplicateKey("name".to_string()));
        assert_eq!(strukt.get("name"), Some(&TypedValue::from("Ada")));
    }

    #[test]
    fn test_from_entries() {
        let ok = TypedStruct::from_entries(vec![("a", TypedValue::from(1)), ("b", TypedValue::Null)]);
        assert_eq!(ok.unwrap().len(), 2);

        let dup = TypedStruct::from_entries(vec![("a", TypedValue::from(1)), ("a", TypedValue::from(2))]);
        assert!(matches!(dup, Err(ConversionError::DuplicateKey(k)) if k == "a"));
    }

    #[test]
    fn test_json_shape() {
        let value: TypedValue = serde_json::from_str(
            r#"{"name": "Ada", "age": 36, "active": true, "tags": ["x", null], "meta": {}}"#,
        )
        .unwrap();

        let strukt = value.as_struct().unwrap();
        assert_eq!(strukt.get("name").and_then(TypedValue::as_str), Some("Ada"));
        assert_eq!(strukt.get("age").and_then(TypedValue::as_f64), Some(36.0));
        assert_eq!(strukt.get("active").and_then(TypedValue::as_bool), Some(true));
        assert_eq!(
            strukt.get("tags"),
            Some(&TypedValue::List(vec!["x".into(), TypedValue::Null]))
        );
        assert_eq!(strukt.get("meta"), Some(&TypedValue::Struct(TypedStruct::new())));

        let back = serde_json::to_value(&value).unwrap();
        assert_eq!(back["age"], serde_json::json!(36.0));
        assert_eq!(back["tags"][1], serde_json::Value::Null);
    }

    #[test]
    fn test_not_a_struct() {
        let err = TypedStruct::try_from(TypedValue::from(3)).unwrap_err();
        assert_eq!(err, ConversionError::NotAStruct { found: "number" });
    }
}
