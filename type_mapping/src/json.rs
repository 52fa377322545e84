//! JSON interop
//!
//! Conversions between `serde_json::Value` and [`TypedValue`]. Used for
//! fixtures and for the Extended JSON fallback of the BSON mapping.

use crate::errors::ConversionError;
use crate::types::{TypedStruct, TypedValue};
use serde_json::Value;

impl From<Value> for TypedValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => TypedValue::Null,
            Value::Bool(b) => TypedValue::Bool(b),
            Value::Number(n) => TypedValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => TypedValue::String(s),
            Value::Array(items) => TypedValue::List(items.into_iter().map(TypedValue::from).collect()),
            Value::Object(map) => {
                let mut strukt = TypedStruct::new();
                for (key, value) in map {
                    strukt.insert(key, TypedValue::from(value));
                }
                TypedValue::Struct(strukt)
            }
        }
    }
}

impl From<TypedValue> for Value {
    fn from(value: TypedValue) -> Self {
        match value {
            TypedValue::Null => Value::Null,
            TypedValue::Bool(b) => Value::Bool(b),
            TypedValue::Number(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            TypedValue::String(s) => Value::String(s),
            TypedValue::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            TypedValue::Struct(strukt) => Value::Object(
                strukt
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<Value> for TypedStruct {
    type Error = ConversionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        TypedStruct::try_from(TypedValue::from(value))
    }
}

/// Convert JSON into a typed value, enforcing a nesting limit
pub(crate) fn from_json_bounded(
    value: Value,
    depth: usize,
    limit: usize,
) -> Result<TypedValue, ConversionError> {
    if depth > limit {
        return Err(ConversionError::DepthExceeded { limit });
    }

    let converted = match value {
        Value::Array(items) => TypedValue::List(
            items
                .into_iter()
                .map(|item| from_json_bounded(item, depth + 1, limit))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            let mut strukt = TypedStruct::new();
            for (key, value) in map {
                strukt.try_insert(key, from_json_bounded(value, depth + 1, limit)?)?;
            }
            TypedValue::Struct(strukt)
        }
        scalar => TypedValue::from(scalar),
    };

    Ok(converted)
}
