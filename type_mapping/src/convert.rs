//! BSON conversion
//!
//! Bidirectional mapping between [`TypedValue`] and BSON.
//!
//! Writing is total: every typed value has a BSON form. Reading normalizes
//! the BSON kinds the wire format lacks:
//!
//! - `ObjectId` becomes its 24-character hex string
//! - `DateTime` becomes RFC3339 text in UTC
//! - `Int32`/`Int64` become numbers (f64)
//! - anything else becomes its relaxed Extended JSON rendering
//!
//! There is no reverse mapping: a string that happens to look like an id or
//! a timestamp is written back as a BSON string.

use crate::errors::ConversionError;
use crate::json::from_json_bounded;
use crate::types::{TypedStruct, TypedValue};
use bson::{Bson, Document};
use chrono::SecondsFormat;

/// Deepest nesting accepted when reading documents, matching the wire format's recursion limit
pub const MAX_NESTING_DEPTH: usize = 100;

/// Convert a typed value into BSON
pub fn to_bson(value: &TypedValue) -> Bson {
    match value {
        TypedValue::Null => Bson::Null,
        TypedValue::Bool(b) => Bson::Boolean(*b),
        TypedValue::Number(n) => Bson::Double(*n),
        TypedValue::String(s) => Bson::String(s.clone()),
        TypedValue::List(items) => Bson::Array(items.iter().map(to_bson).collect()),
        TypedValue::Struct(strukt) => Bson::Document(to_document(strukt)),
    }
}

/// Convert a typed struct into a BSON document
pub fn to_document(strukt: &TypedStruct) -> Document {
    strukt
        .iter()
        .map(|(key, value)| (key.clone(), to_bson(value)))
        .collect()
}

/// Convert a BSON value into a typed value
pub fn from_bson(value: &Bson) -> Result<TypedValue, ConversionError> {
    convert_bson(value, 0)
}

/// Convert a BSON document into a typed struct
pub fn from_document(document: &Document) -> Result<TypedStruct, ConversionError> {
    convert_document(document, 0)
}

/// Render a BSON datetime the way it crosses into the wire format
pub fn format_timestamp(value: &bson::DateTime) -> String {
    value.to_chrono().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn convert_document(document: &Document, depth: usize) -> Result<TypedStruct, ConversionError> {
    let mut strukt = TypedStruct::new();
    for (key, value) in document {
        strukt.try_insert(key.clone(), convert_bson(value, depth + 1)?)?;
    }
    Ok(strukt)
}

fn convert_bson(value: &Bson, depth: usize) -> Result<TypedValue, ConversionError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ConversionError::DepthExceeded {
            limit: MAX_NESTING_DEPTH,
        });
    }

    let converted = match value {
        Bson::Null | Bson::Undefined => TypedValue::Null,
        Bson::Boolean(b) => TypedValue::Bool(*b),
        Bson::Double(n) => TypedValue::Number(*n),
        Bson::Int32(n) => TypedValue::Number(f64::from(*n)),
        Bson::Int64(n) => TypedValue::Number(*n as f64),
        Bson::String(s) => TypedValue::String(s.clone()),
        Bson::ObjectId(oid) => TypedValue::String(oid.to_hex()),
        Bson::DateTime(dt) => TypedValue::String(format_timestamp(dt)),
        Bson::Array(items) => TypedValue::List(
            items
                .iter()
                .map(|item| convert_bson(item, depth + 1))
                .collect::<Result<_, _>>()?,
        ),
        Bson::Document(document) => TypedValue::Struct(convert_document(document, depth)?),
        // Driver kinds with no typed counterpart keep their Extended JSON shape
        other => from_json_bounded(other.clone().into_relaxed_extjson(), depth, MAX_NESTING_DEPTH)?,
    };

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use bson::spec::BinarySubtype;
    use bson::{doc, Binary};
    use serde_json::json;

    fn sample() -> TypedStruct {
        TypedStruct::try_from(json!({
            "name": "Ada",
            "age": 36,
            "score": -1.25,
            "active": false,
            "nothing": null,
            "tags": ["a", 2, true, null, {"deep": ["x"]}],
            "address": {"city": "London", "zip": {"code": "N1"}}
        }))
        .unwrap()
    }

    #[test]
    fn test_roundtrip_plain_values() {
        let original = sample();
        let document = to_document(&original);
        let back = from_document(&document).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_write_kinds() {
        let document = to_document(&sample());
        assert_eq!(document.get("name"), Some(&Bson::String("Ada".into())));
        assert_eq!(document.get("age"), Some(&Bson::Double(36.0)));
        assert_eq!(document.get("active"), Some(&Bson::Boolean(false)));
        assert_eq!(document.get("nothing"), Some(&Bson::Null));
        assert!(matches!(document.get("tags"), Some(Bson::Array(items)) if items.len() == 5));
        assert!(matches!(document.get("address"), Some(Bson::Document(_))));
    }

    #[test]
    fn test_integers_become_numbers() {
        let document = doc! { "small": 7_i32, "big": 9_007_199_254_740_993_i64 };
        let strukt = from_document(&document).unwrap();
        assert_eq!(strukt.get("small"), Some(&TypedValue::Number(7.0)));
        // Precision loss above 2^53 is inherited, not an error
        assert_eq!(
            strukt.get("big"),
            Some(&TypedValue::Number(9_007_199_254_740_992.0))
        );
    }

    #[test]
    fn test_native_kinds_read_as_strings() {
        let oid = ObjectId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap();
        let when = bson::DateTime::from_millis(1_700_000_000_123);
        let document = doc! { "_id": oid, "createdAt": when };

        let strukt = from_document(&document).unwrap();
        assert_eq!(
            strukt.get("_id"),
            Some(&TypedValue::from("65a1b2c3d4e5f60718293a4b"))
        );
        assert_eq!(
            strukt.get("createdAt"),
            Some(&TypedValue::from("2023-11-14T22:13:20Z"))
        );
    }

    #[test]
    fn test_no_reverse_inference() {
        let oid = ObjectId::new();
        let strukt = from_document(&doc! { "_id": oid, "at": bson::DateTime::now() }).unwrap();

        let written = to_document(&strukt);
        assert_eq!(written.get("_id"), Some(&Bson::String(oid.to_hex())));
        assert!(matches!(written.get("at"), Some(Bson::String(_))));
    }

    #[test]
    fn test_unknown_kinds_pass_through() {
        let blob = Binary {
            subtype: BinarySubtype::Generic,
            bytes: vec![1, 2, 3],
        };
        let document = doc! {
            "blob": blob,
            "legacy": Bson::Undefined,
        };

        let strukt = from_document(&document).unwrap();
        assert_eq!(strukt.get("legacy"), Some(&TypedValue::Null));

        let blob = strukt.get("blob").and_then(TypedValue::as_struct).unwrap();
        let inner = blob.get("$binary").and_then(TypedValue::as_struct).unwrap();
        assert_eq!(inner.get("base64"), Some(&TypedValue::from("AQID")));
    }

    #[test]
    fn test_depth_limit() {
        let mut nested = doc! { "leaf": 1 };
        for _ in 0..(MAX_NESTING_DEPTH + 5) {
            nested = doc! { "n": nested };
        }

        assert_eq!(
            from_document(&nested).unwrap_err(),
            ConversionError::DepthExceeded {
                limit: MAX_NESTING_DEPTH
            }
        );

        let mut shallow = doc! { "leaf": 1 };
        for _ in 0..10 {
            shallow = doc! { "n": shallow };
        }
        assert!(from_document(&shallow).is_ok());
    }
}
