//! Id Type module
//!
//! Entity identifiers and their rendering.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::Bson;
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::validation::ValidationError;

/// Canonical 24-hex-character document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(ObjectId);

impl EntityId {
    /// Parse an id from its hex text form
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        ObjectId::parse_str(value)
            .map(Self)
            .map_err(|e| ValidationError::InvalidId(format!("{}", e)))
    }

    /// Generate a fresh id
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for EntityId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<ObjectId> for EntityId {
    fn from(id: ObjectId) -> Self {
        Self(id)
    }
}

impl From<EntityId> for Bson {
    fn from(id: EntityId) -> Self {
        Bson::ObjectId(id.0)
    }
}

/// Render a stored `_id` the way it is reported back to callers
pub fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Split raw ids into parsed ids and the inputs that failed to parse
pub fn partition_ids<S: AsRef<str>>(raw: &[S]) -> (Vec<EntityId>, Vec<String>) {
    let mut valid = Vec::with_capacity(raw.len());
    let mut failed = Vec::new();

    for value in raw {
        match EntityId::parse(value.as_ref()) {
            Ok(id) => valid.push(id),
            Err(_) => failed.push(value.as_ref().to_string()),
        }
    }

    (valid, failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let id = EntityId::parse("65a1b2c3d4e5f60718293a4b").unwrap();
        assert_eq!(id.to_string(), "65a1b2c3d4e5f60718293a4b");
        assert_eq!(id.to_hex(), "65a1b2c3d4e5f60718293a4b");
    }

    #[test]
    fn test_parse_invalid_is_error() {
        for raw in ["", "bad-id", "65a1b2c3d4e5f60718293a4", "zza1b2c3d4e5f60718293a4b"] {
            let err = EntityId::parse(raw).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidId(_)), "{}", raw);
        }
    }

    #[test]
    fn test_partition_ids() {
        let raw = ["65a1b2c3d4e5f60718293a4b", "bad-id", "65a1b2c3d4e5f60718293a4c"];
        let (valid, failed) = partition_ids(&raw);
        assert_eq!(valid.len(), 2);
        assert_eq!(failed, vec!["bad-id".to_string()]);
    }

    #[test]
    fn test_id_to_string() {
        let id = EntityId::generate();
        assert_eq!(id_to_string(&Bson::from(id)), id.to_hex());
        assert_eq!(id_to_string(&Bson::String("custom".into())), "custom");
        assert_eq!(id_to_string(&Bson::Int32(7)), "7");
    }
}
