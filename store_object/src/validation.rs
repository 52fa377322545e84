//! Validation module
//!
//! This module provides validation for the names and identifiers callers
//! hand to the store.

use std::fmt;

/// Validation errors for caller-supplied input
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required request field is missing or empty
    Missing(&'static str),
    /// Name is empty
    Empty,
    /// Name is too long
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },
    /// Name contains characters the store refuses (`$` or NUL)
    InvalidCharacters(String),
    /// Collection name uses the store's reserved namespace
    ReservedPrefix(String),
    /// Field path starts with an operator sigil or has an empty segment
    InvalidFieldPath(String),
    /// Identifier is not 24 hex characters
    InvalidId(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Missing(field) => write!(f, "{} is required", field),
            ValidationError::Empty => write!(f, "Name cannot be empty"),
            ValidationError::TooLong {
                name,
                length,
                max_length,
            } => {
                write!(
                    f,
                    "Name '{}' is too long: {} bytes (max {})",
                    name, length, max_length
                )
            }
            ValidationError::InvalidCharacters(name) => {
                write!(f, "Invalid characters in name '{}': '$' and NUL are not allowed", name)
            }
            ValidationError::ReservedPrefix(name) => {
                write!(f, "Name '{}' uses the reserved 'system.' prefix", name)
            }
            ValidationError::InvalidFieldPath(name) => {
                write!(f, "Invalid field name '{}'", name)
            }
            ValidationError::InvalidId(detail) => write!(f, "invalid ID format: {}", detail),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validated collection name (the entity type)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedCollectionName(String);

impl ValidatedCollectionName {
    /// Namespace budget left for the collection part of `db.collection`
    const MAX_LENGTH: usize = 120;

    /// Create a new validated collection name
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::Empty);
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                name: name.to_string(),
                length: name.len(),
                max_length: Self::MAX_LENGTH,
            });
        }

        if name.contains('$') || name.contains('\0') {
            return Err(ValidationError::InvalidCharacters(name.to_string()));
        }

        if name.starts_with("system.") {
            return Err(ValidationError::ReservedPrefix(name.to_string()));
        }

        Ok(Self(name.to_string()))
    }

    /// Get the validated name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the validated name as a String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ValidatedCollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated field path (`name` or `address.city`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedFieldName(String);

impl ValidatedFieldName {
    /// Create a new validated field name
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::Empty);
        }

        if name.contains('\0') {
            return Err(ValidationError::InvalidCharacters(name.to_string()));
        }

        if name.split('.').any(|segment| segment.is_empty() || segment.starts_with('$')) {
            return Err(ValidationError::InvalidFieldPath(name.to_string()));
        }

        Ok(Self(name.to_string()))
    }

    /// Get the validated name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the validated name as a String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ValidatedFieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Utility functions for validation
pub mod utils {
    use super::*;

    /// Validate every field path in a list
    pub fn validate_field_names<S: AsRef<str>>(
        names: &[S],
    ) -> Result<Vec<ValidatedFieldName>, ValidationError> {
        names
            .iter()
            .map(|name| ValidatedFieldName::new(name.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_collection_names() {
        let long = "a".repeat(120);
        let valid_names = ["users", "thesis_statuses", "Users.archive", "a", long.as_str()];

        for name in valid_names {
            assert!(
                ValidatedCollectionName::new(name).is_ok(),
                "Should accept valid name: {}",
                name
            );
        }
    }

    #[test]
    fn test_invalid_collection_names() {
        let test_cases = [
            ("", ValidationError::Empty),
            (
                "users$x",
                ValidationError::InvalidCharacters("users$x".to_string()),
            ),
            (
                "bad\0name",
                ValidationError::InvalidCharacters("bad\0name".to_string()),
            ),
            (
                "system.users",
                ValidationError::ReservedPrefix("system.users".to_string()),
            ),
        ];

        for (name, expected_error) in test_cases {
            let result = ValidatedCollectionName::new(name);
            assert_eq!(result.unwrap_err(), expected_error);
        }
    }

    #[test]
    fn test_too_long_name() {
        let long_name = "a".repeat(121);
        match ValidatedCollectionName::new(&long_name).unwrap_err() {
            ValidationError::TooLong {
                length, max_length, ..
            } => {
                assert_eq!(length, 121);
                assert_eq!(max_length, 120);
            }
            other => panic!("Expected TooLong error, got {:?}", other),
        }
    }

    #[test]
    fn test_field_name_validation() {
        assert!(ValidatedFieldName::new("name").is_ok());
        assert!(ValidatedFieldName::new("address.city").is_ok());
        assert!(ValidatedFieldName::new("_id").is_ok());
        assert!(ValidatedFieldName::new("$where").is_err());
        assert!(ValidatedFieldName::new("a..b").is_err());
        assert!(ValidatedFieldName::new("a.$b").is_err());
        assert_eq!(ValidatedFieldName::new(""), Err(ValidationError::Empty));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::Missing("entity_type").to_string(),
            "entity_type is required"
        );
        assert!(ValidationError::InvalidId("bad".into())
            .to_string()
            .starts_with("invalid ID format"));
    }

    #[test]
    fn test_utility_functions() {
        assert!(utils::validate_field_names(&["name", "email"]).is_ok());
        assert!(utils::validate_field_names(&["name", "$or"]).is_err());
    }
}
