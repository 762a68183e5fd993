//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// A validated category identifier.
///
/// Category names are matched as substrings of lower-cased event titles, so
/// they are stored trimmed and lower-cased. `"People API"` and `"people api"`
/// name the same category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryName(String);

impl CategoryName {
    /// Creates a new category name after validation.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_lowercase();
        if name.is_empty() {
            return Err(ValidationError::Empty {
                field: "category name",
            });
        }
        Ok(Self(name))
    }

    /// Builds a name from a known-good lower-case literal.
    pub(crate) fn from_static(name: &'static str) -> Self {
        Self(name.to_string())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CategoryName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CategoryName> for String {
    fn from(name: CategoryName) -> Self {
        name.0
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CategoryName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CategoryName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_name_rejects_empty() {
        assert_eq!(
            CategoryName::new(""),
            Err(ValidationError::Empty {
                field: "category name"
            })
        );
        assert!(CategoryName::new("   ").is_err());
    }

    #[test]
    fn category_name_normalizes_case_and_whitespace() {
        let name = CategoryName::new("  People API ").unwrap();
        assert_eq!(name.as_str(), "people api");
        assert_eq!(name, "people api");
    }

    #[test]
    fn category_name_deserialize_validates() {
        let parsed: CategoryName = serde_json::from_str(r#""Admin""#).unwrap();
        assert_eq!(parsed, "admin");

        let result: Result<CategoryName, _> = serde_json::from_str(r#""""#);
        assert!(result.is_err());
    }

    #[test]
    fn validation_error_message() {
        let err = CategoryName::new("").unwrap_err();
        assert_eq!(err.to_string(), "category name cannot be empty");
    }
}
