//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a registered app.
///
/// App ids are caller-chosen strings (not generated), unique within the
/// registry and immutable once registered. Surrounding whitespace is trimmed
/// on construction; an empty id is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppId(String);

impl AppId {
    pub fn new(id: impl AsRef<str>) -> Result<Self, DomainError> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(DomainError::invalid_id("AppId: must not be empty"));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(DomainError::invalid_id("AppId: must not contain whitespace"));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AppId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AppId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AppId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AppId> for String {
    fn from(value: AppId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let id = AppId::new("  app-1 ").unwrap();
        assert_eq!(id.as_str(), "app-1");
    }

    #[test]
    fn rejects_blank_and_inner_whitespace() {
        assert!(matches!(AppId::new("   "), Err(DomainError::InvalidId(_))));
        assert!(matches!(AppId::new("a b"), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn deserialize_validates() {
        let ok: AppId = serde_json::from_str("\"u1\"").unwrap();
        assert_eq!(ok.to_string(), "u1");
        assert!(serde_json::from_str::<AppId>("\"\"").is_err());
    }
}
