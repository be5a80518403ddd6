//! Requesting-context identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a requesting web context.
///
/// Origins are compared byte-for-byte. No canonicalization is applied, so
/// `https://a.test` and `https://a.test/` are distinct origins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(String);

impl Origin {
    /// Create an origin from any string-like value.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self(origin.into())
    }

    /// Borrow the origin as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Origin {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Origin {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Origin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_no_canonicalization() {
        assert_ne!(Origin::from("https://a.test"), Origin::from("https://a.test/"));
        assert_ne!(Origin::from("https://A.test"), Origin::from("https://a.test"));
    }

    #[test]
    fn test_origin_serializes_as_plain_string() {
        let origin = Origin::from("https://a.test");
        let json = serde_json::to_string(&origin).unwrap();
        assert_eq!(json, "\"https://a.test\"");

        let parsed: Origin = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, origin);
    }
}
