//! Marker identifiers.

use core::borrow::Borrow;
use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key naming one marker in the registry.
///
/// Strings are used verbatim. Any other value is keyed by its compact JSON
/// form, so `1` and `"1"` collide while `[1, 2]` becomes `"[1,2]"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(String);

impl MarkerId {
    /// Create an identifier from its key text.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as written to the registry.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MarkerId {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for MarkerId {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<Value> for MarkerId {
    fn from(value: Value) -> Self {
        match value {
            Value::String(key) => Self(key),
            other => Self(other.to_string()),
        }
    }
}

impl From<u64> for MarkerId {
    fn from(key: u64) -> Self {
        Self(key.to_string())
    }
}

impl From<i64> for MarkerId {
    fn from(key: i64) -> Self {
        Self(key.to_string())
    }
}

impl Borrow<str> for MarkerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
