//! Identifier types for bearer-guard.
//!
//! User identifiers are opaque to the token layer: the `user_id` claim may be
//! issued as a JSON string or a JSON integer, and both spellings of the same
//! value name the same user.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IdError;

/// Credentials submitted on login, e.g. `{"email": ..., "password": ...}`.
pub type Credentials = BTreeMap<String, String>;

/// An opaque user identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a `UserId` from any string-like value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty or only whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(value))
    }

    /// Read a `UserId` from a decoded claim value.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim is neither a string nor an integer.
    pub fn from_claim(value: &Value) -> Result<Self, IdError> {
        match value {
            Value::String(s) => Self::new(s.as_str()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Self(n.to_string())),
            other => Err(IdError::UnsupportedClaim(type_name(other))),
        }
    }

    /// The claim value to write into a token payload.
    ///
    /// Canonical integers (`"42"`, `"-3"`) are written as JSON integers;
    /// anything else, including `"007"` and `"+7"`, stays a string so that
    /// [`from_claim`](Self::from_claim) gives back the same identifier.
    #[must_use]
    pub fn to_claim(&self) -> Value {
        match self.0.parse::<i64>() {
            Ok(n) if n.to_string() == self.0 => Value::from(n),
            _ => Value::String(self.0.clone()),
        }
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}
