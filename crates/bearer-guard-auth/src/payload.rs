//! Token payloads.
//!
//! A payload is an open JSON object. Claim semantics (`exp`, `user_id`, ...)
//! belong to the caller; the codec only checks temporal claims when present.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{JwtError, Result};

/// The claims carried by a token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Create an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a payload from any value that serializes to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidPayload` if the value does not serialize to an object.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let value =
            serde_json::to_value(value).map_err(|e| JwtError::InvalidPayload(e.to_string()))?;
        Self::try_from(value)
    }

    /// Get a top-level claim.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a top-level claim, returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a top-level claim.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Resolve a claim by key or dot path.
    ///
    /// `path` is first looked up as a top-level key, so claims whose names
    /// contain dots stay reachable. Otherwise each `.`-separated segment
    /// descends into an object by key or into an array by index.
    #[must_use]
    pub fn query(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(path) {
            return Some(value);
        }

        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Number of top-level claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the payload has no claims.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the payload and return the underlying map.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        Value::Object(payload.0)
    }
}

impl TryFrom<Value> for Payload {
    type Error = JwtError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(JwtError::InvalidPayload(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

/// Anything that can produce a payload mapping for a new token.
pub trait PayloadSource {
    /// Produce the claims for a new token.
    fn to_payload(&self) -> Payload;
}

impl PayloadSource for Payload {
    fn to_payload(&self) -> Payload {
        self.clone()
    }
}

impl PayloadSource for Map<String, Value> {
    fn to_payload(&self) -> Payload {
        Payload(self.clone())
    }
}

impl<T: PayloadSource + ?Sized> PayloadSource for &T {
    fn to_payload(&self) -> Payload {
        (**self).to_payload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Payload {
        Payload::try_from(json!({
            "context": {"some": "data", "items": [{"id": 1}, {"id": 2}]},
            "foo": "bar",
            "dotted.key": true,
        }))
        .unwrap()
    }

    #[test]
    fn query_top_level_and_nested() {
        let payload = sample();
        assert_eq!(payload.query("foo"), Some(&json!("bar")));
        assert_eq!(payload.query("context.some"), Some(&json!("data")));
        assert_eq!(
            payload.query("context"),
            Some(&json!({"some": "data", "items": [{"id": 1}, {"id": 2}]}))
        );
    }

    #[test]
    fn query_prefers_direct_key_over_path() {
        let payload = sample();
        assert_eq!(payload.query("dotted.key"), Some(&json!(true)));
    }

    #[test]
    fn query_indexes_arrays() {
        let payload = sample();
        assert_eq!(payload.query("context.items.1.id"), Some(&json!(2)));
        assert_eq!(payload.query("context.items.9.id"), None);
        assert_eq!(payload.query("context.items.first"), None);
    }

    #[test]
    fn query_missing_paths() {
        let payload = sample();
        assert_eq!(payload.query("missing.path"), None);
        assert_eq!(payload.query("foo.bar"), None);
        assert_eq!(payload.query(""), None);
    }

    #[test]
    fn non_object_values_are_rejected() {
        assert!(matches!(
            Payload::try_from(json!([1, 2])),
            Err(JwtError::InvalidPayload(_))
        ));
        assert!(matches!(
            Payload::from_serialize("just a string"),
            Err(JwtError::InvalidPayload(_))
        ));
    }

    #[test]
    fn payload_from_struct() {
        #[derive(Serialize)]
        struct Claims {
            user_id: u64,
            scope: &'static str,
        }

        let payload = Payload::from_serialize(&Claims {
            user_id: 3,
            scope: "read",
        })
        .unwrap();
        assert_eq!(payload.get("user_id"), Some(&json!(3)));
        assert_eq!(payload.to_payload(), payload);
    }
}
