//! Neutral payload value model shared by every transport and codec.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Generic runtime value for event payloads.
///
/// Covers the JSON data model, which is the common denominator of the
/// supported codecs. Handlers receive and return `Body` values; codecs
/// translate between `Body` and wire bytes. `Text` doubles as the raw
/// string payload that the outbound gateway passes through unserialized.
///
/// Serializes untagged, so a `Body` round-trips through `serde_json` as
/// the plain JSON value it represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    /// JSON null. Also the payload of a bodiless request or response.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON integer (signed 64-bit).
    Int(i64),
    /// JSON floating-point (64-bit IEEE 754).
    Float(f64),
    /// JSON string (UTF-8).
    Text(String),
    /// JSON array (ordered sequence of values).
    Array(Vec<Body>),
    /// JSON object. Uses `BTreeMap` for deterministic serialization order.
    Map(BTreeMap<String, Body>),
}

impl Body {
    /// Returns an empty object value (`{}`).
    #[must_use]
    pub fn empty_map() -> Self {
        Body::Map(BTreeMap::new())
    }

    /// Returns `true` for `Body::Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Body::Null)
    }

    /// Returns the string slice when this value is `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the object map when this value is `Map`.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Body>> {
        match self {
            Body::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up a field when this value is `Map`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Body> {
        self.as_map().and_then(|m| m.get(field))
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<i64> for Body {
    fn from(value: i64) -> Self {
        Body::Int(value)
    }
}

impl From<bool> for Body {
    fn from(value: bool) -> Self {
        Body::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_json_round_trip() {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Body::Text("alice".to_string()));
        map.insert("age".to_string(), Body::Int(42));
        let body = Body::Map(map);

        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"age":42,"name":"alice"}"#);

        let back: Body = serde_json::from_str(&json).unwrap();
        assert_eq!(back, body);
    }

    #[test]
    fn null_parses_to_null_variant() {
        let body: Body = serde_json::from_str("null").unwrap();
        assert!(body.is_null());
    }

    #[test]
    fn field_lookup_on_map() {
        let body: Body = serde_json::from_str(r#"{"id":"42"}"#).unwrap();
        assert_eq!(body.get("id").and_then(Body::as_text), Some("42"));
        assert_eq!(body.get("missing"), None);
    }

    #[test]
    fn lookup_on_non_map_is_none() {
        assert_eq!(Body::Int(1).get("id"), None);
        assert!(Body::Text("x".into()).as_map().is_none());
    }
}
