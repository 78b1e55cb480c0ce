//! JSON codec.

use crate::body::Body;
use crate::error::{DeserializationError, SerializationError};
use crate::subscription::media_type;

use super::{PayloadDeserializer, PayloadSerializer};

/// JSON serializer/deserializer backed by `serde_json`.
///
/// Deserialization treats an empty or all-whitespace document as `{}`, so
/// a bodiless request decodes into an empty object rather than failing.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl PayloadSerializer for JsonCodec {
    fn media_type(&self) -> &'static str {
        media_type::APPLICATION_JSON
    }

    fn serialize(&self, payload: &Body) -> Result<Vec<u8>, SerializationError> {
        if payload.is_null() {
            return Ok(Vec::new());
        }
        serde_json::to_vec(payload).map_err(|e| SerializationError {
            reason: e.to_string(),
        })
    }
}

impl PayloadDeserializer for JsonCodec {
    fn media_type(&self) -> &'static str {
        media_type::APPLICATION_JSON
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Body, DeserializationError> {
        let is_blank = bytes.iter().all(u8::is_ascii_whitespace);
        if bytes.is_empty() || is_blank {
            return Ok(Body::empty_map());
        }
        serde_json::from_slice(bytes).map_err(|e| DeserializationError {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_decodes_like_empty_object() {
        let codec = JsonCodec;
        let from_empty = codec.deserialize(b"").unwrap();
        let from_blank = codec.deserialize(b"  \n ").unwrap();
        let from_braces = codec.deserialize(b"{}").unwrap();
        assert_eq!(from_empty, from_braces);
        assert_eq!(from_blank, from_braces);
    }

    #[test]
    fn object_round_trip() {
        let codec = JsonCodec;
        let body: Body = serde_json::from_str(r#"{"id":"42","qty":3}"#).unwrap();
        let bytes = codec.serialize(&body).unwrap();
        assert_eq!(codec.deserialize(&bytes).unwrap(), body);
    }

    #[test]
    fn null_payload_serializes_to_empty_bytes() {
        let codec = JsonCodec;
        assert!(codec.serialize(&Body::Null).unwrap().is_empty());
    }

    #[test]
    fn malformed_document_is_a_deserialization_error() {
        let codec = JsonCodec;
        let err = codec.deserialize(b"{not json").unwrap_err();
        assert!(!err.reason.is_empty());
    }
}
