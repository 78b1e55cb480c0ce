//! Codec contract and registry.
//!
//! A codec is a serializer/deserializer pair identified by a media-type
//! string. The gateways depend only on the two traits here; concrete
//! codecs are resolved once, at registration time, never per request.

pub mod json;
pub mod xml;

use crate::body::Body;
use crate::error::{DeserializationError, SerializationError, ValidationError};
use crate::subscription::media_type;

pub use json::JsonCodec;
pub use xml::XmlCodec;

/// Turns a payload value into wire bytes.
pub trait PayloadSerializer: Send + Sync + std::fmt::Debug {
    /// Media-type id this serializer produces.
    fn media_type(&self) -> &'static str;

    /// Serializes a payload.
    ///
    /// # Errors
    ///
    /// Returns [`SerializationError`] when the payload cannot be encoded.
    fn serialize(&self, payload: &Body) -> Result<Vec<u8>, SerializationError>;
}

/// Turns wire bytes into a payload value.
pub trait PayloadDeserializer: Send + Sync + std::fmt::Debug {
    /// Media-type id this deserializer accepts.
    fn media_type(&self) -> &'static str;

    /// Deserializes wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializationError`] when the bytes cannot be decoded.
    fn deserialize(&self, bytes: &[u8]) -> Result<Body, DeserializationError>;
}

static JSON: JsonCodec = JsonCodec;
static XML: XmlCodec = XmlCodec;

/// Resolves a serializer by media-type id.
///
/// # Errors
///
/// Returns [`ValidationError`] when no serializer is registered for `id`.
pub fn serializer_for(id: &str) -> Result<&'static dyn PayloadSerializer, ValidationError> {
    match id {
        media_type::APPLICATION_JSON => Ok(&JSON),
        media_type::APPLICATION_XML => Ok(&XML),
        other => Err(ValidationError::new(format!(
            "no serializer found for `{other}`"
        ))),
    }
}

/// Resolves a deserializer by media-type id.
///
/// # Errors
///
/// Returns [`ValidationError`] when no deserializer is registered for `id`.
pub fn deserializer_for(id: &str) -> Result<&'static dyn PayloadDeserializer, ValidationError> {
    match id {
        media_type::APPLICATION_JSON => Ok(&JSON),
        media_type::APPLICATION_XML => Ok(&XML),
        other => Err(ValidationError::new(format!(
            "no deserializer found for `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_media_types() {
        assert_eq!(
            serializer_for(media_type::APPLICATION_JSON).unwrap().media_type(),
            media_type::APPLICATION_JSON
        );
        assert_eq!(
            deserializer_for(media_type::APPLICATION_XML).unwrap().media_type(),
            media_type::APPLICATION_XML
        );
    }

    #[test]
    fn unknown_media_type_is_a_validation_error() {
        let err = serializer_for("application/msgpack").unwrap_err();
        assert!(err.to_string().contains("no serializer found"));

        let err = deserializer_for("text/plain").unwrap_err();
        assert!(err.to_string().contains("no deserializer found"));
    }
}
