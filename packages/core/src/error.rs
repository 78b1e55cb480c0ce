//! Error taxonomy for the middleware.
//!
//! Each failure domain gets its own type so callers can match on what went
//! wrong without string inspection. The umbrella enums [`SubscribeError`]
//! and [`ProduceError`] are the unions surfaced by the registration API
//! and the outbound synchronous path respectively.

use thiserror::Error;

/// Operation invalid for the current start/stop state.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LifecycleError {
    /// What was attempted and why the current state forbids it.
    pub message: String,
}

impl LifecycleError {
    /// Creates a lifecycle error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Malformed or incomplete subscription/request metadata.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Which piece of metadata failed and how.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Malformed path template.
#[derive(Debug, Error)]
#[error("malformed path template `{template}`: segment `{segment}` mixes literal and brace content")]
pub struct RoutingError {
    /// The full template that failed to compile.
    pub template: String,
    /// The offending segment.
    pub segment: String,
}

/// Illegal method/body combination or unresolvable method on outbound calls.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("GET request doesn't have a body")]
    BodyNotAllowed,
    #[error("PUT/POST requires a body")]
    BodyRequired,
    #[error("method can't be null or empty")]
    MissingMethod,
    #[error("unknown method `{value}`")]
    UnknownMethod { value: String },
    #[error("PATCH is not supported on the outbound path")]
    UnsupportedMethod,
    #[error("event has no address")]
    MissingAddress,
    #[error("invalid address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// Network-level send/receive failure, timeout, or unreachable remote.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {reason}")]
    Connect { reason: String },
    #[error("send/receive failed: {reason}")]
    Io { reason: String },
}

/// Payload could not be serialized.
#[derive(Debug, Error)]
#[error("serialization failed: {reason}")]
pub struct SerializationError {
    /// Codec-reported cause.
    pub reason: String,
}

/// Response or request body could not be parsed into the expected model.
#[derive(Debug, Error)]
#[error("deserialization failed: {reason}")]
pub struct DeserializationError {
    /// Codec- or schema-reported cause.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Umbrellas
// ---------------------------------------------------------------------------

/// Union of failures surfaced by the registration API.
///
/// All three are surfaced synchronously to the caller and never recovered
/// automatically.
#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
}

/// Union of failures surfaced by the outbound synchronous path.
///
/// The asynchronous path logs and discards all of these.
#[derive(Debug, Error)]
pub enum ProduceError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_messages_name_the_rule() {
        assert_eq!(
            RequestError::BodyNotAllowed.to_string(),
            "GET request doesn't have a body"
        );
        assert_eq!(
            RequestError::BodyRequired.to_string(),
            "PUT/POST requires a body"
        );
    }

    #[test]
    fn umbrellas_convert_from_leaves() {
        let err: SubscribeError = ValidationError::new("source cannot be empty").into();
        assert!(matches!(err, SubscribeError::Validation(_)));

        let err: ProduceError = TransportError::Timeout.into();
        assert!(matches!(err, ProduceError::Transport(TransportError::Timeout)));
    }

    #[test]
    fn routing_error_reports_segment() {
        let err = RoutingError {
            template: "/orders/{id".to_string(),
            segment: "{id".to_string(),
        };
        assert!(err.to_string().contains("{id"));
    }
}
