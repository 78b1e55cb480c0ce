//! Subscription metadata: what a consumer registers for an inbound route.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::schema::PayloadSchema;

/// Media-type identifiers understood by the codec registry.
pub mod media_type {
    /// JSON payloads.
    pub const APPLICATION_JSON: &str = "application/json";
    /// XML payloads.
    pub const APPLICATION_XML: &str = "application/xml";
}

/// HTTP verbs accepted at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    /// The wire representation of this verb.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }

    /// Parses a verb string.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MissingMethod`] for an empty or blank input
    /// and [`RequestError::UnknownMethod`] for anything unrecognized.
    pub fn parse(value: &str) -> Result<Self, RequestError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(RequestError::MissingMethod);
        }
        match trimmed {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            other => Err(RequestError::UnknownMethod {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SubscriptionInfo
// ---------------------------------------------------------------------------

/// Transport-specific registration metadata.
///
/// A closed set of transport kinds: the gateway pattern-matches on the
/// variant instead of downcasting, so registering the wrong kind fails
/// with a precise validation message rather than a generic type error.
#[derive(Debug, Clone)]
pub enum SubscriptionInfo {
    /// Subscription served by the HTTP inbound gateway.
    Http(HttpSubscription),
}

/// Everything the HTTP gateway needs to serve one route.
#[derive(Debug, Clone)]
pub struct HttpSubscription {
    /// Path template of the expected request (e.g. `/orders/{id}`).
    pub source: String,
    /// Expected verb for this route.
    pub method: Method,
    /// Model the request body is deserialized into.
    pub model: PayloadSchema,
    /// Media-type id of the response serializer.
    pub serializer_id: String,
    /// Media-type id of the request deserializer.
    pub deserializer_id: String,
}

impl HttpSubscription {
    /// Creates a subscription with JSON codecs on both sides.
    #[must_use]
    pub fn json(source: impl Into<String>, method: Method, model: PayloadSchema) -> Self {
        Self {
            source: source.into(),
            method,
            model,
            serializer_id: media_type::APPLICATION_JSON.to_string(),
            deserializer_id: media_type::APPLICATION_JSON.to_string(),
        }
    }
}
