//! The event envelope exchanged between producers and consumers.
//!
//! An [`Event`] carries a correlation id (saga id), a destination address,
//! two metadata maps, and an opaque payload. Every transport builds and
//! consumes events; application code never sees wire-level types.

use std::collections::HashMap;

use crate::body::Body;

/// Reserved internal header: HTTP verb of the request.
pub const HEADER_METHOD: &str = "method";
/// Reserved internal header: media-type id of the payload serializer.
pub const HEADER_SERIALIZER: &str = "serializer";
/// Reserved internal header: media-type id of the payload deserializer.
pub const HEADER_DESERIALIZER: &str = "deserializer";
/// Reserved internal header: HTTP status code as a decimal string.
pub const HEADER_HTTP_CODE: &str = "httpCode";
/// Reserved internal header: full URL of the inbound request.
pub const HEADER_REQUEST_URL: &str = "request_url";

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// Metadata of an [`Event`].
///
/// The saga id and address are fixed at construction. Internal headers are
/// reserved for transport and protocol metadata; external headers mirror
/// wire-protocol headers and are exchanged verbatim with the remote side.
/// Both maps are add-only: keys can be inserted or overwritten, never
/// removed.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    saga_id: Option<String>,
    address: Option<String>,
    internal: HashMap<String, String>,
    external: HashMap<String, String>,
}

impl Headers {
    fn new(saga_id: Option<String>, address: Option<String>) -> Self {
        Self {
            saga_id,
            address,
            internal: HashMap::new(),
            external: HashMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// The communication envelope.
///
/// Construction takes everything that is immutable for the lifetime of the
/// event; headers accumulate afterwards through the add methods. No
/// validation happens here -- callers own the meaning of what they store.
#[derive(Debug, Clone)]
pub struct Event {
    headers: Headers,
    payload: Body,
}

impl Event {
    /// Creates an event with its correlation id, address, and payload.
    #[must_use]
    pub fn new(saga_id: Option<String>, address: Option<String>, payload: Body) -> Self {
        Self {
            headers: Headers::new(saga_id, address),
            payload,
        }
    }

    /// Correlation id threading together all events of one logical request.
    #[must_use]
    pub fn saga_id(&self) -> Option<&str> {
        self.headers.saga_id.as_deref()
    }

    /// Destination (or origin) address of this event.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.headers.address.as_deref()
    }

    /// Payload of this event.
    #[must_use]
    pub fn payload(&self) -> &Body {
        &self.payload
    }

    /// Consumes the event, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> Body {
        self.payload
    }

    /// Inserts or overwrites an internal (transport/protocol) header.
    pub fn add_internal_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.internal.insert(key.into(), value.into());
    }

    /// Inserts or overwrites an external (wire) header.
    pub fn add_external_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.external.insert(key.into(), value.into());
    }

    /// Returns the internal header value for `key`, if present.
    #[must_use]
    pub fn internal_value(&self, key: &str) -> Option<&str> {
        self.headers.internal.get(key).map(String::as_str)
    }

    /// Returns the external header value for `key`, if present.
    #[must_use]
    pub fn external_value(&self, key: &str) -> Option<&str> {
        self.headers.external.get(key).map(String::as_str)
    }

    /// Snapshot of the internal headers.
    ///
    /// The copy includes two synthetic entries, `id` and `address`, taken
    /// from the envelope itself. Either is omitted when unset.
    #[must_use]
    pub fn internal_headers(&self) -> HashMap<String, String> {
        let mut map = self.headers.internal.clone();
        if let Some(id) = &self.headers.saga_id {
            map.insert("id".to_string(), id.clone());
        }
        if let Some(address) = &self.headers.address {
            map.insert("address".to_string(), address.clone());
        }
        map
    }

    /// Snapshot of the external headers.
    #[must_use]
    pub fn external_headers(&self) -> HashMap<String, String> {
        self.headers.external.clone()
    }
}
