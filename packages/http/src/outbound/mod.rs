//! Outbound gateway: turns events into HTTP requests and back.
//!
//! One hop, no retries. The synchronous path surfaces every failure as a
//! typed error; the detached path logs and discards them all -- that
//! fire-and-forget contract is deliberate and callers must never be
//! notified.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error};

use courier_core::body::Body;
use courier_core::codec;
use courier_core::error::{
    DeserializationError, ProduceError, RequestError, SerializationError, TransportError,
};
use courier_core::event::{
    Event, HEADER_DESERIALIZER, HEADER_HTTP_CODE, HEADER_METHOD, HEADER_SERIALIZER,
};
use courier_core::schema::{PayloadSchema, ValidationOutcome};
use courier_core::subscription::{media_type, Method};

/// HTTP outbound gateway.
///
/// Cheap to clone: the underlying client shares its connection pool. The
/// configured timeout bounds every synchronous exchange.
#[derive(Clone)]
pub struct OutboundGateway {
    client: Client,
}

impl OutboundGateway {
    /// Builds a gateway whose requests time out after `produce_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the HTTP client cannot be built.
    pub fn new(produce_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(produce_timeout)
            .build()
            .map_err(|e| TransportError::Io {
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Sends an event synchronously and reconstructs the response event.
    ///
    /// The verb comes from the internal `method` header, the target from
    /// the event's address. With a `response_schema` the response body is
    /// deserialized with the declared deserializer and validated; without
    /// one it is kept as raw text.
    ///
    /// # Errors
    ///
    /// [`RequestError`] for an illegal method/body combination, an
    /// unresolvable method, or a missing/invalid address;
    /// [`TransportError`] for timeouts and network failures;
    /// [`SerializationError`] / [`DeserializationError`] for codec
    /// failures on either side of the exchange.
    pub async fn produce(
        &self,
        event: &Event,
        response_schema: Option<&PayloadSchema>,
    ) -> Result<Event, ProduceError> {
        let method = resolve_method(event)?;
        let address = event.address().ok_or(RequestError::MissingAddress)?;
        let url = reqwest::Url::parse(address).map_err(|e| RequestError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        let request = self.build_request(method, url, event)?;

        debug!(%address, method = %method, "sending outbound request");
        let response = request.send().await.map_err(into_transport_error)?;

        let status = response.status().as_u16();
        let mut headers: Vec<(String, String)> = Vec::new();
        for name in response.headers().keys() {
            let joined = response
                .headers()
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect::<Vec<_>>()
                .join(", ");
            headers.push((name.as_str().to_string(), joined));
        }

        let bytes = response.bytes().await.map_err(into_transport_error)?;
        let payload = decode_response(event, &bytes, response_schema)?;

        let mut response_event = Event::new(None, None, payload);
        response_event.add_internal_header(HEADER_HTTP_CODE, status.to_string());
        for (key, value) in headers {
            response_event.add_external_header(key, value);
        }
        Ok(response_event)
    }

    /// Sends an event on a detached task; the caller is never notified.
    ///
    /// Scheduling is unbounded: every call spawns an independent task and
    /// returns immediately. Failures are logged at error level and
    /// discarded by design.
    pub fn produce_detached(&self, event: Event) {
        let gateway = self.clone();
        tokio::spawn(async move {
            if let Err(e) = gateway.produce(&event, None).await {
                error!(
                    address = event.address().unwrap_or("<none>"),
                    error = %e,
                    "async produce failed"
                );
            }
        });
    }

    /// Applies the method/body rules and assembles the request.
    fn build_request(
        &self,
        method: Method,
        url: reqwest::Url,
        event: &Event,
    ) -> Result<reqwest::RequestBuilder, ProduceError> {
        let has_body = !event.payload().is_null();
        match method {
            Method::Get if has_body => return Err(RequestError::BodyNotAllowed.into()),
            Method::Post | Method::Put if !has_body => {
                return Err(RequestError::BodyRequired.into())
            }
            _ => {}
        }

        let mut request = self.client.request(into_reqwest_method(method), url);
        for (key, value) in event.external_headers() {
            request = request.header(key, value);
        }

        if has_body {
            let serializer_id = event
                .internal_value(HEADER_SERIALIZER)
                .unwrap_or(media_type::APPLICATION_JSON);
            request = request.header(http::header::CONTENT_TYPE, serializer_id);
            request = request.body(encode_body(event.payload(), serializer_id)?);
        }
        Ok(request)
    }
}

/// Resolves the verb from the internal `method` header.
///
/// PATCH is accepted at registration but has no outbound construction
/// branch; it fails fast here instead of falling through.
fn resolve_method(event: &Event) -> Result<Method, RequestError> {
    let value = event
        .internal_value(HEADER_METHOD)
        .ok_or(RequestError::MissingMethod)?;
    let method = Method::parse(value)?;
    if method == Method::Patch {
        return Err(RequestError::UnsupportedMethod);
    }
    Ok(method)
}

fn into_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
    }
}

fn into_transport_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect {
            reason: e.to_string(),
        }
    } else {
        TransportError::Io {
            reason: e.to_string(),
        }
    }
}

/// Serializes an outbound payload. Raw text passes through unchanged.
fn encode_body(payload: &Body, serializer_id: &str) -> Result<Vec<u8>, ProduceError> {
    if let Body::Text(raw) = payload {
        return Ok(raw.clone().into_bytes());
    }
    let serializer = codec::serializer_for(serializer_id).map_err(|e| SerializationError {
        reason: e.to_string(),
    })?;
    Ok(serializer.serialize(payload)?)
}

/// Decodes a response body into the declared model, or keeps it raw when
/// no model was declared (the fire-and-forget path).
fn decode_response(
    request_event: &Event,
    bytes: &[u8],
    response_schema: Option<&PayloadSchema>,
) -> Result<Body, ProduceError> {
    let Some(schema) = response_schema else {
        return Ok(Body::Text(String::from_utf8_lossy(bytes).into_owned()));
    };

    let deserializer_id = request_event
        .internal_value(HEADER_DESERIALIZER)
        .unwrap_or(media_type::APPLICATION_JSON);
    let deserializer =
        codec::deserializer_for(deserializer_id).map_err(|e| DeserializationError {
            reason: e.to_string(),
        })?;

    let payload = deserializer.deserialize(bytes)?;
    match schema.validate(&payload) {
        ValidationOutcome::Valid => Ok(payload),
        ValidationOutcome::Invalid { errors } => Err(DeserializationError {
            reason: errors.join("; "),
        }
        .into()),
    }
}
