//! Per-request dispatch pipeline.
//!
//! One listener group serves every template sharing a listening pattern.
//! The pipeline resolves the endpoint, decodes the body into an event,
//! invokes the handler, and maps the response event back onto the wire.
//!
//! Failure semantics: a body that cannot be decoded or validated yields
//! 400; anything escaping the handler yields 500 with the error message;
//! a request no endpoint matches is dropped with an empty 200 and a debug
//! log only.

use std::sync::Arc;

use axum::body::{to_bytes, Body as ResponseBody};
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use http::{header, HeaderName, HeaderValue, StatusCode};
use tracing::{debug, error};

use courier_core::body::Body;
use courier_core::event::{Event, HEADER_HTTP_CODE, HEADER_METHOD, HEADER_REQUEST_URL};
use courier_core::schema::ValidationOutcome;
use courier_core::subscription::Method;

use crate::route::{Endpoint, ListenerGroup};

/// Serves one inbound request against a listener group.
pub(crate) async fn dispatch(group: Arc<ListenerGroup>, req: Request) -> Response {
    let Ok(method) = Method::parse(req.method().as_str()) else {
        debug!(method = %req.method(), "unsupported verb, request dropped");
        return StatusCode::OK.into_response();
    };
    let path = req.uri().path().to_string();

    let Some(endpoint) = group.resolve(method, &path) else {
        debug!(%path, "no handler registered, request dropped");
        return StatusCode::OK.into_response();
    };

    let query = req.uri().query().map(ToString::to_string);
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    let request_headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let bytes = match to_bytes(req.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(%path, error = %e, "request body unreadable");
            return (StatusCode::BAD_REQUEST, format!("Body malformed!\n{e}")).into_response();
        }
    };

    let payload = match decode_payload(&endpoint, &bytes) {
        Ok(payload) => payload,
        Err(cause) => {
            debug!(%path, %cause, "request body rejected");
            return (StatusCode::BAD_REQUEST, format!("Body malformed!\n{cause}"))
                .into_response();
        }
    };

    let mut event = Event::new(None, None, payload);
    for (key, value) in request_headers {
        event.add_external_header(key, value);
    }
    for (name, value) in endpoint.path_params(&path) {
        event.add_external_header(name, value);
    }
    if let Some(query) = &query {
        for (key, value) in parse_query(query) {
            event.add_external_header(key, value);
        }
    }
    let request_url = match &host {
        Some(host) => format!("http://{host}{path}"),
        None => path.clone(),
    };
    event.add_internal_header(HEADER_REQUEST_URL, request_url);
    event.add_internal_header(HEADER_METHOD, method.as_str());

    let response_event = match endpoint.handler().handle(event).await {
        Ok(event) => event,
        Err(e) => {
            error!(%path, error = %e, "handler failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let response = into_http_response(&endpoint, &response_event, &path);
    debug!(%path, "request processed");
    response
}

/// Decodes and validates the request body against the endpoint's model.
fn decode_payload(endpoint: &Endpoint, bytes: &[u8]) -> Result<Body, String> {
    let payload = endpoint
        .deserializer()
        .deserialize(bytes)
        .map_err(|e| e.reason)?;
    match endpoint.schema().validate(&payload) {
        ValidationOutcome::Valid => Ok(payload),
        ValidationOutcome::Invalid { errors } => Err(errors.join("\n")),
    }
}

/// Maps a response event onto an HTTP response.
///
/// Status comes from the internal `httpCode` header (default 200); every
/// external header except `httpCode` is copied onto the response; the
/// payload is serialized with the endpoint's serializer.
fn into_http_response(endpoint: &Endpoint, event: &Event, path: &str) -> Response {
    let code = event.internal_value(HEADER_HTTP_CODE).unwrap_or("200");
    let Some(status) = code
        .parse::<u16>()
        .ok()
        .and_then(|c| StatusCode::from_u16(c).ok())
    else {
        error!(%path, code, "invalid httpCode header on response event");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("invalid httpCode `{code}`"),
        )
            .into_response();
    };

    let body = match endpoint.serializer().serialize(event.payload()) {
        Ok(body) => body,
        Err(e) => {
            error!(%path, error = %e, "response serialization failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let mut response = Response::new(ResponseBody::from(body));
    *response.status_mut() = status;
    for (key, value) in event.external_headers() {
        if key.eq_ignore_ascii_case(HEADER_HTTP_CODE) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(key.as_str()),
            HeaderValue::from_str(&value),
        ) {
            response.headers_mut().append(name, value);
        }
    }
    response
}

/// Decodes a query string into external-header pairs, joining repeated
/// keys with `", "` in first-seen order.
fn parse_query(query: &str) -> Vec<(String, String)> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
    let mut merged: Vec<(String, String)> = Vec::new();
    for (key, value) in pairs {
        if let Some(entry) = merged.iter_mut().find(|entry| entry.0 == key) {
            entry.1.push_str(", ");
            entry.1.push_str(&value);
        } else {
            merged.push((key, value));
        }
    }
    merged
}
