//! Producer facade: the application-facing outbound API.
//!
//! Builds the outbound envelope (saga id from the scope's context, JSON
//! codecs, caller headers) and delegates the exchange to the gateway.

use std::collections::HashMap;
use std::sync::Arc;

use courier_core::body::Body;
use courier_core::error::ProduceError;
use courier_core::event::{Event, HEADER_DESERIALIZER, HEADER_METHOD, HEADER_SERIALIZER};
use courier_core::schema::PayloadSchema;
use courier_core::subscription::{media_type, Method};

use crate::context::{SagaContextStore, ScopeId};
use crate::outbound::OutboundGateway;

/// Outbound entry point handed to application code.
#[derive(Clone)]
pub struct Producer {
    gateway: OutboundGateway,
    store: Arc<SagaContextStore>,
}

impl Producer {
    /// Creates a producer over a gateway and the shared saga store.
    #[must_use]
    pub fn new(gateway: OutboundGateway, store: Arc<SagaContextStore>) -> Self {
        Self { gateway, store }
    }

    /// Sends a request and waits for its response payload.
    ///
    /// The event carries the scope's saga id, the given external headers,
    /// and JSON codecs on both sides. The response body is deserialized
    /// into `response_schema`'s model and returned.
    ///
    /// # Errors
    ///
    /// Surfaces every [`ProduceError`] of the synchronous outbound path.
    pub async fn produce_sync(
        &self,
        scope: ScopeId,
        address: &str,
        method: Method,
        payload: Body,
        headers: &HashMap<String, String>,
        response_schema: &PayloadSchema,
    ) -> Result<Body, ProduceError> {
        let event = self.build_event(scope, address, method, payload, headers);
        let response = self.gateway.produce(&event, Some(response_schema)).await?;
        Ok(response.into_payload())
    }

    /// Sends a request without awaiting a response.
    ///
    /// Returns as soon as the exchange is scheduled on a detached task.
    /// Failures are logged and discarded; the caller is never notified.
    /// The envelope is built like the synchronous one, with POST as the
    /// verb (the only one whose body rules always accept a payload).
    pub fn produce_async(
        &self,
        scope: ScopeId,
        address: &str,
        payload: Body,
        headers: &HashMap<String, String>,
    ) {
        let event = self.build_event(scope, address, Method::Post, payload, headers);
        self.gateway.produce_detached(event);
    }

    fn build_event(
        &self,
        scope: ScopeId,
        address: &str,
        method: Method,
        payload: Body,
        headers: &HashMap<String, String>,
    ) -> Event {
        let saga_id = self.store.saga_id(scope);
        let mut event = Event::new(saga_id, Some(address.to_string()), payload);
        for (key, value) in headers {
            event.add_external_header(key.clone(), value.clone());
        }
        event.add_internal_header(HEADER_METHOD, method.as_str());
        event.add_internal_header(HEADER_SERIALIZER, media_type::APPLICATION_JSON);
        event.add_internal_header(HEADER_DESERIALIZER, media_type::APPLICATION_JSON);
        event
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn producer_with_store() -> (Producer, Arc<SagaContextStore>) {
        let store = Arc::new(SagaContextStore::new(Duration::from_secs(30)));
        let gateway = OutboundGateway::new(Duration::from_secs(5)).unwrap();
        (Producer::new(gateway, Arc::clone(&store)), store)
    }

    #[test]
    fn envelope_carries_the_scopes_saga_id() {
        let (producer, store) = producer_with_store();
        let scope = store.next_scope();
        store.save_saga_id(scope, "saga-42");

        let event = producer.build_event(
            scope,
            "http://svc/orders",
            Method::Post,
            Body::Null,
            &HashMap::new(),
        );
        assert_eq!(event.saga_id(), Some("saga-42"));
        assert_eq!(event.address(), Some("http://svc/orders"));
        assert_eq!(event.internal_value(HEADER_METHOD), Some("POST"));
        assert_eq!(
            event.internal_value(HEADER_SERIALIZER),
            Some(media_type::APPLICATION_JSON)
        );
        assert_eq!(
            event.internal_value(HEADER_DESERIALIZER),
            Some(media_type::APPLICATION_JSON)
        );
    }

    #[test]
    fn envelope_without_context_has_no_saga_id() {
        let (producer, store) = producer_with_store();
        let scope = store.next_scope();
        let event = producer.build_event(
            scope,
            "http://svc/orders",
            Method::Get,
            Body::Null,
            &HashMap::new(),
        );
        assert_eq!(event.saga_id(), None);
    }

    #[test]
    fn caller_headers_become_external_headers() {
        let (producer, store) = producer_with_store();
        let scope = store.next_scope();
        let mut headers = HashMap::new();
        headers.insert("x-tenant".to_string(), "acme".to_string());

        let event = producer.build_event(
            scope,
            "http://svc/orders",
            Method::Post,
            Body::Null,
            &headers,
        );
        assert_eq!(event.external_value("x-tenant"), Some("acme"));
    }
}
