//! Application context: one struct owning every middleware component.
//!
//! Replaces process-wide singletons with an explicitly constructed
//! context: build it once at startup, share handles with whoever needs
//! them. Components start in dependency order (saga sweep before the
//! listener) and stop in reverse.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use courier_core::error::{LifecycleError, SubscribeError, TransportError, ValidationError};
use courier_core::handler::EventHandler;
use courier_core::subscription::SubscriptionInfo;

use crate::config::CourierConfig;
use crate::context::SagaContextStore;
use crate::inbound::InboundGateway;
use crate::outbound::OutboundGateway;
use crate::producer::Producer;

/// Failures surfaced by [`Application::start`].
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// The assembled middleware: inbound gateway, producer, saga store.
pub struct Application {
    config: CourierConfig,
    inbound: InboundGateway,
    producer: Producer,
    store: Arc<SagaContextStore>,
}

impl Application {
    /// Wires the components from one configuration.
    ///
    /// Nothing binds or spawns here; [`Application::start`] does.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the outbound HTTP client cannot be
    /// built.
    pub fn new(config: CourierConfig) -> Result<Self, TransportError> {
        let store = Arc::new(SagaContextStore::new(config.saga_timeout));
        let outbound = OutboundGateway::new(config.produce_timeout)?;
        let producer = Producer::new(outbound, Arc::clone(&store));
        let inbound = InboundGateway::new(config.clone());
        Ok(Self {
            config,
            inbound,
            producer,
            store,
        })
    }

    /// Registers a handler for one route. Must run before `start()`.
    ///
    /// # Errors
    ///
    /// Propagates the gateway's [`SubscribeError`].
    pub fn subscribe_event(
        &self,
        info: SubscriptionInfo,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), SubscribeError> {
        self.inbound.subscribe_event(info, handler)
    }

    /// Registers several routes. Not atomic.
    ///
    /// # Errors
    ///
    /// Propagates the first [`SubscribeError`] encountered.
    pub fn subscribe_events(
        &self,
        subscriptions: Vec<(SubscriptionInfo, Arc<dyn EventHandler>)>,
    ) -> Result<(), SubscribeError> {
        self.inbound.subscribe_events(subscriptions)
    }

    /// Validates the configuration, starts the saga sweep, and binds the
    /// inbound listener. Returns the bound port.
    ///
    /// # Errors
    ///
    /// [`StartError::Validation`] for an incomplete configuration,
    /// [`StartError::Lifecycle`] when the listener cannot bind or the
    /// application already started.
    pub async fn start(&self) -> Result<u16, StartError> {
        self.config.validate()?;
        self.store.start();
        let port = self.inbound.start().await?;
        info!(port, "application started");
        Ok(port)
    }

    /// Stops the components in reverse start order.
    pub async fn stop(&self) {
        self.inbound.stop().await;
        self.store.stop().await;
        info!("application stopped");
    }

    /// The outbound entry point for application code.
    #[must_use]
    pub fn producer(&self) -> &Producer {
        &self.producer
    }

    /// The shared saga-context store.
    #[must_use]
    pub fn saga_store(&self) -> &Arc<SagaContextStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use courier_core::body::Body;
    use courier_core::event::{Event, HEADER_HTTP_CODE};
    use courier_core::handler::handler_fn;
    use courier_core::schema::PayloadSchema;
    use courier_core::subscription::{HttpSubscription, Method};

    use super::*;

    /// Asks the OS for a currently-free port. The tiny window between
    /// releasing and rebinding it is acceptable in tests.
    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    fn test_config(port: u16) -> CourierConfig {
        CourierConfig {
            host: "127.0.0.1".to_string(),
            port,
            produce_timeout: Duration::from_secs(5),
            saga_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn start_rejects_unconfigured_port() {
        let app = Application::new(test_config(0)).unwrap();
        let err = app.start().await.unwrap_err();
        assert!(matches!(err, StartError::Validation(_)));
    }

    #[tokio::test]
    async fn full_request_response_round_trip() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("courier_http=debug")
            .try_init();

        let port = free_port();
        let app = Application::new(test_config(port)).unwrap();

        let handler = handler_fn(|event: Event| {
            let id = event
                .payload()
                .get("id")
                .and_then(Body::as_text)
                .unwrap_or("?")
                .to_string();
            let mut payload = std::collections::BTreeMap::new();
            payload.insert("status".to_string(), Body::Text("accepted".to_string()));
            payload.insert("id".to_string(), Body::Text(id));
            let mut response = Event::new(None, None, Body::Map(payload));
            response.add_internal_header(HEADER_HTTP_CODE, "201");
            Ok(response)
        });
        app.subscribe_event(
            SubscriptionInfo::Http(HttpSubscription::json(
                "/orders",
                Method::Post,
                PayloadSchema::new("Order").field("id", true),
            )),
            Arc::new(handler),
        )
        .unwrap();

        let bound = app.start().await.unwrap();
        assert_eq!(bound, port);

        let scope = app.saga_store().next_scope();
        let saga_id = uuid::Uuid::new_v4().to_string();
        app.saga_store().save_saga_id(scope, saga_id.clone());
        assert_eq!(app.saga_store().saga_id(scope), Some(saga_id));

        let mut order = std::collections::BTreeMap::new();
        order.insert("id".to_string(), Body::Text("42".to_string()));

        let response = app
            .producer()
            .produce_sync(
                scope,
                &format!("http://127.0.0.1:{port}/orders"),
                Method::Post,
                Body::Map(order),
                &HashMap::new(),
                &PayloadSchema::new("Ack").field("status", true),
            )
            .await
            .unwrap();

        assert_eq!(
            response.get("status").and_then(Body::as_text),
            Some("accepted")
        );
        assert_eq!(response.get("id").and_then(Body::as_text), Some("42"));

        app.stop().await;
    }

    #[tokio::test]
    async fn produce_sync_surfaces_request_errors() {
        let app = Application::new(test_config(free_port())).unwrap();
        let scope = app.saga_store().next_scope();

        let err = app
            .producer()
            .produce_sync(
                scope,
                "http://127.0.0.1:9/x",
                Method::Get,
                Body::Text("unexpected".to_string()),
                &HashMap::new(),
                &PayloadSchema::any("Any"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            courier_core::error::ProduceError::Request(
                courier_core::error::RequestError::BodyNotAllowed
            )
        ));
    }
}
