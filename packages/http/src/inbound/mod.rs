//! Inbound gateway: binds the route table to a listening transport.
//!
//! Follows a deferred-startup lifecycle: `new()` allocates state,
//! registrations accumulate into the route table, and `start()` binds the
//! listener and freezes the table. Registration after `start()` is a
//! lifecycle error; traffic only ever reads frozen routing state.

mod dispatch;
mod middleware;

use std::sync::Arc;

use axum::extract::Request;
use axum::routing::any;
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use courier_core::codec;
use courier_core::error::{LifecycleError, SubscribeError, ValidationError};
use courier_core::handler::EventHandler;
use courier_core::subscription::SubscriptionInfo;

use crate::config::CourierConfig;
use crate::lifecycle::{GatewayState, LifecycleController};
use crate::route::{compile, listening_pattern, normalize_source, Endpoint, RouteTable};

use dispatch::dispatch;
use middleware::build_http_layers;

/// HTTP inbound gateway.
///
/// Owns the route table exclusively. Handlers are invoked concurrently,
/// one tokio task per request, by the serving transport; the degree of
/// parallelism belongs to the transport, not to this gateway.
pub struct InboundGateway {
    config: CourierConfig,
    lifecycle: Arc<LifecycleController>,
    table: Mutex<RouteTable>,
    serve_handle: Mutex<Option<JoinHandle<()>>>,
}

impl InboundGateway {
    /// Creates a gateway without binding any port.
    #[must_use]
    pub fn new(config: CourierConfig) -> Self {
        Self {
            config,
            lifecycle: Arc::new(LifecycleController::new()),
            table: Mutex::new(RouteTable::new()),
            serve_handle: Mutex::new(None),
        }
    }

    /// Registers a handler for one route.
    ///
    /// Validates the subscription, resolves its codecs, compiles the
    /// template, and files the endpoint under its listening pattern.
    /// Registering a template with an already-registered shape is a
    /// silent no-op.
    ///
    /// # Errors
    ///
    /// [`LifecycleError`] once the gateway has started; [`ValidationError`]
    /// for incomplete metadata or unknown codec ids; [`RoutingError`] for a
    /// malformed template.
    ///
    /// [`RoutingError`]: courier_core::error::RoutingError
    pub fn subscribe_event(
        &self,
        info: SubscriptionInfo,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), SubscribeError> {
        if self.lifecycle.state() != GatewayState::Created {
            return Err(LifecycleError::new(
                "gateway already started; subscriptions must be registered before start()",
            )
            .into());
        }

        let SubscriptionInfo::Http(info) = info;
        if info.source.trim().is_empty() {
            return Err(ValidationError::new("source cannot be null or empty").into());
        }
        if info.serializer_id.trim().is_empty() {
            return Err(ValidationError::new("serializer cannot be null or empty").into());
        }
        if info.deserializer_id.trim().is_empty() {
            return Err(ValidationError::new("deserializer cannot be null or empty").into());
        }

        let serializer = codec::serializer_for(&info.serializer_id)?;
        let deserializer = codec::deserializer_for(&info.deserializer_id)?;

        let source = normalize_source(&info.source);
        let segments = compile(&source)?;
        let pattern = listening_pattern(&source);

        let endpoint = Endpoint::new(segments, info.model, serializer, deserializer, handler);
        let inserted = self.table.lock().insert(pattern, info.method, endpoint);
        if inserted {
            debug!(source = %source, method = %info.method, "subscribed endpoint");
        }
        Ok(())
    }

    /// Registers several routes at once.
    ///
    /// Not atomic: a failure partway through leaves earlier registrations
    /// in place.
    ///
    /// # Errors
    ///
    /// Propagates the first [`SubscribeError`] encountered.
    pub fn subscribe_events(
        &self,
        subscriptions: Vec<(SubscriptionInfo, Arc<dyn EventHandler>)>,
    ) -> Result<(), SubscribeError> {
        for (info, handler) in subscriptions {
            self.subscribe_event(info, handler)?;
        }
        Ok(())
    }

    /// Binds the configured address and starts serving.
    ///
    /// Freezes the route table, builds one transport route per listening
    /// pattern, and spawns the serve loop with graceful shutdown. Returns
    /// the bound port (which differs from the configured one when port 0
    /// requested an OS-assigned port).
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the gateway is not in the created
    /// state or the listener cannot bind.
    pub async fn start(&self) -> Result<u16, LifecycleError> {
        if self.lifecycle.state() != GatewayState::Created {
            return Err(LifecycleError::new("gateway cannot start twice"));
        }

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| LifecycleError::new(format!("failed to bind {addr}: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| LifecycleError::new(e.to_string()))?
            .port();

        let mut router = Router::new();
        for (pattern, group) in self.table.lock().freeze() {
            let path = axum_path(&pattern);
            router = router.route(
                &path,
                any(move |req: Request| dispatch(Arc::clone(&group), req)),
            );
        }
        let router = router.layer(build_http_layers(&self.config));

        let mut shutdown_rx = self.lifecycle.shutdown_receiver();
        let shutdown = async move {
            let _ = shutdown_rx.changed().await;
        };

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "inbound gateway serve loop failed");
            }
        });
        *self.serve_handle.lock() = Some(handle);
        self.lifecycle.set_started();

        info!(host = %self.config.host, port, "inbound gateway listening");
        Ok(port)
    }

    /// Signals shutdown and waits for the serve loop to drain.
    ///
    /// Future accepts are aborted; in-flight requests complete under
    /// axum's graceful drain.
    pub async fn stop(&self) {
        self.lifecycle.trigger_shutdown();
        let handle = self.serve_handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "serve task join failed");
            }
        }
        info!("inbound gateway stopped");
    }
}

/// Converts a listening pattern into the transport's route syntax.
///
/// A trailing `*` becomes axum's catch-all segment so every path under the
/// literal prefix reaches the group's dispatcher.
fn axum_path(pattern: &str) -> String {
    match pattern.strip_suffix('*') {
        Some(prefix) => format!("{prefix}{{*rest}}"),
        None => pattern.to_string(),
    }
}
