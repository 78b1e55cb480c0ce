//! Configuration for the HTTP transport.

use std::time::Duration;

use courier_core::error::ValidationError;

/// Everything the gateways and the saga store need at startup.
#[derive(Debug, Clone)]
pub struct CourierConfig {
    /// Bind address for the inbound gateway.
    pub host: String,
    /// Port to listen on. Required at startup; 0 is only meaningful in
    /// tests, where it asks the OS for an ephemeral port.
    pub port: u16,
    /// Upper bound on one outbound synchronous exchange.
    pub produce_timeout: Duration,
    /// How long a saga context stays visible before the sweep may evict it.
    pub saga_timeout: Duration,
    /// Maximum time an inbound request may spend in the pipeline.
    pub request_timeout: Duration,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            produce_timeout: Duration::from_secs(30),
            saga_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl CourierConfig {
    /// Checks that every required setting is present.
    ///
    /// The configuration surface treats absence and zero the same way, so
    /// an unset port or a zero timeout is a startup error.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the first missing setting.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::new("server port is not configured"));
        }
        if self.produce_timeout.is_zero() {
            return Err(ValidationError::new("producer timeout is not configured"));
        }
        if self.saga_timeout.is_zero() {
            return Err(ValidationError::new("saga timeout is not configured"));
        }
        if self.request_timeout.is_zero() {
            return Err(ValidationError::new("request timeout is not configured"));
        }
        Ok(())
    }
}
