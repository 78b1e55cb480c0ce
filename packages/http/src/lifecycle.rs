//! Gateway lifecycle control.
//!
//! Uses `ArcSwap` for lock-free state reads on the hot path (every
//! registration call checks the state) and a watch channel to signal
//! shutdown to the serve task.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::watch;

/// Gateway lifecycle state.
///
/// State machine: Created -> Started -> Stopped. Registration is only
/// legal in `Created`; traffic only flows in `Started`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    /// Constructed, accepting registrations, not yet bound.
    Created,
    /// Listener bound and serving; registrations are rejected.
    Started,
    /// Shutdown signalled; the listener is released.
    Stopped,
}

/// Tracks gateway state and fans out the shutdown signal.
#[derive(Debug)]
pub struct LifecycleController {
    state: ArcSwap<GatewayState>,
    shutdown: watch::Sender<bool>,
}

impl LifecycleController {
    /// Creates a controller in the `Created` state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            state: ArcSwap::from_pointee(GatewayState::Created),
            shutdown: tx,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> GatewayState {
        **self.state.load()
    }

    /// Returns `true` once `set_started` has run.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state() == GatewayState::Started
    }

    /// Transitions to `Started`.
    pub fn set_started(&self) {
        self.state.store(Arc::new(GatewayState::Started));
    }

    /// Transitions to `Stopped` and signals all shutdown receivers.
    pub fn trigger_shutdown(&self) {
        self.state.store(Arc::new(GatewayState::Stopped));
        // Ignore send errors -- receivers may have been dropped
        let _ = self.shutdown.send(true);
    }

    /// Returns a receiver that resolves when shutdown is triggered.
    #[must_use]
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_created_state() {
        let lifecycle = LifecycleController::new();
        assert_eq!(lifecycle.state(), GatewayState::Created);
        assert!(!lifecycle.is_started());
    }

    #[test]
    fn transitions_through_the_state_machine() {
        let lifecycle = LifecycleController::new();
        lifecycle.set_started();
        assert!(lifecycle.is_started());
        lifecycle.trigger_shutdown();
        assert_eq!(lifecycle.state(), GatewayState::Stopped);
    }

    #[tokio::test]
    async fn shutdown_signal_reaches_receivers() {
        let lifecycle = LifecycleController::new();
        let mut rx = lifecycle.shutdown_receiver();
        lifecycle.trigger_shutdown();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }
}
