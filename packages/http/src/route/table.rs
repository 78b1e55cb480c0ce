//! Route table: listening-pattern groups of compiled endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use courier_core::subscription::Method;
use tracing::debug;

use super::endpoint::{Endpoint, Segment};

/// Endpoints sharing one listening pattern, split per method.
///
/// Within a method, endpoints keep their registration order and the first
/// structural match wins; there is no ranking by specificity.
#[derive(Debug, Default)]
pub struct ListenerGroup {
    by_method: HashMap<Method, Vec<Arc<Endpoint>>>,
}

impl ListenerGroup {
    /// Adds an endpoint unless one with the same segment shape is already
    /// registered under the method. Returns `false` on that silent no-op.
    pub fn add(&mut self, method: Method, endpoint: Endpoint) -> bool {
        let endpoints = self.by_method.entry(method).or_default();
        if endpoints.iter().any(|e| e.same_shape(endpoint.segments())) {
            return false;
        }
        endpoints.push(Arc::new(endpoint));
        true
    }

    /// Resolves a concrete request to the first matching endpoint.
    #[must_use]
    pub fn resolve(&self, method: Method, path: &str) -> Option<Arc<Endpoint>> {
        self.by_method
            .get(&method)?
            .iter()
            .find(|endpoint| endpoint.matches(path))
            .cloned()
    }

    /// Total number of endpoints across all methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_method.values().map(Vec::len).sum()
    }

    /// Whether the group holds no endpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The full routing state of an inbound gateway before it starts.
///
/// Owned exclusively by the gateway: mutated only during registration,
/// then frozen into per-group `Arc`s when the listener binds.
#[derive(Debug, Default)]
pub struct RouteTable {
    groups: HashMap<String, ListenerGroup>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an endpoint under its listening pattern.
    ///
    /// Returns `false` when an endpoint with the same shape already exists
    /// for the method (idempotent registration).
    pub fn insert(&mut self, pattern: String, method: Method, endpoint: Endpoint) -> bool {
        let inserted = self.groups.entry(pattern).or_default().add(method, endpoint);
        if !inserted {
            debug!(method = %method, "duplicate route shape ignored");
        }
        inserted
    }

    /// Number of listening patterns.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of registered endpoints.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.groups.values().map(ListenerGroup::len).sum()
    }

    /// Drains the table into shareable per-pattern groups for the serve
    /// task. Called once, after the listener has bound successfully.
    #[must_use]
    pub fn freeze(&mut self) -> Vec<(String, Arc<ListenerGroup>)> {
        self.groups
            .drain()
            .map(|(pattern, group)| (pattern, Arc::new(group)))
            .collect()
    }
}
