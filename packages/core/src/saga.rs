//! Saga correlation context model.

use std::time::Instant;

/// Correlation metadata for one logical end-to-end request.
///
/// Created implicitly the first time a scope stores a saga id, or
/// explicitly when a full context is saved. `first_creation` never changes
/// after construction; the eviction sweep measures entry age against it.
#[derive(Debug, Clone)]
pub struct SagaContext {
    saga_id: Option<String>,
    first_creation: Instant,
}

impl SagaContext {
    /// Creates an empty context stamped now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            saga_id: None,
            first_creation: Instant::now(),
        }
    }

    /// Creates a context with a saga id, stamped now.
    #[must_use]
    pub fn with_saga_id(saga_id: impl Into<String>) -> Self {
        Self {
            saga_id: Some(saga_id.into()),
            first_creation: Instant::now(),
        }
    }

    /// The correlation id, if one has been assigned.
    #[must_use]
    pub fn saga_id(&self) -> Option<&str> {
        self.saga_id.as_deref()
    }

    /// Replaces the correlation id without touching the creation stamp.
    pub fn set_saga_id(&mut self, saga_id: impl Into<String>) {
        self.saga_id = Some(saga_id.into());
    }

    /// When this context was first created.
    #[must_use]
    pub fn first_creation(&self) -> Instant {
        self.first_creation
    }
}

impl Default for SagaContext {
    fn default() -> Self {
        Self::new()
    }
}
