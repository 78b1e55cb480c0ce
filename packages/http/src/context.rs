//! Saga context store with time-based eviction.
//!
//! Process-shared table mapping a scope token to its saga context. Scope
//! tokens are allocated explicitly and passed along the call chain; there
//! is no ambient (thread-identity) keying. Request tasks and the single
//! background sweep share the map through `DashMap`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use courier_core::saga::SagaContext;

/// Grace period added to the configured saga timeout before eviction.
const EVICTION_GRACE: Duration = Duration::from_millis(100);
/// Sweep sleep while the store is empty.
const IDLE_SLEEP: Duration = Duration::from_secs(1);
/// Sweep sleep between scans while the store holds entries.
const SWEEP_SLEEP: Duration = Duration::from_millis(10);

/// Opaque token identifying one logical unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

/// Shared saga-context table plus its eviction sweep.
///
/// Each entry is logically owned by the scope that created it but is read
/// and removed concurrently by the sweep; `DashMap` makes that sharing
/// sound where the original design left it to chance.
pub struct SagaContextStore {
    entries: DashMap<ScopeId, SagaContext>,
    timeout: Duration,
    next_scope: AtomicU64,
    shutdown: watch::Sender<bool>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SagaContextStore {
    /// Creates a store whose entries expire `saga_timeout` plus a fixed
    /// 100 ms grace period after creation.
    #[must_use]
    pub fn new(saga_timeout: Duration) -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            entries: DashMap::new(),
            timeout: saga_timeout + EVICTION_GRACE,
            next_scope: AtomicU64::new(0),
            shutdown: tx,
            sweeper: Mutex::new(None),
        }
    }

    /// Allocates a fresh scope token. No entry is created until the scope
    /// first saves something.
    pub fn next_scope(&self) -> ScopeId {
        ScopeId(self.next_scope.fetch_add(1, Ordering::Relaxed))
    }

    /// Overwrites the full context for a scope.
    pub fn save_saga_context(&self, scope: ScopeId, context: SagaContext) {
        self.entries.insert(scope, context);
    }

    /// Sets the saga id for a scope, creating the context (stamped now)
    /// when absent. An existing context keeps its creation stamp.
    pub fn save_saga_id(&self, scope: ScopeId, saga_id: impl Into<String>) {
        self.entries
            .entry(scope)
            .or_default()
            .set_saga_id(saga_id.into());
    }

    /// Returns a snapshot of the scope's context, if present.
    #[must_use]
    pub fn saga_context(&self, scope: ScopeId) -> Option<SagaContext> {
        self.entries.get(&scope).map(|entry| entry.value().clone())
    }

    /// Returns the scope's saga id, if any.
    ///
    /// An absent context is not an error; it is logged at debug level.
    #[must_use]
    pub fn saga_id(&self, scope: ScopeId) -> Option<String> {
        match self.entries.get(&scope) {
            None => {
                debug!(scope = scope.0, "no saga context for scope");
                None
            }
            Some(entry) => entry.value().saga_id().map(ToString::to_string),
        }
    }

    /// Explicitly destroys the scope's context.
    pub fn remove(&self, scope: ScopeId) {
        self.entries.remove(&scope);
    }

    /// Number of live contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no contexts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Starts the background eviction sweep. A second call is a no-op.
    ///
    /// The sweep sleeps 1 s while the store is empty and 10 ms otherwise,
    /// then removes every entry older than the timeout. Shutdown is raced
    /// against the sleep, so stop latency is bounded by one interval.
    pub fn start(self: &Arc<Self>) {
        let mut guard = self.sweeper.lock();
        if guard.is_some() {
            debug!("saga sweep already running");
            return;
        }

        let store = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                let interval = if store.entries.is_empty() {
                    IDLE_SLEEP
                } else {
                    SWEEP_SLEEP
                };
                tokio::select! {
                    _ = shutdown.changed() => break,
                    () = tokio::time::sleep(interval) => {}
                }
                store.evict_expired();
            }
        });
        *guard = Some(handle);
    }

    /// Signals the sweep to stop and waits for it to exit.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);
        let handle = self.sweeper.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Removes every entry whose age exceeds the timeout.
    fn evict_expired(&self) {
        if self.entries.is_empty() {
            return;
        }
        let now = Instant::now();
        let expired: Vec<ScopeId> = self
            .entries
            .iter()
            .filter(|entry| entry.value().first_creation() + self.timeout < now)
            .map(|entry| *entry.key())
            .collect();
        if !expired.is_empty() {
            trace!(count = expired.len(), "evicting expired saga contexts");
            for scope in expired {
                self.entries.remove(&scope);
            }
        }
    }
}
