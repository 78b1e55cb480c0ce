//! Handler contract for inbound events.

use async_trait::async_trait;

use crate::event::Event;

/// Application-side processor for one registered route.
///
/// The gateway invokes `handle` once per matched request and serializes the
/// returned event as the response. Any error escaping the handler becomes a
/// 500 response carrying the error's message; it never crashes the gateway.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Processes an inbound event and produces the response event.
    async fn handle(&self, event: Event) -> anyhow::Result<Event>;
}

/// Adapts a closure into an [`EventHandler`].
///
/// Keeps small services and tests free of one-off trait impls.
pub struct FnHandler<F>(F);

/// Wraps a closure returning a ready result as an [`EventHandler`].
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(Event) -> anyhow::Result<Event> + Send + Sync,
{
    FnHandler(f)
}

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(Event) -> anyhow::Result<Event> + Send + Sync,
{
    async fn handle(&self, event: Event) -> anyhow::Result<Event> {
        (self.0)(event)
    }
}
