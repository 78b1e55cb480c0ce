//! Courier core — event envelope, payload model, codecs, and subscription
//! metadata shared by every transport.

pub mod body;
pub mod codec;
pub mod error;
pub mod event;
pub mod handler;
pub mod saga;
pub mod schema;
pub mod subscription;

pub use body::Body;
pub use event::Event;
pub use handler::{handler_fn, EventHandler};
pub use saga::SagaContext;
pub use schema::{FieldDef, PayloadSchema, ValidationOutcome};
pub use subscription::{HttpSubscription, Method, SubscriptionInfo};
