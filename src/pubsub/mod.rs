//! Pub/sub bridge: the concurrent pipeline between the native client's
//! delivery thread and the host's blocking consumer.
//!
//! A push message travels: native delivery thread → [`sink::deliver`] →
//! the owning [`SubscriptionSession`]'s queue → [`consumer::run`] on the
//! host thread → host handler. The [`PubSubRegistry`] ties identities to
//! sessions and owns their lifecycle.

pub mod consumer;
mod message;
mod registry;
mod session;
pub mod sink;

pub use message::{PushKind, PushMessage};
pub use registry::PubSubRegistry;
pub use session::{MessageHandler, SubscriptionSession};
