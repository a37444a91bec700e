//! # Pontifex
//!
//! An embedding bridge for a native Valkey/Redis client library.
//!
//! The native library owns connections, cluster topology, and the wire
//! protocol; pontifex owns the part that cannot be delegated to it — the
//! pub/sub delivery pipeline between the native client's background
//! delivery thread and a host runtime with a synchronous, blocking
//! consumption model:
//!
//! - per-connection subscription sessions with a mutex + condition-variable
//!   message queue
//! - an async delivery sink safe to call from any foreign thread
//! - a blocking consumption loop with strict FIFO delivery and
//!   wake-on-teardown cancellation
//! - subscribe/unsubscribe/publish orchestration and PUBSUB introspection
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use pontifex::{Client, PubSubRegistry};
//! # fn transport() -> Arc<dyn pontifex::CommandTransport> { unimplemented!() }
//!
//! let registry = Arc::new(PubSubRegistry::new());
//! let client = Client::new(transport(), registry);
//!
//! // Blocks until every channel is unsubscribed.
//! client.subscribe(
//!     &[Bytes::from_static(b"news")],
//!     Arc::new(|_client, channel, payload, _pattern| {
//!         println!("{:?}: {:?}", channel, payload);
//!     }),
//!     0,
//! )?;
//! # pontifex::Result::Ok(())
//! ```

#![warn(
    clippy::all,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_lifetimes,
    unused_qualifications
)]

// ─────────────────────────────────────────────────────────────────────────────
// Modules
// ─────────────────────────────────────────────────────────────────────────────

/// Client handle and host-visible command surface.
pub mod client;
/// Pub/sub command orchestration.
mod commands;
/// Error types and result aliases.
pub mod error;
/// Request types and reply values for the native call convention.
pub mod protocol;
/// Session, registry, sink, and consumption loop.
pub mod pubsub;
/// The dependency contract on the native client.
pub mod transport;

/// Raw bindings to the native client adapter.
#[cfg(feature = "ffi")]
pub mod ffi;

/// OpenTelemetry integration (optional).
#[cfg(feature = "telemetry")]
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

// ─────────────────────────────────────────────────────────────────────────────
// Common Re-exports
// ─────────────────────────────────────────────────────────────────────────────

// Error handling
pub use error::{Error, Result, TransportError, UsageError};

// Protocol
pub use protocol::{RequestType, Value};

// Client
pub use client::{Client, ClientId};

// Pub/sub
pub use pubsub::{MessageHandler, PubSubRegistry, PushKind, PushMessage};

// Transport
pub use transport::CommandTransport;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Crate version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Timeout argument appended to unsubscribe-class commands.
pub(crate) const UNSUBSCRIBE_TIMEOUT_ARG: &[u8] = b"0";
