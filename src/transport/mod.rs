//! The dependency contract on the native client library.
//!
//! Everything the bridge asks of the native client goes through
//! [`CommandTransport`]: one synchronous request/response primitive. The
//! production implementation lives behind the `ffi` feature; tests script
//! their own.

use bytes::Bytes;

use crate::error::TransportError;
use crate::protocol::{RequestType, Value};

/// Synchronous command channel into the native client.
///
/// Implementations must be callable from any thread; subscribe-class
/// requests block inside the native client until acknowledged.
pub trait CommandTransport: Send + Sync {
    /// Sends one command and waits for its reply.
    fn send_command(&self, request: RequestType, args: &[Bytes]) -> Result<Value, TransportError>;
}

impl std::fmt::Debug for dyn CommandTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CommandTransport")
    }
}
