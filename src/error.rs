//! Error types for pontifex.
//!
//! Faults are split along the boundary they occur at: usage errors are
//! raised before any request reaches the native client, transport errors
//! carry whatever the native client reported back.

use thiserror::Error;

/// Result type alias for pontifex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pontifex.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller misuse detected before any command was sent
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),

    /// The native client reported a failure for a command round-trip
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Errors raised by the bridge itself, with no state mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// A subscribe-class call arrived while the client's consumption loop
    /// is already parked on this connection
    #[error("client is in subscribe mode; only unsubscribe commands are allowed")]
    SubscribeMode,

    /// PUBSUB dispatcher received a subcommand it does not know
    #[error("unknown PUBSUB subcommand '{0}'")]
    UnknownSubcommand(String),

    /// A subcommand that needs an argument was called without one
    #[error("PUBSUB {subcommand} requires {what}")]
    MissingArgument {
        /// Subcommand name (uppercase)
        subcommand: &'static str,
        /// Description of the missing argument
        what: &'static str,
    },
}

/// Failures reported by the native client for a synchronous command.
///
/// The variants mirror the native adapter's error taxonomy; the payload is
/// the error message it supplied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Catch-all request failure
    #[error("request failed: {0}")]
    Unspecified(String),

    /// The request timed out inside the native client
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The connection dropped mid-request
    #[error("connection lost: {0}")]
    Disconnect(String),

    /// A transaction was aborted by the server
    #[error("transaction aborted: {0}")]
    ExecAbort(String),

    /// The reply arrived but had a shape the command cannot use
    #[error("unexpected response type for '{command}'")]
    UnexpectedResponse {
        /// Command that received the malformed reply
        command: &'static str,
    },
}

impl Error {
    /// Returns true if this error was raised before any command was sent.
    #[inline]
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }

    /// Returns true if this error came back from the native client.
    #[inline]
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Returns true if retrying the same call could succeed.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(TransportError::Timeout(_))
                | Error::Transport(TransportError::Disconnect(_))
        )
    }
}
