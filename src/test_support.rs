//! Shared fixtures for unit tests: scripted transports and throwaway
//! clients wired to a fresh registry.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::client::Client;
use crate::error::TransportError;
use crate::protocol::{RequestType, Value};
use crate::pubsub::PubSubRegistry;
use crate::transport::CommandTransport;

/// Transport that acknowledges everything with `Value::Ok`.
struct NoopTransport;

impl CommandTransport for NoopTransport {
    fn send_command(&self, _request: RequestType, _args: &[Bytes]) -> Result<Value, TransportError> {
        Ok(Value::Ok)
    }
}

/// Transport that records every command and replies from a script.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<(RequestType, Vec<Bytes>)>>,
    /// Replies handed out front-to-back; `Value::Ok` once exhausted.
    replies: Mutex<Vec<Result<Value, TransportError>>>,
}

impl RecordingTransport {
    pub(crate) fn script(&self, reply: Result<Value, TransportError>) {
        self.replies.lock().push(reply);
    }

    /// Snapshot of every command sent so far, in order.
    pub(crate) fn sent(&self) -> Vec<(RequestType, Vec<Bytes>)> {
        self.sent.lock().clone()
    }
}

impl CommandTransport for RecordingTransport {
    fn send_command(&self, request: RequestType, args: &[Bytes]) -> Result<Value, TransportError> {
        self.sent.lock().push((request, args.to_vec()));
        let mut replies = self.replies.lock();
        if replies.is_empty() {
            Ok(Value::Ok)
        } else {
            replies.remove(0)
        }
    }
}

/// Transport that fails every command.
struct FailingTransport;

impl CommandTransport for FailingTransport {
    fn send_command(&self, request: RequestType, _args: &[Bytes]) -> Result<Value, TransportError> {
        Err(TransportError::Disconnect(request.command_name().to_string()))
    }
}

/// A client over a transport that acknowledges everything.
pub(crate) fn noop_client() -> Client {
    Client::new(Arc::new(NoopTransport), Arc::new(PubSubRegistry::new()))
}

/// A client whose transport records every command it is sent.
pub(crate) fn recording_client() -> (Client, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let client = Client::new(
        Arc::clone(&transport) as Arc<dyn CommandTransport>,
        Arc::new(PubSubRegistry::new()),
    );
    (client, transport)
}

/// A client whose transport fails every command.
pub(crate) fn failing_client() -> Client {
    Client::new(Arc::new(FailingTransport), Arc::new(PubSubRegistry::new()))
}
