//! Identity → session registry.
//!
//! One registry instance is the lifecycle root for every session it holds.
//! It is plain owned state, injected into the orchestration and sink entry
//! points; the `ffi` module owns a process-wide instance for the native
//! callback path.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::client::{Client, ClientId};
use crate::pubsub::session::{MessageHandler, SubscriptionSession};

/// Concurrent map of active pub/sub sessions, keyed by client identity.
///
/// Lookups and inserts race only across identities; per-identity traffic is
/// serialized by the session's own mutex. Contention here scales with
/// active-session count, not message volume.
#[derive(Debug, Default)]
pub struct PubSubRegistry {
    sessions: DashMap<ClientId, Arc<SubscriptionSession>>,
}

impl PubSubRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        PubSubRegistry {
            sessions: DashMap::new(),
        }
    }

    /// Creates and stores a session for this client identity, retaining the
    /// client handle and handler for the session's duration.
    ///
    /// A session already present under the identity is closed and replaced;
    /// callers are expected to unregister first, so the replacement is
    /// logged as a probable usage bug.
    pub fn register(&self, client: Client, handler: MessageHandler) -> Arc<SubscriptionSession> {
        let id = client.id();
        let session = Arc::new(SubscriptionSession::new(client, handler));
        if let Some(prior) = self.sessions.insert(id, Arc::clone(&session)) {
            warn!(client = %id, "replacing existing pub/sub session");
            prior.close();
        }
        debug!(client = %id, "registered pub/sub session");
        session
    }

    /// Looks up the session for a client identity.
    pub fn find(&self, id: ClientId) -> Option<Arc<SubscriptionSession>> {
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Tears down and removes the session for a client identity.
    ///
    /// The session is deactivated and its parked consumer woken before the
    /// entry is dropped. Unregistering an absent identity is a no-op.
    pub fn unregister(&self, id: ClientId) {
        if let Some((_, session)) = self.sessions.remove(&id) {
            session.close();
            debug!(client = %id, "unregistered pub/sub session");
        }
    }

    /// Whether the identity's consumption loop is currently running.
    pub fn in_blocking_mode(&self, id: ClientId) -> bool {
        self.find(id).is_some_and(|s| s.in_blocking_mode())
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Tears down every remaining session.
    ///
    /// Module-teardown path; must not race register/find/unregister.
    pub fn shutdown(&self) {
        self.sessions.retain(|id, session| {
            debug!(client = %id, "closing pub/sub session at shutdown");
            session.close();
            false
        });
    }
}

impl Drop for PubSubRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}
