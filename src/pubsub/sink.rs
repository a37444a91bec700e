//! Async delivery sink.
//!
//! Entry point for the native client's background delivery thread. Runs
//! concurrently with the consumption loop and with orchestration calls on
//! other identities; it never blocks on anything but the session's queue
//! mutex and never raises — a message it cannot place is dropped.

use tracing::trace;

use crate::client::ClientId;
use crate::pubsub::message::{PushKind, PushMessage};
use crate::pubsub::registry::PubSubRegistry;

/// Copies one push notification into the owning session's queue and wakes
/// the consumer.
///
/// The `channel`/`payload`/`pattern` buffers are only valid for the
/// duration of the call; the queued node owns deep copies. Returns true
/// when the message was queued, false when it was dropped:
/// control-traffic kinds, an unknown identity, or a session already torn
/// down — all benign races under concurrent teardown.
pub fn deliver(
    registry: &PubSubRegistry,
    id: ClientId,
    kind: PushKind,
    channel: &[u8],
    payload: &[u8],
    pattern: Option<&[u8]>,
) -> bool {
    if !kind.is_message() {
        trace!(client = %id, ?kind, "ignoring non-message push");
        return false;
    }

    let Some(session) = registry.find(id) else {
        trace!(client = %id, "push for unknown client dropped");
        return false;
    };

    let msg = PushMessage::copied(kind, channel, payload, pattern);
    if session.enqueue(msg) {
        trace!(client = %id, channel = ?String::from_utf8_lossy(channel), "queued push message");
        true
    } else {
        trace!(client = %id, "push for inactive session dropped");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::noop_client;
    use bytes::Bytes;
    use std::sync::Arc;

    #[test]
    fn test_deliver_queues_message() {
        let registry = PubSubRegistry::new();
        let client = noop_client();
        let id = client.id();
        let session = registry.register(client, Arc::new(|_, _, _, _| {}));
        session.add_subscriptions([Bytes::from_static(b"news")]);

        assert!(deliver(&registry, id, PushKind::Message, b"news", b"hello", None));
        assert_eq!(session.queued_len(), 1);
    }

    #[test]
    fn test_deliver_ignores_control_kinds() {
        let registry = PubSubRegistry::new();
        let client = noop_client();
        let id = client.id();
        let session = registry.register(client, Arc::new(|_, _, _, _| {}));

        assert!(!deliver(&registry, id, PushKind::Subscribe, b"news", b"1", None));
        assert!(!deliver(&registry, id, PushKind::Disconnection, b"", b"", None));
        assert_eq!(session.queued_len(), 0);
    }

    #[test]
    fn test_deliver_to_unknown_identity_is_silent() {
        let registry = PubSubRegistry::new();
        let ghost = noop_client().id();
        assert!(!deliver(&registry, ghost, PushKind::Message, b"news", b"x", None));
    }

    #[test]
    fn test_deliver_after_teardown_is_dropped() {
        let registry = PubSubRegistry::new();
        let client = noop_client();
        let id = client.id();
        let session = registry.register(client, Arc::new(|_, _, _, _| {}));
        session.deactivate();

        assert!(!deliver(&registry, id, PushKind::Message, b"news", b"late", None));
        assert_eq!(session.queued_len(), 0);
    }

    #[test]
    fn test_deliver_carries_pattern() {
        let registry = PubSubRegistry::new();
        let client = noop_client();
        let id = client.id();
        let session = registry.register(client, Arc::new(|_, _, _, _| {}));
        session.add_subscriptions([Bytes::from_static(b"ch.*")]);

        assert!(deliver(&registry, id, PushKind::PMessage, b"ch.1", b"x", Some(b"ch.*")));
        let queued = session.wait_next().unwrap();
        assert_eq!(queued.pattern.as_deref(), Some(&b"ch.*"[..]));
    }
}
