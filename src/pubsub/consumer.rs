//! Blocking consumption loop.
//!
//! Runs on the thread that called subscribe and owns it until the session
//! leaves its running state. The only suspension point is the session's
//! condition variable; handler invocation happens with no locks held.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::protocol::RequestType;
use crate::pubsub::session::SubscriptionSession;

/// Drains the session queue in FIFO order, dispatching each message to the
/// host handler, until the session deactivates or its subscribed set
/// empties. Never re-entered for the same session.
///
/// On exit the remaining server-side subscriptions are dropped with a
/// `cleanup` unsubscribe-class request — this covers the
/// drained-to-zero path where the host never explicitly unsubscribed —
/// and the session is unregistered.
pub fn run(session: &Arc<SubscriptionSession>, cleanup: RequestType) {
    let client = session.owner().clone();
    session.set_blocking_mode(true);
    debug!(client = %client.id(), "entering pub/sub consumption loop");

    while session.should_run() {
        if let Some(msg) = session.wait_next() {
            session.dispatch(msg);
        }
    }

    // Best-effort server-side cleanup; the session is torn down regardless.
    if let Err(err) = client.transport().send_command(cleanup, &[]) {
        warn!(client = %client.id(), command = %cleanup, %err, "cleanup unsubscribe failed");
    }

    session.set_blocking_mode(false);
    client.registry().unregister(client.id());
    debug!(client = %client.id(), "left pub/sub consumption loop");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::message::{PushKind, PushMessage};
    use crate::pubsub::session::MessageHandler;
    use crate::test_support::{failing_client, recording_client};
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::time::Duration;

    fn msg(payload: &[u8]) -> PushMessage {
        PushMessage::copied(PushKind::Message, b"news", payload, None)
    }

    #[test]
    fn test_loop_exits_immediately_with_no_subscriptions() {
        let (client, transport) = recording_client();
        let registry = client.registry().clone();
        let session = registry.register(client, Arc::new(|_, _, _, _| {}));

        run(&session, RequestType::Unsubscribe);

        assert!(!session.in_blocking_mode());
        assert!(registry.is_empty());
        // Cleanup unsubscribe is issued even for an empty session.
        assert_eq!(transport.sent(), vec![(RequestType::Unsubscribe, vec![])]);
    }

    #[test]
    fn test_loop_dispatches_queued_then_exits_on_deactivate() {
        let (client, _transport) = recording_client();
        let registry = client.registry().clone();

        let seen: Arc<Mutex<Vec<Bytes>>> = Arc::new(Mutex::new(Vec::new()));
        let handler: MessageHandler = {
            let seen = Arc::clone(&seen);
            Arc::new(move |_, _, payload, _| seen.lock().push(payload))
        };

        let session = registry.register(client, handler);
        session.add_subscriptions([Bytes::from_static(b"news")]);
        session.enqueue(msg(b"m1"));
        session.enqueue(msg(b"m2"));

        let deactivator = {
            let session = Arc::clone(&session);
            std::thread::spawn(move || {
                // Let the consumer drain, then force the exit condition.
                while session.queued_len() > 0 {
                    std::thread::sleep(Duration::from_millis(5));
                }
                session.deactivate();
            })
        };

        run(&session, RequestType::Unsubscribe);
        deactivator.join().unwrap();

        let seen = seen.lock();
        assert_eq!(seen.as_slice(), &[Bytes::from_static(b"m1"), Bytes::from_static(b"m2")]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cleanup_failure_still_unregisters() {
        let client = failing_client();
        let registry = client.registry().clone();
        let session = registry.register(client, Arc::new(|_, _, _, _| {}));

        run(&session, RequestType::PUnsubscribe);
        assert!(registry.is_empty());
        assert!(!session.in_blocking_mode());
    }
}
