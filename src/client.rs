//! Client handle: the host-visible object a session delivers for.
//!
//! A `Client` is a cheap cloneable handle over the connection's identity,
//! its command transport, and the registry its pub/sub sessions live in.
//! Connection establishment itself belongs to the native client library.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use crate::commands::{self, SubscribeClass};
use crate::error::Result;
use crate::protocol::{RequestType, Value};
use crate::pubsub::{MessageHandler, PubSubRegistry};
use crate::transport::CommandTransport;

/// Opaque client identity used as the registry key.
///
/// For embedded use it is a fresh counter value; the FFI path derives it
/// from the native connection pointer. Displayed in decimal either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl ClientId {
    /// Allocates a process-unique identity.
    pub fn next() -> ClientId {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ClientId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a native connection handle as an identity.
    pub fn from_raw(raw: u64) -> ClientId {
        ClientId(raw)
    }

    /// The raw identity value.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct ClientInner {
    id: ClientId,
    transport: Arc<dyn CommandTransport>,
    registry: Arc<PubSubRegistry>,
}

/// A connection-scoped client handle.
///
/// Clones share the same identity, transport, and registry. Sessions hold
/// a clone for their duration; the client never references its session
/// back, so teardown always releases the handle.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Creates a client with a fresh identity.
    pub fn new(transport: Arc<dyn CommandTransport>, registry: Arc<PubSubRegistry>) -> Client {
        Client::with_id(ClientId::next(), transport, registry)
    }

    /// Creates a client over an existing identity, e.g. a native
    /// connection handle.
    pub fn with_id(
        id: ClientId,
        transport: Arc<dyn CommandTransport>,
        registry: Arc<PubSubRegistry>,
    ) -> Client {
        Client {
            inner: Arc::new(ClientInner {
                id,
                transport,
                registry,
            }),
        }
    }

    /// This client's identity.
    #[inline]
    pub fn id(&self) -> ClientId {
        self.inner.id
    }

    /// The command channel into the native client.
    #[inline]
    pub fn transport(&self) -> &Arc<dyn CommandTransport> {
        &self.inner.transport
    }

    /// The registry this client's sessions live in.
    #[inline]
    pub fn registry(&self) -> &Arc<PubSubRegistry> {
        &self.inner.registry
    }

    /// True while a consumption loop runs for this client; only
    /// unsubscribe-class calls are accepted in that state.
    pub fn in_subscribe_mode(&self) -> bool {
        self.inner.registry.in_blocking_mode(self.inner.id)
    }

    // ── Subscribe-class commands ────────────────────────────────────────

    /// Subscribes to literal channels and blocks, dispatching each
    /// delivered message to `handler`, until the session deactivates or
    /// its subscription set empties.
    ///
    /// `timeout_ms` governs only the subscribe acknowledgment inside the
    /// native client, not the per-message wait.
    ///
    /// # Errors
    ///
    /// [`UsageError::SubscribeMode`](crate::error::UsageError) when a loop
    /// is already running for this client, or the transport error from a
    /// failed subscribe command (the session is torn down first).
    pub fn subscribe(
        &self,
        channels: &[Bytes],
        handler: MessageHandler,
        timeout_ms: i64,
    ) -> Result<()> {
        commands::subscribe(self, SubscribeClass::Channel, channels, handler, timeout_ms)
    }

    /// Pattern variant of [`subscribe`](Client::subscribe); handlers
    /// receive the matching pattern as the fourth argument.
    pub fn psubscribe(
        &self,
        patterns: &[Bytes],
        handler: MessageHandler,
        timeout_ms: i64,
    ) -> Result<()> {
        commands::subscribe(self, SubscribeClass::Pattern, patterns, handler, timeout_ms)
    }

    /// Shard-channel variant of [`subscribe`](Client::subscribe).
    pub fn ssubscribe(
        &self,
        channels: &[Bytes],
        handler: MessageHandler,
        timeout_ms: i64,
    ) -> Result<()> {
        commands::subscribe(self, SubscribeClass::Shard, channels, handler, timeout_ms)
    }

    /// Unsubscribes from the given channels, or from all channels when
    /// `channels` is `None`.
    ///
    /// Infallible from the host's point of view: transport failures are
    /// logged and local state is updated regardless, so a parked
    /// consumption loop always observes its exit condition.
    pub fn unsubscribe(&self, channels: Option<&[Bytes]>) {
        commands::unsubscribe(self, SubscribeClass::Channel, channels);
    }

    /// Pattern variant of [`unsubscribe`](Client::unsubscribe).
    pub fn punsubscribe(&self, patterns: Option<&[Bytes]>) {
        commands::unsubscribe(self, SubscribeClass::Pattern, patterns);
    }

    /// Shard-channel variant of [`unsubscribe`](Client::unsubscribe).
    pub fn sunsubscribe(&self, channels: Option<&[Bytes]>) {
        commands::unsubscribe(self, SubscribeClass::Shard, channels);
    }

    // ── Publish ─────────────────────────────────────────────────────────

    /// Publishes a message; returns the number of subscribers that
    /// received it.
    pub fn publish(&self, channel: Bytes, message: Bytes) -> Result<i64> {
        commands::publish(self, RequestType::Publish, channel, message)
    }

    /// Shard-channel variant of [`publish`](Client::publish).
    pub fn spublish(&self, channel: Bytes, message: Bytes) -> Result<i64> {
        commands::publish(self, RequestType::SPublish, channel, message)
    }

    // ── Introspection ───────────────────────────────────────────────────

    /// `PUBSUB <subcommand> [args...]`, the host-surface dispatcher.
    ///
    /// # Errors
    ///
    /// [`UsageError::UnknownSubcommand`](crate::error::UsageError) before
    /// anything is sent, or the transport error from the query itself.
    pub fn pubsub(&self, subcommand: &str, args: &[Bytes]) -> Result<Value> {
        commands::pubsub_dispatch(self, subcommand, args)
    }

    /// Channels with at least one subscriber, optionally filtered by glob
    /// pattern.
    pub fn pubsub_channels(&self, pattern: Option<Bytes>) -> Result<Vec<Bytes>> {
        commands::pubsub_channels(self, pattern)
    }

    /// Shard-channel variant of [`pubsub_channels`](Client::pubsub_channels).
    pub fn pubsub_shard_channels(&self, pattern: Option<Bytes>) -> Result<Vec<Bytes>> {
        commands::pubsub_shard_channels(self, pattern)
    }

    /// Per-channel subscriber counts.
    pub fn pubsub_numsub(&self, channels: &[Bytes]) -> Result<Vec<(Bytes, i64)>> {
        commands::pubsub_numsub(self, channels)
    }

    /// Shard-channel variant of [`pubsub_numsub`](Client::pubsub_numsub).
    pub fn pubsub_shard_numsub(&self, channels: &[Bytes]) -> Result<Vec<(Bytes, i64)>> {
        commands::pubsub_shard_numsub(self, channels)
    }

    /// Number of pattern subscriptions across all clients.
    pub fn pubsub_numpat(&self) -> Result<i64> {
        commands::pubsub_numpat(self)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("id", &self.inner.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, TransportError, UsageError};
    use crate::test_support::{failing_client, recording_client};

    #[test]
    fn test_client_ids_are_unique() {
        assert_ne!(ClientId::next(), ClientId::next());
        assert_eq!(ClientId::from_raw(7).as_u64(), 7);
        assert_eq!(ClientId::from_raw(7).to_string(), "7");
    }

    #[test]
    fn test_subscribe_empty_set_returns_after_cleanup() {
        // With nothing acknowledged into the subscribed set, the loop's
        // run condition is false from the start; the call still issues the
        // subscribe command and the exit-path cleanup unsubscribe.
        let (client, transport) = recording_client();
        client
            .subscribe(&[], Arc::new(|_, _, _, _| {}), 250)
            .unwrap();

        assert_eq!(
            transport.sent(),
            vec![
                (RequestType::Subscribe, vec![Bytes::from_static(b"250")]),
                (RequestType::Unsubscribe, vec![]),
            ]
        );
        assert!(client.registry().is_empty());
        assert!(!client.in_subscribe_mode());
    }

    #[test]
    fn test_subscribe_failure_tears_down_session() {
        let client = failing_client();
        let err = client
            .subscribe(&[Bytes::from_static(b"news")], Arc::new(|_, _, _, _| {}), 0)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::Disconnect(_))
        ));
        assert!(client.registry().is_empty());
    }

    #[test]
    fn test_unsubscribe_without_session_is_noop() {
        let (client, transport) = recording_client();
        client.unsubscribe(Some(&[Bytes::from_static(b"news")]));
        client.punsubscribe(None);

        assert_eq!(
            transport.sent(),
            vec![
                (
                    RequestType::Unsubscribe,
                    vec![Bytes::from_static(b"news"), Bytes::from_static(b"0")]
                ),
                (RequestType::PUnsubscribe, vec![Bytes::from_static(b"0")]),
            ]
        );
    }

    #[test]
    fn test_publish_returns_subscriber_count() {
        let (client, transport) = recording_client();
        transport.script(Ok(Value::Int(3)));

        let count = client
            .publish(Bytes::from_static(b"news"), Bytes::from_static(b"hi"))
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(
            transport.sent(),
            vec![(
                RequestType::Publish,
                vec![Bytes::from_static(b"news"), Bytes::from_static(b"hi")]
            )]
        );
    }

    #[test]
    fn test_publish_unexpected_reply_reports_zero() {
        // The scripted default reply is Value::Ok, not an integer.
        let (client, _transport) = recording_client();
        let count = client
            .publish(Bytes::from_static(b"news"), Bytes::from_static(b"hi"))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_pubsub_unknown_subcommand() {
        let (client, transport) = recording_client();
        let err = client.pubsub("shardhelp", &[]).unwrap_err();
        assert_eq!(
            err,
            Error::Usage(UsageError::UnknownSubcommand("shardhelp".into()))
        );
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_pubsub_numsub_requires_channels() {
        let (client, transport) = recording_client();
        let err = client.pubsub("numsub", &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::Usage(UsageError::MissingArgument { subcommand: "NUMSUB", .. })
        ));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_pubsub_channels_decodes_reply() {
        let (client, transport) = recording_client();
        transport.script(Ok(Value::Array(vec![
            Value::Bulk(Bytes::from_static(b"news")),
            Value::Bulk(Bytes::from_static(b"sport")),
        ])));

        let channels = client.pubsub_channels(Some(Bytes::from_static(b"*"))).unwrap();
        assert_eq!(
            channels,
            vec![Bytes::from_static(b"news"), Bytes::from_static(b"sport")]
        );
        assert_eq!(
            transport.sent(),
            vec![(RequestType::PubSubChannels, vec![Bytes::from_static(b"*")])]
        );
    }

    #[test]
    fn test_pubsub_numsub_decodes_map_reply() {
        let (client, transport) = recording_client();
        transport.script(Ok(Value::Map(vec![
            (Value::Bulk(Bytes::from_static(b"news")), Value::Int(2)),
        ])));

        let counts = client.pubsub_numsub(&[Bytes::from_static(b"news")]).unwrap();
        assert_eq!(counts, vec![(Bytes::from_static(b"news"), 2)]);
    }

    #[test]
    fn test_pubsub_numpat_rejects_malformed_reply() {
        let (client, transport) = recording_client();
        transport.script(Ok(Value::Bulk(Bytes::from_static(b"oops"))));

        let err = client.pubsub_numpat().unwrap_err();
        assert_eq!(
            err,
            Error::Transport(TransportError::UnexpectedResponse { command: "PUBSUB NUMPAT" })
        );
    }
}
