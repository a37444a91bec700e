//! Subscribe/unsubscribe/publish orchestration.
//!
//! A successful subscribe does not return until its consumption loop
//! exits; everything else here is a plain blocking round-trip.

use bytes::Bytes;
use tracing::warn;

use crate::client::Client;
use crate::error::{Result, UsageError};
use crate::protocol::{RequestType, Value};
use crate::pubsub::{consumer, MessageHandler};

/// The three subscribe-class command families. Each pairs a subscribe
/// request type with the unsubscribe type used for teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubscribeClass {
    /// SUBSCRIBE / UNSUBSCRIBE, literal channel names
    Channel,
    /// PSUBSCRIBE / PUNSUBSCRIBE, glob patterns
    Pattern,
    /// SSUBSCRIBE / SUNSUBSCRIBE, shard channels
    Shard,
}

impl SubscribeClass {
    pub(crate) fn subscribe_type(self) -> RequestType {
        match self {
            SubscribeClass::Channel => RequestType::Subscribe,
            SubscribeClass::Pattern => RequestType::PSubscribe,
            SubscribeClass::Shard => RequestType::SSubscribe,
        }
    }

    pub(crate) fn unsubscribe_type(self) -> RequestType {
        match self {
            SubscribeClass::Channel => RequestType::Unsubscribe,
            SubscribeClass::Pattern => RequestType::PUnsubscribe,
            SubscribeClass::Shard => RequestType::SUnsubscribe,
        }
    }
}

/// Subscribes and runs the consumption loop to completion.
///
/// The session is registered before the command goes out so pushes racing
/// the acknowledgment land in the queue instead of being dropped. On
/// command failure the session is torn down again and the error surfaces;
/// on success the call blocks inside the loop until the session exits its
/// running state.
pub(crate) fn subscribe(
    client: &Client,
    class: SubscribeClass,
    names: &[Bytes],
    handler: MessageHandler,
    timeout_ms: i64,
) -> Result<()> {
    let registry = client.registry();
    if registry.in_blocking_mode(client.id()) {
        return Err(UsageError::SubscribeMode.into());
    }

    let session = registry.register(client.clone(), handler);

    let mut args: Vec<Bytes> = Vec::with_capacity(names.len() + 1);
    args.extend(names.iter().cloned());
    args.push(Bytes::from(timeout_ms.to_string().into_bytes()));

    let request = class.subscribe_type();
    if let Err(err) = client.transport().send_command(request, &args) {
        warn!(client = %client.id(), command = %request, %err, "subscribe command failed");
        registry.unregister(client.id());
        return Err(err.into());
    }

    session.add_subscriptions(names.iter().cloned());
    consumer::run(&session, class.unsubscribe_type());
    Ok(())
}

/// Unsubscribes from the given names, or from everything when `names` is
/// absent.
///
/// Never raises: transport failures are logged and the local subscription
/// state is updated regardless, so the client cannot be left stuck in
/// blocking mode by a failed cleanup. Draining the subscribed set to
/// empty deactivates the session and wakes its parked consumer.
pub(crate) fn unsubscribe(client: &Client, class: SubscribeClass, names: Option<&[Bytes]>) {
    let request = class.unsubscribe_type();

    let mut args: Vec<Bytes> = Vec::with_capacity(names.map_or(0, <[Bytes]>::len) + 1);
    if let Some(names) = names {
        args.extend(names.iter().cloned());
    }
    args.push(Bytes::from_static(crate::UNSUBSCRIBE_TIMEOUT_ARG));

    if let Err(err) = client.transport().send_command(request, &args) {
        warn!(client = %client.id(), command = %request, %err, "unsubscribe command failed");
    }

    if let Some(session) = client.registry().find(client.id()) {
        match names {
            Some(names) => session.remove_subscriptions(names.iter()),
            None => session.clear_subscriptions(),
        }
    }
}

/// Publishes one message; returns the subscriber count the store reports.
///
/// An integer is the only reply shape PUBLISH has; anything else is logged
/// and reported as zero subscribers.
pub(crate) fn publish(
    client: &Client,
    request: RequestType,
    channel: Bytes,
    payload: Bytes,
) -> Result<i64> {
    let reply = client.transport().send_command(request, &[channel, payload])?;
    match reply {
        Value::Int(count) => Ok(count),
        other => {
            warn!(client = %client.id(), command = %request, ?other, "unexpected publish reply");
            Ok(0)
        }
    }
}
