//! Push-message taxonomy and the queued message node.

use bytes::Bytes;

/// Kinds of push notification the native client can deliver.
///
/// The numbering mirrors the native adapter's push-kind enumeration; the
/// sink only ever queues the three message kinds, everything else is
/// control traffic it ignores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum PushKind {
    /// Connection-level disconnect notice
    Disconnection = 0,
    /// Push the adapter could not classify
    Other = 1,
    /// Client-side caching invalidation
    Invalidate = 2,
    /// Message on an exactly-subscribed channel
    Message = 3,
    /// Message matched by a pattern subscription
    PMessage = 4,
    /// Message on a shard channel
    SMessage = 5,
    /// UNSUBSCRIBE confirmation
    Unsubscribe = 6,
    /// PUNSUBSCRIBE confirmation
    PUnsubscribe = 7,
    /// SUNSUBSCRIBE confirmation
    SUnsubscribe = 8,
    /// SUBSCRIBE confirmation
    Subscribe = 9,
    /// PSUBSCRIBE confirmation
    PSubscribe = 10,
    /// SSUBSCRIBE confirmation
    SSubscribe = 11,
}

impl PushKind {
    /// Decodes the raw kind the native callback supplies.
    pub fn from_raw(raw: i32) -> Option<PushKind> {
        Some(match raw {
            0 => PushKind::Disconnection,
            1 => PushKind::Other,
            2 => PushKind::Invalidate,
            3 => PushKind::Message,
            4 => PushKind::PMessage,
            5 => PushKind::SMessage,
            6 => PushKind::Unsubscribe,
            7 => PushKind::PUnsubscribe,
            8 => PushKind::SUnsubscribe,
            9 => PushKind::Subscribe,
            10 => PushKind::PSubscribe,
            11 => PushKind::SSubscribe,
            _ => return None,
        })
    }

    /// True for the three kinds that carry a payload for the host handler.
    #[inline]
    pub fn is_message(self) -> bool {
        matches!(self, PushKind::Message | PushKind::PMessage | PushKind::SMessage)
    }
}

/// One delivered message, queued for the consumption loop.
///
/// Always an owned deep copy: the buffers the native callback hands over
/// are dead the moment it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    /// Which message kind this is
    pub kind: PushKind,
    /// Channel the message arrived on
    pub channel: Bytes,
    /// Message body
    pub payload: Bytes,
    /// Matching pattern, for pattern-subscription delivery only
    pub pattern: Option<Bytes>,
}

impl PushMessage {
    /// Builds a node by copying the foreign-owned buffers.
    pub fn copied(kind: PushKind, channel: &[u8], payload: &[u8], pattern: Option<&[u8]>) -> Self {
        PushMessage {
            kind,
            channel: Bytes::copy_from_slice(channel),
            payload: Bytes::copy_from_slice(payload),
            pattern: pattern
                .filter(|p| !p.is_empty())
                .map(Bytes::copy_from_slice),
        }
    }
}
