//! Request types issued through the native client.

/// Commands the bridge sends over the native client's synchronous
/// request/response primitive.
///
/// The discriminants are the bridge's adapter contract: the FFI layer
/// forwards them verbatim as the native `command()` request-type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RequestType {
    /// SUBSCRIBE channel [channel ...] — blocks the calling thread
    Subscribe = 1,
    /// UNSUBSCRIBE [channel ...]
    Unsubscribe = 2,
    /// PSUBSCRIBE pattern [pattern ...] — blocks the calling thread
    PSubscribe = 3,
    /// PUNSUBSCRIBE [pattern ...]
    PUnsubscribe = 4,
    /// SSUBSCRIBE shardchannel [shardchannel ...] — blocks the calling thread
    SSubscribe = 5,
    /// SUNSUBSCRIBE [shardchannel ...]
    SUnsubscribe = 6,
    /// PUBLISH channel message
    Publish = 7,
    /// SPUBLISH shardchannel message
    SPublish = 8,
    /// PUBSUB CHANNELS [pattern]
    PubSubChannels = 9,
    /// PUBSUB NUMSUB [channel ...]
    PubSubNumSub = 10,
    /// PUBSUB NUMPAT
    PubSubNumPat = 11,
    /// PUBSUB SHARDCHANNELS [pattern]
    PubSubShardChannels = 12,
    /// PUBSUB SHARDNUMSUB [channel ...]
    PubSubShardNumSub = 13,
}

impl RequestType {
    /// Command name as the server knows it, for log lines.
    pub fn command_name(self) -> &'static str {
        match self {
            RequestType::Subscribe => "SUBSCRIBE",
            RequestType::Unsubscribe => "UNSUBSCRIBE",
            RequestType::PSubscribe => "PSUBSCRIBE",
            RequestType::PUnsubscribe => "PUNSUBSCRIBE",
            RequestType::SSubscribe => "SSUBSCRIBE",
            RequestType::SUnsubscribe => "SUNSUBSCRIBE",
            RequestType::Publish => "PUBLISH",
            RequestType::SPublish => "SPUBLISH",
            RequestType::PubSubChannels => "PUBSUB CHANNELS",
            RequestType::PubSubNumSub => "PUBSUB NUMSUB",
            RequestType::PubSubNumPat => "PUBSUB NUMPAT",
            RequestType::PubSubShardChannels => "PUBSUB SHARDCHANNELS",
            RequestType::PubSubShardNumSub => "PUBSUB SHARDNUMSUB",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.command_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(RequestType::Subscribe.command_name(), "SUBSCRIBE");
        assert_eq!(RequestType::PubSubNumPat.to_string(), "PUBSUB NUMPAT");
    }

    #[test]
    fn test_discriminants_are_stable() {
        assert_eq!(RequestType::Subscribe as u32, 1);
        assert_eq!(RequestType::PubSubShardNumSub as u32, 13);
    }
}
