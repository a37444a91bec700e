//! Command orchestration over the native client.
//!
//! Only the pub/sub command family lives here; every other command the
//! store knows is marshaled by the host layers above this crate.

mod introspection;
mod pubsub;

pub(crate) use introspection::{
    pubsub_channels, pubsub_dispatch, pubsub_numpat, pubsub_numsub, pubsub_shard_channels,
    pubsub_shard_numsub,
};
pub(crate) use pubsub::{publish, subscribe, unsubscribe, SubscribeClass};
