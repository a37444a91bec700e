//! PUBSUB introspection commands.
//!
//! Plain request/response queries against the server's view of pub/sub
//! state; none of them touch the session machinery.

use bytes::Bytes;

use crate::client::Client;
use crate::error::{Result, TransportError, UsageError};
use crate::protocol::{RequestType, Value};

/// PUBSUB CHANNELS [pattern] — names of channels with at least one
/// subscriber, optionally filtered by glob pattern.
pub(crate) fn pubsub_channels(client: &Client, pattern: Option<Bytes>) -> Result<Vec<Bytes>> {
    channels_query(client, RequestType::PubSubChannels, pattern)
}

/// PUBSUB SHARDCHANNELS [pattern] — the shard-channel variant.
pub(crate) fn pubsub_shard_channels(client: &Client, pattern: Option<Bytes>) -> Result<Vec<Bytes>> {
    channels_query(client, RequestType::PubSubShardChannels, pattern)
}

fn channels_query(
    client: &Client,
    request: RequestType,
    pattern: Option<Bytes>,
) -> Result<Vec<Bytes>> {
    let args: Vec<Bytes> = pattern.into_iter().collect();
    let reply = client.transport().send_command(request, &args)?;
    reply
        .into_bulk_vec()
        .ok_or_else(|| TransportError::UnexpectedResponse { command: request.command_name() }.into())
}

/// PUBSUB NUMSUB channel [channel ...] — per-channel subscriber counts, in
/// the order the server reports them.
pub(crate) fn pubsub_numsub(client: &Client, channels: &[Bytes]) -> Result<Vec<(Bytes, i64)>> {
    numsub_query(client, RequestType::PubSubNumSub, channels)
}

/// PUBSUB SHARDNUMSUB — the shard-channel variant.
pub(crate) fn pubsub_shard_numsub(client: &Client, channels: &[Bytes]) -> Result<Vec<(Bytes, i64)>> {
    numsub_query(client, RequestType::PubSubShardNumSub, channels)
}

fn numsub_query(
    client: &Client,
    request: RequestType,
    channels: &[Bytes],
) -> Result<Vec<(Bytes, i64)>> {
    let reply = client.transport().send_command(request, channels)?;
    let malformed = || TransportError::UnexpectedResponse { command: request.command_name() };

    let pairs = reply.into_pairs().ok_or_else(malformed)?;
    let mut out = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        match (key, value.as_int()) {
            (Value::Bulk(channel), Some(count)) => out.push((channel, count)),
            _ => return Err(malformed().into()),
        }
    }
    Ok(out)
}

/// PUBSUB NUMPAT — number of pattern subscriptions across all clients.
pub(crate) fn pubsub_numpat(client: &Client) -> Result<i64> {
    let reply = client.transport().send_command(RequestType::PubSubNumPat, &[])?;
    reply.as_int().ok_or_else(|| {
        TransportError::UnexpectedResponse { command: RequestType::PubSubNumPat.command_name() }
            .into()
    })
}

/// Host-surface dispatcher: case-insensitive subcommand plus raw
/// arguments, returning the undecoded reply.
///
/// Unknown subcommands and missing required arguments are usage errors
/// raised before anything is sent.
pub(crate) fn pubsub_dispatch(client: &Client, subcommand: &str, args: &[Bytes]) -> Result<Value> {
    match subcommand.to_ascii_lowercase().as_str() {
        "channels" => {
            let channels = pubsub_channels(client, args.first().cloned())?;
            Ok(Value::Array(channels.into_iter().map(Value::Bulk).collect()))
        }
        "shardchannels" => {
            let channels = pubsub_shard_channels(client, args.first().cloned())?;
            Ok(Value::Array(channels.into_iter().map(Value::Bulk).collect()))
        }
        "numsub" => {
            if args.is_empty() {
                return Err(UsageError::MissingArgument {
                    subcommand: "NUMSUB",
                    what: "an array of channel names",
                }
                .into());
            }
            Ok(numsub_reply(pubsub_numsub(client, args)?))
        }
        "shardnumsub" => {
            if args.is_empty() {
                return Err(UsageError::MissingArgument {
                    subcommand: "SHARDNUMSUB",
                    what: "an array of channel names",
                }
                .into());
            }
            Ok(numsub_reply(pubsub_shard_numsub(client, args)?))
        }
        "numpat" => Ok(Value::Int(pubsub_numpat(client)?)),
        _ => Err(UsageError::UnknownSubcommand(subcommand.to_string()).into()),
    }
}

fn numsub_reply(counts: Vec<(Bytes, i64)>) -> Value {
    Value::Map(
        counts
            .into_iter()
            .map(|(channel, count)| (Value::Bulk(channel), Value::Int(count)))
            .collect(),
    )
}
