//! Raw bindings to the native client adapter.
//!
//! Build with `--features ffi`; the native adapter library must then be
//! present at link time. Everything the bridge consumes crosses here:
//! the synchronous `command` primitive (as [`FfiTransport`]) and the push
//! callback the adapter's delivery thread invokes (exported as
//! [`pontifex_push_callback`]).
//!
//! The bridge module root lives here too: one process-wide
//! [`PubSubRegistry`] created at embedder startup and destroyed at
//! shutdown, mirroring the host module's init/shutdown hooks.

use std::os::raw::{c_char, c_ulong, c_void};
use std::slice;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::warn;

use crate::client::{Client, ClientId};
use crate::error::TransportError;
use crate::protocol::{RequestType, Value};
use crate::pubsub::{sink, PubSubRegistry, PushKind};
use crate::transport::CommandTransport;

// ─────────────────────────────────────────────────────────────────────────────
// Raw reply shapes
// ─────────────────────────────────────────────────────────────────────────────

/// Reply-type discriminants used by the native adapter.
mod response_type {
    pub const NULL: i32 = 0;
    pub const OK: i32 = 1;
    pub const INT: i32 = 2;
    pub const FLOAT: i32 = 3;
    pub const BOOL: i32 = 4;
    pub const STRING: i32 = 5;
    pub const ARRAY: i32 = 6;
    pub const MAP: i32 = 7;
}

/// Error-type discriminants used by the native adapter.
mod error_type {
    pub const UNSPECIFIED: i32 = 0;
    pub const EXEC_ABORT: i32 = 1;
    pub const TIMEOUT: i32 = 2;
    pub const DISCONNECT: i32 = 3;
}

/// One decoded reply node. Owned by the `CommandResult` it came in;
/// freed as a whole via `free_command_result`.
#[repr(C)]
pub struct CommandResponse {
    pub response_type: i32,
    pub int_value: i64,
    pub float_value: f64,
    pub bool_value: bool,
    pub string_value: *mut u8,
    pub string_value_len: i64,
    pub array_value: *mut CommandResponse,
    pub array_value_len: i64,
    /// For map elements: the entry's key node
    pub map_key: *mut CommandResponse,
    /// For map elements: the entry's value node
    pub map_value: *mut CommandResponse,
}

/// Error report attached to a failed command.
#[repr(C)]
pub struct CommandError {
    pub command_error_message: *const c_char,
    pub command_error_type: i32,
}

/// What `command` hands back: exactly one of `response` or
/// `command_error` is populated.
#[repr(C)]
pub struct CommandResult {
    pub response: *mut CommandResponse,
    pub command_error: *mut CommandError,
}

/// Signature of the push callback registered with the native adapter.
pub type PushCallback = extern "C" fn(
    client_ptr: usize,
    kind: i32,
    payload: *const u8,
    payload_len: i64,
    channel: *const u8,
    channel_len: i64,
    pattern: *const u8,
    pattern_len: i64,
);

extern "C" {
    fn command(
        client_adapter_ptr: *const c_void,
        request_id: usize,
        command_type: u32,
        arg_count: c_ulong,
        args: *const usize,
        args_len: *const c_ulong,
        route_bytes: *const u8,
        route_bytes_len: usize,
        span_ptr: u64,
    ) -> *mut CommandResult;

    fn free_command_result(command_result_ptr: *mut CommandResult);

    fn register_pubsub_callback(
        client_adapter_ptr: *const c_void,
        pubsub_callback: PushCallback,
    ) -> *const c_char;

    fn unregister_pubsub_callback(client_adapter_ptr: *const c_void) -> *const c_char;
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport over the native `command` primitive
// ─────────────────────────────────────────────────────────────────────────────

/// A native connection handle.
struct NativeConnection(*const c_void);

// SAFETY: the adapter serializes command execution on its side; the raw
// pointer is an opaque token it hands back to us, never dereferenced here.
unsafe impl Send for NativeConnection {}
unsafe impl Sync for NativeConnection {}

/// [`CommandTransport`] over the native adapter's synchronous `command`
/// call.
pub struct FfiTransport {
    conn: NativeConnection,
}

impl FfiTransport {
    /// Wraps a native connection handle.
    ///
    /// # Safety
    ///
    /// `conn` must be a live connection pointer obtained from the native
    /// adapter and must outlive this transport.
    pub unsafe fn new(conn: *const c_void) -> FfiTransport {
        FfiTransport {
            conn: NativeConnection(conn),
        }
    }
}

impl CommandTransport for FfiTransport {
    fn send_command(&self, request: RequestType, args: &[Bytes]) -> Result<Value, TransportError> {
        let arg_ptrs: Vec<usize> = args.iter().map(|a| a.as_ptr() as usize).collect();
        let arg_lens: Vec<c_ulong> = args.iter().map(|a| a.len() as c_ulong).collect();

        // SAFETY: the arg pointer/length arrays stay alive across the
        // call, and the result pointer is freed exactly once below.
        unsafe {
            let result = command(
                self.conn.0,
                0,
                request as u32,
                args.len() as c_ulong,
                arg_ptrs.as_ptr(),
                arg_lens.as_ptr(),
                std::ptr::null(),
                0,
                0,
            );

            let Some(result_ref) = result.as_ref() else {
                return Err(TransportError::Unspecified(format!(
                    "{} returned no result",
                    request.command_name()
                )));
            };

            let outcome = if let Some(err) = result_ref.command_error.as_ref() {
                Err(error_from_parts(
                    err.command_error_type,
                    message_from_cstr(err.command_error_message, request),
                ))
            } else {
                Ok(match result_ref.response.as_ref() {
                    Some(resp) => value_from_response(resp),
                    None => Value::Nil,
                })
            };

            free_command_result(result);
            outcome
        }
    }
}

/// Maps the adapter's error taxonomy onto [`TransportError`].
fn error_from_parts(error_type: i32, message: String) -> TransportError {
    match error_type {
        error_type::EXEC_ABORT => TransportError::ExecAbort(message),
        error_type::TIMEOUT => TransportError::Timeout(message),
        error_type::DISCONNECT => TransportError::Disconnect(message),
        _ => TransportError::Unspecified(message),
    }
}

unsafe fn message_from_cstr(msg: *const c_char, request: RequestType) -> String {
    if msg.is_null() {
        return format!("{} failed", request.command_name());
    }
    std::ffi::CStr::from_ptr(msg).to_string_lossy().into_owned()
}

unsafe fn bytes_from_raw(ptr: *const u8, len: i64) -> Bytes {
    if ptr.is_null() || len <= 0 {
        return Bytes::new();
    }
    Bytes::copy_from_slice(slice::from_raw_parts(ptr, len as usize))
}

/// Deep-copies a reply tree into owned [`Value`]s.
unsafe fn value_from_response(resp: &CommandResponse) -> Value {
    match resp.response_type {
        response_type::NULL => Value::Nil,
        response_type::OK => Value::Ok,
        response_type::INT => Value::Int(resp.int_value),
        response_type::FLOAT => Value::Float(resp.float_value),
        response_type::BOOL => Value::Bool(resp.bool_value),
        response_type::STRING => Value::Bulk(bytes_from_raw(resp.string_value, resp.string_value_len)),
        response_type::ARRAY => Value::Array(elements_of(resp).iter().map(|e| value_from_response(e)).collect()),
        response_type::MAP => Value::Map(
            elements_of(resp)
                .iter()
                .map(|entry| {
                    let key = entry
                        .map_key
                        .as_ref()
                        .map_or(Value::Nil, |k| value_from_response(k));
                    let value = entry
                        .map_value
                        .as_ref()
                        .map_or(Value::Nil, |v| value_from_response(v));
                    (key, value)
                })
                .collect(),
        ),
        other => {
            warn!(response_type = other, "unknown reply type from native adapter");
            Value::Nil
        }
    }
}

unsafe fn elements_of(resp: &CommandResponse) -> &[CommandResponse] {
    if resp.array_value.is_null() || resp.array_value_len <= 0 {
        return &[];
    }
    slice::from_raw_parts(resp.array_value, resp.array_value_len as usize)
}

// ─────────────────────────────────────────────────────────────────────────────
// Bridge module root
// ─────────────────────────────────────────────────────────────────────────────

static BRIDGE: RwLock<Option<Arc<PubSubRegistry>>> = RwLock::new(None);

/// Creates the process-wide registry. Idempotent; called from the
/// embedder's module-init hook.
pub fn init_bridge() {
    let mut bridge = BRIDGE.write();
    if bridge.is_none() {
        *bridge = Some(Arc::new(PubSubRegistry::new()));
    }
}

/// Tears down the registry and every remaining session. Called once from
/// the embedder's module-shutdown hook.
pub fn shutdown_bridge() {
    if let Some(registry) = BRIDGE.write().take() {
        registry.shutdown();
    }
}

/// The process-wide registry, when the bridge is initialized.
pub fn bridge_registry() -> Option<Arc<PubSubRegistry>> {
    BRIDGE.read().clone()
}

/// Builds a [`Client`] over a native connection and registers the push
/// callback for it.
///
/// # Safety
///
/// `conn` must be a live connection pointer obtained from the native
/// adapter; it doubles as the client identity.
pub unsafe fn attach_client(conn: *const c_void) -> Result<Client, TransportError> {
    let registry = bridge_registry()
        .ok_or_else(|| TransportError::Unspecified("pub/sub bridge not initialized".into()))?;

    let err = register_pubsub_callback(conn, pontifex_push_callback);
    if !err.is_null() {
        return Err(TransportError::Unspecified(
            std::ffi::CStr::from_ptr(err).to_string_lossy().into_owned(),
        ));
    }

    Ok(Client::with_id(
        ClientId::from_raw(conn as u64),
        Arc::new(FfiTransport::new(conn)),
        registry,
    ))
}

/// Unregisters the push callback and tears down any session for the
/// connection. Safe to call on a client that never subscribed.
///
/// # Safety
///
/// `conn` must be the pointer the client was attached with, still live.
pub unsafe fn detach_client(conn: *const c_void) {
    let err = unregister_pubsub_callback(conn);
    if !err.is_null() {
        let msg = std::ffi::CStr::from_ptr(err).to_string_lossy();
        warn!(%msg, "unregister_pubsub_callback failed");
    }
    if let Some(registry) = bridge_registry() {
        registry.unregister(ClientId::from_raw(conn as u64));
    }
}

/// Push-callback entry point handed to the native adapter.
///
/// Runs on the adapter's delivery thread; the buffers are only valid for
/// the duration of the call, so everything is copied before return.
pub extern "C" fn pontifex_push_callback(
    client_ptr: usize,
    kind: i32,
    payload: *const u8,
    payload_len: i64,
    channel: *const u8,
    channel_len: i64,
    pattern: *const u8,
    pattern_len: i64,
) {
    let Some(registry) = bridge_registry() else {
        return;
    };
    let Some(kind) = PushKind::from_raw(kind) else {
        return;
    };

    // SAFETY: the adapter guarantees pointer/length pairs valid for the
    // duration of this callback; null or non-positive lengths mean absent.
    unsafe {
        let channel = borrowed_slice(channel, channel_len);
        let payload = borrowed_slice(payload, payload_len);
        let pattern = if pattern.is_null() || pattern_len <= 0 {
            None
        } else {
            Some(slice::from_raw_parts(pattern, pattern_len as usize))
        };

        sink::deliver(
            &registry,
            ClientId::from_raw(client_ptr as u64),
            kind,
            channel,
            payload,
            pattern,
        );
    }
}

unsafe fn borrowed_slice<'a>(ptr: *const u8, len: i64) -> &'a [u8] {
    if ptr.is_null() || len <= 0 {
        &[]
    } else {
        slice::from_raw_parts(ptr, len as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy_mapping() {
        assert_eq!(
            error_from_parts(error_type::TIMEOUT, "t".into()),
            TransportError::Timeout("t".into())
        );
        assert_eq!(
            error_from_parts(error_type::DISCONNECT, "d".into()),
            TransportError::Disconnect("d".into())
        );
        assert_eq!(
            error_from_parts(error_type::EXEC_ABORT, "a".into()),
            TransportError::ExecAbort("a".into())
        );
        assert_eq!(
            error_from_parts(error_type::UNSPECIFIED, "u".into()),
            TransportError::Unspecified("u".into())
        );
        assert_eq!(
            error_from_parts(99, "x".into()),
            TransportError::Unspecified("x".into())
        );
    }
}
