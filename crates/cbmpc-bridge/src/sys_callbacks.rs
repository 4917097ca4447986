//! The `extern "C"` callback table handed to `cbmpc_engine_new_session`
//! (§4.4), backed by the process-wide [`SessionTable`].
//!
//! `ctx` is the session pointer itself, reinterpreted as a pointer-sized
//! integer — the engine is told to treat it as opaque and hand it back
//! unchanged on every callback, which is exactly the contract a `u64` key
//! into [`SessionTable`] needs.

use crate::table::SessionTable;
use cbmpc_engine::sys::{
    FreeBytesCallback, OutBytes, OutBytesVector, ReceiveAllCallback, ReceiveCallback, SendCallback,
};
use cbmpc_types::{Error, Result, RoleId};
use std::os::raw::c_int;
use std::sync::OnceLock;

const STATUS_OK: c_int = 0;
const STATUS_NETWORK: c_int = -1;
const STATUS_MEMORY: c_int = -3;

static SESSIONS: OnceLock<SessionTable> = OnceLock::new();

/// The process-wide session table the `extern "C"` callbacks below
/// resolve `ctx` against. Lazily initialized on first use.
pub fn sessions() -> &'static SessionTable {
    SESSIONS.get_or_init(SessionTable::new)
}

fn status_of(result: &Result<()>) -> c_int {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) if e.kind() == cbmpc_types::ErrorKind::SessionMissing => STATUS_MEMORY,
        Err(_) => STATUS_NETWORK,
    }
}

fn leak_into(out: *mut OutBytes, bytes: Vec<u8>) {
    let mut boxed = bytes.into_boxed_slice();
    let data = boxed.as_mut_ptr();
    let len = boxed.len();
    std::mem::forget(boxed);
    // SAFETY: `out` is a valid, caller-owned `OutBytes` per the ABI
    // contract in `cbmpc_engine::sys`; the engine later frees `data`
    // via `cbmpc_bridge_free_bytes`.
    unsafe {
        (*out).data = data;
        (*out).len = len;
    }
}

fn ctx_to_session_ptr(ctx: *mut std::os::raw::c_void) -> u64 {
    ctx as u64
}

/// # Safety
/// `data`/`len` must describe a valid, initialized byte slice owned by
/// the caller for the duration of this call; the bridge copies out of it
/// and never retains the pointer, per §4.4's memory-ownership rule.
pub unsafe extern "C" fn cbmpc_bridge_send(
    ctx: *mut std::os::raw::c_void,
    to_role: u32,
    data: *const u8,
    len: usize,
) -> c_int {
    let session_ptr = ctx_to_session_ptr(ctx);
    let bytes = if len == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(data, len).to_vec()
    };
    let result = sessions()
        .resolve(session_ptr)
        .and_then(|transport| block_on_send(transport, RoleId::new(to_role), bytes));
    status_of(&result)
}

fn block_on_send(
    transport: std::sync::Arc<dyn cbmpc_transport::Transport>,
    to: RoleId,
    bytes: Vec<u8>,
) -> Result<()> {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(transport.send(to, bytes)))
}

/// # Safety
/// `out` must point to a writable, caller-owned `OutBytes` the engine
/// will later release via [`cbmpc_bridge_free_bytes`].
pub unsafe extern "C" fn cbmpc_bridge_receive(
    ctx: *mut std::os::raw::c_void,
    from_role: u32,
    out: *mut OutBytes,
) -> c_int {
    let session_ptr = ctx_to_session_ptr(ctx);
    let outcome = sessions().resolve(session_ptr).and_then(|transport| {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(transport.receive(RoleId::new(from_role)))
        })
    });
    match outcome {
        Ok(bytes) => {
            leak_into(out, bytes);
            STATUS_OK
        }
        Err(e) if e.kind() == cbmpc_types::ErrorKind::SessionMissing => STATUS_MEMORY,
        Err(_) => STATUS_NETWORK,
    }
}

/// # Safety
/// `from_roles` must point to `count` valid `u32`s; `out` must point to a
/// writable, caller-owned `OutBytesVector`.
pub unsafe extern "C" fn cbmpc_bridge_receive_all(
    ctx: *mut std::os::raw::c_void,
    from_roles: *const u32,
    count: usize,
    out: *mut OutBytesVector,
) -> c_int {
    let session_ptr = ctx_to_session_ptr(ctx);
    let roles: Vec<RoleId> = std::slice::from_raw_parts(from_roles, count)
        .iter()
        .map(|r| RoleId::new(*r))
        .collect();

    let outcome = sessions().resolve(session_ptr).and_then(|transport| {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(transport.receive_all(&roles))
        })
    });

    match outcome {
        Ok(by_role) => {
            let mut entries = Vec::with_capacity(roles.len());
            for role in &roles {
                let Some(bytes) = by_role.get(role).cloned() else {
                    return STATUS_NETWORK;
                };
                let mut boxed = bytes.into_boxed_slice();
                let data = boxed.as_mut_ptr();
                let len = boxed.len();
                std::mem::forget(boxed);
                entries.push(OutBytes { data, len });
            }
            let mut entries = entries.into_boxed_slice();
            let data = entries.as_mut_ptr();
            let vec_len = entries.len();
            std::mem::forget(entries);
            // SAFETY: see `leak_into`.
            unsafe {
                (*out).data = data;
                (*out).count = vec_len;
            }
            STATUS_OK
        }
        Err(e) if e.kind() == cbmpc_types::ErrorKind::SessionMissing => STATUS_MEMORY,
        Err(_) => STATUS_NETWORK,
    }
}

/// # Safety
/// `data`/`len` must be a buffer previously produced by
/// [`cbmpc_bridge_receive`] or [`cbmpc_bridge_receive_all`] and not yet
/// freed.
pub unsafe extern "C" fn cbmpc_bridge_free_bytes(data: *mut u8, len: usize) {
    if data.is_null() {
        return;
    }
    drop(Box::from_raw(std::slice::from_raw_parts_mut(data, len)));
}

/// Type-checks this module's exports against the ABI `cbmpc-engine::sys`
/// expects, without requiring a linked native library.
const _: SendCallback = cbmpc_bridge_send;
const _: ReceiveCallback = cbmpc_bridge_receive;
const _: ReceiveAllCallback = cbmpc_bridge_receive_all;
const _: FreeBytesCallback = cbmpc_bridge_free_bytes;
