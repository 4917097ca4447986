//! The `extern "C"` ABI a real vendored engine library satisfies.
//!
//! Compiled only under `link-native`; the default `mock` build never sees
//! this module, so shipping this crate never requires an unresolved
//! native symbol at link time. A consumer that enables `link-native` is
//! responsible for supplying a library exporting these symbols — none are
//! vendored here.
//!
//! Callback signatures mirror §4.4's ABI exactly: `send`/`receive`/
//! `receive_all`, status 0 success / -1 network / -3 memory. The engine
//! invokes these synchronously, on the caller's own thread (§9) — there is
//! no callback queue on either side of this boundary.

use std::os::raw::{c_int, c_void};

/// `send(ctx, to_int, bytes) -> int` (§6).
pub type SendCallback =
    unsafe extern "C" fn(ctx: *mut c_void, to_role: u32, data: *const u8, len: usize) -> c_int;

/// A host-allocated output buffer the engine reads from and later frees
/// via [`FreeBytesCallback`] (§4.4's "companion free bytes call").
#[repr(C)]
pub struct OutBytes {
    pub data: *mut u8,
    pub len: usize,
}

/// `receive(ctx, from_int, out) -> int` (§6).
pub type ReceiveCallback =
    unsafe extern "C" fn(ctx: *mut c_void, from_role: u32, out: *mut OutBytes) -> c_int;

#[repr(C)]
pub struct OutBytesVector {
    pub data: *mut OutBytes,
    pub count: usize,
}

/// `receive_all(ctx, from_ints, count, out) -> int` (§6).
pub type ReceiveAllCallback = unsafe extern "C" fn(
    ctx: *mut c_void,
    from_roles: *const u32,
    count: usize,
    out: *mut OutBytesVector,
) -> c_int;

/// Releases a buffer previously populated by [`ReceiveCallback`] or
/// [`ReceiveAllCallback`].
pub type FreeBytesCallback = unsafe extern "C" fn(data: *mut u8, len: usize);

extern "C" {
    /// Allocates a native session bound to `ctx` (opaque to the engine;
    /// it is only ever handed back to the callbacks below) and the given
    /// callback table. Returns an opaque session pointer, or null on
    /// failure.
    pub fn cbmpc_engine_new_session(
        ctx: *mut c_void,
        self_role: u32,
        party_count: u32,
        send: SendCallback,
        receive: ReceiveCallback,
        receive_all: ReceiveAllCallback,
        free_bytes: FreeBytesCallback,
    ) -> *mut c_void;

    pub fn cbmpc_engine_close_session(session: *mut c_void);

    /// Runs DKG on `session`, writing the serialized key share and final
    /// session id into caller-provided `OutBytes` structs. Returns 0 on
    /// success, a negative status otherwise (§7 `ProtocolAborted`).
    pub fn cbmpc_engine_dkg(
        session: *mut c_void,
        curve_nid: c_int,
        sid: *const u8,
        sid_len: usize,
        out_key: *mut OutBytes,
        out_sid: *mut OutBytes,
    ) -> c_int;

    pub fn cbmpc_engine_refresh(
        session: *mut c_void,
        key: *const u8,
        key_len: usize,
        out_key: *mut OutBytes,
    ) -> c_int;

    pub fn cbmpc_engine_sign(
        session: *mut c_void,
        key: *const u8,
        key_len: usize,
        message_hash: *const u8,
        message_hash_len: usize,
        receiver_role: u32,
        out_sig: *mut OutBytes,
    ) -> c_int;

    pub fn cbmpc_engine_agree_random(
        session: *mut c_void,
        bit_len: usize,
        out: *mut OutBytes,
    ) -> c_int;

    pub fn cbmpc_engine_compile_ac(
        tree: *const u8,
        tree_len: usize,
        out_compiled: *mut OutBytes,
    ) -> c_int;

    /// Writes the curve's generator point encoding into `out` (§4.7).
    pub fn cbmpc_engine_generator(curve_nid: c_int, out: *mut OutBytes) -> c_int;

    pub fn cbmpc_engine_scalar_add(
        curve_nid: c_int,
        a: *const u8,
        a_len: usize,
        b: *const u8,
        b_len: usize,
        out: *mut OutBytes,
    ) -> c_int;

    pub fn cbmpc_engine_scalar_sub(
        curve_nid: c_int,
        a: *const u8,
        a_len: usize,
        b: *const u8,
        b_len: usize,
        out: *mut OutBytes,
    ) -> c_int;

    pub fn cbmpc_engine_scalar_mul(
        curve_nid: c_int,
        a: *const u8,
        a_len: usize,
        b: *const u8,
        b_len: usize,
        out: *mut OutBytes,
    ) -> c_int;

    pub fn cbmpc_engine_scalar_inv(
        curve_nid: c_int,
        a: *const u8,
        a_len: usize,
        out: *mut OutBytes,
    ) -> c_int;

    pub fn cbmpc_engine_point_add(
        curve_nid: c_int,
        a: *const u8,
        a_len: usize,
        b: *const u8,
        b_len: usize,
        out: *mut OutBytes,
    ) -> c_int;

    pub fn cbmpc_engine_point_sub(
        curve_nid: c_int,
        a: *const u8,
        a_len: usize,
        b: *const u8,
        b_len: usize,
        out: *mut OutBytes,
    ) -> c_int;

    pub fn cbmpc_engine_point_neg(
        curve_nid: c_int,
        a: *const u8,
        a_len: usize,
        out: *mut OutBytes,
    ) -> c_int;

    pub fn cbmpc_engine_point_scalar_mul(
        curve_nid: c_int,
        point: *const u8,
        point_len: usize,
        scalar: *const u8,
        scalar_len: usize,
        out: *mut OutBytes,
    ) -> c_int;

    pub fn cbmpc_engine_scalar_times_generator(
        curve_nid: c_int,
        scalar: *const u8,
        scalar_len: usize,
        out: *mut OutBytes,
    ) -> c_int;

    /// Writes the point's `x` and `y` affine coordinate encodings into
    /// `out_x`/`out_y`.
    pub fn cbmpc_engine_point_coordinates(
        curve_nid: c_int,
        point: *const u8,
        point_len: usize,
        out_x: *mut OutBytes,
        out_y: *mut OutBytes,
    ) -> c_int;
}
