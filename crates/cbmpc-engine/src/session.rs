//! The boundary between a `Job` and the native engine: the callback
//! contract the engine uses to reach back into the host's transport
//! (§4.4, §9), and the `Engine` trait a job drives a protocol through.

use cbmpc_types::{Curve, Error, Result, RoleId};

/// What the engine calls back into during a protocol run.
///
/// For the `mock` backend this is an ordinary trait object call — "the
/// engine running on the caller's task" (§9) is literally true, there is
/// no process or language boundary to cross. `cbmpc-bridge` implements
/// this trait over a real [`Transport`]; the `link-native` backend instead
/// wraps each method as an `extern "C" fn` matching [`crate::sys`]'s ABI.
///
/// [`Transport`]: https://docs.rs/cbmpc-transport
pub trait SessionCallbacks: Send + Sync {
    fn send(&self, session_ptr: u64, to: RoleId, bytes: &[u8]) -> Result<()>;
    fn receive(&self, session_ptr: u64, from: RoleId) -> Result<Vec<u8>>;
    fn receive_all(&self, session_ptr: u64, from: &[RoleId]) -> Result<Vec<Vec<u8>>>;
}

/// A live native session: the opaque handle a `Job` holds for the
/// lifetime of its engine-side state (§4.5).
pub struct NativeSession {
    pub(crate) session_ptr: u64,
    pub(crate) self_role: RoleId,
    pub(crate) party_count: usize,
    pub(crate) callbacks: std::sync::Arc<dyn SessionCallbacks>,
}

impl NativeSession {
    pub fn session_ptr(&self) -> u64 {
        self.session_ptr
    }

    pub fn self_role(&self) -> RoleId {
        self.self_role
    }

    pub fn party_count(&self) -> usize {
        self.party_count
    }
}

/// Designates which party receives the assembled output in a threshold
/// signing call; all others receive empty bytes (§4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignerReceiver(pub RoleId);

/// The engine-facing operations every protocol façade drives (§4.6, C6).
///
/// A single `dyn Engine` is shared process-wide; all state that varies per
/// call lives in the `NativeSession` and the arguments, matching the real
/// engine's statelessness between calls.
pub trait Engine: Send + Sync {
    fn new_session(
        &self,
        session_ptr: u64,
        self_role: RoleId,
        party_count: usize,
        callbacks: std::sync::Arc<dyn SessionCallbacks>,
    ) -> Result<NativeSession>;

    fn close_session(&self, session: NativeSession);

    fn dkg(&self, session: &NativeSession, curve: Curve, sid: cbmpc_types::SessionId) -> Result<(crate::Key, cbmpc_types::SessionId)>;

    fn refresh(&self, session: &NativeSession, key: &crate::Key) -> Result<crate::Key>;

    fn sign(
        &self,
        session: &NativeSession,
        key: &crate::Key,
        message_hash: &[u8],
        receiver: SignerReceiver,
    ) -> Result<Vec<u8>>;

    fn agree_random(&self, session: &NativeSession, bit_len: usize) -> Result<Vec<u8>>;

    /// Builds a PVE ciphertext blob committing `kem_ct` to `x` under
    /// `label`, returning the commitment point bytes and the blob.
    fn pve_build(&self, curve: Curve, label: &[u8], kem_ct: &[u8], x: &[u8]) -> Result<(Vec<u8>, Vec<u8>)>;

    /// Verifies that `blob` commits to `expected_q` under `label` and has
    /// not been tampered with.
    fn pve_verify(&self, label: &[u8], expected_q: &[u8], blob: &[u8]) -> Result<()>;

    /// Splits a verified blob back into its embedded KEM ciphertext.
    fn pve_kem_ct<'a>(&self, blob: &'a [u8]) -> Result<&'a [u8]>;

    fn compile_ac(&self, tree_bytes: Vec<u8>) -> Result<crate::AccessStructureHandle>;

    /// The curve's generator, as an opaque point (§4.7's "Generator").
    fn generator(&self, curve: Curve) -> Result<crate::CurvePoint>;

    fn scalar_add(&self, a: &crate::Scalar, b: &crate::Scalar) -> Result<crate::Scalar>;
    fn scalar_sub(&self, a: &crate::Scalar, b: &crate::Scalar) -> Result<crate::Scalar>;
    fn scalar_mul(&self, a: &crate::Scalar, b: &crate::Scalar) -> Result<crate::Scalar>;
    fn scalar_inv(&self, a: &crate::Scalar) -> Result<crate::Scalar>;

    fn point_add(&self, a: &crate::CurvePoint, b: &crate::CurvePoint) -> Result<crate::CurvePoint>;
    fn point_sub(&self, a: &crate::CurvePoint, b: &crate::CurvePoint) -> Result<crate::CurvePoint>;
    fn point_neg(&self, a: &crate::CurvePoint) -> Result<crate::CurvePoint>;

    /// `scalar * point` (§4.7).
    fn point_scalar_mul(&self, point: &crate::CurvePoint, scalar: &crate::Scalar) -> Result<crate::CurvePoint>;

    /// `scalar * Generator(curve)`.
    fn scalar_times_generator(&self, scalar: &crate::Scalar) -> Result<crate::CurvePoint>;

    /// Splits a point into its `(x, y)` affine coordinate encodings.
    fn point_coordinates(&self, point: &crate::CurvePoint) -> Result<(Vec<u8>, Vec<u8>)>;
}

/// Looks up `self_role` in `names`, returning [`Error::InvalidArgument`]
/// if it is out of range — the range check every `new_session` call needs
/// before allocating anything (§4.5).
pub(crate) fn check_role_range(self_role: RoleId, party_count: usize) -> Result<()> {
    self_role.validate(party_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_range_check() {
        assert!(check_role_range(RoleId::new(1), 3).is_ok());
        assert!(check_role_range(RoleId::new(3), 3).is_err());
    }
}
