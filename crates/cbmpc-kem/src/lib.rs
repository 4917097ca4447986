//! The pluggable deterministic-KEM interface (§4.2).
//!
//! PVE needs a key-encapsulation mechanism whose `Encapsulate(ek, ρ)` is a
//! pure function of its inputs — two honest parties deriving the same `ρ`
//! must land on the same ciphertext, with no hidden randomness anywhere in
//! the path. [`Kem`] is the trait the rest of the workspace programs
//! against; [`RsaOaepKem`] is the one concrete implementation this harness
//! ships, built on deterministic OAEP masking (see [`hkdf_stream`]).

mod binding;
mod hkdf_stream;
mod rsa_oaep;

pub use binding::{bind_kem, current_kem, ScopedKemGuard};
pub use rsa_oaep::{PrivateKeyHandle, RsaOaepKem};

use cbmpc_types::Result;
use std::sync::Arc;

/// A deterministic key-encapsulation mechanism (§4.2).
///
/// `encapsulate` must be a pure function of `(ek, rho)`: calling it twice
/// with the same inputs yields byte-identical ciphertexts. This is what
/// lets PVE be reconstructed independently by parties who derive the same
/// `rho` through the access-structure protocol rather than exchanging the
/// KEM ciphertext directly.
pub trait Kem: Send + Sync {
    /// Generates a fresh keypair, returning an opaque private-key handle
    /// and the encoded public key (`ek`).
    fn generate(&self) -> Result<(PrivateKeyHandle, Vec<u8>)>;

    /// Recomputes `ek` from a private-key handle.
    fn derive_pub(&self, handle: &PrivateKeyHandle) -> Result<Vec<u8>>;

    /// Wraps a raw private-key encoding (as produced by an external key
    /// generator) into a handle this KEM can use for decapsulation.
    fn new_private_key_handle(&self, raw_private_key: &[u8]) -> Result<PrivateKeyHandle>;

    /// `Encapsulate(ek, rho) -> ct`, deterministic in both inputs.
    fn encapsulate(&self, ek: &[u8], rho: &[u8; 32]) -> Result<Vec<u8>>;

    /// `Decapsulate(handle, ct) -> rho`.
    fn decapsulate(&self, handle: &PrivateKeyHandle, ct: &[u8]) -> Result<[u8; 32]>;

    /// `FreePrivateKeyHandle(handle)` (§4.2): releases the handle's key
    /// material. `PrivateKeyHandle` already zeroizes on drop, so the
    /// default just drops it; a KEM backed by a registry token would
    /// override this to free that token instead.
    fn free_private_key_handle(&self, handle: PrivateKeyHandle) {
        tracing::debug!("freeing private key handle");
        drop(handle);
    }
}

/// Convenience: run `f` with `kem` bound as the task-local KEM for the
/// duration of the call, restoring whatever was bound before on return
/// (including on unwind).
pub fn with_kem<R>(kem: Arc<dyn Kem>, f: impl FnOnce() -> R) -> R {
    let _guard = bind_kem(kem);
    f()
}
