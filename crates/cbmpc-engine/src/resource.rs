//! Opaque engine resources: `Scalar`, `CurvePoint`, `Key`,
//! `AccessStructureHandle` (§4.7, §9).
//!
//! Each wraps a [`cbmpc_registry::Token`] plus whatever cached metadata the
//! public API needs to answer without a round trip through the engine
//! (curve id, public point bytes, serialized form). Destruction is
//! explicit (`close`); `Drop` is the finalizer safety net §9 calls for,
//! and disarms itself once `close` has run so the net never double-frees.

use std::sync::Arc;

use cbmpc_registry::{Registry, Token};
use cbmpc_types::{Curve, Result};
use zeroize::Zeroize;

use crate::session::Engine;

/// A registry-token handle shared by every opaque engine resource.
///
/// `Drop` frees the token if it was never explicitly closed — the
/// finalizer safety net of §9 — but correctness must not depend on it
/// running at any particular time.
struct OpaqueHandle {
    registry: Arc<Registry>,
    token: Token,
    armed: bool,
}

impl OpaqueHandle {
    fn new(registry: Arc<Registry>, token: Token) -> Self {
        Self {
            registry,
            token,
            armed: true,
        }
    }

    fn close(&mut self) {
        if self.armed {
            self.registry.free(self.token);
            self.armed = false;
        }
    }

    fn token(&self) -> Token {
        self.token
    }
}

impl Drop for OpaqueHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// An immutable element of a curve's scalar field, cached locally as a
/// big-endian byte buffer alongside its engine-side token.
///
/// Modular arithmetic (add/sub/mul/inv) is curve-bound and is performed by
/// the engine against the token, not by this type — the methods below are
/// thin forwarders onto the matching [`Engine`] call.
pub struct Scalar {
    handle: OpaqueHandle,
    curve: Curve,
    bytes: Vec<u8>,
}

impl Scalar {
    pub(crate) fn new(registry: Arc<Registry>, token: Token, curve: Curve, bytes: Vec<u8>) -> Self {
        Self {
            handle: OpaqueHandle::new(registry, token),
            curve,
            bytes,
        }
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn token(&self) -> Token {
        self.handle.token()
    }

    /// Big-endian bytes, padded to the curve's order byte length.
    pub fn bytes_padded(&self) -> Vec<u8> {
        let width = self.curve.max_hash_size();
        let mut out = vec![0u8; width.saturating_sub(self.bytes.len())];
        out.extend_from_slice(&self.bytes);
        out
    }

    /// Explicitly releases the engine-side resource. Idempotent.
    pub fn close(&mut self) {
        self.handle.close();
    }

    /// `self + other` (§4.7).
    pub fn add(&self, engine: &dyn Engine, other: &Scalar) -> Result<Scalar> {
        engine.scalar_add(self, other)
    }

    /// `self - other` (§4.7).
    pub fn sub(&self, engine: &dyn Engine, other: &Scalar) -> Result<Scalar> {
        engine.scalar_sub(self, other)
    }

    /// `self * other` (§4.7).
    pub fn mul(&self, engine: &dyn Engine, other: &Scalar) -> Result<Scalar> {
        engine.scalar_mul(self, other)
    }

    /// `self^-1` (§4.7).
    pub fn inv(&self, engine: &dyn Engine) -> Result<Scalar> {
        engine.scalar_inv(self)
    }

    /// `self * Generator(self.curve())`.
    pub fn times_generator(&self, engine: &dyn Engine) -> Result<CurvePoint> {
        engine.scalar_times_generator(self)
    }
}

impl PartialEq for Scalar {
    /// Constant-time in the byte length, per §4.7 ("Equality is
    /// constant-time").
    fn eq(&self, other: &Self) -> bool {
        if self.curve != other.curve || self.bytes.len() != other.bytes.len() {
            return false;
        }
        let mut diff = 0u8;
        for (a, b) in self.bytes.iter().zip(other.bytes.iter()) {
            diff |= a ^ b;
        }
        diff == 0
    }
}

impl Eq for Scalar {}

impl Drop for Scalar {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// An opaque point on a curve's group, backed by an engine token.
pub struct CurvePoint {
    handle: OpaqueHandle,
    curve: Curve,
    encoded: Vec<u8>,
}

impl CurvePoint {
    pub(crate) fn new(registry: Arc<Registry>, token: Token, curve: Curve, encoded: Vec<u8>) -> Self {
        Self {
            handle: OpaqueHandle::new(registry, token),
            curve,
            encoded,
        }
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn token(&self) -> Token {
        self.handle.token()
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn is_infinity(&self) -> bool {
        self.encoded.iter().all(|b| *b == 0)
    }

    pub fn close(&mut self) {
        self.handle.close();
    }

    /// `self + other` (§4.7).
    pub fn add(&self, engine: &dyn Engine, other: &CurvePoint) -> Result<CurvePoint> {
        engine.point_add(self, other)
    }

    /// `self - other` (§4.7).
    pub fn sub(&self, engine: &dyn Engine, other: &CurvePoint) -> Result<CurvePoint> {
        engine.point_sub(self, other)
    }

    /// `-self` (§4.7).
    pub fn neg(&self, engine: &dyn Engine) -> Result<CurvePoint> {
        engine.point_neg(self)
    }

    /// `scalar * self` (§4.7).
    pub fn scalar_mul(&self, engine: &dyn Engine, scalar: &Scalar) -> Result<CurvePoint> {
        engine.point_scalar_mul(self, scalar)
    }

    /// This point's `(x, y)` affine coordinate encodings.
    pub fn coordinates(&self, engine: &dyn Engine) -> Result<(Vec<u8>, Vec<u8>)> {
        engine.point_coordinates(self)
    }
}

impl PartialEq for CurvePoint {
    fn eq(&self, other: &Self) -> bool {
        self.curve == other.curve && self.encoded == other.encoded
    }
}

/// A curve key share: an opaque native object plus cached metadata that
/// must stay consistent with it (§3: public point unchanged by Refresh).
pub struct Key {
    handle: OpaqueHandle,
    curve: Curve,
    public_point: Vec<u8>,
}

impl Key {
    pub(crate) fn new(registry: Arc<Registry>, token: Token, curve: Curve, public_point: Vec<u8>) -> Self {
        Self {
            handle: OpaqueHandle::new(registry, token),
            curve,
            public_point,
        }
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn token(&self) -> Token {
        self.handle.token()
    }

    pub fn public_point(&self) -> &[u8] {
        &self.public_point
    }

    pub fn close(&mut self) {
        self.handle.close();
    }
}

/// A compiled access structure bound to the engine token holding its
/// parsed/validated form.
pub struct AccessStructureHandle {
    handle: OpaqueHandle,
    compiled: Vec<u8>,
}

impl AccessStructureHandle {
    pub(crate) fn new(registry: Arc<Registry>, token: Token, compiled: Vec<u8>) -> Self {
        Self {
            handle: OpaqueHandle::new(registry, token),
            compiled,
        }
    }

    pub fn token(&self) -> Token {
        self.handle.token()
    }

    pub fn compiled_bytes(&self) -> &[u8] {
        &self.compiled
    }

    pub fn close(&mut self) {
        self.handle.close();
    }
}
