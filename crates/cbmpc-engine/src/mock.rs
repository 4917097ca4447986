//! Safe-Rust reference engine (default feature).
//!
//! The real engine's protocols are explicitly out of scope — this backend
//! is a self-consistent stand-in that exercises every operation the
//! harness invokes (a transport round trip per DKG/Sign/Refresh/
//! AgreeRandom, a tamper-evident commitment for PVE) without claiming any
//! cryptographic security of its own. It exists so the rest of this
//! workspace — registry, bridge, job, façades — can be driven end to end
//! in tests without a vendored native library.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};

use cbmpc_registry::Registry;
use cbmpc_types::{Curve, Error, Result, RoleId, SessionId};

use crate::modmath;
use crate::session::{Engine, NativeSession, SessionCallbacks, SignerReceiver};
use crate::{AccessStructureHandle, CurvePoint, Key, Scalar};

type HmacSha256 = Hmac<Sha256>;

/// Per-party key material backing a [`Key`]'s registry token. Never
/// leaves this crate — `Key` only exposes `curve()`/`public_point()`.
struct KeyMaterial {
    own_share: Vec<u8>,
    public_point: Vec<u8>,
}

/// The aggregator role every mock protocol funnels through. Any fixed
/// role works; 0 is simplest and is always present (§3: role ids are
/// `[0, N)`).
fn aggregator() -> RoleId {
    RoleId::new(0)
}

pub struct MockEngine {
    registry: Arc<Registry>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
        }
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    fn new_scalar(&self, curve: Curve, bytes: Vec<u8>) -> Scalar {
        let token = self.registry.register(bytes.clone());
        Scalar::new(Arc::clone(&self.registry), token, curve, bytes)
    }

    fn new_point(&self, curve: Curve, bytes: Vec<u8>) -> CurvePoint {
        let token = self.registry.register(bytes.clone());
        CurvePoint::new(Arc::clone(&self.registry), token, curve, bytes)
    }

    fn scalar_binop(
        &self,
        a: &Scalar,
        b: &Scalar,
        f: impl Fn(&[u8], &[u8], &[u8]) -> Vec<u8>,
    ) -> Result<Scalar> {
        if a.curve() != b.curve() {
            return Err(Error::AlgorithmMismatch("scalar operands must share a curve".into()));
        }
        let m = a.curve().order();
        let av = modmath::reduce_to_width_mod(&a.bytes_padded(), m);
        let bv = modmath::reduce_to_width_mod(&b.bytes_padded(), m);
        Ok(self.new_scalar(a.curve(), f(&av, &bv, m)))
    }

    fn point_binop(
        &self,
        a: &CurvePoint,
        b: &CurvePoint,
        f: impl Fn(&[u8], &[u8], &[u8]) -> Vec<u8>,
    ) -> Result<CurvePoint> {
        if a.curve() != b.curve() {
            return Err(Error::AlgorithmMismatch("point operands must share a curve".into()));
        }
        let m = a.curve().order();
        let av = modmath::reduce_to_width_mod(a.encoded(), m);
        let bv = modmath::reduce_to_width_mod(b.encoded(), m);
        Ok(self.new_point(a.curve(), f(&av, &bv, m)))
    }
}

/// Funnels one byte vector per party through `AGGREGATOR`, which combines
/// them with `combine` and broadcasts the result back to everyone.
/// Non-commutative combine functions must sort by role id themselves;
/// `combine` receives `(role, bytes)` pairs in role order.
fn aggregate_and_broadcast(
    session: &NativeSession,
    local: Vec<u8>,
    combine: impl FnOnce(&[(RoleId, Vec<u8>)]) -> Vec<u8>,
) -> Result<Vec<u8>> {
    let self_role = session.self_role();
    let n = session.party_count();
    let aggregator = aggregator();

    if self_role == aggregator {
        let others: Vec<RoleId> = (0..n as u32)
            .map(RoleId::new)
            .filter(|r| *r != aggregator)
            .collect();
        let received = session.callbacks.receive_all(session.session_ptr(), &others)?;
        let mut pairs = vec![(aggregator, local)];
        pairs.extend(others.into_iter().zip(received));
        pairs.sort_by_key(|(role, _)| role.get());
        let combined = combine(&pairs);
        for role in (0..n as u32).map(RoleId::new).filter(|r| *r != aggregator) {
            session
                .callbacks
                .send(session.session_ptr(), role, &combined)?;
        }
        Ok(combined)
    } else {
        session
            .callbacks
            .send(session.session_ptr(), aggregator, &local)?;
        session.callbacks.receive(session.session_ptr(), aggregator)
    }
}

fn hmac_sha256(key: &[u8], msg: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(msg);
    mac.finalize().into_bytes().to_vec()
}

impl Engine for MockEngine {
    fn new_session(
        &self,
        session_ptr: u64,
        self_role: RoleId,
        party_count: usize,
        callbacks: Arc<dyn SessionCallbacks>,
    ) -> Result<NativeSession> {
        crate::session::check_role_range(self_role, party_count)?;
        tracing::debug!(session_ptr, role = self_role.get(), party_count, "mock engine session created");
        Ok(NativeSession {
            session_ptr,
            self_role,
            party_count,
            callbacks,
        })
    }

    fn close_session(&self, session: NativeSession) {
        tracing::debug!(session_ptr = session.session_ptr(), "mock engine session closed");
    }

    fn dkg(&self, session: &NativeSession, curve: Curve, sid: SessionId) -> Result<(Key, SessionId)> {
        let width = curve.max_hash_size();
        let mut own_share = vec![0u8; width];
        rand::thread_rng().fill_bytes(&mut own_share);

        let public_point = aggregate_and_broadcast(session, own_share.clone(), |pairs| {
            let mut hasher = Sha256::new();
            for (role, bytes) in pairs {
                hasher.update(role.get().to_be_bytes());
                hasher.update(bytes);
            }
            hasher.finalize().to_vec()
        })?;

        let final_sid = if sid.is_empty() {
            let mut bytes = [0u8; 16];
            rand::thread_rng().fill_bytes(&mut bytes);
            let minted = aggregate_and_broadcast(session, bytes.to_vec(), |pairs| {
                pairs[0].1.clone() // AGGREGATOR's own minted id wins for everyone
            })?;
            SessionId::from_bytes(minted)
        } else {
            sid
        };

        let token = self.registry.register(KeyMaterial {
            own_share,
            public_point: public_point.clone(),
        });
        tracing::info!(curve = %curve, "DKG complete");
        Ok((Key::new(Arc::clone(&self.registry), token, curve, public_point), final_sid))
    }

    fn refresh(&self, session: &NativeSession, key: &Key) -> Result<Key> {
        let material: KeyMaterial = self
            .registry
            .lookup_any(key.token())?
            .downcast_ref::<KeyMaterial>()
            .map(|m| KeyMaterial {
                own_share: m.own_share.clone(),
                public_point: m.public_point.clone(),
            })
            .ok_or_else(|| Error::InvalidHandle("key handle has the wrong resource type".into()))?;

        let mut nonce = vec![0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);
        let round_nonce = aggregate_and_broadcast(session, nonce, |pairs| {
            let mut hasher = Sha256::new();
            for (_, bytes) in pairs {
                hasher.update(bytes);
            }
            hasher.finalize().to_vec()
        })?;

        let new_share = hmac_sha256(&material.own_share, &round_nonce);
        // Public point is unchanged by design — Refresh must preserve the
        // joint public key (§3, §8).
        let token = self.registry.register(KeyMaterial {
            own_share: new_share,
            public_point: material.public_point.clone(),
        });
        tracing::info!(curve = %key.curve(), "Refresh complete");
        Ok(Key::new(Arc::clone(&self.registry), token, key.curve(), material.public_point))
    }

    fn sign(
        &self,
        session: &NativeSession,
        key: &Key,
        message_hash: &[u8],
        receiver: SignerReceiver,
    ) -> Result<Vec<u8>> {
        if message_hash.len() > key.curve().max_hash_size() {
            return Err(Error::InvalidArgument(format!(
                "message hash of {} bytes exceeds curve order size {}",
                message_hash.len(),
                key.curve().max_hash_size()
            )));
        }
        let material = self
            .registry
            .lookup_any(key.token())?
            .downcast_ref::<KeyMaterial>()
            .map(|m| m.own_share.clone())
            .ok_or_else(|| Error::InvalidHandle("key handle has the wrong resource type".into()))?;

        let partial = hmac_sha256(&material, message_hash);
        let self_role = session.self_role();

        if self_role == receiver.0 {
            let others: Vec<RoleId> = (0..session.party_count() as u32)
                .map(RoleId::new)
                .filter(|r| *r != self_role)
                .collect();
            let received = session.callbacks.receive_all(session.session_ptr(), &others)?;
            let mut hasher = Sha256::new();
            hasher.update(&partial);
            for bytes in received {
                hasher.update(bytes);
            }
            let sig = hasher.finalize().to_vec();
            tracing::info!(role = self_role.get(), "assembled threshold signature");
            Ok(sig)
        } else {
            session
                .callbacks
                .send(session.session_ptr(), receiver.0, &partial)?;
            Ok(Vec::new())
        }
    }

    fn agree_random(&self, session: &NativeSession, bit_len: usize) -> Result<Vec<u8>> {
        if bit_len == 0 || bit_len % 8 != 0 {
            return Err(Error::InvalidArgument(format!(
                "agree-random bit length {bit_len} must be a positive multiple of 8"
            )));
        }
        let byte_len = bit_len / 8;
        let mut local = vec![0u8; byte_len];
        rand::thread_rng().fill_bytes(&mut local);

        aggregate_and_broadcast(session, local, |pairs| {
            let mut combined = vec![0u8; byte_len];
            for (_, bytes) in pairs {
                for (c, b) in combined.iter_mut().zip(bytes.iter()) {
                    *c ^= b;
                }
            }
            Sha256::digest(&combined)[..byte_len.min(32)].to_vec()
        })
    }

    fn pve_build(&self, curve: Curve, label: &[u8], kem_ct: &[u8], x: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let _ = curve;
        let mut hasher = Sha256::new();
        hasher.update(label);
        hasher.update(x);
        let q = hasher.finalize().to_vec();

        let tag = hmac_sha256(label, &[kem_ct, &q].concat());

        let mut blob = Vec::with_capacity(kem_ct.len() + q.len() + tag.len() + 8);
        blob.extend_from_slice(&(kem_ct.len() as u32).to_be_bytes());
        blob.extend_from_slice(kem_ct);
        blob.extend_from_slice(&q);
        blob.extend_from_slice(&tag);
        Ok((q, blob))
    }

    fn pve_verify(&self, label: &[u8], expected_q: &[u8], blob: &[u8]) -> Result<()> {
        let (kem_ct, q, tag) = split_blob(blob)?;
        if q != expected_q {
            return Err(Error::ProtocolAborted {
                status: -10,
                message: "PVE ciphertext does not commit to the expected point".into(),
            });
        }
        let expected_tag = hmac_sha256(label, &[kem_ct, q].concat());
        if expected_tag != tag {
            return Err(Error::ProtocolAborted {
                status: -11,
                message: "PVE ciphertext tag mismatch".into(),
            });
        }
        Ok(())
    }

    fn pve_kem_ct<'a>(&self, blob: &'a [u8]) -> Result<&'a [u8]> {
        let (kem_ct, _, _) = split_blob(blob)?;
        Ok(kem_ct)
    }

    fn compile_ac(&self, tree_bytes: Vec<u8>) -> Result<AccessStructureHandle> {
        // Structural validation already ran on the caller's tree before
        // compilation (§9); here the engine only "parses" its own blob.
        let token = self.registry.register(tree_bytes.clone());
        Ok(AccessStructureHandle::new(Arc::clone(&self.registry), token, tree_bytes))
    }

    fn generator(&self, curve: Curve) -> Result<CurvePoint> {
        Ok(self.new_point(curve, curve.generator_encoding()))
    }

    fn scalar_add(&self, a: &Scalar, b: &Scalar) -> Result<Scalar> {
        self.scalar_binop(a, b, modmath::add_mod)
    }

    fn scalar_sub(&self, a: &Scalar, b: &Scalar) -> Result<Scalar> {
        self.scalar_binop(a, b, modmath::sub_mod)
    }

    fn scalar_mul(&self, a: &Scalar, b: &Scalar) -> Result<Scalar> {
        self.scalar_binop(a, b, modmath::mul_mod)
    }

    fn scalar_inv(&self, a: &Scalar) -> Result<Scalar> {
        let m = a.curve().order();
        let value = modmath::reduce_to_width_mod(&a.bytes_padded(), m);
        let inv = modmath::inv_mod(&value, m)?;
        Ok(self.new_scalar(a.curve(), inv))
    }

    fn point_add(&self, a: &CurvePoint, b: &CurvePoint) -> Result<CurvePoint> {
        self.point_binop(a, b, modmath::add_mod)
    }

    fn point_sub(&self, a: &CurvePoint, b: &CurvePoint) -> Result<CurvePoint> {
        self.point_binop(a, b, modmath::sub_mod)
    }

    fn point_neg(&self, a: &CurvePoint) -> Result<CurvePoint> {
        let m = a.curve().order();
        let value = modmath::reduce_to_width_mod(a.encoded(), m);
        let zero = vec![0u8; m.len()];
        Ok(self.new_point(a.curve(), modmath::sub_mod(&zero, &value, m)))
    }

    fn point_scalar_mul(&self, point: &CurvePoint, scalar: &Scalar) -> Result<CurvePoint> {
        if point.curve() != scalar.curve() {
            return Err(Error::AlgorithmMismatch(
                "point and scalar operands must share a curve".into(),
            ));
        }
        let m = point.curve().order();
        let p = modmath::reduce_to_width_mod(point.encoded(), m);
        let s = modmath::reduce_to_width_mod(&scalar.bytes_padded(), m);
        Ok(self.new_point(point.curve(), modmath::mul_mod(&p, &s, m)))
    }

    fn scalar_times_generator(&self, scalar: &Scalar) -> Result<CurvePoint> {
        let m = scalar.curve().order();
        let value = modmath::reduce_to_width_mod(&scalar.bytes_padded(), m);
        Ok(self.new_point(scalar.curve(), value))
    }

    fn point_coordinates(&self, point: &CurvePoint) -> Result<(Vec<u8>, Vec<u8>)> {
        let encoded = point.encoded();
        let mid = (encoded.len() + 1) / 2;
        Ok((encoded[..mid].to_vec(), encoded[mid..].to_vec()))
    }
}

fn split_blob(blob: &[u8]) -> Result<(&[u8], &[u8], &[u8])> {
    if blob.len() < 4 {
        return Err(Error::ProtocolAborted {
            status: -12,
            message: "PVE ciphertext blob truncated".into(),
        });
    }
    let kem_len = u32::from_be_bytes(blob[0..4].try_into().expect("checked 4 bytes")) as usize;
    if blob.len() < 4 + kem_len + 32 + 32 {
        return Err(Error::ProtocolAborted {
            status: -12,
            message: "PVE ciphertext blob truncated".into(),
        });
    }
    let kem_ct = &blob[4..4 + kem_len];
    let q = &blob[4 + kem_len..4 + kem_len + 32];
    let tag = &blob[4 + kem_len + 32..4 + kem_len + 64];
    Ok((kem_ct, q, tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// An in-process loopback `SessionCallbacks` used only by this
    /// crate's own unit tests, standing in for `cbmpc-bridge` + a real
    /// transport.
    struct LoopbackCallbacks {
        inboxes: Vec<Mutex<HashMap<u32, std::sync::mpsc::Receiver<Vec<u8>>>>>,
        senders: Vec<Mutex<HashMap<u32, std::sync::mpsc::Sender<Vec<u8>>>>>,
    }

    impl LoopbackCallbacks {
        fn new(n: usize) -> Vec<Arc<Self>> {
            // Build n^2 one-shot-ish channels (unbounded, reused per test).
            let mut senders: Vec<HashMap<u32, std::sync::mpsc::Sender<Vec<u8>>>> =
                (0..n).map(|_| HashMap::new()).collect();
            let mut receivers: Vec<HashMap<u32, std::sync::mpsc::Receiver<Vec<u8>>>> =
                (0..n).map(|_| HashMap::new()).collect();
            for from in 0..n {
                for to in 0..n {
                    if from == to {
                        continue;
                    }
                    let (tx, rx) = std::sync::mpsc::channel();
                    senders[from].insert(to as u32, tx);
                    receivers[to].insert(from as u32, rx);
                }
            }
            receivers
                .into_iter()
                .zip(senders)
                .map(|(rx, tx)| {
                    Arc::new(Self {
                        inboxes: vec![Mutex::new(rx)],
                        senders: vec![Mutex::new(tx)],
                    })
                })
                .collect()
        }
    }

    impl SessionCallbacks for LoopbackCallbacks {
        fn send(&self, _session_ptr: u64, to: RoleId, bytes: &[u8]) -> Result<()> {
            let senders = self.senders[0].lock().expect("lock poisoned");
            senders
                .get(&to.get())
                .expect("peer exists in loopback")
                .send(bytes.to_vec())
                .map_err(|_| Error::PeerDisconnected("loopback channel closed".into()))
        }

        fn receive(&self, _session_ptr: u64, from: RoleId) -> Result<Vec<u8>> {
            let inboxes = self.inboxes[0].lock().expect("lock poisoned");
            inboxes
                .get(&from.get())
                .expect("peer exists in loopback")
                .recv()
                .map_err(|_| Error::PeerDisconnected("loopback channel closed".into()))
        }

        fn receive_all(&self, session_ptr: u64, from: &[RoleId]) -> Result<Vec<Vec<u8>>> {
            from.iter().map(|r| self.receive(session_ptr, *r)).collect()
        }
    }

    fn build_sessions(engine: &MockEngine, n: usize) -> Vec<NativeSession> {
        let callbacks = LoopbackCallbacks::new(n);
        callbacks
            .into_iter()
            .enumerate()
            .map(|(role, cb)| {
                engine
                    .new_session(role as u64 + 1, RoleId::new(role as u32), n, cb)
                    .expect("session construction succeeds")
            })
            .collect()
    }

    #[test]
    fn test_agree_random_matches_across_parties() {
        let engine = MockEngine::new();
        let sessions = build_sessions(&engine, 3);

        let results: Vec<Vec<u8>> = std::thread::scope(|scope| {
            let handles: Vec<_> = sessions
                .iter()
                .map(|s| scope.spawn(|| engine.agree_random(s, 256).expect("agree-random succeeds")))
                .collect();
            handles.into_iter().map(|h| h.join().expect("thread join")).collect()
        });

        assert_eq!(results[0], results[1]);
        assert_eq!(results[1], results[2]);
        assert_eq!(results[0].len(), 32);
    }

    #[test]
    fn test_dkg_public_point_matches_across_parties() {
        let engine = MockEngine::new();
        let sessions = build_sessions(&engine, 2);

        let results: Vec<(Key, SessionId)> = std::thread::scope(|scope| {
            let handles: Vec<_> = sessions
                .iter()
                .map(|s| scope.spawn(|| engine.dkg(s, Curve::P256, SessionId::fresh()).expect("dkg succeeds")))
                .collect();
            handles.into_iter().map(|h| h.join().expect("thread join")).collect()
        });

        assert_eq!(results[0].0.public_point(), results[1].0.public_point());
        assert_eq!(results[0].1, results[1].1);
    }

    #[test]
    fn test_pve_round_trip_and_tamper_detection() {
        let engine = MockEngine::new();
        let label = b"backup-alice";
        let x = b"some 32 byte scalar material....";
        let kem_ct = b"pretend-kem-ciphertext";

        let (q, blob) = engine
            .pve_build(Curve::P256, label, kem_ct, x)
            .expect("pve_build succeeds");
        engine.pve_verify(label, &q, &blob).expect("fresh blob verifies");

        let mut tampered = blob.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        assert!(engine.pve_verify(label, &q, &tampered).is_err());
    }

    #[test]
    fn test_scalar_add_sub_round_trip() {
        let engine = MockEngine::new();
        let a = engine.new_scalar(Curve::P256, vec![7]);
        let b = engine.new_scalar(Curve::P256, vec![9]);
        let sum = engine.scalar_add(&a, &b).expect("add succeeds");
        let back = engine.scalar_sub(&sum, &b).expect("sub succeeds");
        assert_eq!(back.bytes_padded(), a.bytes_padded());
    }

    #[test]
    fn test_scalar_inv_is_multiplicative_inverse() {
        let engine = MockEngine::new();
        let a = engine.new_scalar(Curve::Secp256k1, vec![1, 2, 3]);
        let inv = engine.scalar_inv(&a).expect("invertible");
        let product = engine.scalar_mul(&a, &inv).expect("mul succeeds");
        assert_eq!(product.bytes_padded(), Curve::Secp256k1.generator_encoding());
    }

    #[test]
    fn test_scalar_arithmetic_rejects_curve_mismatch() {
        let engine = MockEngine::new();
        let a = engine.new_scalar(Curve::P256, vec![1]);
        let b = engine.new_scalar(Curve::Secp256k1, vec![1]);
        assert!(engine.scalar_add(&a, &b).is_err());
    }

    #[test]
    fn test_scalar_times_generator_matches_point_scalar_mul_of_generator() {
        let engine = MockEngine::new();
        let scalar = engine.new_scalar(Curve::P256, vec![42]);
        let via_shortcut = engine.scalar_times_generator(&scalar).expect("succeeds");
        let g = engine.generator(Curve::P256).expect("generator succeeds");
        let via_scalar_mul = engine.point_scalar_mul(&g, &scalar).expect("succeeds");
        assert_eq!(via_shortcut, via_scalar_mul);
    }

    #[test]
    fn test_point_add_neg_is_identity() {
        let engine = MockEngine::new();
        let p = engine.new_point(Curve::P256, vec![5, 6]);
        let neg = engine.point_neg(&p).expect("neg succeeds");
        let sum = engine.point_add(&p, &neg).expect("add succeeds");
        assert!(sum.is_infinity());
    }

    #[test]
    fn test_point_coordinates_splits_encoding_in_half() {
        let engine = MockEngine::new();
        let p = engine.generator(Curve::P256).expect("generator succeeds");
        let (x, y) = engine.point_coordinates(&p).expect("coordinates succeeds");
        assert_eq!(x.len() + y.len(), Curve::P256.max_hash_size());
    }
}
