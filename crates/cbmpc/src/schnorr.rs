//! `SchnorrMP` façade namespace (§4.6): the BIP-340/Schnorr-family
//! sibling of the ECDSA façades, restricted to curves with
//! [`Curve::supports_schnorr`] and BIP-340's fixed 32-byte message.

use crate::JobHandle;
use cbmpc_engine::{AccessStructure, AccessStructureHandle, Key, SignerReceiver};
use cbmpc_job::JobMP;
use cbmpc_types::{Curve, Error, Result, SessionId};

fn require_schnorr(curve: Curve) -> Result<()> {
    if !curve.supports_schnorr() {
        return Err(Error::InvalidArgument(format!(
            "{curve} does not support Schnorr/BIP-340 signing"
        )));
    }
    Ok(())
}

pub fn dkg<J: JobHandle>(job: &J, curve: Curve, sid: SessionId) -> Result<(Key, SessionId)> {
    require_schnorr(curve)?;
    crate::dkg::dkg(job, curve, sid)
}

pub fn threshold_dkg(
    job: &JobMP,
    curve: Curve,
    sid: SessionId,
    ac: &AccessStructure,
) -> Result<(Key, SessionId, AccessStructureHandle)> {
    require_schnorr(curve)?;
    crate::dkg::threshold_dkg(job, curve, sid, ac)
}

pub fn refresh<J: JobHandle>(job: &J, key: &Key) -> Result<Key> {
    require_schnorr(key.curve())?;
    crate::refresh::refresh(job, key)
}

pub fn threshold_refresh(job: &JobMP, key: &Key, ac: &AccessStructureHandle) -> Result<Key> {
    require_schnorr(key.curve())?;
    crate::refresh::threshold_refresh(job, key, ac)
}

/// Signs a BIP-340 message (exactly 32 bytes) under `key`.
pub fn sign<J: JobHandle>(
    job: &J,
    key: &Key,
    message: &[u8],
    receiver: SignerReceiver,
) -> Result<Vec<u8>> {
    require_schnorr(key.curve())?;
    if message.len() != 32 {
        return Err(Error::InvalidArgument(format!(
            "BIP-340 message must be exactly 32 bytes, got {}",
            message.len()
        )));
    }
    let session = job.session()?;
    job.engine().sign(session, key, message, receiver)
}

pub fn sign_batch<J: JobHandle>(
    job: &J,
    key: &Key,
    messages: &[Vec<u8>],
    receiver: SignerReceiver,
) -> Result<Vec<Vec<u8>>> {
    if messages.is_empty() {
        return Err(Error::InvalidArgument(
            "batch signing requires at least one message".into(),
        ));
    }
    messages.iter().map(|m| sign(job, key, m, receiver)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mp_job;
    use cbmpc_types::RoleId;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dkg_rejects_non_schnorr_curve() {
        let job = mp_job(RoleId::new(0), 1).await;
        let err = dkg(&job, Curve::P256, SessionId::fresh())
            .expect_err("P-256 does not support Schnorr");
        assert_eq!(err.kind(), cbmpc_types::ErrorKind::InvalidArgument);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sign_rejects_wrong_length_message() {
        let job = mp_job(RoleId::new(0), 1).await;
        let (key, _sid) = dkg(&job, Curve::Secp256k1, SessionId::fresh()).expect("dkg succeeds");
        let bad = vec![0u8; 31];
        let err = sign(&job, &key, &bad, SignerReceiver(RoleId::new(0)))
            .expect_err("31-byte message must be rejected");
        assert_eq!(err.kind(), cbmpc_types::ErrorKind::InvalidArgument);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sign_accepts_32_byte_message() {
        let job = mp_job(RoleId::new(0), 1).await;
        let (key, _sid) = dkg(&job, Curve::Ed25519, SessionId::fresh()).expect("dkg succeeds");
        let msg = vec![1u8; 32];
        let sig = sign(&job, &key, &msg, SignerReceiver(RoleId::new(0))).expect("sign succeeds");
        assert!(!sig.is_empty());
    }
}
