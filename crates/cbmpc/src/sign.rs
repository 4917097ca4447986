//! Sign façade (§4.6): threshold ECDSA signing with the signer-receiver
//! convention ("exactly one designated role index receives the assembled
//! signature; all other parties receive an empty signature").

use crate::JobHandle;
use cbmpc_engine::{Key, SignerReceiver};
use cbmpc_types::{Error, Result};

/// Signs `message_hash` under `key`, returning a non-empty signature only
/// for the party at `receiver`.
pub fn sign<J: JobHandle>(
    job: &J,
    key: &Key,
    message_hash: &[u8],
    receiver: SignerReceiver,
) -> Result<Vec<u8>> {
    validate_ecdsa_hash(key, message_hash)?;
    let session = job.session()?;
    let sig = job.engine().sign(session, key, message_hash, receiver)?;
    tracing::debug!(receiver = receiver.0.get(), signature_len = sig.len(), "sign complete");
    Ok(sig)
}

/// Signs a batch of message hashes under `key`, one call per message
/// ("Batch signing follows the same rule per message").
pub fn sign_batch<J: JobHandle>(
    job: &J,
    key: &Key,
    message_hashes: &[Vec<u8>],
    receiver: SignerReceiver,
) -> Result<Vec<Vec<u8>>> {
    if message_hashes.is_empty() {
        return Err(Error::InvalidArgument(
            "batch signing requires at least one message".into(),
        ));
    }
    message_hashes
        .iter()
        .map(|hash| sign(job, key, hash, receiver))
        .collect()
}

fn validate_ecdsa_hash(key: &Key, message_hash: &[u8]) -> Result<()> {
    if message_hash.is_empty() {
        return Err(Error::InvalidArgument("message hash must not be empty".into()));
    }
    if message_hash.len() > key.curve().max_hash_size() {
        return Err(Error::InvalidArgument(format!(
            "message hash of {} bytes exceeds curve order size {}",
            message_hash.len(),
            key.curve().max_hash_size()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dkg::dkg;
    use crate::test_support::mp_job;
    use cbmpc_types::{Curve, RoleId, SessionId};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sign_rejects_oversized_hash() {
        let job = mp_job(RoleId::new(0), 1).await;
        let (key, _sid) = dkg(&job, Curve::P256, SessionId::fresh()).expect("dkg succeeds");
        let too_long = vec![0u8; 33];
        let err = sign(&job, &key, &too_long, SignerReceiver(RoleId::new(0)))
            .expect_err("oversized hash must be rejected");
        assert_eq!(err.kind(), cbmpc_types::ErrorKind::InvalidArgument);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sign_receiver_gets_nonempty_signature() {
        let job = mp_job(RoleId::new(0), 1).await;
        let (key, _sid) = dkg(&job, Curve::P256, SessionId::fresh()).expect("dkg succeeds");
        let hash = vec![7u8; 32];
        let sig = sign(&job, &key, &hash, SignerReceiver(RoleId::new(0))).expect("sign succeeds");
        assert!(!sig.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sign_batch_rejects_empty_batch() {
        let job = mp_job(RoleId::new(0), 1).await;
        let (key, _sid) = dkg(&job, Curve::P256, SessionId::fresh()).expect("dkg succeeds");
        let err = sign_batch(&job, &key, &[], SignerReceiver(RoleId::new(0)))
            .expect_err("empty batch must be rejected");
        assert_eq!(err.kind(), cbmpc_types::ErrorKind::InvalidArgument);
    }
}
