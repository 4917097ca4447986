//! DKG / ThresholdDKG façades (§4.6).

use crate::JobHandle;
use cbmpc_engine::{AccessStructure, AccessStructureHandle, Key};
use cbmpc_job::JobMP;
use cbmpc_types::{Curve, Result, SessionId};

/// Runs distributed key generation on `curve`, minting a fresh session id
/// if `sid` is empty.
pub fn dkg<J: JobHandle>(job: &J, curve: Curve, sid: SessionId) -> Result<(Key, SessionId)> {
    let session = job.session()?;
    let result = job.engine().dkg(session, curve, sid);
    if result.is_ok() {
        tracing::info!(%curve, "dkg complete");
    }
    result
}

/// DKG guarded by a threshold access structure: `ac` is validated and
/// compiled up front (§9: "the harness validates structural constraints
/// up front") before the engine is ever invoked.
pub fn threshold_dkg(
    job: &JobMP,
    curve: Curve,
    sid: SessionId,
    ac: &AccessStructure,
) -> Result<(Key, SessionId, AccessStructureHandle)> {
    ac.validate()?;
    let compiled = ac.compile()?;
    let ac_handle = job.engine().compile_ac(compiled)?;
    tracing::debug!("access structure compiled for threshold dkg");
    let (key, sid) = dkg(job, curve, sid)?;
    Ok((key, sid, ac_handle))
}
