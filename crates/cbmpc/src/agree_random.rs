//! AgreeRandom / MultiAgreeRandom façades (§4.6, §8 seed scenario 1).

use cbmpc_job::{Job2P, JobMP};
use cbmpc_types::{Error, Result};

fn validate_bit_len(bit_len: usize) -> Result<()> {
    if bit_len == 0 || bit_len % 8 != 0 {
        return Err(Error::InvalidArgument(format!(
            "agree-random bit length {bit_len} must be a positive multiple of 8"
        )));
    }
    Ok(())
}

/// 2-party AgreeRandom.
pub fn agree_random(job: &Job2P, bit_len: usize) -> Result<Vec<u8>> {
    validate_bit_len(bit_len)?;
    let session = job.session()?;
    let bytes = job.engine().agree_random(session, bit_len)?;
    tracing::debug!(bit_len, "agree-random complete");
    Ok(bytes)
}

/// N-party AgreeRandom.
pub fn multi_agree_random(job: &JobMP, bit_len: usize) -> Result<Vec<u8>> {
    validate_bit_len(bit_len)?;
    let session = job.session()?;
    let bytes = job.engine().agree_random(session, bit_len)?;
    tracing::debug!(bit_len, "multi-agree-random complete");
    Ok(bytes)
}
