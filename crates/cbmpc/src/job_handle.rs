//! A thin seam letting every façade function in this crate be written
//! once against either job shape (§4.6: façades "invoke the engine with
//! the job pointer"), rather than duplicated for `Job2P` and `JobMP`.

use cbmpc_engine::{Engine, NativeSession};
use cbmpc_job::{Job2P, JobMP};
use cbmpc_types::Result;
use std::sync::Arc;

pub trait JobHandle {
    fn engine(&self) -> &Arc<dyn Engine>;
    fn session(&self) -> Result<&NativeSession>;
}

impl JobHandle for Job2P {
    fn engine(&self) -> &Arc<dyn Engine> {
        Job2P::engine(self)
    }

    fn session(&self) -> Result<&NativeSession> {
        Job2P::session(self)
    }
}

impl JobHandle for JobMP {
    fn engine(&self) -> &Arc<dyn Engine> {
        JobMP::engine(self)
    }

    fn session(&self) -> Result<&NativeSession> {
        JobMP::session(self)
    }
}
