//! Protocol façades over the threshold-cryptography engine (§4.6).
//!
//! Each submodule exposes a small set of free functions that validate
//! their arguments, drive a [`cbmpc_job::Job2P`] or [`cbmpc_job::JobMP`]
//! through the underlying [`cbmpc_engine::Engine`], and return
//! application-level types (`Key`, `Ciphertext`, signatures) rather than
//! raw engine blobs.

mod job_handle;

pub mod agree_random;
pub mod config;
pub mod dkg;
pub mod pve;
pub mod refresh;
pub mod schnorr;
pub mod sign;

#[cfg(test)]
mod test_support;

pub use config::{HarnessConfig, LoggingConfig, TransportConfig};
pub use job_handle::JobHandle;

pub use cbmpc_engine::{AccessStructure, AccessStructureHandle, Key, SignerReceiver};
pub use cbmpc_job::{Job2P, JobMP};
pub use cbmpc_types::{Ciphertext, Curve, Error, ErrorKind, PartyName, Result, RoleId, SessionId};
