//! Shared data-model types and error taxonomy for the threshold-crypto
//! harness (§3, §7 in the design notes).
//!
//! This crate has no dependency on the engine, the registry, the
//! transport, or tokio: everything here is a plain value type that other
//! crates pass across their own boundaries. Nothing in this crate talks to
//! the native engine.

mod ciphertext;
mod cluster_config;
mod curve;
mod error;
mod ids;

pub use ciphertext::Ciphertext;
pub use cluster_config::{ClusterConfig, PartyConfig};
pub use curve::Curve;
pub use error::{Error, ErrorKind, Result};
pub use ids::{PartyName, Role2P, RoleId, SessionId};
