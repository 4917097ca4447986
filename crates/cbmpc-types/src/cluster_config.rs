//! Cluster configuration (§6): the JSON topology document naming every
//! party's address and certificate material.
//!
//! Loading is deliberately split from validation, mirroring the teacher's
//! `DaemonConfig` loader: `ClusterConfig::from_str`/`from_path` only parse
//! JSON, `validate` enforces the invariants spec.md lists separately so a
//! caller can inspect a rejected config before surfacing the error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Error;

/// One party's entry in the cluster topology.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PartyConfig {
    pub name: String,
    pub address: String,
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// The cluster-wide topology document (§6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub ca_cert: PathBuf,
    pub parties: Vec<PartyConfig>,
}

impl ClusterConfig {
    /// Parses a `ClusterConfig` from its JSON text form.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text)
            .map_err(|e| Error::ConfigInvalid(format!("malformed cluster config JSON: {e}")))
    }

    /// Validates every invariant §6 lists, given the root directory that
    /// cert/key paths must not escape.
    ///
    /// `root` is ambient (not named by the JSON schema itself) — see
    /// `HarnessConfig` for where a caller supplies it.
    pub fn validate(&self, root: &Path) -> Result<(), Error> {
        if self.parties.len() < 2 {
            return Err(Error::ConfigInvalid(format!(
                "cluster must have at least 2 parties, got {}",
                self.parties.len()
            )));
        }

        let mut names = HashSet::with_capacity(self.parties.len());
        let mut addresses = HashSet::with_capacity(self.parties.len());

        for party in &self.parties {
            if party.name.is_empty() {
                return Err(Error::ConfigInvalid("party name must not be empty".into()));
            }
            if party.address.is_empty() {
                return Err(Error::ConfigInvalid(format!(
                    "party {:?} has an empty address",
                    party.name
                )));
            }
            if party.cert.as_os_str().is_empty() || party.key.as_os_str().is_empty() {
                return Err(Error::ConfigInvalid(format!(
                    "party {:?} has an empty cert or key path",
                    party.name
                )));
            }
            validate_host_port(&party.address).map_err(|e| {
                Error::ConfigInvalid(format!("party {:?}: {e}", party.name))
            })?;
            within_root(root, &party.cert)?;
            within_root(root, &party.key)?;

            if !names.insert(party.name.clone()) {
                return Err(Error::ConfigInvalid(format!(
                    "duplicate party name {:?}",
                    party.name
                )));
            }
            if !addresses.insert(party.address.clone()) {
                return Err(Error::ConfigInvalid(format!(
                    "duplicate party address {:?}",
                    party.address
                )));
            }
        }

        if self.ca_cert.as_os_str().is_empty() {
            return Err(Error::ConfigInvalid("ca_cert path must not be empty".into()));
        }
        within_root(root, &self.ca_cert)?;

        Ok(())
    }

    /// The ordered party name list (§3: `names[0..N)`).
    pub fn names(&self) -> Vec<&str> {
        self.parties.iter().map(|p| p.name.as_str()).collect()
    }
}

fn validate_host_port(address: &str) -> Result<(), Error> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| Error::ConfigInvalid(format!("{address:?} is not host:port")))?;
    if host.is_empty() {
        return Err(Error::ConfigInvalid(format!("{address:?} has an empty host")));
    }
    port.parse::<u16>()
        .map_err(|_| Error::ConfigInvalid(format!("{address:?} has an invalid port")))?;
    Ok(())
}

/// Rejects `path` if, once resolved against `root` (for relative paths),
/// it would escape `root` via `..` components. Does not touch the
/// filesystem — certs need not exist yet at validation time.
fn within_root(root: &Path, path: &Path) -> Result<(), Error> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };

    let mut depth: i64 = 0;
    for component in joined.components() {
        use std::path::Component;
        match component {
            Component::ParentDir => depth -= 1,
            Component::Normal(_) => depth += 1,
            _ => {}
        }
        if depth < 0 {
            return Err(Error::ConfigInvalid(format!(
                "path {:?} escapes configured root {:?}",
                path, root
            )));
        }
    }
    Ok(())
}
