//! Loading certificates and building per-peer endpoint addresses from a
//! [`ClusterConfig`] (§6).

use cbmpc_types::{ClusterConfig, Error, PartyName, Result, RoleId};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

/// Everything a [`crate::TlsTransport`] needs to dial/listen for one party.
#[derive(Clone)]
pub struct ResolvedParty {
    pub name: PartyName,
    pub role: RoleId,
    pub address: SocketAddr,
    pub cert: CertificateDer<'static>,
}

/// The fully-resolved cluster view a transport is constructed from: the
/// caller's own role, every party's certificate and address, and the CA
/// pool every leaf certificate must chain to.
pub struct ResolvedCluster {
    pub self_role: RoleId,
    pub ca_certs: Vec<CertificateDer<'static>>,
    pub parties: Vec<ResolvedParty>,
    pub own_cert: CertificateDer<'static>,
    pub own_key: PrivateKeyDer<'static>,
}

/// Reads a [`ClusterConfig`] plus `self_role`'s own private key, resolving
/// every relative path against `root` (§6 `ClusterConfig.validate`'s
/// root-confinement already guarantees these paths stay under `root`).
pub fn resolve_cluster(config: &ClusterConfig, root: &Path, self_role: RoleId) -> Result<ResolvedCluster> {
    config.validate(root)?;

    let self_index = self_role.get() as usize;
    let Some(self_party) = config.parties.get(self_index) else {
        return Err(Error::InvalidArgument(format!(
            "self role {self_index} out of range for {} parties",
            config.parties.len()
        )));
    };

    let ca_certs = load_certs(&root.join(&config.ca_cert))?;
    let own_cert_chain = load_certs(&root.join(&self_party.cert))?;
    let own_cert = own_cert_chain
        .into_iter()
        .next()
        .ok_or_else(|| Error::CertificateInvalid("own certificate file is empty".to_string()))?;
    let own_key = load_private_key(&root.join(&self_party.key))?;

    let mut parties = Vec::with_capacity(config.parties.len());
    for (index, party) in config.parties.iter().enumerate() {
        let address: SocketAddr = party.address.parse().map_err(|e| {
            Error::ConfigInvalid(format!("party {index} address {:?} invalid: {e}", party.address))
        })?;
        let cert_chain = load_certs(&root.join(&party.cert))?;
        let cert = cert_chain.into_iter().next().ok_or_else(|| {
            Error::CertificateInvalid(format!("party {index} certificate file is empty"))
        })?;
        parties.push(ResolvedParty {
            name: PartyName::new(party.name.clone())?,
            role: RoleId::new(index as u32),
            address,
            cert,
        });
    }

    Ok(ResolvedCluster {
        self_role,
        ca_certs,
        parties,
        own_cert,
        own_key,
    })
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let bytes = fs::read(path)
        .map_err(|e| Error::CertificateInvalid(format!("reading {}: {e}", path.display())))?;
    let certs = rustls_pemfile::certs(&mut bytes.as_slice())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::CertificateInvalid(format!("parsing {}: {e}", path.display())))?;
    if certs.is_empty() {
        return Err(Error::CertificateInvalid(format!(
            "{} contains no certificates",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let bytes = fs::read(path)
        .map_err(|e| Error::CertificateInvalid(format!("reading {}: {e}", path.display())))?;
    rustls_pemfile::private_key(&mut bytes.as_slice())
        .map_err(|e| Error::CertificateInvalid(format!("parsing {}: {e}", path.display())))?
        .ok_or_else(|| Error::CertificateInvalid(format!("{} contains no private key", path.display())))
}
