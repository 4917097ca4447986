//! Shared mTLS test-cluster harness: one self-signed certificate per
//! party written to a tempdir, with every party's own leaf trusted as its
//! own root — the same self-signed pattern `cbmpc-transport`'s own unit
//! tests use for a single pair, scaled up to an N-party loopback cluster.

use cbmpc_transport::{resolve_cluster, TlsTransport, Transport, TransportOptions};
use cbmpc_types::{ClusterConfig, PartyConfig, RoleId};
use std::net::TcpListener as StdTcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestCluster {
    pub dir: TempDir,
    pub config: ClusterConfig,
}

fn self_signed_pem(name: &str) -> (String, String) {
    let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ED25519).expect("key pair generation");
    let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).expect("cert params");
    params.distinguished_name = rcgen::DistinguishedName::new();
    params.distinguished_name.push(rcgen::DnType::CommonName, name);
    let cert = params.self_signed(&key_pair).expect("self-signed cert");
    (cert.pem(), key_pair.serialize_pem())
}

/// Grabs a currently-free loopback port. Releasing it before
/// `TlsTransport::connect` rebinds it is an inherent small race in any
/// ephemeral-port test helper; acceptable on the loopback interface used
/// here.
fn free_port() -> u16 {
    StdTcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .expect("read local addr")
        .port()
}

/// Builds a `party_count`-party cluster config and writes its PEM
/// materials under a fresh tempdir, one self-signed cert/key pair per
/// party plus a `ca.pem` bundle concatenating every party's own cert.
pub fn build_cluster(names: &[&str]) -> TestCluster {
    let dir = TempDir::new().expect("create tempdir");
    let mut ca_bundle = String::new();
    let mut parties = Vec::with_capacity(names.len());

    for name in names {
        let (cert_pem, key_pem) = self_signed_pem(name);
        std::fs::write(dir.path().join(format!("{name}.pem")), &cert_pem).expect("write cert");
        std::fs::write(dir.path().join(format!("{name}.key")), &key_pem).expect("write key");
        ca_bundle.push_str(&cert_pem);

        let port = free_port();
        parties.push(PartyConfig {
            name: name.to_string(),
            address: format!("127.0.0.1:{port}"),
            cert: PathBuf::from(format!("{name}.pem")),
            key: PathBuf::from(format!("{name}.key")),
        });
    }

    std::fs::write(dir.path().join("ca.pem"), &ca_bundle).expect("write ca bundle");

    let config = ClusterConfig {
        ca_cert: PathBuf::from("ca.pem"),
        parties,
    };
    config.validate(dir.path()).expect("generated cluster config validates");

    TestCluster { dir, config }
}

/// Resolves and dials/listens for every party concurrently, returning one
/// connected transport per role in party order. Does not return until
/// every party's slot is filled (`TlsTransport::connect`'s own contract).
pub async fn connect_all(cluster: &TestCluster) -> Vec<Arc<dyn Transport>> {
    let root = cluster.dir.path().to_path_buf();
    let config = cluster.config.clone();
    let party_count = config.parties.len();

    let mut tasks = Vec::with_capacity(party_count);
    for role in 0..party_count {
        let root = root.clone();
        let config = config.clone();
        tasks.push(tokio::spawn(async move {
            let resolved = resolve_cluster(&config, &root, RoleId::new(role as u32))
                .expect("cluster resolves for this role");
            let transport = TlsTransport::connect(resolved, TransportOptions::default())
                .await
                .expect("transport connects to every peer");
            Arc::new(transport) as Arc<dyn Transport>
        }));
    }

    let mut out = Vec::with_capacity(party_count);
    for task in tasks {
        out.push(task.await.expect("connect task panicked"));
    }
    out
}
