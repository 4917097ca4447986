//! PVE encrypt/verify/decrypt round trip and tamper detection on P-256,
//! driven through a real job over a connected mTLS cluster (seed
//! scenario). PVE's engine operations never touch the transport, but the
//! façade still requires a live job handle, so this exercises it end to
//! end rather than through the in-crate null-transport fixture.

mod common;

use cbmpc::pve::{decrypt, encrypt, verify};
use cbmpc_bridge::SessionTable;
use cbmpc_engine::{Engine, MockEngine};
use cbmpc_job::JobMP;
use cbmpc_kem::{Kem, RsaOaepKem};
use cbmpc_types::{Ciphertext, Curve, PartyName, RoleId};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn pve_round_trips_and_detects_tampering_over_mtls() {
    let cluster = common::build_cluster(&["alice", "bob"]);
    let mut transports = common::connect_all(&cluster).await;
    let bob_transport = transports.pop().expect("bob transport present");
    let alice_transport = transports.pop().expect("alice transport present");
    bob_transport.close().await;

    let names = vec![
        PartyName::new("alice").expect("valid name"),
        PartyName::new("bob").expect("valid name"),
    ];
    let engine: Arc<dyn Engine> = Arc::new(MockEngine::new());
    let table = Arc::new(SessionTable::new());
    let job = JobMP::new(engine, table, alice_transport.clone(), RoleId::new(0), names, Handle::current(), None)
        .expect("job construction succeeds");

    let kem: Arc<dyn Kem> = Arc::new(RsaOaepKem::new(2048));
    let (handle, ek) = kem.generate().expect("key generation succeeds");

    let unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the epoch")
        .as_secs();
    let label = format!("backup-alice-{unix}");
    let x = Sha256::digest(&ek).to_vec();

    let ct = encrypt(&job, kem.clone(), Curve::P256, &ek, label.as_bytes(), &x).expect("encrypt succeeds");

    let expected_q = Sha256::new_with_prefix(label.as_bytes()).chain_update(&x).finalize().to_vec();
    verify(&job, &ct, &expected_q).expect("fresh ciphertext verifies");

    let mut tampered_bytes = ct.blob().to_vec();
    let last = tampered_bytes.len() - 1;
    tampered_bytes[last] ^= 0x01;
    let tampered = Ciphertext::new(ct.curve(), ct.label().to_vec(), tampered_bytes);
    assert!(
        verify(&job, &tampered, &expected_q).is_err(),
        "a single flipped bit must fail verification"
    );

    let recovered = decrypt(&job, kem, &handle, &ct).expect("decrypt succeeds");
    assert_eq!(recovered, x);

    alice_transport.close().await;
}
