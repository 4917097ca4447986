//! 2-party ECDSA DKG + Sign over a real mTLS cluster on P-256 (seed
//! scenario), signer-receiver fixed at role 0.
//!
//! The `mock` backend is a safe-Rust stand-in with no real elliptic-curve
//! math, so this test proves the harness's contract instead: both
//! parties land on the same joint key, and the designated receiver alone
//! gets a non-empty signature. Verifying a real DER-encoded ECDSA
//! signature would require a linked native engine.

mod common;

use cbmpc::dkg::dkg;
use cbmpc::sign::sign;
use cbmpc_bridge::SessionTable;
use cbmpc_engine::{Engine, MockEngine, SignerReceiver};
use cbmpc_job::Job2P;
use cbmpc_types::{Curve, PartyName, Role2P, RoleId, SessionId};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::runtime::Handle;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn two_party_dkg_then_sign_agrees_on_joint_key() {
    let cluster = common::build_cluster(&["alice", "bob"]);
    let transports = common::connect_all(&cluster).await;
    let message_hash = Sha256::digest(b"Hello, MPC World!").to_vec();

    let mut tasks = Vec::with_capacity(transports.len());
    for (role, transport) in transports.into_iter().enumerate() {
        let message_hash = message_hash.clone();
        let self_role = if role == 0 { Role2P::P1 } else { Role2P::P2 };
        let names = [
            PartyName::new("alice").expect("valid name"),
            PartyName::new("bob").expect("valid name"),
        ];
        tasks.push(tokio::spawn(async move {
            let engine: Arc<dyn Engine> = Arc::new(MockEngine::new());
            let table = Arc::new(SessionTable::new());
            let job = Job2P::new(engine, table, transport.clone(), self_role, names, Handle::current(), None)
                .expect("job construction succeeds");

            let (key, _sid) = dkg(&job, Curve::P256, SessionId::fresh()).expect("dkg succeeds");
            let public_point = key.public_point().to_vec();
            let signature = sign(&job, &key, &message_hash, SignerReceiver(RoleId::new(0)))
                .expect("sign succeeds");

            transport.close().await;
            (self_role, public_point, signature)
        }));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(task.await.expect("party task panicked"));
    }

    let (_, point0, sig0) = results
        .iter()
        .find(|(role, _, _)| *role == Role2P::P1)
        .expect("P1 result present");
    let (_, point1, sig1) = results
        .iter()
        .find(|(role, _, _)| *role == Role2P::P2)
        .expect("P2 result present");

    assert_eq!(point0, point1, "both parties must agree on the joint public key");
    assert!(!sig0.is_empty(), "the designated receiver gets a non-empty signature");
    assert!(sig1.is_empty(), "the non-receiver gets an empty signature");
}
