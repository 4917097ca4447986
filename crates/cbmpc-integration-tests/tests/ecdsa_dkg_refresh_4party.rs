//! 4-party ECDSA DKG + Refresh over a real mTLS cluster on P-256 (seed
//! scenario): the joint public key must survive Refresh unchanged across
//! every party, and a post-Refresh Sign must still produce a receiver
//! signature.

mod common;

use cbmpc::dkg::dkg;
use cbmpc::refresh::refresh;
use cbmpc::sign::sign;
use cbmpc_bridge::SessionTable;
use cbmpc_engine::{Engine, MockEngine, SignerReceiver};
use cbmpc_job::JobMP;
use cbmpc_types::{Curve, PartyName, RoleId, SessionId};
use std::sync::Arc;
use tokio::runtime::Handle;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
async fn four_party_refresh_preserves_public_key() {
    let party_names = ["alice", "bob", "carol", "dave"];
    let cluster = common::build_cluster(&party_names);
    let transports = common::connect_all(&cluster).await;
    let names: Vec<PartyName> = party_names
        .iter()
        .map(|n| PartyName::new(*n).expect("valid name"))
        .collect();

    let mut tasks = Vec::with_capacity(transports.len());
    for (role, transport) in transports.into_iter().enumerate() {
        let names = names.clone();
        tasks.push(tokio::spawn(async move {
            let engine: Arc<dyn Engine> = Arc::new(MockEngine::new());
            let table = Arc::new(SessionTable::new());
            let job = JobMP::new(engine, table, transport.clone(), RoleId::new(role as u32), names, Handle::current(), None)
                .expect("job construction succeeds");

            let (key, _sid) = dkg(&job, Curve::P256, SessionId::fresh()).expect("dkg succeeds");
            let before = key.public_point().to_vec();

            let refreshed = refresh(&job, &key).expect("refresh succeeds");
            let after = refreshed.public_point().to_vec();

            let signature = sign(&job, &refreshed, &[5u8; 32], SignerReceiver(RoleId::new(0)))
                .expect("post-refresh sign succeeds");

            transport.close().await;
            (role, before, after, signature)
        }));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(task.await.expect("party task panicked"));
    }

    let reference = results[0].1.clone();
    for (role, before, after, signature) in &results {
        assert_eq!(before, &reference, "public key must match across all parties before refresh");
        assert_eq!(after, &reference, "refresh must not change the joint public key");
        if *role == 0 {
            assert!(!signature.is_empty(), "receiver gets a non-empty post-refresh signature");
        } else {
            assert!(signature.is_empty(), "non-receivers get an empty post-refresh signature");
        }
    }
}
