//! Shared test fixtures for this crate's façade unit tests: in-process
//! jobs over a no-op transport, enough to drive the `mock` engine without
//! a real mTLS cluster.

#![cfg(test)]

use cbmpc_bridge::SessionTable;
use cbmpc_engine::{Engine, MockEngine};
use cbmpc_job::{Job2P, JobMP};
use cbmpc_transport::Transport;
use cbmpc_types::{PartyName, Result, Role2P, RoleId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Handle;

struct NullTransport;

#[async_trait::async_trait]
impl Transport for NullTransport {
    async fn send(&self, _to: RoleId, _bytes: Vec<u8>) -> Result<()> {
        Ok(())
    }
    async fn receive(&self, _from: RoleId) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
    async fn receive_all(&self, _from: &[RoleId]) -> Result<HashMap<RoleId, Vec<u8>>> {
        Ok(HashMap::new())
    }
    async fn close(&self) {}
}

pub async fn mp_job(self_role: RoleId, party_count: usize) -> JobMP {
    let engine: Arc<dyn Engine> = Arc::new(MockEngine::new());
    let table = Arc::new(SessionTable::new());
    let transport: Arc<dyn Transport> = Arc::new(NullTransport);
    let names = (0..party_count)
        .map(|i| PartyName::new(format!("party-{i}")).expect("valid name"))
        .collect();
    JobMP::new(engine, table, transport, self_role, names, Handle::current(), None)
        .expect("job construction succeeds")
}

pub async fn twop_job(self_role: Role2P) -> Job2P {
    let engine: Arc<dyn Engine> = Arc::new(MockEngine::new());
    let table = Arc::new(SessionTable::new());
    let transport: Arc<dyn Transport> = Arc::new(NullTransport);
    let names = [
        PartyName::new("alice").expect("valid name"),
        PartyName::new("bob").expect("valid name"),
    ];
    Job2P::new(engine, table, transport, self_role, names, Handle::current(), None)
        .expect("job construction succeeds")
}
