//! Implements [`cbmpc_engine::SessionCallbacks`] over a real [`Transport`]
//! (§4.4). The engine's callbacks are synchronous (§9); `Transport`'s
//! operations are async, so each callback parks the calling OS thread on
//! the tokio runtime rather than spawning — there is no callback queue on
//! either side of this boundary, matching §9's scheduling model.

use cbmpc_engine::SessionCallbacks;
use cbmpc_transport::Transport;
use cbmpc_types::{Error, Result, RoleId};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Bridges one job's [`Transport`] to the engine's callback ABI.
pub struct TransportCallbacks {
    transport: Arc<dyn Transport>,
    runtime: Handle,
}

impl TransportCallbacks {
    pub fn new(transport: Arc<dyn Transport>, runtime: Handle) -> Self {
        Self { transport, runtime }
    }

    fn block_on<F: Future>(&self, fut: F) -> F::Output {
        tokio::task::block_in_place(|| self.runtime.block_on(fut))
    }
}

impl SessionCallbacks for TransportCallbacks {
    fn send(&self, _session_ptr: u64, to: RoleId, bytes: &[u8]) -> Result<()> {
        self.block_on(self.transport.send(to, bytes.to_vec()))
    }

    fn receive(&self, _session_ptr: u64, from: RoleId) -> Result<Vec<u8>> {
        self.block_on(self.transport.receive(from))
    }

    fn receive_all(&self, _session_ptr: u64, from: &[RoleId]) -> Result<Vec<Vec<u8>>> {
        let mut by_role = self.block_on(self.transport.receive_all(from))?;
        from.iter()
            .map(|role| {
                by_role.remove(role).ok_or_else(|| {
                    Error::PeerDisconnected(format!("receive_all missing role {role}"))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct LoopbackTransport;

    #[async_trait]
    impl Transport for LoopbackTransport {
        async fn send(&self, _to: RoleId, _bytes: Vec<u8>) -> Result<()> {
            Ok(())
        }
        async fn receive(&self, from: RoleId) -> Result<Vec<u8>> {
            Ok(vec![from.get() as u8])
        }
        async fn receive_all(&self, from: &[RoleId]) -> Result<HashMap<RoleId, Vec<u8>>> {
            Ok(from.iter().map(|r| (*r, vec![r.get() as u8])).collect())
        }
        async fn close(&self) {}
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_send_and_receive_round_trip() {
        let handle = Handle::current();
        let callbacks = TransportCallbacks::new(Arc::new(LoopbackTransport), handle);

        tokio::task::spawn_blocking(move || {
            callbacks.send(1, RoleId::new(1), b"hi").expect("send succeeds");
            let got = callbacks.receive(1, RoleId::new(2)).expect("receive succeeds");
            assert_eq!(got, vec![2]);
        })
        .await
        .expect("blocking task completes");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_receive_all_preserves_requested_order() {
        let handle = Handle::current();
        let callbacks = TransportCallbacks::new(Arc::new(LoopbackTransport), handle);

        tokio::task::spawn_blocking(move || {
            let roles = vec![RoleId::new(2), RoleId::new(0), RoleId::new(1)];
            let got = callbacks
                .receive_all(1, &roles)
                .expect("receive_all succeeds");
            assert_eq!(got, vec![vec![2], vec![0], vec![1]]);
        })
        .await
        .expect("blocking task completes");
    }
}
