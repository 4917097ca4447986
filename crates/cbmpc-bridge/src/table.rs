//! The process-wide session table (§4.4): maps an opaque session pointer
//! to the host-side [`Transport`] that backs it.

use cbmpc_transport::Transport;
use cbmpc_types::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Allocates session pointers and maps each to the `Transport` a job
/// constructed it with. A session pointer is never `0` — that value is
/// reserved the same way [`cbmpc_registry::Token::NONE`] reserves it, so
/// an all-zero `ctx` at the FFI boundary is unambiguously "no session."
pub struct SessionTable {
    next: AtomicU64,
    table: RwLock<HashMap<u64, Arc<dyn Transport>>>,
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTable {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            table: RwLock::new(HashMap::new()),
        }
    }

    /// Allocates a fresh session pointer bound to `transport` (§4.5
    /// `NewJob2P`/`NewJobMP`'s "allocates a session pointer, registers
    /// (pointer -> transport) in the bridge").
    pub fn register(&self, transport: Arc<dyn Transport>) -> u64 {
        let ptr = self.next.fetch_add(1, Ordering::Relaxed);
        self.table.write().insert(ptr, transport);
        tracing::debug!(session_ptr = ptr, "session registered in bridge table");
        ptr
    }

    /// Resolves a session pointer to its transport; missing entry is
    /// `SessionMissing` (§4.4 step 1).
    pub fn resolve(&self, session_ptr: u64) -> Result<Arc<dyn Transport>> {
        self.table
            .read()
            .get(&session_ptr)
            .cloned()
            .ok_or_else(|| Error::SessionMissing(format!("no transport for session {session_ptr}")))
    }

    /// Removes a session's table entry (§4.5 `Job.Close`'s "removes the
    /// bridge entry"). Idempotent.
    pub fn remove(&self, session_ptr: u64) {
        if self.table.write().remove(&session_ptr).is_some() {
            tracing::debug!(session_ptr, "session removed from bridge table");
        }
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cbmpc_types::RoleId;
    use std::collections::HashMap as StdHashMap;

    struct StubTransport;

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, _to: RoleId, _bytes: Vec<u8>) -> Result<()> {
            Ok(())
        }
        async fn receive(&self, _from: RoleId) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
        async fn receive_all(&self, _from: &[RoleId]) -> Result<StdHashMap<RoleId, Vec<u8>>> {
            Ok(StdHashMap::new())
        }
        async fn close(&self) {}
    }

    #[test]
    fn test_register_resolve_remove_round_trip() {
        let table = SessionTable::new();
        let ptr = table.register(Arc::new(StubTransport));
        assert_ne!(ptr, 0);
        table.resolve(ptr).expect("registered session resolves");
        table.remove(ptr);
        let err = table
            .resolve(ptr)
            .expect_err("removed session must be missing");
        assert_eq!(err.kind(), cbmpc_types::ErrorKind::SessionMissing);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let table = SessionTable::new();
        table.remove(999);
        assert!(table.is_empty());
    }

    #[test]
    fn test_pointers_are_distinct() {
        let table = SessionTable::new();
        let a = table.register(Arc::new(StubTransport));
        let b = table.register(Arc::new(StubTransport));
        assert_ne!(a, b);
    }
}
