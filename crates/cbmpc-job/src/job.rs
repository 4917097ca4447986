//! `Job2P`/`JobMP` construction and teardown (§4.5).

use cbmpc_bridge::{SessionTable, TransportCallbacks};
use cbmpc_engine::{Engine, NativeSession};
use cbmpc_transport::Transport;
use cbmpc_types::{Error, PartyName, Result, Role2P, RoleId};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Shared state behind both `Job2P` and `JobMP` — everything §4.5
/// specifies is agnostic to 2-party vs multi-party beyond the role type
/// exposed at the surface.
struct JobCore {
    engine: Arc<dyn Engine>,
    session_table: Arc<SessionTable>,
    transport: Arc<dyn Transport>,
    session_ptr: u64,
    native_session: Option<NativeSession>,
}

impl JobCore {
    /// `NewJob2P`/`NewJobMP` (§4.5): validates `self_role` is in range,
    /// allocates a session pointer, registers it in the bridge, and asks
    /// the engine to construct a native session. Any failure after the
    /// bridge registration unwinds the registration before returning.
    ///
    /// `deadline`, if set, bounds every transport wait this job's protocol
    /// calls make afterward (§5 — a job's optional context/deadline); once
    /// it elapses, pending `receive`s return `Cancelled` (§4.4).
    fn construct(
        engine: Arc<dyn Engine>,
        session_table: Arc<SessionTable>,
        transport: Arc<dyn Transport>,
        self_role: RoleId,
        party_count: usize,
        names: &[PartyName],
        runtime: Handle,
        deadline: Option<Duration>,
    ) -> Result<Self> {
        self_role.validate(party_count)?;
        if names.len() != party_count {
            return Err(Error::InvalidArgument(format!(
                "expected {party_count} party names, got {}",
                names.len()
            )));
        }

        transport.set_deadline(deadline);
        let session_ptr = session_table.register(transport.clone());
        let callbacks = Arc::new(TransportCallbacks::new(transport.clone(), runtime));

        match engine.new_session(session_ptr, self_role, party_count, callbacks) {
            Ok(native_session) => {
                tracing::info!(session_ptr, role = self_role.get(), party_count, "job constructed");
                Ok(Self {
                    engine,
                    session_table,
                    transport,
                    session_ptr,
                    native_session: Some(native_session),
                })
            }
            Err(e) => {
                tracing::warn!(session_ptr, error = %e, "job construction failed, unwinding bridge registration");
                session_table.remove(session_ptr);
                Err(e)
            }
        }
    }

    fn session(&self) -> Result<&NativeSession> {
        self.native_session
            .as_ref()
            .ok_or_else(|| Error::Closed("job is closed".to_string()))
    }

    /// `Close()` (§4.5): destroys the native session, removes the bridge
    /// entry, releases the session pointer. Idempotent; never closes the
    /// underlying transport.
    fn close(&mut self) {
        if let Some(session) = self.native_session.take() {
            self.engine.close_session(session);
            self.session_table.remove(self.session_ptr);
            tracing::debug!(session_ptr = self.session_ptr, "job closed");
        }
    }
}

impl Drop for JobCore {
    fn drop(&mut self) {
        self.close();
    }
}

/// A 2-party job (§3, §4.5).
pub struct Job2P {
    core: JobCore,
    self_role: Role2P,
}

impl Job2P {
    /// `NewJob2P(transport, role, names[2])`. `deadline`, if set, bounds
    /// every transport wait this job's protocol calls make (§5).
    pub fn new(
        engine: Arc<dyn Engine>,
        session_table: Arc<SessionTable>,
        transport: Arc<dyn Transport>,
        self_role: Role2P,
        names: [PartyName; 2],
        runtime: Handle,
        deadline: Option<Duration>,
    ) -> Result<Self> {
        let core = JobCore::construct(
            engine,
            session_table,
            transport,
            self_role.as_role_id(),
            2,
            &names,
            runtime,
            deadline,
        )?;
        Ok(Self { core, self_role })
    }

    pub fn self_role(&self) -> Role2P {
        self.self_role
    }

    pub fn peer_role(&self) -> Role2P {
        self.self_role.peer()
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.core.engine
    }

    pub fn session(&self) -> Result<&NativeSession> {
        self.core.session()
    }

    pub fn close(&mut self) {
        self.core.close();
    }
}

/// A multi-party job (§3, §4.5).
pub struct JobMP {
    core: JobCore,
    self_role: RoleId,
}

impl JobMP {
    /// `NewJobMP(transport, self, names[N])`. `deadline`, if set, bounds
    /// every transport wait this job's protocol calls make (§5).
    pub fn new(
        engine: Arc<dyn Engine>,
        session_table: Arc<SessionTable>,
        transport: Arc<dyn Transport>,
        self_role: RoleId,
        names: Vec<PartyName>,
        runtime: Handle,
        deadline: Option<Duration>,
    ) -> Result<Self> {
        let party_count = names.len();
        let core = JobCore::construct(
            engine,
            session_table,
            transport,
            self_role,
            party_count,
            &names,
            runtime,
            deadline,
        )?;
        Ok(Self { core, self_role })
    }

    pub fn self_role(&self) -> RoleId {
        self.self_role
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.core.engine
    }

    pub fn session(&self) -> Result<&NativeSession> {
        self.core.session()
    }

    pub fn close(&mut self) {
        self.core.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cbmpc_engine::{MockEngine, SignerReceiver};
    use cbmpc_types::{Curve, SessionId};
    use std::collections::HashMap;

    struct NullTransport;

    #[async_trait]
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

    fn names(count: usize) -> Vec<PartyName> {
        (0..count)
            .map(|i| PartyName::new(format!("party-{i}")).expect("valid name"))
            .collect()
    }

    #[tokio::test]
    async fn test_new_job_2p_then_close_is_idempotent() {
        let engine: Arc<dyn Engine> = Arc::new(MockEngine::new());
        let table = Arc::new(SessionTable::new());
        let transport: Arc<dyn Transport> = Arc::new(NullTransport);
        let handle = Handle::current();

        let name_array: [PartyName; 2] = [
            PartyName::new("alice").expect("valid name"),
            PartyName::new("bob").expect("valid name"),
        ];
        let mut job = Job2P::new(
            engine,
            table.clone(),
            transport,
            Role2P::P1,
            name_array,
            handle,
            None,
        )
        .expect("job construction succeeds");

        assert_eq!(table.len(), 1);
        job.session().expect("session is open");

        job.close();
        job.close(); // idempotent
        assert_eq!(table.len(), 0);

        let err = job.session().expect_err("closed job has no session");
        assert_eq!(err.kind(), cbmpc_types::ErrorKind::Closed);
    }

    #[tokio::test]
    async fn test_new_job_mp_rejects_role_out_of_range() {
        let engine: Arc<dyn Engine> = Arc::new(MockEngine::new());
        let table = Arc::new(SessionTable::new());
        let transport: Arc<dyn Transport> = Arc::new(NullTransport);
        let handle = Handle::current();

        let err = JobMP::new(engine, table.clone(), transport, RoleId::new(5), names(3), handle, None)
            .expect_err("out-of-range role must be rejected");
        assert_eq!(err.kind(), cbmpc_types::ErrorKind::InvalidArgument);
        assert!(table.is_empty(), "failed construction must not leak a bridge entry");
    }

    #[tokio::test]
    async fn test_job_mp_drives_agree_random_through_engine() {
        let engine: Arc<dyn Engine> = Arc::new(MockEngine::new());
        let table = Arc::new(SessionTable::new());
        let transport: Arc<dyn Transport> = Arc::new(NullTransport);
        let handle = Handle::current();

        let job = JobMP::new(engine, table, transport, RoleId::new(0), names(1), handle, None)
            .expect("single-party job construction succeeds");
        let session = job.session().expect("session is open");
        let bytes = job
            .engine()
            .agree_random(session, 128)
            .expect("agree_random succeeds for a lone party");
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn test_curve_and_signer_receiver_types_are_reexported_for_facade_use() {
        let _ = Curve::P256;
        let _ = SessionId::fresh();
        let _ = SignerReceiver(RoleId::new(0));
    }
}
