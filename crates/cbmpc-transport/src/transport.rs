//! The `Transport` trait and its TLS/TCP implementation (§4.3).

use crate::config::ResolvedCluster;
use crate::peer::PeerConnection;
use crate::tls;
use async_trait::async_trait;
use cbmpc_types::{Error, PartyName, Result, RoleId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_rustls::{TlsAcceptor, TlsConnector};

/// Tuning knobs not carried by [`cbmpc_types::ClusterConfig`] itself —
/// analogous to the teacher's `QuicConfig`, but for the TCP/TLS dial and
/// framing behavior this harness uses instead of QUIC.
#[derive(Clone, Debug)]
pub struct TransportOptions {
    /// A frame whose declared length exceeds this terminates the
    /// connection with `FrameTooLarge`.
    pub max_frame_size: usize,
    /// How long construction waits for every expected peer slot to fill
    /// before giving up.
    pub connect_timeout: Duration,
    /// Delay between dial attempts to a peer that hasn't accepted yet.
    pub dial_retry_interval: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            max_frame_size: 64 * 1024 * 1024,
            connect_timeout: Duration::from_secs(30),
            dial_retry_interval: Duration::from_millis(200),
        }
    }
}

/// Authenticated, framed, full-duplex channels to every other party in a
/// cluster (§4.3).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `bytes` to `to`, blocking until the write completes.
    async fn send(&self, to: RoleId, bytes: Vec<u8>) -> Result<()>;

    /// Dequeues the next message received from `from`, blocking until one
    /// is available or the peer connection fails.
    async fn receive(&self, from: RoleId) -> Result<Vec<u8>>;

    /// Receives exactly one message from each role in `from`, failing if
    /// any underlying receive fails.
    async fn receive_all(&self, from: &[RoleId]) -> Result<HashMap<RoleId, Vec<u8>>>;

    /// Bounds every subsequent `receive`/`receive_all` call: once `deadline`
    /// elapses waiting on a peer, the call returns `Error::Cancelled`
    /// instead of blocking further (§4.4, §5 — a `Job`'s optional
    /// context/deadline). `None` waits indefinitely, the default for
    /// transports that never call this.
    fn set_deadline(&self, deadline: Option<Duration>) {
        let _ = deadline;
    }

    /// Shuts the listener, closes every connection, and unblocks all
    /// waiters.
    async fn close(&self);
}

/// A [`Transport`] over mutually-authenticated TLS 1.3 connections on
/// top of TCP, using the dial/listen topology §4.3 describes: the
/// lower-indexed party in each pair dials, the higher-indexed party
/// listens.
pub struct TlsTransport {
    self_role: RoleId,
    peers: Arc<RwLock<HashMap<RoleId, Arc<PeerConnection>>>>,
    listener_task: JoinHandle<()>,
    closed: AtomicBool,
    deadline: RwLock<Option<Duration>>,
}

impl TlsTransport {
    /// Builds the transport for `cluster`, spawning the listener and
    /// dialing every lower-indexed peer. Does not return until every
    /// expected peer slot is populated, or `options.connect_timeout`
    /// elapses.
    pub async fn connect(cluster: ResolvedCluster, options: TransportOptions) -> Result<Self> {
        let self_index = cluster.self_role.get() as usize;
        let own_party = cluster
            .parties
            .get(self_index)
            .ok_or_else(|| Error::InvalidArgument("self role out of range".to_string()))?;

        let server_config = tls::build_server_config(
            &cluster.ca_certs,
            cluster.own_cert.clone(),
            clone_key(&cluster.own_key),
        )?;
        let client_config = tls::build_client_config(
            &cluster.ca_certs,
            cluster.own_cert.clone(),
            clone_key(&cluster.own_key),
        )?;

        let peers: Arc<RwLock<HashMap<RoleId, Arc<PeerConnection>>>> =
            Arc::new(RwLock::new(HashMap::new()));

        let listener = TcpListener::bind(own_party.address)
            .await
            .map_err(|e| Error::PeerDisconnected(format!("binding {}: {e}", own_party.address)))?;

        // The lower-indexed party in each ordered pair dials; the
        // higher-indexed party listens (§4.3). So we listen for the peers
        // below us and dial the peers above us.
        let expected_from_listen: Vec<(RoleId, PartyName)> = cluster
            .parties
            .iter()
            .filter(|p| (p.role.get() as usize) < self_index)
            .map(|p| (p.role, p.name.clone()))
            .collect();
        let expected_from_dial: Vec<crate::config::ResolvedParty> = cluster
            .parties
            .iter()
            .filter(|p| p.role.get() as usize > self_index)
            .cloned()
            .collect();

        let acceptor = TlsAcceptor::from(Arc::new(server_config));
        let listener_peers = peers.clone();
        let max_frame_size = options.max_frame_size;
        let listener_task = tokio::spawn(accept_loop(
            listener,
            acceptor,
            expected_from_listen,
            listener_peers,
            max_frame_size,
        ));

        let connector = TlsConnector::from(Arc::new(client_config));
        for target in expected_from_dial {
            dial_with_retry(
                &connector,
                &target,
                peers.clone(),
                max_frame_size,
                options.dial_retry_interval,
                options.connect_timeout,
            )
            .await?;
        }

        let expected_total = cluster.parties.len() - 1;
        wait_until_ready(&peers, expected_total, options.connect_timeout).await?;

        Ok(Self {
            self_role: cluster.self_role,
            peers,
            listener_task,
            closed: AtomicBool::new(false),
            deadline: RwLock::new(None),
        })
    }

    fn peer(&self, role: RoleId) -> Result<Arc<PeerConnection>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Cancelled("transport is closed".to_string()));
        }
        self.peers
            .read()
            .get(&role)
            .cloned()
            .ok_or_else(|| Error::PeerDisconnected(format!("no connection to role {role}")))
    }
}

#[async_trait]
impl Transport for TlsTransport {
    async fn send(&self, to: RoleId, bytes: Vec<u8>) -> Result<()> {
        if to == self.self_role {
            return Err(Error::InvalidArgument("cannot send to self".to_string()));
        }
        self.peer(to)?.send(&bytes).await
    }

    async fn receive(&self, from: RoleId) -> Result<Vec<u8>> {
        let deadline = *self.deadline.read();
        self.peer(from)?.receive(deadline).await
    }

    async fn receive_all(&self, from: &[RoleId]) -> Result<HashMap<RoleId, Vec<u8>>> {
        let mut out = HashMap::with_capacity(from.len());
        for role in from {
            out.insert(*role, self.receive(*role).await?);
        }
        Ok(out)
    }

    fn set_deadline(&self, deadline: Option<Duration>) {
        *self.deadline.write() = deadline;
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.listener_task.abort();
        for peer in self.peers.read().values() {
            peer.close();
        }
    }
}

fn clone_key(key: &rustls::pki_types::PrivateKeyDer<'static>) -> rustls::pki_types::PrivateKeyDer<'static> {
    key.clone_key()
}

async fn accept_loop(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    expected: Vec<(RoleId, PartyName)>,
    peers: Arc<RwLock<HashMap<RoleId, Arc<PeerConnection>>>>,
    max_frame_size: usize,
) {
    let by_name: HashMap<String, RoleId> = expected
        .iter()
        .map(|(role, name)| (name.as_str().to_string(), *role))
        .collect();
    let mut remaining = expected.len();

    while remaining > 0 {
        let (socket, _addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            }
        };
        let acceptor = acceptor.clone();

        match handshake_inbound(socket, acceptor, &by_name, max_frame_size).await {
            Ok((role, conn)) => {
                peers.write().insert(role, conn);
                remaining -= 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, "inbound handshake failed");
            }
        }
    }
}

async fn handshake_inbound(
    socket: TcpStream,
    acceptor: TlsAcceptor,
    by_name: &HashMap<String, RoleId>,
    max_frame_size: usize,
) -> Result<(RoleId, Arc<PeerConnection>)> {
    let tls_stream = acceptor
        .accept(socket)
        .await
        .map_err(|e| Error::CertificateInvalid(format!("inbound TLS handshake failed: {e}")))?;

    let peer_cn = {
        let (_, session) = tls_stream.get_ref();
        let certs = session
            .peer_certificates()
            .ok_or_else(|| Error::CertificateInvalid("peer presented no certificate".to_string()))?;
        let leaf = certs
            .first()
            .ok_or_else(|| Error::CertificateInvalid("empty peer certificate chain".to_string()))?;
        tls::common_name(leaf)?
    };

    let role = *by_name
        .get(&peer_cn)
        .ok_or_else(|| Error::CertificateInvalid(format!("unexpected peer common name {peer_cn:?}")))?;
    let name = PartyName::new(peer_cn)?;

    let (reader, writer) = tokio::io::split(tls_stream);
    let conn = PeerConnection::spawn(name, role, reader, writer, max_frame_size);
    Ok((role, conn))
}

async fn dial_with_retry(
    connector: &TlsConnector,
    target: &crate::config::ResolvedParty,
    peers: Arc<RwLock<HashMap<RoleId, Arc<PeerConnection>>>>,
    max_frame_size: usize,
    retry_interval: Duration,
    deadline: Duration,
) -> Result<()> {
    let started = tokio::time::Instant::now();
    loop {
        match try_dial(connector, target, max_frame_size).await {
            Ok(conn) => {
                peers.write().insert(target.role, conn);
                return Ok(());
            }
            Err(e) => {
                if started.elapsed() >= deadline {
                    return Err(Error::PeerDisconnected(format!(
                        "could not connect to {} ({}) within {:?}: {e}",
                        target.role, target.name, deadline
                    )));
                }
                tokio::time::sleep(retry_interval).await;
            }
        }
    }
}

async fn try_dial(
    connector: &TlsConnector,
    target: &crate::config::ResolvedParty,
    max_frame_size: usize,
) -> Result<Arc<PeerConnection>> {
    let socket = TcpStream::connect(target.address)
        .await
        .map_err(|e| Error::PeerDisconnected(format!("dialing {}: {e}", target.address)))?;
    let server_name = rustls::pki_types::ServerName::try_from(target.name.as_str().to_string())
        .map_err(|e| Error::CertificateInvalid(format!("invalid server name: {e}")))?;
    let tls_stream = connector
        .connect(server_name, socket)
        .await
        .map_err(|e| Error::CertificateInvalid(format!("outbound TLS handshake failed: {e}")))?;

    let peer_cn = {
        let (_, session) = tls_stream.get_ref();
        let certs = session
            .peer_certificates()
            .ok_or_else(|| Error::CertificateInvalid("server presented no certificate".to_string()))?;
        let leaf = certs
            .first()
            .ok_or_else(|| Error::CertificateInvalid("empty server certificate chain".to_string()))?;
        tls::common_name(leaf)?
    };
    if peer_cn != target.name.as_str() {
        return Err(Error::CertificateInvalid(format!(
            "server common name {peer_cn:?} does not match expected {:?}",
            target.name
        )));
    }

    let (reader, writer) = tokio::io::split(tls_stream);
    Ok(PeerConnection::spawn(
        target.name.clone(),
        target.role,
        reader,
        writer,
        max_frame_size,
    ))
}

async fn wait_until_ready(
    peers: &Arc<RwLock<HashMap<RoleId, Arc<PeerConnection>>>>,
    expected: usize,
    deadline: Duration,
) -> Result<()> {
    let started = tokio::time::Instant::now();
    loop {
        if peers.read().len() >= expected {
            return Ok(());
        }
        if started.elapsed() >= deadline {
            return Err(Error::PeerDisconnected(format!(
                "only {} of {expected} peer slots filled within {:?}",
                peers.read().len(),
                deadline
            )));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
