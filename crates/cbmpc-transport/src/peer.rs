//! Per-peer connection state (§4.3 "Receive buffering", "Failure
//! semantics"): one background reader task per live connection feeding a
//! per-peer inbound queue, and a write half serialized behind a lock so
//! concurrent `Send`s to the same peer don't interleave frames.

use crate::framing::{read_frame, write_frame};
use cbmpc_types::{Error, PartyName, Result, RoleId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// A live, TLS-authenticated connection to one peer.
pub(crate) struct PeerConnection {
    pub(crate) name: PartyName,
    pub(crate) role: RoleId,
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    dead: Arc<AtomicBool>,
    reader_task: JoinHandle<()>,
}

impl PeerConnection {
    pub(crate) fn spawn(
        name: PartyName,
        role: RoleId,
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
        max_frame_size: usize,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let dead = Arc::new(AtomicBool::new(false));
        let reader_task = tokio::spawn(reader_loop(reader, tx, dead.clone(), max_frame_size));

        Arc::new(Self {
            name,
            role,
            writer: Mutex::new(Box::new(writer)),
            inbound: Mutex::new(rx),
            dead,
            reader_task,
        })
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.dead.load(Ordering::Acquire)
    }

    pub(crate) async fn send(&self, payload: &[u8]) -> Result<()> {
        if self.is_dead() {
            return Err(Error::PeerDisconnected(format!(
                "peer {} ({}) is dead",
                self.role, self.name
            )));
        }
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, payload).await.inspect_err(|_| {
            self.dead.store(true, Ordering::Release);
        })
    }

    /// Waits for the next inbound message, failing with `Cancelled` if
    /// `deadline` elapses first (§4.4, §5).
    pub(crate) async fn receive(&self, deadline: Option<Duration>) -> Result<Vec<u8>> {
        let mut inbound = self.inbound.lock().await;
        let closed = || {
            Error::PeerDisconnected(format!("peer {} ({}) connection closed", self.role, self.name))
        };
        match deadline {
            None => inbound.recv().await.ok_or_else(closed),
            Some(d) => match tokio::time::timeout(d, inbound.recv()).await {
                Ok(received) => received.ok_or_else(closed),
                Err(_elapsed) => Err(Error::Cancelled(format!(
                    "peer {} ({}) did not respond within {:?}",
                    self.role, self.name, d
                ))),
            },
        }
    }

    pub(crate) fn close(&self) {
        self.dead.store(true, Ordering::Release);
        self.reader_task.abort();
    }
}

async fn reader_loop(
    mut reader: impl AsyncRead + Send + Unpin,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    dead: Arc<AtomicBool>,
    max_frame_size: usize,
) {
    loop {
        match read_frame(&mut reader, max_frame_size).await {
            Ok(frame) => {
                if tx.send(frame).is_err() {
                    // No one is listening anymore; the connection has been closed locally.
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "peer reader loop terminating");
                dead.store(true, Ordering::Release);
                break;
            }
        }
    }
}
