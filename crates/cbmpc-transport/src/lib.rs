//! The mTLS transport (§4.3, C3): authenticated, framed, full-duplex
//! channels between every pair of parties in a cluster.
//!
//! The lower-indexed party in each ordered pair dials; the higher-indexed
//! party listens. Construction doesn't return until every expected peer
//! slot is filled, matching §4.3's "the transport is 'ready' only when
//! every expected peer slot is populated."

mod config;
mod framing;
mod peer;
mod tls;
mod transport;

pub use config::{resolve_cluster, ResolvedCluster, ResolvedParty};
pub use transport::{Transport, TlsTransport, TransportOptions};
