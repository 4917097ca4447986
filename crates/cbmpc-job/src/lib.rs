//! The per-party session handle (§4.5, C5).
//!
//! A `Job` ties together an engine, a transport, and the bridge's session
//! table for the lifetime of one party's participation in a cluster.
//! Façades (§4.6) borrow a `Job`'s [`NativeSession`] to drive engine
//! calls; they never touch the bridge or the transport directly.

mod job;

pub use job::{Job2P, JobMP};
