//! The callback bridge (§4.4, C4): the process-wide session table plus
//! the glue between a job's [`cbmpc_transport::Transport`] and the
//! engine's callback ABI.
//!
//! [`TransportCallbacks`] is what `cbmpc-job` hands the engine for the
//! `mock` backend (a plain trait object, no FFI marshaling needed). The
//! `link-native` feature additionally exports the raw `extern "C"`
//! callback table a real native engine library is linked against.

mod callbacks;
mod table;

#[cfg(feature = "link-native")]
mod sys_callbacks;

pub use callbacks::TransportCallbacks;
pub use table::SessionTable;

#[cfg(feature = "link-native")]
pub use sys_callbacks::{
    cbmpc_bridge_free_bytes, cbmpc_bridge_receive, cbmpc_bridge_receive_all, cbmpc_bridge_send,
    sessions,
};
