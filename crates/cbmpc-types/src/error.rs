//! Shared error taxonomy for the harness.
//!
//! Every harness crate returns [`Error`] directly rather than minting its
//! own `thiserror` enum: the taxonomy is a property of the whole system —
//! a transport failure becomes a bridge status code becomes a façade error
//! of the *same kind*, never translated into something new along the way.

use std::fmt;

/// The harness's error type.
///
/// Each variant corresponds to one of the error kinds named in the error
/// taxonomy. Variants carry a human-readable message; use [`Error::kind`]
/// for programmatic matching instead of matching on the variant's payload.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Null/empty input where required, out-of-range role or index, a size
    /// mismatch (message-hash too long, BIP-340 message not 32 bytes, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Cluster topology violation (duplicate name/address, too few
    /// parties, malformed `host:port`, ...).
    #[error("invalid cluster configuration: {0}")]
    ConfigInvalid(String),

    /// CA load failure, TLS handshake failure, or leaf-certificate CN
    /// mismatch against the expected party name.
    #[error("certificate error: {0}")]
    CertificateInvalid(String),

    /// A peer connection's socket closed, a framing error occurred, or the
    /// reader side hit EOF.
    #[error("peer disconnected: {0}")]
    PeerDisconnected(String),

    /// An inbound frame's length prefix exceeded the configured maximum.
    #[error("frame too large: {0}")]
    FrameTooLarge(String),

    /// A context deadline elapsed or an explicit cancellation was observed.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// The callback bridge could not resolve a session pointer to a
    /// transport.
    #[error("session missing: {0}")]
    SessionMissing(String),

    /// A handle-registry lookup missed (unknown or already-freed token).
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    /// A KEM private-key handle was used with a ciphertext from a
    /// different key family.
    #[error("algorithm mismatch: {0}")]
    AlgorithmMismatch(String),

    /// A KEM private-key handle's public-key hash does not match the
    /// ciphertext's binding.
    #[error("public key hash mismatch: {0}")]
    PublicKeyHashMismatch(String),

    /// OAEP/label decapsulation failed.
    #[error("decapsulation failed: {0}")]
    DecapsulationFailed(String),

    /// The engine returned a non-zero status with no corresponding network
    /// failure: signature-verify failure, invalid transcript, proof
    /// failure, or any other protocol-internal abort.
    #[error("protocol aborted (engine status {status}): {message}")]
    ProtocolAborted {
        /// The engine's raw status code, preserved for diagnostics.
        status: i32,
        /// A human-readable description.
        message: String,
    },

    /// Operation attempted on a closed `Job` or an already-destroyed
    /// resource.
    #[error("closed: {0}")]
    Closed(String),
}

/// The discriminant of an [`Error`], for matching without destructuring
/// the message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    ConfigInvalid,
    CertificateInvalid,
    PeerDisconnected,
    FrameTooLarge,
    Cancelled,
    SessionMissing,
    InvalidHandle,
    AlgorithmMismatch,
    PublicKeyHashMismatch,
    DecapsulationFailed,
    ProtocolAborted,
    Closed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::ConfigInvalid => "config_invalid",
            ErrorKind::CertificateInvalid => "certificate_invalid",
            ErrorKind::PeerDisconnected => "peer_disconnected",
            ErrorKind::FrameTooLarge => "frame_too_large",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::SessionMissing => "session_missing",
            ErrorKind::InvalidHandle => "invalid_handle",
            ErrorKind::AlgorithmMismatch => "algorithm_mismatch",
            ErrorKind::PublicKeyHashMismatch => "public_key_hash_mismatch",
            ErrorKind::DecapsulationFailed => "decapsulation_failed",
            ErrorKind::ProtocolAborted => "protocol_aborted",
            ErrorKind::Closed => "closed",
        };
        f.write_str(s)
    }
}

impl Error {
    /// The error's kind, for programmatic matching.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::ConfigInvalid(_) => ErrorKind::ConfigInvalid,
            Error::CertificateInvalid(_) => ErrorKind::CertificateInvalid,
            Error::PeerDisconnected(_) => ErrorKind::PeerDisconnected,
            Error::FrameTooLarge(_) => ErrorKind::FrameTooLarge,
            Error::Cancelled(_) => ErrorKind::Cancelled,
            Error::SessionMissing(_) => ErrorKind::SessionMissing,
            Error::InvalidHandle(_) => ErrorKind::InvalidHandle,
            Error::AlgorithmMismatch(_) => ErrorKind::AlgorithmMismatch,
            Error::PublicKeyHashMismatch(_) => ErrorKind::PublicKeyHashMismatch,
            Error::DecapsulationFailed(_) => ErrorKind::DecapsulationFailed,
            Error::ProtocolAborted { .. } => ErrorKind::ProtocolAborted,
            Error::Closed(_) => ErrorKind::Closed,
        }
    }
}

/// Convenience result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;
