//! The PVE ciphertext envelope (§3).
//!
//! A `Ciphertext` is opaque engine-produced bytes with exactly two fields a
//! caller is allowed to read without asking the engine to parse them: the
//! commitment point's curve and the label it is bound to. The commitment
//! point itself stays inside the opaque blob — callers compare it against
//! an independently-held [`crate::Curve`]-typed point via the engine's
//! `Verify` operation, not by decoding it here.

use crate::Curve;
use serde::{Deserialize, Serialize};

/// A PVE ciphertext: `Q = x·G` committed under a curve, with a caller-
/// supplied label, plus the engine-opaque encrypted payload.
#[derive(Clone, Serialize, Deserialize)]
pub struct Ciphertext {
    curve: Curve,
    label: Vec<u8>,
    blob: Vec<u8>,
}

impl Ciphertext {
    /// Wraps engine-produced bytes with their declared curve and label.
    ///
    /// This does not itself verify that `blob` commits to `label` under
    /// `curve` — that is the engine's `Verify` operation (§4.6 PVE Verify).
    pub fn new(curve: Curve, label: impl Into<Vec<u8>>, blob: impl Into<Vec<u8>>) -> Self {
        Self {
            curve,
            label: label.into(),
            blob: blob.into(),
        }
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn label(&self) -> &[u8] {
        &self.label
    }

    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    pub fn into_blob(self) -> Vec<u8> {
        self.blob
    }
}

impl std::fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ciphertext")
            .field("curve", &self.curve)
            .field("label", &hex::encode(&self.label))
            .field("blob_len", &self.blob.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_round_trip() {
        let ct = Ciphertext::new(Curve::P256, b"backup-alice".to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(ct.curve(), Curve::P256);
        assert_eq!(ct.label(), b"backup-alice");
        assert_eq!(ct.blob(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_debug_does_not_panic_on_empty() {
        let ct = Ciphertext::new(Curve::Ed25519, Vec::new(), Vec::new());
        let _ = format!("{ct:?}");
    }
}
