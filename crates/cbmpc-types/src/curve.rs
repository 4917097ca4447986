//! Curve metadata (§4.7).
//!
//! `Curve` carries only the static facts a caller needs before ever talking
//! to the engine: its numeric identifier, its group order (as a fixed-size
//! big-endian byte constant), and the byte length used to bound ECDSA
//! message-hash inputs. Actual field/group arithmetic is always performed
//! by the native engine against an opaque [`crate::SessionId`]-scoped
//! object — `Curve` never computes anything itself.

use serde::{Deserialize, Serialize};

/// A curve identifier understood by the engine.
///
/// The numeric ids follow the conventional OpenSSL `NID_*` values so that
/// a caller embedding this harness alongside other OpenSSL-based tooling
/// sees consistent identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curve {
    P256,
    P384,
    P521,
    Secp256k1,
    Ed25519,
}

/// secp256r1 (P-256) group order, big-endian.
const ORDER_P256: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63, 0x25, 0x51,
];

/// secp384r1 (P-384) group order, big-endian.
const ORDER_P384: [u8; 48] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xc7, 0x63, 0x4d, 0x81, 0xf4, 0x37, 0x2d, 0xdf,
    0x58, 0x1a, 0x0d, 0xb2, 0x48, 0xb0, 0xa7, 0x7a, 0xec, 0xec, 0x19, 0x6a, 0xcc, 0xc5, 0x29, 0x73,
];

/// secp521r1 (P-521) group order, big-endian (66 bytes — ceil(521/8)).
const ORDER_P521: [u8; 66] = [
    0x01, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfa,
    0x51, 0x86, 0x87, 0x83, 0xbf, 0x2f, 0x96, 0x6b, 0x7f, 0xcc, 0x01, 0x48, 0xf7, 0x09, 0xa5, 0xd0,
    0x3b, 0xb5, 0xc9, 0xb8, 0x89, 0x9c, 0x47, 0xae, 0xbb, 0x6f, 0xb7, 0x1e, 0x91, 0x38, 0x64, 0x09,
];

/// secp256k1 group order, big-endian.
const ORDER_SECP256K1: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

/// Ed25519 (`ℓ`) group order, big-endian.
const ORDER_ED25519: [u8; 32] = [
    0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x14, 0xde, 0xf9, 0xde, 0xa2, 0xf7, 0x9c, 0xd6, 0x58, 0x12, 0x63, 0x1a, 0x5c, 0xf5, 0xd3, 0xed,
];

impl Curve {
    /// The conventional OpenSSL `NID_*` value for this curve.
    pub fn nid(self) -> i32 {
        match self {
            Curve::P256 => 415,       // NID_X9_62_prime256v1
            Curve::P384 => 715,       // NID_secp384r1
            Curve::P521 => 716,       // NID_secp521r1
            Curve::Secp256k1 => 714,  // NID_secp256k1
            Curve::Ed25519 => 1087,   // NID_ED25519
        }
    }

    /// The group order, big-endian, as a byte slice.
    pub fn order(self) -> &'static [u8] {
        match self {
            Curve::P256 => &ORDER_P256,
            Curve::P384 => &ORDER_P384,
            Curve::P521 => &ORDER_P521,
            Curve::Secp256k1 => &ORDER_SECP256K1,
            Curve::Ed25519 => &ORDER_ED25519,
        }
    }

    /// The byte length of the group order — the bound used for ECDSA
    /// message-hash length checks (§4.7, §8).
    pub fn max_hash_size(self) -> usize {
        self.order().len()
    }

    /// `true` for the curves usable in BIP-340/Schnorr-family protocols.
    pub fn supports_schnorr(self) -> bool {
        matches!(self, Curve::Secp256k1 | Curve::Ed25519)
    }

    /// The generator's encoding in the engine's scalar-field-element
    /// representation of a point (§4.7's "Generator"): the multiplicative
    /// identity `1`, padded to the curve's order width. The real engine
    /// encodes the generator as an actual curve point; this is the static
    /// fact a caller can compare against before ever asking the engine to
    /// compute anything.
    pub fn generator_encoding(self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.max_hash_size()];
        if let Some(last) = bytes.last_mut() {
            *last = 1;
        }
        bytes
    }
}

impl std::fmt::Display for Curve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Curve::P256 => "P-256",
            Curve::P384 => "P-384",
            Curve::P521 => "P-521",
            Curve::Secp256k1 => "secp256k1",
            Curve::Ed25519 => "Ed25519",
        };
        f.write_str(s)
    }
}
