//! The deterministic OAEP-randomness stream (§4.2).
//!
//! `PRK = HMAC-SHA256(salt="cbmpc-pve-rsa-oaep-hkdf", IKM=SHA-256(ρ ||
//! SHA-256(ek)))`; blocks `T_i = HMAC-SHA256(PRK, T_{i-1} ||
//! "cbmpc-pve-rsa-oaep" || i)` with `i` wrapping `1..255`. This is an
//! HKDF-Expand-shaped construction with a fixed info string, used as an
//! [`RngCore`] source so it can feed straight into `rsa`'s OAEP padding.

use hmac::{Hmac, Mac};
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

const SALT: &[u8] = b"cbmpc-pve-rsa-oaep-hkdf";
const INFO: &[u8] = b"cbmpc-pve-rsa-oaep";

fn hmac(key: &[u8], msg: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(msg);
    mac.finalize().into_bytes().into()
}

/// Derives the seed used to bind PVE's ciphertext to a specific `ek`.
pub(crate) fn derive_prk(rho: &[u8; 32], ek: &[u8]) -> [u8; 32] {
    let ek_hash = Sha256::digest(ek);
    let mut ikm_input = Vec::with_capacity(rho.len() + ek_hash.len());
    ikm_input.extend_from_slice(rho);
    ikm_input.extend_from_slice(&ek_hash);
    let ikm = Sha256::digest(&ikm_input);
    hmac(SALT, &ikm)
}

/// A deterministic byte stream standing in for an RNG: exactly the bytes
/// `rsa`'s OAEP implementation would otherwise draw from a true RNG for
/// its masking seed.
pub(crate) struct HkdfStream {
    prk: [u8; 32],
    prev_block: Vec<u8>,
    counter: u8,
    buffer: Vec<u8>,
}

impl HkdfStream {
    pub(crate) fn new(prk: [u8; 32]) -> Self {
        Self {
            prk,
            prev_block: Vec::new(),
            counter: 1,
            buffer: Vec::new(),
        }
    }

    fn next_block(&mut self) -> [u8; 32] {
        let mut msg = Vec::with_capacity(self.prev_block.len() + INFO.len() + 1);
        msg.extend_from_slice(&self.prev_block);
        msg.extend_from_slice(INFO);
        msg.push(self.counter);
        let block = hmac(&self.prk, &msg);
        self.prev_block = block.to_vec();
        self.counter = if self.counter == 255 { 1 } else { self.counter + 1 };
        block
    }

    fn fill(&mut self, dest: &mut [u8]) {
        let mut written = 0;
        while written < dest.len() {
            if self.buffer.is_empty() {
                self.buffer = self.next_block().to_vec();
            }
            let take = (dest.len() - written).min(self.buffer.len());
            dest[written..written + take].copy_from_slice(&self.buffer[..take]);
            self.buffer.drain(..take);
            written += take;
        }
    }
}

impl Drop for HkdfStream {
    fn drop(&mut self) {
        self.prk.zeroize();
        self.prev_block.zeroize();
        self.buffer.zeroize();
    }
}

impl RngCore for HkdfStream {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.fill(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill(dest);
        Ok(())
    }
}

/// Deliberately deterministic — this is the point. Implementing the
/// `CryptoRng` marker lets it satisfy `rsa`'s `CryptoRngCore` bound.
impl CryptoRng for HkdfStream {}
