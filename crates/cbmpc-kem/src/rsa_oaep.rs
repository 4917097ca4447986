//! The RSA-OAEP reference KEM (§4.2).
//!
//! `ek` encodes a PKCS#1 RSA public key; `skRef` (as surfaced outside this
//! crate) is an opaque [`PrivateKeyHandle`] wrapping a zeroizing PKCS#8 DER
//! private key plus the SHA-256 hash of the matching public key. OAEP's
//! label binds each ciphertext to a specific `ek`, and its masking seed is
//! drawn from [`hkdf_stream`] instead of a true RNG, which is what makes
//! `Encapsulate` a pure function of `(ek, rho)`.

use crate::hkdf_stream::{derive_prk, HkdfStream};
use crate::Kem;
use cbmpc_types::{Error, Result};
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

const LABEL_PREFIX: &str = "cbmpc/pve/rsa-oaep:";

/// An opaque RSA private key handle (§9's handle pattern, applied to key
/// material rather than a registry token — there is no session to scope
/// it to, so the zeroizing buffer itself is the lifetime owner).
pub struct PrivateKeyHandle {
    der: Zeroizing<Vec<u8>>,
    public_key_hash: [u8; 32],
}

impl PrivateKeyHandle {
    fn from_private_key(key: &RsaPrivateKey) -> Result<Self> {
        let der = key
            .to_pkcs8_der()
            .map_err(|e| Error::InvalidArgument(format!("DER-encoding RSA private key: {e}")))?;
        let public_key_hash = hash_public_key(&RsaPublicKey::from(key))?;
        Ok(Self {
            der: Zeroizing::new(der.as_bytes().to_vec()),
            public_key_hash,
        })
    }

    fn to_private_key(&self) -> Result<RsaPrivateKey> {
        RsaPrivateKey::from_pkcs8_der(&self.der)
            .map_err(|e| Error::InvalidArgument(format!("parsing RSA private key: {e}")))
    }

    /// The SHA-256 hash of this handle's matching public key, as bound
    /// into the OAEP label of ciphertexts it can decapsulate.
    pub fn public_key_hash(&self) -> [u8; 32] {
        self.public_key_hash
    }

    /// The raw `skRef` bytes this handle wraps (§4.2's `Generate() ->
    /// (skRef, ek)`): a zeroizing PKCS#8 DER encoding of the private key.
    pub fn skref(&self) -> &[u8] {
        &self.der
    }
}

fn hash_public_key(pk: &RsaPublicKey) -> Result<[u8; 32]> {
    let der = pk
        .to_pkcs1_der()
        .map_err(|e| Error::InvalidArgument(format!("DER-encoding RSA public key: {e}")))?;
    Ok(Sha256::digest(der.as_bytes()).into())
}

fn parse_public_key(ek: &[u8]) -> Result<RsaPublicKey> {
    RsaPublicKey::from_pkcs1_der(ek)
        .map_err(|e| Error::InvalidArgument(format!("parsing RSA public key: {e}")))
}

fn oaep_label(ek_hash: &[u8; 32]) -> String {
    format!("{LABEL_PREFIX}{}", hex::encode(ek_hash))
}

/// An RSA-OAEP [`Kem`] with a configurable key size.
///
/// `key_bits` must be at least 2048 and a multiple of 1024; this is
/// enforced at construction so every handle this instance produces shares
/// one modulus size.
pub struct RsaOaepKem {
    key_bits: usize,
}

impl RsaOaepKem {
    /// Builds a KEM that generates keys of the given bit size.
    ///
    /// # Panics
    /// Panics if `key_bits` is below 2048 or not a multiple of 1024 — this
    /// is a configuration error, not a runtime condition, so it is caught
    /// at construction rather than threaded through every call as a
    /// `Result`.
    pub fn new(key_bits: usize) -> Self {
        assert!(
            key_bits >= 2048 && key_bits % 1024 == 0,
            "RSA-OAEP key size must be >= 2048 bits and a multiple of 1024, got {key_bits}"
        );
        Self { key_bits }
    }

    fn key_size_bytes(&self) -> usize {
        self.key_bits / 8
    }
}

impl Kem for RsaOaepKem {
    fn generate(&self) -> Result<(PrivateKeyHandle, Vec<u8>)> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, self.key_bits)
            .map_err(|e| Error::InvalidArgument(format!("generating RSA key: {e}")))?;
        let public_key = RsaPublicKey::from(&private_key);
        let ek = public_key
            .to_pkcs1_der()
            .map_err(|e| Error::InvalidArgument(format!("DER-encoding RSA public key: {e}")))?
            .as_bytes()
            .to_vec();
        let handle = PrivateKeyHandle::from_private_key(&private_key)?;
        tracing::debug!(key_bits = self.key_bits, "generated RSA-OAEP keypair");
        Ok((handle, ek))
    }

    fn derive_pub(&self, handle: &PrivateKeyHandle) -> Result<Vec<u8>> {
        let private_key = handle.to_private_key()?;
        let public_key = RsaPublicKey::from(&private_key);
        let der = public_key
            .to_pkcs1_der()
            .map_err(|e| Error::InvalidArgument(format!("DER-encoding RSA public key: {e}")))?;
        Ok(der.as_bytes().to_vec())
    }

    fn new_private_key_handle(&self, raw_private_key: &[u8]) -> Result<PrivateKeyHandle> {
        let private_key = RsaPrivateKey::from_pkcs8_der(raw_private_key)
            .map_err(|e| Error::InvalidArgument(format!("parsing RSA private key: {e}")))?;
        if private_key.size() != self.key_size_bytes() {
            return Err(Error::AlgorithmMismatch(format!(
                "private key modulus is {} bytes, expected {}",
                private_key.size(),
                self.key_size_bytes()
            )));
        }
        PrivateKeyHandle::from_private_key(&private_key)
    }

    fn encapsulate(&self, ek: &[u8], rho: &[u8; 32]) -> Result<Vec<u8>> {
        let public_key = parse_public_key(ek)?;
        if public_key.size() != self.key_size_bytes() {
            return Err(Error::AlgorithmMismatch(format!(
                "public key modulus is {} bytes, expected {}",
                public_key.size(),
                self.key_size_bytes()
            )));
        }
        let ek_hash = hash_public_key(&public_key)?;
        let label = oaep_label(&ek_hash);
        let prk = derive_prk(rho, ek);
        let mut rng = HkdfStream::new(prk);
        let padding = Oaep::new_with_label::<Sha256, _>(label);
        public_key
            .encrypt(&mut rng, padding, rho)
            .map_err(|e| Error::InvalidArgument(format!("RSA-OAEP encapsulation failed: {e}")))
    }

    fn decapsulate(&self, handle: &PrivateKeyHandle, ct: &[u8]) -> Result<[u8; 32]> {
        let private_key = handle.to_private_key()?;
        if ct.len() != private_key.size() {
            return Err(Error::AlgorithmMismatch(format!(
                "ciphertext is {} bytes, expected {} for this key",
                ct.len(),
                private_key.size()
            )));
        }
        let label = oaep_label(&handle.public_key_hash);
        let padding = Oaep::new_with_label::<Sha256, _>(label);
        let rho_bytes = private_key
            .decrypt(padding, ct)
            .map_err(|e| Error::DecapsulationFailed(format!("RSA-OAEP decryption failed: {e}")))?;
        rho_bytes.try_into().map_err(|bytes: Vec<u8>| {
            Error::DecapsulationFailed(format!(
                "decrypted plaintext is {} bytes, expected 32",
                bytes.len()
            ))
        })
    }
}
