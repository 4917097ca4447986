//! PVE façade namespace (§4.6): publicly verifiable encryption of a
//! curve scalar under a KEM public key, plus the batch and access-
//! structure-row variants built on the same primitive.
//!
//! The engine's `pve_build`/`pve_verify`/`pve_kem_ct` operations only
//! produce and check the commitment half of a ciphertext (`kem_ct || q
//! || tag`, §9's opaque-blob treatment) — the actual masking of the
//! secret scalar `x` is this façade's job, same as a KEM-DEM hybrid
//! scheme: `rho` is drawn once per call, fed to the KEM to produce
//! `kem_ct`, and also stretched into a one-time keystream that masks
//! `x`. The resulting [`Ciphertext`] packs the engine's blob and the
//! masked scalar together.

use crate::JobHandle;
use cbmpc_engine::AccessStructure;
use cbmpc_kem::{with_kem, Kem, PrivateKeyHandle};
use cbmpc_types::{Ciphertext, Curve, Error, PartyName, Result};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

fn validate_pve_inputs(ek: &[u8], label: &[u8], x: &[u8]) -> Result<()> {
    if ek.is_empty() {
        return Err(Error::InvalidArgument("PVE public key must not be empty".into()));
    }
    if label.is_empty() {
        return Err(Error::InvalidArgument("PVE label must not be empty".into()));
    }
    if x.is_empty() {
        return Err(Error::InvalidArgument("PVE plaintext scalar must not be empty".into()));
    }
    Ok(())
}

fn keystream(rho: &[u8; 32], len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len + 32);
    let mut counter: u32 = 0;
    while out.len() < len {
        let mut mac = HmacSha256::new_from_slice(rho).expect("HMAC accepts a 32-byte key");
        mac.update(b"cbmpc-pve-mask");
        mac.update(&counter.to_be_bytes());
        out.extend_from_slice(&mac.finalize().into_bytes());
        counter += 1;
    }
    out.truncate(len);
    out
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}

fn pack(engine_blob: &[u8], masked_x: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + engine_blob.len() + masked_x.len());
    out.extend_from_slice(&(engine_blob.len() as u32).to_be_bytes());
    out.extend_from_slice(engine_blob);
    out.extend_from_slice(masked_x);
    out
}

fn unpack(bytes: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    if bytes.len() < 4 {
        return Err(Error::InvalidArgument("PVE ciphertext blob truncated".into()));
    }
    let len = u32::from_be_bytes(bytes[0..4].try_into().expect("checked 4 bytes")) as usize;
    if bytes.len() < 4 + len {
        return Err(Error::InvalidArgument("PVE ciphertext blob truncated".into()));
    }
    Ok((bytes[4..4 + len].to_vec(), bytes[4 + len..].to_vec()))
}

/// `Encrypt(ek, L, x)`.
pub fn encrypt<J: JobHandle>(
    job: &J,
    kem: Arc<dyn Kem>,
    curve: Curve,
    ek: &[u8],
    label: &[u8],
    x: &[u8],
) -> Result<Ciphertext> {
    validate_pve_inputs(ek, label, x)?;
    with_kem(kem.clone(), || {
        let mut rho = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut rho);
        let kem_ct = kem.encapsulate(ek, &rho)?;
        let (_q, engine_blob) = job.engine().pve_build(curve, label, &kem_ct, x)?;
        let masked_x = xor(x, &keystream(&rho, x.len()));
        Ok(Ciphertext::new(curve, label.to_vec(), pack(&engine_blob, &masked_x)))
    })
}

/// `Verify(ct, expected_q, L)`.
pub fn verify<J: JobHandle>(job: &J, ct: &Ciphertext, expected_q: &[u8]) -> Result<()> {
    let (engine_blob, _masked_x) = unpack(ct.blob())?;
    job.engine().pve_verify(ct.label(), expected_q, &engine_blob)
}

/// `Decrypt(dk, ct, L)`.
pub fn decrypt<J: JobHandle>(
    job: &J,
    kem: Arc<dyn Kem>,
    dk: &PrivateKeyHandle,
    ct: &Ciphertext,
) -> Result<Vec<u8>> {
    let (engine_blob, masked_x) = unpack(ct.blob())?;
    with_kem(kem.clone(), || {
        let kem_ct = job.engine().pve_kem_ct(&engine_blob)?;
        let rho = kem.decapsulate(dk, kem_ct)?;
        Ok(xor(&masked_x, &keystream(&rho, masked_x.len())))
    })
}

/// Encrypts `(label, x)` pairs under the same `ek`, one engine call each.
pub fn batch_encrypt<J: JobHandle>(
    job: &J,
    kem: Arc<dyn Kem>,
    curve: Curve,
    ek: &[u8],
    items: &[(Vec<u8>, Vec<u8>)],
) -> Result<Vec<Ciphertext>> {
    items
        .iter()
        .map(|(label, x)| encrypt(job, kem.clone(), curve, ek, label, x))
        .collect()
}

pub fn batch_verify<J: JobHandle>(job: &J, items: &[(Ciphertext, Vec<u8>)]) -> Result<()> {
    for (ct, expected_q) in items {
        verify(job, ct, expected_q)?;
    }
    Ok(())
}

pub fn batch_decrypt<J: JobHandle>(
    job: &J,
    kem: Arc<dyn Kem>,
    dk: &PrivateKeyHandle,
    items: &[Ciphertext],
) -> Result<Vec<Vec<u8>>> {
    items.iter().map(|ct| decrypt(job, kem.clone(), dk, ct)).collect()
}

/// AC Encrypt: one PVE row per party share, keyed by that party's `ek`.
pub fn ac_encrypt<J: JobHandle>(
    job: &J,
    kem: Arc<dyn Kem>,
    curve: Curve,
    label: &[u8],
    eks: &HashMap<PartyName, Vec<u8>>,
    shares: &HashMap<PartyName, Vec<u8>>,
) -> Result<HashMap<PartyName, Ciphertext>> {
    shares
        .iter()
        .map(|(name, x)| {
            let ek = eks
                .get(name)
                .ok_or_else(|| Error::InvalidArgument(format!("no PVE public key for party {name}")))?;
            let ct = encrypt(job, kem.clone(), curve, ek, label, x)?;
            Ok((name.clone(), ct))
        })
        .collect()
}

/// AC Verify: every row must commit to its party's share commitment.
pub fn ac_verify<J: JobHandle>(
    job: &J,
    rows: &HashMap<PartyName, Ciphertext>,
    expected_q_by_party: &HashMap<PartyName, Vec<u8>>,
) -> Result<()> {
    for (name, ct) in rows {
        let expected_q = expected_q_by_party
            .get(name)
            .ok_or_else(|| Error::InvalidArgument(format!("no expected commitment for party {name}")))?;
        verify(job, ct, expected_q)?;
    }
    Ok(())
}

/// AC PartyDecryptRow: one party decrypts its own row.
pub fn ac_party_decrypt_row<J: JobHandle>(
    job: &J,
    kem: Arc<dyn Kem>,
    dk: &PrivateKeyHandle,
    row: &Ciphertext,
) -> Result<Vec<u8>> {
    decrypt(job, kem, dk, row)
}

/// AC AggregateToRestoreRow: combines an authorized quorum's decrypted
/// rows back into the shared secret, rejecting a `shares` set that does
/// not satisfy `ac`.
pub fn ac_aggregate_to_restore_row(
    ac: &AccessStructure,
    shares: &HashMap<PartyName, Vec<u8>>,
) -> Result<Vec<u8>> {
    ac.validate()?;
    if !quorum_satisfied(ac, shares) {
        return Err(Error::InvalidArgument(
            "share set does not satisfy the access structure".into(),
        ));
    }
    let width = shares
        .values()
        .next()
        .map(Vec::len)
        .ok_or_else(|| Error::InvalidArgument("no shares supplied".into()))?;
    let mut combined = vec![0u8; width];
    for bytes in shares.values() {
        if bytes.len() != width {
            return Err(Error::InvalidArgument("share lengths differ".into()));
        }
        for (c, b) in combined.iter_mut().zip(bytes.iter()) {
            *c ^= b;
        }
    }
    Ok(combined)
}

fn quorum_satisfied(ac: &AccessStructure, shares: &HashMap<PartyName, Vec<u8>>) -> bool {
    match ac {
        AccessStructure::Leaf(name) => shares.keys().any(|k| k.as_str() == name),
        AccessStructure::And(children) => children.iter().all(|c| quorum_satisfied(c, shares)),
        AccessStructure::Or(children) => children.iter().any(|c| quorum_satisfied(c, shares)),
        AccessStructure::Threshold(k, children) => {
            children.iter().filter(|c| quorum_satisfied(c, shares)).count() >= *k as usize
        }
    }
}
