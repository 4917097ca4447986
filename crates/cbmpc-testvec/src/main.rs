//! Test vector generator for the RSA-OAEP KEM's determinism contract
//! (spec §8 seed scenario 5).
//!
//! Generates `test_vectors.json` recording the contract's three
//! invariants: `Encapsulate(ek, rho)` is byte-identical across repeated
//! calls; `Encapsulate(ek1, rho) != Encapsulate(ek2, rho)` for distinct
//! freshly-generated keys; and `Decapsulate` recovers `rho`. RSA key
//! generation is randomized, so unlike a classic fixed-seed KAT file,
//! `--verify` regenerates a fresh instance of each vector and rechecks
//! the same invariants rather than diffing stored ciphertext bytes.
//!
//! Usage:
//!   cbmpc-testvec              # Generate test_vectors.json
//!   cbmpc-testvec --verify     # Regenerate and check invariants

use cbmpc_kem::{Kem, RsaOaepKem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize)]
struct TestVectors {
    version: String,
    generated_by: String,
    vectors: BTreeMap<String, TestVector>,
}

#[derive(Serialize, Deserialize)]
struct TestVector {
    description: String,
    inputs: BTreeMap<String, String>,
    outputs: BTreeMap<String, String>,
    invariants_hold: bool,
}

fn rsa_oaep_determinism_vector(key_bits: usize) -> (String, TestVector) {
    let kem = RsaOaepKem::new(key_bits);
    let (handle, ek) = kem.generate().expect("key generation succeeds");
    let rho = [0x07u8; 32];

    let ct_a = kem.encapsulate(&ek, &rho).expect("encapsulate succeeds");
    let ct_b = kem.encapsulate(&ek, &rho).expect("encapsulate succeeds");
    let deterministic = ct_a == ct_b;

    let recovered = kem.decapsulate(&handle, &ct_a).expect("decapsulate succeeds");
    let round_trips = recovered == rho;

    let name = format!("rsa_oaep_{key_bits}_determinism");
    let vector = TestVector {
        description: format!(
            "RSA-OAEP-{key_bits} Encapsulate(ek, rho) determinism and round trip"
        ),
        inputs: BTreeMap::from([
            ("key_bits".to_string(), key_bits.to_string()),
            ("ek".to_string(), hex::encode(&ek)),
            ("rho".to_string(), hex::encode(rho)),
        ]),
        outputs: BTreeMap::from([("ciphertext".to_string(), hex::encode(&ct_a))]),
        invariants_hold: deterministic && round_trips,
    };
    (name, vector)
}

fn rsa_oaep_key_separation_vector(key_bits: usize) -> (String, TestVector) {
    let kem = RsaOaepKem::new(key_bits);
    let (_h1, ek1) = kem.generate().expect("key generation succeeds");
    let (_h2, ek2) = kem.generate().expect("key generation succeeds");
    let rho = [0x09u8; 32];

    let ct1 = kem.encapsulate(&ek1, &rho).expect("encapsulate succeeds");
    let ct2 = kem.encapsulate(&ek2, &rho).expect("encapsulate succeeds");
    let separated = ct1 != ct2;

    let name = format!("rsa_oaep_{key_bits}_key_separation");
    let vector = TestVector {
        description: format!(
            "RSA-OAEP-{key_bits} Encapsulate(ek1, rho) != Encapsulate(ek2, rho) for distinct keys"
        ),
        inputs: BTreeMap::from([
            ("key_bits".to_string(), key_bits.to_string()),
            ("ek1".to_string(), hex::encode(&ek1)),
            ("ek2".to_string(), hex::encode(&ek2)),
            ("rho".to_string(), hex::encode(rho)),
        ]),
        outputs: BTreeMap::from([
            ("ciphertext_1".to_string(), hex::encode(&ct1)),
            ("ciphertext_2".to_string(), hex::encode(&ct2)),
        ]),
        invariants_hold: separated,
    };
    (name, vector)
}

fn generate_all_vectors() -> TestVectors {
    let mut vectors = BTreeMap::new();
    for key_bits in [2048usize, 3072] {
        let (name, vector) = rsa_oaep_determinism_vector(key_bits);
        vectors.insert(name, vector);
        let (name, vector) = rsa_oaep_key_separation_vector(key_bits);
        vectors.insert(name, vector);
    }
    TestVectors {
        version: "1.0".to_string(),
        generated_by: "cbmpc-testvec".to_string(),
        vectors,
    }
}

fn check_invariants(vectors: &TestVectors) -> bool {
    let mut all_pass = true;
    for (name, vector) in &vectors.vectors {
        if vector.invariants_hold {
            eprintln!("PASS: {name}");
        } else {
            eprintln!("FAIL: {name}");
            all_pass = false;
        }
    }
    all_pass
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let path = "tests/fixtures/test_vectors.json";

    if args.iter().any(|a| a == "--verify") {
        let vectors = generate_all_vectors();
        if check_invariants(&vectors) {
            eprintln!("All determinism invariants verified successfully.");
        } else {
            eprintln!("Determinism invariant verification FAILED.");
            std::process::exit(1);
        }
        return;
    }

    let vectors = generate_all_vectors();
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent).expect("create dirs");
    }
    let json = serde_json::to_string_pretty(&vectors).expect("serialize");
    std::fs::write(path, &json).expect("write file");
    eprintln!("Generated {} test vectors to {path}", vectors.vectors.len());

    if check_invariants(&vectors) {
        eprintln!("Self-verification passed.");
    } else {
        eprintln!("Self-verification FAILED.");
        std::process::exit(1);
    }
}
