//! # Mock Mixer Backend
//!
//! A deterministic, transparent stand-in for the compiled withdrawal circuit,
//! for development and tests.
//!
//! ## How It Works
//!
//! `prove()` checks the witness the way the circuit constrains it:
//!
//! ```text
//! leaf      = H_leaf(secret, wallet)
//! nullifier = H_nullifier(secret, secret)
//! root      = fold(leaf, path, address_bits)   // bit i = 0: H_i(cur, sibling)
//!                                              // bit i = 1: H_i(sibling, cur)
//! ```
//!
//! An unsatisfied witness yields no result, like the native prover. A
//! satisfied one yields a Groth16-shaped proof whose points are SHA-256
//! digests bound to the verifying key's `alpha` and the public inputs.
//! `verify()` recomputes the points and compares.
//!
//! ## Security Warning
//!
//! **NOT PRIVATE.** Anyone holding the public inputs can recompute the proof.
//! The hash is SHA-256 reduced into the scalar field, not the circuit's real
//! hash. Never use this backend where zero-knowledge matters.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use mixer_core::{AddressBits, FieldElement};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::backend::MixerBackend;
use crate::codec::EncodedWitness;
use crate::error::BackendError;
use crate::proof::{G1Point, G2Point, Proof, VerifyingKey, PUBLIC_INPUT_COUNT};

const LEAF_TAG: &[u8] = b"mixer.mock.leaf";
const NULLIFIER_TAG: &[u8] = b"mixer.mock.nullifier";
const NODE_TAG: &[u8] = b"mixer.mock.node";
const KEY_TAG: &[u8] = b"mixer.mock.vk";
const PROOF_TAG: &[u8] = b"mixer.mock.proof";

/// Contents of a mock proving-key file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockProvingKey {
    /// Circuit the key was generated for.
    pub circuit_id: String,
    /// Tree depth the key was generated for.
    pub tree_depth: usize,
}

/// Deterministic SHA-256 backend. **NOT PRIVATE.**
#[derive(Debug)]
pub struct MockMixerBackend {
    tree_depth: usize,
    prove_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl MockMixerBackend {
    /// A backend for a circuit of the given depth. The depth is reported
    /// as-is; bounds are the coordinator's concern.
    pub fn new(tree_depth: usize) -> Self {
        Self {
            tree_depth,
            prove_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }

    /// Number of `prove` calls that reached this backend.
    pub fn prove_calls(&self) -> usize {
        self.prove_calls.load(Ordering::SeqCst)
    }

    /// Number of `verify` calls that reached this backend.
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    /// Write a proving-key file for `circuit_id` and return the matching
    /// verifying key.
    pub fn generate_keys(
        &self,
        circuit_id: &str,
        proving_key_path: &Path,
    ) -> Result<VerifyingKey, BackendError> {
        let pk = MockProvingKey {
            circuit_id: circuit_id.to_owned(),
            tree_depth: self.tree_depth,
        };
        let json = serde_json::to_vec_pretty(&pk)
            .map_err(|e| BackendError::KeyMaterial(format!("failed to encode proving key: {e}")))?;
        std::fs::write(proving_key_path, json)?;
        tracing::debug!(circuit_id, path = %proving_key_path.display(), "generated mock keys");
        Ok(verifying_key_for(circuit_id))
    }

    fn load_proving_key(&self, path: &Path) -> Result<MockProvingKey, BackendError> {
        let text = std::fs::read_to_string(path)?;
        let pk: MockProvingKey = serde_json::from_str(&text).map_err(|e| {
            BackendError::KeyMaterial(format!("{} is not a mock proving key: {e}", path.display()))
        })?;
        if pk.tree_depth != self.tree_depth {
            return Err(BackendError::KeyMaterial(format!(
                "proving key is for depth {}, backend depth is {}",
                pk.tree_depth, self.tree_depth
            )));
        }
        Ok(pk)
    }

    /// The public inputs if the witness satisfies the circuit, else `None`.
    fn satisfied_inputs(&self, witness: &EncodedWitness) -> Option<[FieldElement; 3]> {
        let [root, wallet, nullifier, secret] = witness
            .scalar_args()
            .map(|arg| FieldElement::from_decimal(arg).ok());
        let (root, wallet, nullifier, secret) = (root?, wallet?, nullifier?, secret?);

        if witness.path.len() != self.tree_depth {
            return None;
        }
        let path = witness
            .path
            .iter()
            .map(|p| FieldElement::from_decimal(p).ok())
            .collect::<Option<Vec<_>>>()?;

        if nullifier_hash(&secret) != nullifier {
            return None;
        }
        let bits = AddressBits::new(witness.address_bits.as_str());
        let computed = compute_root(&leaf_hash(&secret, &wallet), &bits, &path)?;
        if computed != root {
            return None;
        }
        Some([root, wallet, nullifier])
    }
}

impl MixerBackend for MockMixerBackend {
    fn tree_depth(&self) -> usize {
        self.tree_depth
    }

    fn prove(
        &self,
        proving_key: &Path,
        witness: &EncodedWitness,
    ) -> Result<Option<Vec<u8>>, BackendError> {
        self.prove_calls.fetch_add(1, Ordering::SeqCst);
        let pk = self.load_proving_key(proving_key)?;

        let Some(inputs) = self.satisfied_inputs(witness) else {
            tracing::debug!("mock circuit unsatisfied");
            return Ok(None);
        };

        let vk = verifying_key_for(&pk.circuit_id);
        let proof = proof_for(&vk.alpha, &inputs);
        let json = serde_json::to_vec(&proof)
            .map_err(|e| BackendError::KeyMaterial(format!("failed to encode proof: {e}")))?;
        Ok(Some(json))
    }

    fn verify(&self, verifying_key_json: &str, proof_json: &str) -> Result<bool, BackendError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let Ok(vk) = serde_json::from_str::<VerifyingKey>(verifying_key_json) else {
            return Ok(false);
        };
        let Ok(proof) = serde_json::from_str::<Proof>(proof_json) else {
            return Ok(false);
        };
        let Ok(inputs) = proof.public_inputs() else {
            return Ok(false);
        };
        if inputs.len() != PUBLIC_INPUT_COUNT || vk.public_input_count() != PUBLIC_INPUT_COUNT {
            return Ok(false);
        }
        let expected = proof_for(&vk.alpha, &inputs);
        Ok(expected.a == proof.a
            && expected.b == proof.b
            && expected.c == proof.c
            && expected.input == proof.input)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---- Hash primitives ----

fn digest(tag: &[u8], parts: &[&[u8]]) -> FieldElement {
    let mut hasher = Sha256::new();
    hasher.update(tag);
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    FieldElement::from_be_bytes_mod_order(hasher.finalize().as_slice())
}

fn hash_scalars(tag: &[u8], scalars: &[&FieldElement]) -> FieldElement {
    let encoded: Vec<String> = scalars.iter().map(|s| s.to_decimal()).collect();
    let parts: Vec<&[u8]> = encoded.iter().map(|s| s.as_bytes()).collect();
    digest(tag, &parts)
}

/// Commitment stored in the tree: `H_leaf(secret, wallet)`.
pub fn leaf_hash(secret: &FieldElement, wallet: &FieldElement) -> FieldElement {
    hash_scalars(LEAF_TAG, &[secret, wallet])
}

/// Published nullifier: `H_nullifier(secret, secret)`.
pub fn nullifier_hash(secret: &FieldElement) -> FieldElement {
    hash_scalars(NULLIFIER_TAG, &[secret, secret])
}

/// Interior node at `level` (0 = parents of leaves).
pub fn hash_node(level: usize, left: &FieldElement, right: &FieldElement) -> FieldElement {
    let level = FieldElement::from_u64(level as u64);
    hash_scalars(NODE_TAG, &[&level, left, right])
}

/// Fold a leaf up its authentication path, LSB-first. `None` if the bits
/// are shorter than the path or contain a non-binary symbol.
pub fn compute_root(
    leaf: &FieldElement,
    bits: &AddressBits,
    path: &[FieldElement],
) -> Option<FieldElement> {
    let mut current = leaf.clone();
    for (level, sibling) in path.iter().enumerate() {
        current = if bits.bit(level)? {
            hash_node(level, sibling, &current)
        } else {
            hash_node(level, &current, sibling)
        };
    }
    Some(current)
}

/// The verifying key [`MockMixerBackend::generate_keys`] returns for
/// `circuit_id`.
pub fn verifying_key_for(circuit_id: &str) -> VerifyingKey {
    let coord = |label: &str| digest(KEY_TAG, &[circuit_id.as_bytes(), label.as_bytes()]).to_hex();
    let g1 = |name: &str| G1Point([coord(&format!("{name}.x")), coord(&format!("{name}.y"))]);
    let g2 = |name: &str| {
        G2Point([
            [coord(&format!("{name}.x0")), coord(&format!("{name}.x1"))],
            [coord(&format!("{name}.y0")), coord(&format!("{name}.y1"))],
        ])
    };
    VerifyingKey {
        alpha: g1("alpha"),
        beta: g2("beta"),
        gamma: g2("gamma"),
        delta: g2("delta"),
        gamma_abc: (0..=PUBLIC_INPUT_COUNT)
            .map(|i| g1(&format!("gamma_abc.{i}")))
            .collect(),
    }
}

fn proof_for(alpha: &G1Point, inputs: &[FieldElement]) -> Proof {
    let decimals: Vec<String> = inputs.iter().map(FieldElement::to_decimal).collect();
    let coord = |label: &str| {
        let mut parts: Vec<&[u8]> = vec![
            label.as_bytes(),
            alpha.0[0].as_bytes(),
            alpha.0[1].as_bytes(),
        ];
        parts.extend(decimals.iter().map(|d| d.as_bytes()));
        digest(PROOF_TAG, &parts).to_hex()
    };
    Proof {
        a: G1Point([coord("A.x"), coord("A.y")]),
        b: G2Point([
            [coord("B.x0"), coord("B.x1")],
            [coord("B.y0"), coord("B.y1")],
        ]),
        c: G1Point([coord("C.x"), coord("C.y")]),
        input: inputs.iter().map(FieldElement::to_hex).collect(),
        extra: serde_json::Map::new(),
    }
}
