//! # Backend Wire Codec
//!
//! The single place where domain values are turned into the backend's wire
//! representation and back.
//!
//! ## Wire Contract
//!
//! - Every scalar and every path element crosses the boundary as a canonical
//!   base-10 ASCII string. Never hex, never raw bytes: the circuit parses
//!   decimal and a different radix silently yields a different witness.
//! - Address bits cross as a string of `0`/`1`, position 0 = least
//!   significant bit, one symbol per tree level.
//! - Proofs and verifying keys cross as JSON text.

use std::fmt;

use mixer_core::{AddressBits, FieldElement, WithdrawalWitness};

use crate::error::CodecError;
use crate::proof::{Proof, VerifyingKey};

/// A witness in backend wire form.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedWitness {
    /// Merkle root, decimal.
    pub root: String,
    /// Wallet address, decimal.
    pub wallet_address: String,
    /// Nullifier hash, decimal.
    pub nullifier_hash: String,
    /// Nullifier preimage, decimal.
    pub nullifier_secret: String,
    /// `0`/`1` string, LSB first.
    pub address_bits: String,
    /// Sibling hashes, decimal, leaf level first.
    pub path: Vec<String>,
}

impl EncodedWitness {
    /// Scalars in backend argument order.
    pub fn scalar_args(&self) -> [&str; 4] {
        [
            &self.root,
            &self.wallet_address,
            &self.nullifier_hash,
            &self.nullifier_secret,
        ]
    }
}

impl fmt::Debug for EncodedWitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedWitness")
            .field("root", &self.root)
            .field("wallet_address", &self.wallet_address)
            .field("nullifier_hash", &self.nullifier_hash)
            .field("nullifier_secret", &"<redacted>")
            .field("address_bits", &"<redacted>")
            .field("path_len", &self.path.len())
            .finish()
    }
}

/// Encode one scalar as canonical decimal.
pub fn encode_scalar(value: &FieldElement) -> String {
    value.to_decimal()
}

/// Encode the address bits as the fixed-length `0`/`1` string.
pub fn encode_address_bits(bits: &AddressBits) -> String {
    bits.as_str().to_owned()
}

/// Encode a whole witness. Assumes the witness already passed validation.
pub fn encode_witness(witness: &WithdrawalWitness) -> EncodedWitness {
    EncodedWitness {
        root: encode_scalar(&witness.root),
        wallet_address: encode_scalar(&witness.wallet_address),
        nullifier_hash: encode_scalar(&witness.nullifier_hash),
        nullifier_secret: encode_scalar(&witness.nullifier_secret),
        address_bits: encode_address_bits(&witness.address_bits),
        path: witness.merkle_path.iter().map(encode_scalar).collect(),
    }
}

/// Decode a backend proof payload. Trailing NULs and whitespace are
/// tolerated since native backends hand back C strings.
pub fn decode_proof(payload: &[u8]) -> Result<Proof, CodecError> {
    let text = std::str::from_utf8(payload)?;
    let text = text.trim_end_matches('\0').trim();
    if text.is_empty() {
        return Err(CodecError::Empty);
    }
    Ok(serde_json::from_str(text)?)
}

/// Encode a proof as compact JSON for the verify call.
pub fn encode_proof(proof: &Proof) -> Result<String, CodecError> {
    Ok(serde_json::to_string(proof)?)
}

/// Encode a verifying key as compact JSON for the verify call.
pub fn encode_verifying_key(vk: &VerifyingKey) -> Result<String, CodecError> {
    Ok(serde_json::to_string(vk)?)
}

/// Decode a verifying key from JSON text.
pub fn decode_verifying_key(text: &str) -> Result<VerifyingKey, CodecError> {
    if text.trim().is_empty() {
        return Err(CodecError::Empty);
    }
    Ok(serde_json::from_str(text)?)
}
