//! # Withdrawal Witnesses
//!
//! The complete public and private input set for one withdrawal proof.
//!
//! - Public: `root`, `wallet_address`, `nullifier_hash`.
//! - Private: `nullifier_secret`, `address_bits`, `merkle_path`.
//!
//! [`WithdrawalWitness`] is the typed form callers build directly.
//! [`WitnessDocument`] is the loosely typed JSON form accepted from external
//! tooling; its scalars stay as JSON source text until the parameter
//! validator has checked the structural rules in order.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{FieldError, ValidationError};
use crate::field::FieldElement;
use crate::tree::AddressBits;

/// Public and private inputs for a single withdrawal proof.
///
/// Transient: built per request and dropped once the proof is produced.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalWitness {
    /// Merkle root the leaf is authenticated against.
    pub root: FieldElement,
    /// Wallet the withdrawn funds are bound to.
    pub wallet_address: FieldElement,
    /// Published nullifier, `H(secret, secret)`.
    pub nullifier_hash: FieldElement,
    /// Preimage of the nullifier. Never logged.
    pub nullifier_secret: FieldElement,
    /// Leaf position, least-significant bit first.
    pub address_bits: AddressBits,
    /// Sibling hashes from the leaf level up to just below the root.
    pub merkle_path: Vec<FieldElement>,
}

impl WithdrawalWitness {
    /// The scalar fields in wire order, paired with their names.
    pub fn named_scalars(&self) -> [(&'static str, &FieldElement); 4] {
        [
            ("root", &self.root),
            ("wallet_address", &self.wallet_address),
            ("nullifier_hash", &self.nullifier_hash),
            ("nullifier_secret", &self.nullifier_secret),
        ]
    }

    /// The public inputs, in the order the circuit declares them.
    pub fn public_inputs(&self) -> [&FieldElement; 3] {
        [&self.root, &self.wallet_address, &self.nullifier_hash]
    }
}

impl fmt::Debug for WithdrawalWitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithdrawalWitness")
            .field("root", &self.root)
            .field("wallet_address", &self.wallet_address)
            .field("nullifier_hash", &self.nullifier_hash)
            .field("nullifier_secret", &"<redacted>")
            .field("address_bits", &"<redacted>")
            .field("merkle_path_len", &self.merkle_path.len())
            .finish()
    }
}

/// Leaf position as it appears in a witness document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressField {
    /// A leaf index, expanded to bits by the validator.
    Index(u64),
    /// A pre-expanded bit string.
    Bits(String),
    /// A pre-expanded list of bit values, element 0 first.
    BitList(Vec<u8>),
}

/// A scalar exactly as it was written in a witness document.
///
/// Kept as source text so integers wider than 64 bits keep every digit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonScalar(Box<RawValue>);

impl JsonScalar {
    /// Wrap one JSON value given as text.
    pub fn from_json_text(text: impl Into<String>) -> Result<Self, serde_json::Error> {
        RawValue::from_string(text.into()).map(Self)
    }

    /// The JSON source text.
    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    /// Parse as a field element.
    pub fn to_field(&self) -> Result<FieldElement, FieldError> {
        FieldElement::from_json_text(self.0.get())
    }
}

impl PartialEq for JsonScalar {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// The JSON witness form:
///
/// ```text
/// {"root": "...", "wallet_address": "...", "nullifier": "...",
///  "nullifier_secret": "...", "address": 3, "path": ["...", ...]}
/// ```
///
/// Scalars may be decimal strings or JSON integers of any width; `address`
/// may be a leaf index, a bit string or a list of bit values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WitnessDocument {
    /// Merkle root.
    pub root: JsonScalar,
    /// Withdrawing wallet.
    pub wallet_address: JsonScalar,
    /// Nullifier hash.
    #[serde(alias = "nullifier_hash")]
    pub nullifier: JsonScalar,
    /// Nullifier preimage.
    pub nullifier_secret: JsonScalar,
    /// Leaf position.
    pub address: AddressField,
    /// Merkle authentication path.
    pub path: Vec<JsonScalar>,
}

impl WitnessDocument {
    /// Parse a witness document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(text).map_err(|e| ValidationError::MalformedWitness(e.to_string()))
    }
}
