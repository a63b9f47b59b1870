//! # Parameter Validation
//!
//! Structural checks run before any backend call. Rules are applied in a
//! fixed order and the first violation wins:
//!
//! 1. Merkle path length equals the tree depth.
//! 2. Address bits length equals the tree depth, and every symbol is binary.
//! 3. Every scalar is an integer and, under [`RangeCheck::Enforce`], below
//!    the scalar field modulus. Path elements follow the same rule.
//!
//! Validation is pure. It never touches the backend.

use mixer_core::{
    AddressBits, AddressField, FieldElement, JsonScalar, TreeDepth, ValidationError,
    WithdrawalWitness, WitnessDocument,
};
use serde::{Deserialize, Serialize};

/// Policy for scalars at or above the field modulus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeCheck {
    /// Reject non-canonical scalars with [`ValidationError::ScalarOutOfRange`].
    #[default]
    Enforce,
    /// Accept any integer and leave the decision to the backend.
    Defer,
}

/// Checks witnesses against a fixed tree depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterValidator {
    depth: TreeDepth,
    range_check: RangeCheck,
}

impl ParameterValidator {
    /// Validator for `depth` with the default range-check policy.
    pub fn new(depth: TreeDepth) -> Self {
        Self {
            depth,
            range_check: RangeCheck::default(),
        }
    }

    /// Replace the range-check policy.
    pub fn with_range_check(mut self, range_check: RangeCheck) -> Self {
        self.range_check = range_check;
        self
    }

    /// The depth witnesses are checked against.
    pub fn depth(&self) -> TreeDepth {
        self.depth
    }

    /// The active range-check policy.
    pub fn range_check(&self) -> RangeCheck {
        self.range_check
    }

    /// Check a typed witness.
    pub fn validate(&self, witness: &WithdrawalWitness) -> Result<(), ValidationError> {
        self.check_path_len(witness.merkle_path.len())?;
        self.check_address_bits(&witness.address_bits)?;

        for (field, value) in witness.named_scalars() {
            self.check_range(field, value)?;
        }
        for (level, element) in witness.merkle_path.iter().enumerate() {
            if !self.in_range(element) {
                return Err(ValidationError::ScalarOutOfRange {
                    field: path_field(level),
                });
            }
        }
        Ok(())
    }

    /// Check a JSON witness document and convert it to a typed witness.
    ///
    /// The same rule order applies; a leaf-index `address` is expanded to
    /// bits before rule 2 is checked.
    pub fn validate_document(
        &self,
        document: &WitnessDocument,
    ) -> Result<WithdrawalWitness, ValidationError> {
        self.check_path_len(document.path.len())?;

        let address_bits = match &document.address {
            AddressField::Index(index) => AddressBits::from_leaf_index(*index, self.depth)?,
            AddressField::Bits(bits) => AddressBits::new(bits.as_str()),
            AddressField::BitList(bits) => AddressBits::from_bit_values(bits),
        };
        self.check_address_bits(&address_bits)?;

        let root = scalar("root", &document.root)?;
        let wallet_address = scalar("wallet_address", &document.wallet_address)?;
        let nullifier_hash = scalar("nullifier_hash", &document.nullifier)?;
        let nullifier_secret = scalar("nullifier_secret", &document.nullifier_secret)?;
        let merkle_path = document
            .path
            .iter()
            .enumerate()
            .map(|(level, value)| {
                value
                    .to_field()
                    .map_err(|_| ValidationError::ScalarNotInteger {
                        field: path_field(level),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let witness = WithdrawalWitness {
            root,
            wallet_address,
            nullifier_hash,
            nullifier_secret,
            address_bits,
            merkle_path,
        };
        self.validate(&witness)?;
        Ok(witness)
    }

    fn check_path_len(&self, actual: usize) -> Result<(), ValidationError> {
        let expected = self.depth.get();
        if actual != expected {
            return Err(ValidationError::MerklePathLength { expected, actual });
        }
        Ok(())
    }

    fn check_address_bits(&self, bits: &AddressBits) -> Result<(), ValidationError> {
        let expected = self.depth.get();
        let actual = bits.len();
        if actual != expected {
            return Err(ValidationError::AddressBitsLength { expected, actual });
        }
        if let Some((position, symbol)) = bits.first_invalid() {
            return Err(ValidationError::AddressBitSymbol { position, symbol });
        }
        Ok(())
    }

    fn check_range(&self, field: &str, value: &FieldElement) -> Result<(), ValidationError> {
        if self.in_range(value) {
            Ok(())
        } else {
            Err(ValidationError::ScalarOutOfRange {
                field: field.to_owned(),
            })
        }
    }

    fn in_range(&self, value: &FieldElement) -> bool {
        match self.range_check {
            RangeCheck::Enforce => value.is_canonical(),
            RangeCheck::Defer => true,
        }
    }
}

/// Check `witness` against `depth` with range checks enforced.
pub fn validate(witness: &WithdrawalWitness, depth: TreeDepth) -> Result<(), ValidationError> {
    ParameterValidator::new(depth).validate(witness)
}

fn scalar(field: &str, value: &JsonScalar) -> Result<FieldElement, ValidationError> {
    value.to_field().map_err(|_| ValidationError::ScalarNotInteger {
        field: field.to_owned(),
    })
}

fn path_field(level: usize) -> String {
    format!("merkle_path[{level}]")
}
