//! # Tree Depth and Address Bits
//!
//! The withdrawal circuit authenticates a leaf against a Merkle root using a
//! fixed-depth path. The leaf's position is supplied as a string of address
//! bits, one per tree level.
//!
//! ## Bit Ordering
//!
//! Address bits are **least-significant bit first**: position `i` of the bit
//! string selects the side at tree level `i`, counting up from the leaf. Leaf
//! index 3 in a depth-4 tree is therefore `"1100"`, not `"0011"`. The
//! convention is pinned by [`ADDRESS_BIT_ORDER`] and every conversion between
//! leaf indices and bit strings goes through it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TreeDepthError, ValidationError};

/// Exclusive upper bound on tree depth. Deeper trees are rejected as a
/// sanity bound, not a circuit limit.
pub const TREE_DEPTH_LIMIT: usize = 32;

/// Symbol for a left branch (the current node is the left child).
pub const ZERO_SYMBOL: char = '0';

/// Symbol for a right branch (the current node is the right child).
pub const ONE_SYMBOL: char = '1';

/// Order in which leaf-index bits are laid out in an address bit string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitOrder {
    /// Position 0 holds the least-significant bit of the leaf index.
    LsbFirst,
    /// Position 0 holds the most-significant bit of the leaf index.
    MsbFirst,
}

impl BitOrder {
    /// Which power of two the symbol at `position` represents, in a string
    /// of `len` bits.
    pub fn bit_weight(self, position: usize, len: usize) -> usize {
        match self {
            BitOrder::LsbFirst => position,
            BitOrder::MsbFirst => len - 1 - position,
        }
    }
}

/// The bit order the withdrawal circuit expects.
pub const ADDRESS_BIT_ORDER: BitOrder = BitOrder::LsbFirst;

/// Number of levels in the Merkle tree, fixed by the proving backend.
///
/// Invariant: `0 < depth < 32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TreeDepth(usize);

impl TreeDepth {
    /// Validate and wrap a depth reported by a backend or configuration.
    pub fn new(depth: usize) -> Result<Self, TreeDepthError> {
        if depth == 0 || depth >= TREE_DEPTH_LIMIT {
            return Err(TreeDepthError(depth));
        }
        Ok(Self(depth))
    }

    /// The raw depth.
    pub fn get(self) -> usize {
        self.0
    }

    /// Number of leaves in a full tree of this depth.
    pub fn leaf_capacity(self) -> u64 {
        1u64 << self.0
    }
}

impl TryFrom<usize> for TreeDepth {
    type Error = TreeDepthError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for TreeDepth {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = usize::deserialize(deserializer)?;
        TreeDepth::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for TreeDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A leaf position expressed as a string of binary symbols, one per level.
///
/// The content is not validated on construction; callers may hand in any
/// text and the parameter validator reports the first offending symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBits(String);

impl AddressBits {
    /// Wrap a caller-supplied bit string as-is.
    pub fn new(bits: impl Into<String>) -> Self {
        Self(bits.into())
    }

    /// Build from booleans, `true` = [`ONE_SYMBOL`]. Element 0 is position 0.
    pub fn from_bools(bits: &[bool]) -> Self {
        Self(
            bits.iter()
                .map(|b| if *b { ONE_SYMBOL } else { ZERO_SYMBOL })
                .collect(),
        )
    }

    /// Build from numeric bit values as they appear in a JSON list. Values
    /// other than 0 and 1 are kept as a non-binary symbol for the validator
    /// to report.
    pub fn from_bit_values(bits: &[u8]) -> Self {
        Self(
            bits.iter()
                .map(|b| match b {
                    0 => ZERO_SYMBOL,
                    1 => ONE_SYMBOL,
                    other => char::from_digit(u32::from(*other), 10)
                        .unwrap_or(char::REPLACEMENT_CHARACTER),
                })
                .collect(),
        )
    }

    /// Expand a leaf index into `depth` bits using [`ADDRESS_BIT_ORDER`].
    pub fn from_leaf_index(index: u64, depth: TreeDepth) -> Result<Self, ValidationError> {
        let capacity = depth.leaf_capacity();
        if index >= capacity {
            return Err(ValidationError::LeafIndexOutOfRange { index, capacity });
        }
        let len = depth.get();
        let bits = (0..len)
            .map(|position| {
                let weight = ADDRESS_BIT_ORDER.bit_weight(position, len);
                if (index >> weight) & 1 == 1 {
                    ONE_SYMBOL
                } else {
                    ZERO_SYMBOL
                }
            })
            .collect();
        Ok(Self(bits))
    }

    /// Recover the leaf index, or `None` if the string holds a non-binary
    /// symbol or is too long for a `u64`.
    pub fn leaf_index(&self) -> Option<u64> {
        let len = self.len();
        if len > 64 {
            return None;
        }
        let mut index = 0u64;
        for (position, symbol) in self.0.chars().enumerate() {
            let weight = ADDRESS_BIT_ORDER.bit_weight(position, len);
            match symbol {
                ONE_SYMBOL => index |= 1u64 << weight,
                ZERO_SYMBOL => {}
                _ => return None,
            }
        }
        Some(index)
    }

    /// The first symbol that is not [`ZERO_SYMBOL`] or [`ONE_SYMBOL`].
    pub fn first_invalid(&self) -> Option<(usize, char)> {
        self.0
            .chars()
            .enumerate()
            .find(|(_, c)| *c != ZERO_SYMBOL && *c != ONE_SYMBOL)
    }

    /// Bit at `position` (`Some(true)` for [`ONE_SYMBOL`]).
    pub fn bit(&self, position: usize) -> Option<bool> {
        match self.0.chars().nth(position)? {
            ONE_SYMBOL => Some(true),
            ZERO_SYMBOL => Some(false),
            _ => None,
        }
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw symbol string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AddressBits {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AddressBits {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for AddressBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Expanding a leaf index and reading it back is the identity.
        #[test]
        fn leaf_index_round_trip(d in 1usize..32, seed in any::<u64>()) {
            let depth = TreeDepth::new(d).unwrap();
            let index = seed % depth.leaf_capacity();
            let bits = AddressBits::from_leaf_index(index, depth).unwrap();
            prop_assert_eq!(bits.len(), d);
            prop_assert_eq!(bits.first_invalid(), None);
            prop_assert_eq!(bits.leaf_index(), Some(index));
            prop_assert_eq!(bits.bit(0), Some(index & 1 == 1));
        }
    }
}
