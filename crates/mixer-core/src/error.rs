//! # Error Types: Witness Shape and Field Parsing
//!
//! Errors raised before anything reaches a proving backend. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - One `ValidationError` variant per structural rule, carrying the
//!   expected vs actual values so a caller can tell which rule fired.
//! - Secret values never appear in error messages. Scalar errors name the
//!   offending field, not its content.

use thiserror::Error;

/// A witness that does not match the circuit's fixed shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The Merkle authentication path has the wrong number of siblings.
    #[error("merkle path length mismatch: expected {expected} siblings, got {actual}")]
    MerklePathLength {
        /// The tree depth of the circuit.
        expected: usize,
        /// Number of path elements supplied.
        actual: usize,
    },

    /// The address bit string has the wrong number of bits.
    #[error("address bits length mismatch: expected {expected} bits, got {actual}")]
    AddressBitsLength {
        /// The tree depth of the circuit.
        expected: usize,
        /// Number of bit symbols supplied.
        actual: usize,
    },

    /// An address bit is neither `0` nor `1`.
    #[error("address bit {position} is not binary: found {symbol:?}")]
    AddressBitSymbol {
        /// Zero-based position in the bit string (0 = least significant).
        position: usize,
        /// The offending symbol.
        symbol: char,
    },

    /// A leaf index does not fit in a tree of the circuit's depth.
    #[error("leaf index {index} does not fit in a tree with {capacity} leaves")]
    LeafIndexOutOfRange {
        /// The requested leaf index.
        index: u64,
        /// Number of leaves the tree can hold.
        capacity: u64,
    },

    /// A scalar input is not a non-negative base-10 integer.
    #[error("{field} is not an integer")]
    ScalarNotInteger {
        /// Name of the offending witness field.
        field: String,
    },

    /// A scalar input is not below the scalar field modulus.
    #[error("{field} is not a canonical field element (must be below the scalar field modulus)")]
    ScalarOutOfRange {
        /// Name of the offending witness field.
        field: String,
    },

    /// The witness document could not be parsed at all.
    #[error("malformed witness document: {0}")]
    MalformedWitness(String),
}

/// Error parsing a field element from text or JSON.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The input was empty.
    #[error("empty field element")]
    Empty,

    /// The input contained something other than ASCII digits.
    #[error("field element is not a base-{radix} integer: {input:?}")]
    NotAnInteger {
        /// The rejected input, truncated for display.
        input: String,
        /// The radix the parser expected.
        radix: u32,
    },

    /// The JSON value was neither a string nor a non-negative integer.
    #[error("field element must be a decimal string or non-negative integer, got {0}")]
    UnsupportedJson(&'static str),
}

/// Error constructing a [`TreeDepth`](crate::TreeDepth).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("tree depth {0} is out of bounds (must satisfy 0 < depth < 32)")]
pub struct TreeDepthError(pub usize);
