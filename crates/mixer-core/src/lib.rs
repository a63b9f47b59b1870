//! # mixer-core — Foundational Types for the Withdrawal Prover
//!
//! Defines the domain primitives shared by every other crate in the
//! workspace. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Integers, never floats.** Every scalar is a [`FieldElement`], an
//!    unbounded integer whose text form is base-10. There is no way to build
//!    one from a float or a signed value.
//!
//! 2. **One bit-ordering convention.** Address bits are LSB-first, pinned by
//!    [`ADDRESS_BIT_ORDER`]. Leaf-index conversions go through it.
//!
//! 3. **Bounded tree depth.** [`TreeDepth`] only exists for `0 < depth < 32`.
//!
//! 4. **Secrets stay out of logs.** `Debug` for [`WithdrawalWitness`] redacts
//!    the private inputs; validation errors name fields, not values.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mixer-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod field;
pub mod tree;
pub mod witness;

// Re-export primary types for ergonomic imports.
pub use error::{FieldError, TreeDepthError, ValidationError};
pub use field::{FieldElement, FIELD_ELEMENT_BYTES, SNARK_SCALAR_FIELD};
pub use tree::{
    AddressBits, BitOrder, TreeDepth, ADDRESS_BIT_ORDER, ONE_SYMBOL, TREE_DEPTH_LIMIT, ZERO_SYMBOL,
};
pub use witness::{AddressField, JsonScalar, WithdrawalWitness, WitnessDocument};
