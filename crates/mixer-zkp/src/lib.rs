//! # mixer-zkp — Withdrawal Proof Coordination
//!
//! The layer between a caller holding a withdrawal witness and the external
//! engine that owns the circuit. It validates, encodes, delegates and
//! decodes; it performs no cryptography of its own.
//!
//! ## Architecture
//!
//! ```text
//! prove:  witness ─► ParameterValidator ─► codec::encode_witness ─► MixerBackend::prove ─► codec::decode_proof ─► Proof
//! verify: Proof ─► codec::encode_proof (+ cached VK JSON) ─► MixerBackend::verify ─► bool
//! ```
//!
//! - [`MixerBackend`] is the consumed capability trait: tree depth, prove,
//!   verify. [`CliBackend`] drives a command-line prover;
//!   [`MockMixerBackend`] (feature `mock`) is a transparent stand-in.
//! - [`codec`] is the only place wire strings are produced or parsed.
//! - [`VerifyingKeyStore`] normalizes the accepted verifying-key shapes once.
//! - [`ProofCoordinator`] is the façade; [`ProvingPool`] bounds concurrent
//!   calls for async hosts.
//!
//! ## Error Taxonomy
//!
//! See [`error`]. An invalid proof is `Ok(false)`, never an error.
//!
//! ## Logging
//!
//! All diagnostics go through `tracing`. Installing a subscriber is the
//! host's job. Secret witness values are never logged.

pub mod backend;
pub mod cli;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod keys;
#[cfg(feature = "mock")]
pub mod mock;
pub mod pool;
pub mod proof;
pub mod validate;

// Re-export primary types.
pub use backend::{MixerBackend, SharedBackend};
pub use cli::CliBackend;
pub use codec::EncodedWitness;
pub use config::{BackendSettings, CoordinatorConfig, PoolSettings, VerifyingKeySetting};
pub use coordinator::ProofCoordinator;
pub use error::{BackendError, CodecError, ConfigError, CoordinatorError, PoolError};
pub use keys::{ProvingKeyRef, VerifyingKeyOrigin, VerifyingKeySource, VerifyingKeyStore};
#[cfg(feature = "mock")]
pub use mock::MockMixerBackend;
pub use pool::ProvingPool;
pub use proof::{G1Point, G2Point, Proof, VerifyingKey, PUBLIC_INPUT_COUNT};
pub use validate::{ParameterValidator, RangeCheck};
