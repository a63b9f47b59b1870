//! # Backend Capability Trait
//!
//! The proving engine is external. This layer consumes it only through
//! [`MixerBackend`]: a capability query, a prove operation and a verify
//! operation, all over the decimal/bit-string wire contract produced by
//! [`codec`](crate::codec).
//!
//! ## Open Trait
//!
//! The withdrawal circuit is compiled and packaged outside this workspace,
//! so the trait is not sealed. Native bindings, the process adapter
//! ([`CliBackend`](crate::CliBackend)) and test doubles implement it.
//!
//! ## Reentrancy
//!
//! `Send + Sync` is the precondition the coordinator asserts on its backend.
//! A backend whose native handle is not reentrant must serialize internally.

use std::path::Path;
use std::sync::Arc;

use crate::codec::EncodedWitness;
use crate::error::BackendError;

/// The external proving/verification engine.
pub trait MixerBackend: Send + Sync {
    /// Tree depth of the compiled circuit, fixed for the backend's lifetime.
    ///
    /// Queried once at coordinator construction and cached.
    fn tree_depth(&self) -> usize;

    /// Generate a proof for an encoded witness.
    ///
    /// # Returns
    ///
    /// `Ok(Some(bytes))` with the JSON-encoded proof, or `Ok(None)` when the
    /// circuit rejected the witness (the native "null on failure").
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] only when the engine itself could not be
    /// driven: spawn failures, I/O, unreadable key material.
    fn prove(
        &self,
        proving_key: &Path,
        witness: &EncodedWitness,
    ) -> Result<Option<Vec<u8>>, BackendError>;

    /// Verify a JSON proof against a JSON verifying key.
    ///
    /// A cryptographically invalid proof is `Ok(false)`, never an error.
    fn verify(&self, verifying_key_json: &str, proof_json: &str) -> Result<bool, BackendError>;

    /// Human-readable backend name, for logs.
    fn name(&self) -> &str {
        "backend"
    }
}

impl<B: MixerBackend + ?Sized> MixerBackend for Arc<B> {
    fn tree_depth(&self) -> usize {
        (**self).tree_depth()
    }

    fn prove(
        &self,
        proving_key: &Path,
        witness: &EncodedWitness,
    ) -> Result<Option<Vec<u8>>, BackendError> {
        (**self).prove(proving_key, witness)
    }

    fn verify(&self, verifying_key_json: &str, proof_json: &str) -> Result<bool, BackendError> {
        (**self).verify(verifying_key_json, proof_json)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<B: MixerBackend + ?Sized> MixerBackend for Box<B> {
    fn tree_depth(&self) -> usize {
        (**self).tree_depth()
    }

    fn prove(
        &self,
        proving_key: &Path,
        witness: &EncodedWitness,
    ) -> Result<Option<Vec<u8>>, BackendError> {
        (**self).prove(proving_key, witness)
    }

    fn verify(&self, verifying_key_json: &str, proof_json: &str) -> Result<bool, BackendError> {
        (**self).verify(verifying_key_json, proof_json)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A type-erased, shareable backend handle.
pub type SharedBackend = Arc<dyn MixerBackend>;
