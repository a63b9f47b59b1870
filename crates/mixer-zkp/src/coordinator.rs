//! # Proof Coordinator
//!
//! The façade over a [`MixerBackend`]. Owns the backend handle and the
//! canonical verifying key, resolves a proving key per call, and runs
//! validate → encode → backend → decode.
//!
//! ## Lifecycle
//!
//! Everything the coordinator holds is fixed at construction: the backend,
//! its tree depth (queried once), the verifying key and the default proving
//! key. Per-call state lives on the stack, so `&self` methods are safe to
//! call concurrently whenever the backend is `Send + Sync`, which the trait
//! requires.

use std::fmt;

use mixer_core::{TreeDepth, WithdrawalWitness, WitnessDocument};

use crate::backend::{MixerBackend, SharedBackend};
use crate::codec::{self, EncodedWitness};
use crate::config::CoordinatorConfig;
use crate::error::{ConfigError, CoordinatorError};
use crate::keys::{ProvingKeyRef, VerifyingKeySource, VerifyingKeyStore};
use crate::proof::{Proof, VerifyingKey};
use crate::validate::{ParameterValidator, RangeCheck};

/// Orchestrates withdrawal proof generation and verification.
pub struct ProofCoordinator<B = SharedBackend> {
    backend: B,
    tree_depth: TreeDepth,
    verifying_key: VerifyingKeyStore,
    proving_key: Option<ProvingKeyRef>,
    validator: ParameterValidator,
}

impl<B: MixerBackend> fmt::Debug for ProofCoordinator<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofCoordinator")
            .field("backend", &self.backend.name())
            .field("tree_depth", &self.tree_depth)
            .field("verifying_key", &self.verifying_key.origin())
            .field("proving_key", &self.proving_key)
            .field("validator", &self.validator)
            .finish()
    }
}

impl<B: MixerBackend> ProofCoordinator<B> {
    /// Build a coordinator.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::Configuration`] when the backend's tree depth is
    /// outside `0 < depth < 32`, when the verifying key matches none of the
    /// accepted shapes, or when a default proving key is given but missing.
    pub fn new(
        backend: B,
        verifying_key: impl Into<VerifyingKeySource>,
        proving_key: Option<ProvingKeyRef>,
    ) -> Result<Self, CoordinatorError> {
        let depth = backend.tree_depth();
        let tree_depth = TreeDepth::new(depth)
            .map_err(|e| ConfigError::TreeDepthOutOfBounds { depth: e.0 })?;

        let verifying_key = VerifyingKeyStore::load(verifying_key)?;

        if let Some(pk) = &proving_key {
            pk.ensure_exists()?;
        }

        tracing::info!(
            backend = backend.name(),
            tree_depth = depth,
            vk_origin = %verifying_key.origin(),
            default_proving_key = proving_key.is_some(),
            "proof coordinator ready"
        );

        Ok(Self {
            backend,
            tree_depth,
            verifying_key,
            proving_key,
            validator: ParameterValidator::new(tree_depth),
        })
    }

    /// Build a coordinator from a configuration document and a backend.
    pub fn from_config(backend: B, config: &CoordinatorConfig) -> Result<Self, CoordinatorError> {
        let proving_key = config.proving_key.clone().map(ProvingKeyRef::from);
        Ok(Self::new(backend, config.verifying_key_source(), proving_key)?
            .with_range_check(config.field_range_check))
    }

    /// Replace the field-modulus range-check policy.
    pub fn with_range_check(mut self, range_check: RangeCheck) -> Self {
        self.validator = self.validator.with_range_check(range_check);
        self
    }

    /// The backend's tree depth, cached at construction.
    pub fn tree_depth(&self) -> TreeDepth {
        self.tree_depth
    }

    /// The canonical verifying key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.verifying_key.key()
    }

    /// The verifying key store, including its wire form.
    pub fn verifying_key_store(&self) -> &VerifyingKeyStore {
        &self.verifying_key
    }

    /// The default proving key, if one was configured.
    pub fn default_proving_key(&self) -> Option<&ProvingKeyRef> {
        self.proving_key.as_ref()
    }

    /// The validator prove calls run.
    pub fn validator(&self) -> &ParameterValidator {
        &self.validator
    }

    /// The backend handle.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Generate a proof for `witness`.
    ///
    /// `proving_key` overrides the default for this call only.
    ///
    /// # Errors
    ///
    /// - [`CoordinatorError::Configuration`]: no proving key resolves, or it
    ///   does not exist.
    /// - [`CoordinatorError::Validation`]: the witness shape is wrong. The
    ///   backend is not called.
    /// - [`CoordinatorError::ProofGeneration`]: the backend returned no proof.
    /// - [`CoordinatorError::Backend`]: the backend could not be driven.
    #[tracing::instrument(skip_all, fields(backend = self.backend.name(), depth = self.tree_depth.get()))]
    pub fn prove(
        &self,
        witness: &WithdrawalWitness,
        proving_key: Option<&ProvingKeyRef>,
    ) -> Result<Proof, CoordinatorError> {
        let proving_key = self.resolve_proving_key(proving_key)?;

        if let Err(e) = self.validator.validate(witness) {
            tracing::warn!(error = %e, "witness rejected");
            return Err(e.into());
        }

        self.prove_encoded(proving_key, &codec::encode_witness(witness))
    }

    /// Generate a proof from a JSON witness document.
    ///
    /// Scalars may be decimal strings or JSON integers; `address` may be a
    /// leaf index or a bit string. Structural rules apply in the same order
    /// as [`prove`](Self::prove).
    #[tracing::instrument(skip_all, fields(backend = self.backend.name(), depth = self.tree_depth.get()))]
    pub fn prove_json(
        &self,
        witness_json: &str,
        proving_key: Option<&ProvingKeyRef>,
    ) -> Result<Proof, CoordinatorError> {
        let proving_key = self.resolve_proving_key(proving_key)?;

        let witness = WitnessDocument::from_json(witness_json)
            .and_then(|doc| self.validator.validate_document(&doc))
            .map_err(|e| {
                tracing::warn!(error = %e, "witness document rejected");
                e
            })?;

        self.prove_encoded(proving_key, &codec::encode_witness(&witness))
    }

    /// Verify `proof` against the held verifying key.
    ///
    /// Returns the backend's answer unmodified: `Ok(false)` for a
    /// well-formed but invalid proof.
    #[tracing::instrument(skip_all, fields(backend = self.backend.name()))]
    pub fn verify(&self, proof: &Proof) -> Result<bool, CoordinatorError> {
        let proof_json = codec::encode_proof(proof)
            .map_err(|e| CoordinatorError::ContractType(format!("proof cannot be encoded: {e}")))?;
        let valid = self.backend.verify(self.verifying_key.json(), &proof_json)?;
        tracing::debug!(valid, "backend verification finished");
        Ok(valid)
    }

    /// Verify a proof supplied as JSON.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::ContractType`] when the text is not a canonical
    /// proof. The backend is not called.
    pub fn verify_json(&self, proof_json: &str) -> Result<bool, CoordinatorError> {
        let proof = codec::decode_proof(proof_json.as_bytes()).map_err(|e| {
            CoordinatorError::ContractType(format!("value is not a canonical proof: {e}"))
        })?;
        self.verify(&proof)
    }

    fn resolve_proving_key<'a>(
        &'a self,
        per_call: Option<&'a ProvingKeyRef>,
    ) -> Result<&'a ProvingKeyRef, ConfigError> {
        let proving_key = per_call
            .or(self.proving_key.as_ref())
            .ok_or(ConfigError::NoProvingKey)?;
        proving_key.ensure_exists()?;
        Ok(proving_key)
    }

    fn prove_encoded(
        &self,
        proving_key: &ProvingKeyRef,
        witness: &EncodedWitness,
    ) -> Result<Proof, CoordinatorError> {
        tracing::debug!(proving_key = %proving_key, "invoking backend prover");
        let Some(payload) = self.backend.prove(proving_key.path(), witness)? else {
            tracing::warn!("backend returned no proof");
            return Err(CoordinatorError::ProofGeneration(
                "backend returned no proof for a structurally valid witness".into(),
            ));
        };

        let proof = codec::decode_proof(&payload).map_err(|e| {
            tracing::warn!(error = %e, "backend proof payload is unusable");
            CoordinatorError::ProofGeneration(format!("backend proof payload is unusable: {e}"))
        })?;
        tracing::debug!(public_inputs = proof.input.len(), "proof decoded");
        Ok(proof)
    }
}

impl ProofCoordinator<SharedBackend> {
    /// Connect the configured backend and build a coordinator over it.
    pub fn open(config: &CoordinatorConfig) -> Result<Self, CoordinatorError> {
        let backend = config
            .backend
            .as_ref()
            .ok_or(ConfigError::NoBackend)?
            .connect()?;
        Self::from_config(backend, config)
    }
}
