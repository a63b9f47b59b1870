//! # Coordinator Error Taxonomy
//!
//! Every failure surfaces synchronously to the immediate caller and falls in
//! exactly one category:
//!
//! | Category           | Raised when                                                    |
//! |--------------------|----------------------------------------------------------------|
//! | `configuration`    | no usable proving key, unusable verifying key, bad tree depth  |
//! | `validation`       | witness shape mismatch, before any backend call                |
//! | `proof_generation` | the backend returned no proof for a well-formed request        |
//! | `contract_type`    | `verify` was handed something that is not a canonical `Proof`  |
//! | `backend`          | the backend transport itself failed (spawn, I/O)               |
//!
//! An invalid proof is never an error: `verify` answers `Ok(false)`.
//! Nothing here is retried; proving is deterministic for identical input.

use std::path::PathBuf;
use std::time::Duration;

use mixer_core::ValidationError;
use thiserror::Error;

/// Top-level error returned by [`ProofCoordinator`](crate::ProofCoordinator).
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// Construction-time or key-resolution failure.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The witness does not match the circuit parameters.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The backend produced no usable proof for a structurally valid witness.
    #[error("proof generation failed: {0}")]
    ProofGeneration(String),

    /// `verify` was given a value that is not a canonical proof.
    #[error("contract type violation: {0}")]
    ContractType(String),

    /// The backend could not be reached or driven.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl CoordinatorError {
    /// Stable machine-readable category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::ProofGeneration(_) => "proof_generation",
            Self::ContractType(_) => "contract_type",
            Self::Backend(_) => "backend",
        }
    }
}

/// Configuration and key-material errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The backend reported a tree depth outside `0 < depth < 32`.
    #[error("backend tree depth {depth} is out of bounds (must satisfy 0 < depth < 32)")]
    TreeDepthOutOfBounds {
        /// The depth the backend reported.
        depth: usize,
    },

    /// None of the accepted verifying-key shapes produced a key.
    #[error("unusable verifying key: {0}")]
    VerifyingKey(String),

    /// A proving key reference points at nothing.
    #[error("proving key file does not exist: {}", .0.display())]
    ProvingKeyNotFound(PathBuf),

    /// No proving key was supplied for the call and no default is configured.
    #[error("no proving key: pass one per call or configure a default")]
    NoProvingKey,

    /// The configuration names no backend to connect to.
    #[error("no backend configured")]
    NoBackend,

    /// Pool sizing is unusable.
    #[error("invalid pool settings: {0}")]
    InvalidPool(String),

    /// The configuration document could not be parsed.
    #[error("invalid configuration document: {0}")]
    InvalidDocument(String),

    /// A configuration or key file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Failure of the backend transport (not of the proof).
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend program could not be started.
    #[error("failed to launch backend program {}: {source}", .program.display())]
    Spawn {
        /// Program that failed to launch.
        program: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Reading or writing backend files failed.
    #[error("backend io error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend's key material is unreadable.
    #[error("backend key material is unusable: {0}")]
    KeyMaterial(String),
}

/// Error converting between domain values and their JSON/wire forms.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The payload was empty.
    #[error("empty payload")]
    Empty,

    /// The payload was not UTF-8.
    #[error("payload is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    /// The payload was not the expected JSON shape.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A proof public input is not an integer.
    #[error("proof public input {index} is not an integer")]
    PublicInput {
        /// Position in the proof's `input` array.
        index: usize,
    },
}

/// Failure of a call routed through [`ProvingPool`](crate::ProvingPool).
#[derive(Error, Debug)]
pub enum PoolError {
    /// The coordinator itself failed.
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    /// The prove call outlived its deadline. The backend call keeps running
    /// detached and holds its slot until it returns.
    #[error("prove call exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),

    /// The pool was closed.
    #[error("worker pool is closed")]
    Closed,

    /// The worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    WorkerFailed(String),
}
