//! # Bounded Proving Pool
//!
//! Async front for a shared [`ProofCoordinator`]. Proving is CPU- and
//! memory-heavy and blocks for seconds, so each call runs on tokio's blocking
//! pool behind a semaphore sized to the host. Verification is cheaper and
//! gets its own, wider semaphore.
//!
//! ## Deadlines
//!
//! The backend offers no cancellation hook. When a prove call outlives the
//! configured deadline the caller gets [`PoolError::DeadlineExceeded`] and
//! the in-flight call is detached: it keeps its permit until the backend
//! returns, so the pool never oversubscribes the host. The deadline starts
//! once a permit is held; queueing time is not counted.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mixer_core::WithdrawalWitness;
use tokio::sync::Semaphore;

use crate::backend::{MixerBackend, SharedBackend};
use crate::config::PoolSettings;
use crate::coordinator::ProofCoordinator;
use crate::error::{ConfigError, PoolError};
use crate::keys::ProvingKeyRef;
use crate::proof::Proof;

/// Concurrency-bounded async access to a [`ProofCoordinator`].
pub struct ProvingPool<B = SharedBackend> {
    coordinator: Arc<ProofCoordinator<B>>,
    prove_permits: Arc<Semaphore>,
    verify_permits: Arc<Semaphore>,
    prove_timeout: Option<Duration>,
}

impl<B> Clone for ProvingPool<B> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
            prove_permits: Arc::clone(&self.prove_permits),
            verify_permits: Arc::clone(&self.verify_permits),
            prove_timeout: self.prove_timeout,
        }
    }
}

impl<B: MixerBackend> fmt::Debug for ProvingPool<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvingPool")
            .field("coordinator", &self.coordinator)
            .field("available_prove_slots", &self.prove_permits.available_permits())
            .field("available_verify_slots", &self.verify_permits.available_permits())
            .field("prove_timeout", &self.prove_timeout)
            .finish()
    }
}

impl<B: MixerBackend + 'static> ProvingPool<B> {
    /// Wrap `coordinator` with the limits in `settings`.
    pub fn new(
        coordinator: Arc<ProofCoordinator<B>>,
        settings: &PoolSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        tracing::info!(
            max_concurrent_proofs = settings.max_concurrent_proofs,
            max_concurrent_verifications = settings.verification_limit(),
            prove_timeout_secs = ?settings.prove_timeout_secs,
            "proving pool ready"
        );
        Ok(Self {
            coordinator,
            prove_permits: Arc::new(Semaphore::new(settings.max_concurrent_proofs)),
            verify_permits: Arc::new(Semaphore::new(settings.verification_limit())),
            prove_timeout: settings.prove_timeout(),
        })
    }

    /// The shared coordinator.
    pub fn coordinator(&self) -> &Arc<ProofCoordinator<B>> {
        &self.coordinator
    }

    /// Prove slots not currently held.
    pub fn available_prove_slots(&self) -> usize {
        self.prove_permits.available_permits()
    }

    /// Verify slots not currently held.
    pub fn available_verify_slots(&self) -> usize {
        self.verify_permits.available_permits()
    }

    /// Stop admitting new work. Calls already holding a slot finish.
    pub fn close(&self) {
        self.prove_permits.close();
        self.verify_permits.close();
    }

    /// Run [`ProofCoordinator::prove`] on the blocking pool.
    pub async fn prove(
        &self,
        witness: WithdrawalWitness,
        proving_key: Option<ProvingKeyRef>,
    ) -> Result<Proof, PoolError> {
        let permit = Arc::clone(&self.prove_permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        let coordinator = Arc::clone(&self.coordinator);
        let job = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            coordinator.prove(&witness, proving_key.as_ref())
        });

        let joined = match self.prove_timeout {
            Some(limit) => match tokio::time::timeout(limit, job).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = limit.as_millis() as u64,
                        "prove call exceeded deadline, detaching"
                    );
                    return Err(PoolError::DeadlineExceeded(limit));
                }
            },
            None => job.await,
        };
        let result = joined.map_err(|e| PoolError::WorkerFailed(e.to_string()))?;
        Ok(result?)
    }

    /// Run [`ProofCoordinator::verify`] on the blocking pool.
    pub async fn verify(&self, proof: Proof) -> Result<bool, PoolError> {
        let permit = Arc::clone(&self.verify_permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        let coordinator = Arc::clone(&self.coordinator);
        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            coordinator.verify(&proof)
        })
        .await
        .map_err(|e| PoolError::WorkerFailed(e.to_string()))?;
        Ok(result?)
    }
}
