//! # Configured Coordinator and Pool
//!
//! A coordinator stood up from a YAML document on disk, driven through the
//! async proving pool.

use std::path::Path;
use std::sync::Arc;

use mixer_core::{AddressBits, FieldElement, TreeDepth, WithdrawalWitness};
use mixer_zkp::mock::{compute_root, hash_node, leaf_hash, nullifier_hash};
use mixer_zkp::{
    ConfigError, CoordinatorConfig, CoordinatorError, MixerBackend, MockMixerBackend, PoolError,
    ProofCoordinator, ProvingPool, RangeCheck, VerifyingKeyOrigin,
};

const DEPTH: usize = 8;

/// Write keys and a config document into `dir`, returning the config path.
fn write_deployment(dir: &Path) -> std::path::PathBuf {
    let vk = MockMixerBackend::new(DEPTH)
        .generate_keys("pool-circuit", &dir.join("mixer.pk.raw"))
        .unwrap();
    std::fs::write(
        dir.join("mixer.vk.json"),
        serde_json::to_string_pretty(&vk).unwrap(),
    )
    .unwrap();

    let config_path = dir.join("coordinator.yaml");
    std::fs::write(
        &config_path,
        format!(
            "verifying_key: mixer.vk.json\n\
             proving_key: mixer.pk.raw\n\
             field_range_check: enforce\n\
             pool:\n  max_concurrent_proofs: 2\n  prove_timeout_secs: 30\n\
             backend:\n  kind: mock\n  tree_depth: {DEPTH}\n"
        ),
    )
    .unwrap();
    config_path
}

/// A withdrawal of leaf `index` from a tree where it is the only deposit.
fn lone_withdrawal(index: u64, secret: u64) -> WithdrawalWitness {
    let secret = FieldElement::from_u64(secret);
    let wallet = FieldElement::from_u64(secret_wallet(index));
    let mut empty = FieldElement::zero();
    let mut path = Vec::with_capacity(DEPTH);
    for level in 0..DEPTH {
        path.push(empty.clone());
        empty = hash_node(level, &empty, &empty);
    }
    let bits = AddressBits::from_leaf_index(index, TreeDepth::new(DEPTH).unwrap()).unwrap();
    let root = compute_root(&leaf_hash(&secret, &wallet), &bits, &path).unwrap();
    WithdrawalWitness {
        root,
        wallet_address: wallet,
        nullifier_hash: nullifier_hash(&secret),
        nullifier_secret: secret,
        address_bits: bits,
        merkle_path: path,
    }
}

fn secret_wallet(index: u64) -> u64 {
    0xabc0 + index
}

#[test]
fn open_from_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoordinatorConfig::from_file(&write_deployment(dir.path())).unwrap();
    assert_eq!(config.field_range_check, RangeCheck::Enforce);

    let coordinator = ProofCoordinator::open(&config).unwrap();
    assert_eq!(coordinator.tree_depth().get(), DEPTH);
    assert_eq!(coordinator.backend().name(), "mock");
    assert_eq!(
        coordinator.verifying_key_store().origin(),
        VerifyingKeyOrigin::FilePath
    );
    assert_eq!(
        coordinator.default_proving_key().map(|pk| pk.path().to_path_buf()),
        Some(dir.path().join("mixer.pk.raw"))
    );

    let proof = coordinator.prove(&lone_withdrawal(5, 99), None).unwrap();
    assert!(coordinator.verify(&proof).unwrap());
}

#[test]
fn open_without_backend_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_deployment(dir.path());
    let mut config = CoordinatorConfig::from_file(&path).unwrap();
    config.backend = None;

    let err = ProofCoordinator::open(&config).unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::Configuration(ConfigError::NoBackend)
    ));
}

#[test]
fn config_with_missing_proving_key_fails_eagerly() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_deployment(dir.path());
    std::fs::remove_file(dir.path().join("mixer.pk.raw")).unwrap();

    let config = CoordinatorConfig::from_file(&path).unwrap();
    let err = ProofCoordinator::open(&config).unwrap_err();
    assert!(matches!(
        err,
        CoordinatorError::Configuration(ConfigError::ProvingKeyNotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_proves_concurrently_and_verifies() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoordinatorConfig::from_file(&write_deployment(dir.path())).unwrap();
    let coordinator = Arc::new(ProofCoordinator::open(&config).unwrap());
    let pool = ProvingPool::new(Arc::clone(&coordinator), &config.pool).unwrap();
    assert_eq!(pool.available_prove_slots(), 2);

    let tasks: Vec<_> = (0..8u64)
        .map(|index| {
            let pool = pool.clone();
            tokio::spawn(async move {
                let proof = pool.prove(lone_withdrawal(index, 1000 + index), None).await?;
                pool.verify(proof).await
            })
        })
        .collect();

    for task in tasks {
        let verified: Result<bool, PoolError> = task.await.unwrap();
        assert!(verified.unwrap());
    }
    assert_eq!(pool.available_prove_slots(), 2);
}

#[tokio::test]
async fn pool_surfaces_proof_generation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoordinatorConfig::from_file(&write_deployment(dir.path())).unwrap();
    let pool = ProvingPool::new(Arc::new(ProofCoordinator::open(&config).unwrap()), &config.pool)
        .unwrap();

    let mut witness = lone_withdrawal(2, 7);
    witness.nullifier_hash = FieldElement::from_u64(1);
    let err = pool.prove(witness, None).await.unwrap_err();
    match err {
        PoolError::Coordinator(e) => assert_eq!(e.category(), "proof_generation"),
        other => panic!("expected coordinator error, got: {other}"),
    }
}
