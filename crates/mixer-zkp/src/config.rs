//! # Coordinator Configuration
//!
//! A [`CoordinatorConfig`] document describes everything needed to stand a
//! coordinator up: the verifying key, an optional default proving key, the
//! range-check policy, pool sizing and which backend to connect.
//!
//! ```yaml
//! verifying_key: keys/mixer.vk.json     # path, raw JSON, or inline mapping
//! proving_key: keys/mixer.pk.raw
//! field_range_check: enforce            # or: defer
//! pool:
//!   max_concurrent_proofs: 2
//!   prove_timeout_secs: 120
//! backend:
//!   kind: cli
//!   program: /usr/local/bin/mixer
//!   tree_depth: 29
//! ```
//!
//! Documents loaded with [`CoordinatorConfig::from_file`] resolve relative
//! key paths against the document's directory.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mixer_core::TreeDepth;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::backend::{MixerBackend, SharedBackend};
use crate::cli::CliBackend;
use crate::error::ConfigError;
use crate::keys::VerifyingKeySource;
use crate::validate::RangeCheck;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Verifying key as written in a configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerifyingKeySetting {
    /// A filesystem path or raw JSON text, probed in that order.
    Text(String),
    /// The key fields inline.
    Mapping(serde_json::Map<String, serde_json::Value>),
}

/// Top-level coordinator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// The circuit's verifying key.
    pub verifying_key: VerifyingKeySetting,
    /// Default proving key file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proving_key: Option<PathBuf>,
    /// Field-modulus range-check policy for witness scalars.
    #[serde(default)]
    pub field_range_check: RangeCheck,
    /// Worker pool sizing.
    #[serde(default)]
    pub pool: PoolSettings,
    /// Backend to connect. Required by [`ProofCoordinator::open`](crate::ProofCoordinator::open).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendSettings>,
}

impl CoordinatorConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| ConfigError::InvalidDocument(format!("invalid YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| ConfigError::InvalidDocument(format!("invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a document from disk. `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let mut config = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        tracing::debug!(path = %path.display(), "loaded coordinator configuration");
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool.validate()
    }

    /// The verifying key as a source for [`VerifyingKeyStore`](crate::VerifyingKeyStore).
    pub fn verifying_key_source(&self) -> VerifyingKeySource {
        match &self.verifying_key {
            VerifyingKeySetting::Text(text) => VerifyingKeySource::probe(text.as_str()),
            VerifyingKeySetting::Mapping(map) => VerifyingKeySource::Mapping(map.clone()),
        }
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        if let Some(pk) = &self.proving_key {
            if pk.is_relative() {
                self.proving_key = Some(base.join(pk));
            }
        }
        if let VerifyingKeySetting::Text(text) = &self.verifying_key {
            let candidate = base.join(text);
            if Path::new(text).is_relative() && candidate.is_file() {
                self.verifying_key = VerifyingKeySetting::Text(candidate.display().to_string());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// Bounds on concurrent backend work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolSettings {
    /// Concurrent prove calls. Defaults to the available parallelism.
    #[serde(default = "default_max_concurrent_proofs")]
    pub max_concurrent_proofs: usize,
    /// Concurrent verify calls. Defaults to four per prove slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_verifications: Option<usize>,
    /// Deadline for a single prove call, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prove_timeout_secs: Option<u64>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_concurrent_proofs: default_max_concurrent_proofs(),
            max_concurrent_verifications: None,
            prove_timeout_secs: None,
        }
    }
}

impl PoolSettings {
    /// Effective verification concurrency, never above
    /// [`Semaphore::MAX_PERMITS`].
    pub fn verification_limit(&self) -> usize {
        self.max_concurrent_verifications
            .unwrap_or_else(|| self.max_concurrent_proofs.saturating_mul(4))
            .min(Semaphore::MAX_PERMITS)
    }

    /// Effective prove deadline.
    pub fn prove_timeout(&self) -> Option<Duration> {
        self.prove_timeout_secs.map(Duration::from_secs)
    }

    /// Reject zero-sized or oversized pools and zero deadlines.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_limit("max_concurrent_proofs", self.max_concurrent_proofs)?;
        if let Some(limit) = self.max_concurrent_verifications {
            check_limit("max_concurrent_verifications", limit)?;
        }
        if self.prove_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidPool(
                "prove_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn check_limit(name: &str, limit: usize) -> Result<(), ConfigError> {
    if limit == 0 {
        return Err(ConfigError::InvalidPool(format!("{name} must be at least 1")));
    }
    if limit > Semaphore::MAX_PERMITS {
        return Err(ConfigError::InvalidPool(format!(
            "{name} must be at most {}",
            Semaphore::MAX_PERMITS
        )));
    }
    Ok(())
}

fn default_max_concurrent_proofs() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Which backend to connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendSettings {
    /// The circuit's command-line prover.
    Cli {
        /// Prover executable.
        program: PathBuf,
        /// Arguments placed before the subcommand.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        /// Depth the prover was compiled for.
        tree_depth: usize,
    },
    /// The deterministic mock backend. **NOT PRIVATE.**
    #[cfg(feature = "mock")]
    Mock {
        /// Depth to report.
        tree_depth: usize,
    },
}

impl BackendSettings {
    /// The depth the settings declare.
    pub fn tree_depth(&self) -> usize {
        match self {
            Self::Cli { tree_depth, .. } => *tree_depth,
            #[cfg(feature = "mock")]
            Self::Mock { tree_depth } => *tree_depth,
        }
    }

    /// Construct the backend.
    pub fn connect(&self) -> Result<SharedBackend, ConfigError> {
        let depth = self.tree_depth();
        TreeDepth::new(depth).map_err(|e| ConfigError::TreeDepthOutOfBounds { depth: e.0 })?;

        let backend: SharedBackend = match self {
            Self::Cli { program, args, tree_depth } => {
                Arc::new(CliBackend::new(program.clone(), *tree_depth).with_args(args.clone()))
            }
            #[cfg(feature = "mock")]
            Self::Mock { tree_depth } => Arc::new(crate::mock::MockMixerBackend::new(*tree_depth)),
        };
        tracing::debug!(backend = backend.name(), tree_depth = depth, "backend connected");
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VK: &str = r#"{"alpha":["1","2"],"beta":[["1","2"],["3","4"]],"gamma":[["1","2"],["3","4"]],"delta":[["1","2"],["3","4"]],"gammaABC":[["1","2"],["3","4"],["5","6"],["7","8"]]}"#;

    #[test]
    fn minimal_document_uses_defaults() {
        let config = CoordinatorConfig::from_yaml_str("verifying_key: keys/mixer.vk.json\n").unwrap();
        assert_eq!(
            config.verifying_key,
            VerifyingKeySetting::Text("keys/mixer.vk.json".into())
        );
        assert_eq!(config.proving_key, None);
        assert_eq!(config.field_range_check, RangeCheck::Enforce);
        assert!(config.pool.max_concurrent_proofs >= 1);
        assert_eq!(
            config.pool.verification_limit(),
            config.pool.max_concurrent_proofs * 4
        );
        assert_eq!(config.pool.prove_timeout(), None);
        assert!(config.backend.is_none());
    }

    #[test]
    fn full_yaml_document() {
        let yaml = r#"
verifying_key: /keys/mixer.vk.json
proving_key: /keys/mixer.pk.raw
field_range_check: defer
pool:
  max_concurrent_proofs: 2
  max_concurrent_verifications: 3
  prove_timeout_secs: 90
backend:
  kind: cli
  program: /usr/local/bin/mixer
  tree_depth: 29
"#;
        let config = CoordinatorConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.proving_key, Some(PathBuf::from("/keys/mixer.pk.raw")));
        assert_eq!(config.field_range_check, RangeCheck::Defer);
        assert_eq!(config.pool.verification_limit(), 3);
        assert_eq!(config.pool.prove_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(
            config.backend,
            Some(BackendSettings::Cli {
                program: PathBuf::from("/usr/local/bin/mixer"),
                args: Vec::new(),
                tree_depth: 29,
            })
        );
    }

    #[test]
    fn inline_mapping_verifying_key_in_json() {
        let json = format!(r#"{{"verifying_key": {VK}}}"#);
        let config = CoordinatorConfig::from_json_str(&json).unwrap();
        assert!(matches!(
            config.verifying_key_source(),
            VerifyingKeySource::Mapping(_)
        ));
        assert!(crate::VerifyingKeyStore::load(config.verifying_key_source()).is_ok());
    }

    #[test]
    fn unknown_fields_and_bad_pools_are_rejected() {
        let err = CoordinatorConfig::from_yaml_str("verifying_key: x\nprover: y\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDocument(_)));

        let err = CoordinatorConfig::from_yaml_str(
            "verifying_key: x\npool:\n  max_concurrent_proofs: 0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPool(_)));

        let err = CoordinatorConfig::from_yaml_str(
            "verifying_key: x\npool:\n  prove_timeout_secs: 0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPool(_)));
    }

    #[test]
    fn oversized_pools_are_rejected() {
        let err = CoordinatorConfig::from_yaml_str(
            "verifying_key: x\npool:\n  max_concurrent_proofs: 18446744073709551615\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPool(_)));

        let err = CoordinatorConfig::from_yaml_str(&format!(
            "verifying_key: x\npool:\n  max_concurrent_proofs: 1\n  max_concurrent_verifications: {}\n",
            Semaphore::MAX_PERMITS + 1
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPool(_)));

        let at_limit = PoolSettings {
            max_concurrent_proofs: Semaphore::MAX_PERMITS,
            max_concurrent_verifications: None,
            prove_timeout_secs: None,
        };
        assert!(at_limit.validate().is_ok());
        assert_eq!(at_limit.verification_limit(), Semaphore::MAX_PERMITS);
    }

    #[test]
    fn connect_checks_declared_depth() {
        let settings = BackendSettings::Cli {
            program: PathBuf::from("mixer"),
            args: Vec::new(),
            tree_depth: 32,
        };
        assert!(matches!(
            settings.connect(),
            Err(ConfigError::TreeDepthOutOfBounds { depth: 32 })
        ));

        let settings = BackendSettings::Cli {
            program: PathBuf::from("mixer"),
            args: Vec::new(),
            tree_depth: 20,
        };
        let backend = settings.connect().unwrap();
        assert_eq!(backend.tree_depth(), 20);
        assert_eq!(backend.name(), "cli");
    }

    #[test]
    fn file_paths_resolve_against_document_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mixer.vk.json"), VK).unwrap();

        let config_path = dir.path().join("coordinator.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "verifying_key: mixer.vk.json").unwrap();
        writeln!(file, "proving_key: mixer.pk.raw").unwrap();
        drop(file);

        let config = CoordinatorConfig::from_file(&config_path).unwrap();
        assert_eq!(config.proving_key, Some(dir.path().join("mixer.pk.raw")));
        assert!(matches!(
            config.verifying_key_source(),
            VerifyingKeySource::FilePath(path) if path == dir.path().join("mixer.vk.json")
        ));
    }

    #[test]
    fn json_extension_selects_json_parser() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coordinator.json");
        std::fs::write(&path, format!(r#"{{"verifying_key": {VK}}}"#)).unwrap();
        assert!(CoordinatorConfig::from_file(&path).is_ok());

        let missing = dir.path().join("absent.yaml");
        assert!(matches!(
            CoordinatorConfig::from_file(&missing),
            Err(ConfigError::Io { .. })
        ));
    }

    #[cfg(feature = "mock")]
    #[test]
    fn mock_backend_settings() {
        let config = CoordinatorConfig::from_yaml_str(
            "verifying_key: x\nbackend:\n  kind: mock\n  tree_depth: 8\n",
        )
        .unwrap();
        let backend = config.backend.unwrap().connect().unwrap();
        assert_eq!(backend.name(), "mock");
        assert_eq!(backend.tree_depth(), 8);
    }
}
