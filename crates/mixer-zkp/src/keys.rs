//! # Key Material
//!
//! ## Verifying Keys
//!
//! A verifying key may arrive in one of four shapes. They are modelled as one
//! tagged union, [`VerifyingKeySource`], and normalized exactly once, at
//! coordinator construction, into an immutable [`VerifyingKeyStore`]:
//!
//! 1. `Inline`: an already structured [`VerifyingKey`].
//! 2. `Mapping`: a JSON object.
//! 3. `FilePath`: a path to a JSON document.
//! 4. `RawJson`: JSON text.
//!
//! Untyped text is classified by [`VerifyingKeySource::probe`]: an existing
//! path wins over raw JSON, matching the fixed priority order above.
//!
//! ## Proving Keys
//!
//! A [`ProvingKeyRef`] is only a handle to key material the backend reads
//! itself. This layer checks that the file exists and never opens it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::ConfigError;
use crate::proof::{VerifyingKey, PUBLIC_INPUT_COUNT};

/// One of the accepted verifying-key shapes.
#[derive(Debug, Clone)]
pub enum VerifyingKeySource {
    /// An already structured key.
    Inline(VerifyingKey),
    /// A JSON object holding the key fields.
    Mapping(serde_json::Map<String, serde_json::Value>),
    /// A filesystem path to a JSON document.
    FilePath(PathBuf),
    /// JSON text.
    RawJson(String),
}

impl VerifyingKeySource {
    /// Classify untyped text: an existing filesystem path, else raw JSON.
    pub fn probe(text: impl Into<String>) -> Self {
        let text = text.into();
        if Path::new(&text).is_file() {
            Self::FilePath(PathBuf::from(text))
        } else {
            Self::RawJson(text)
        }
    }

    /// Short name of the shape, for logs.
    pub fn kind(&self) -> VerifyingKeyOrigin {
        match self {
            Self::Inline(_) => VerifyingKeyOrigin::Inline,
            Self::Mapping(_) => VerifyingKeyOrigin::Mapping,
            Self::FilePath(_) => VerifyingKeyOrigin::FilePath,
            Self::RawJson(_) => VerifyingKeyOrigin::RawJson,
        }
    }
}

impl From<VerifyingKey> for VerifyingKeySource {
    fn from(vk: VerifyingKey) -> Self {
        Self::Inline(vk)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for VerifyingKeySource {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::Mapping(map)
    }
}

impl From<PathBuf> for VerifyingKeySource {
    fn from(path: PathBuf) -> Self {
        Self::FilePath(path)
    }
}

impl From<&Path> for VerifyingKeySource {
    fn from(path: &Path) -> Self {
        Self::FilePath(path.to_path_buf())
    }
}

impl From<&str> for VerifyingKeySource {
    fn from(text: &str) -> Self {
        Self::probe(text)
    }
}

impl From<String> for VerifyingKeySource {
    fn from(text: String) -> Self {
        Self::probe(text)
    }
}

/// Which shape a stored verifying key was normalized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyingKeyOrigin {
    /// Supplied structured.
    Inline,
    /// Supplied as a JSON object.
    Mapping,
    /// Read from a file.
    FilePath,
    /// Parsed from JSON text.
    RawJson,
}

impl fmt::Display for VerifyingKeyOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inline => "inline",
            Self::Mapping => "mapping",
            Self::FilePath => "file_path",
            Self::RawJson => "raw_json",
        };
        f.write_str(name)
    }
}

/// The canonical verifying key, immutable for the coordinator's lifetime.
///
/// The JSON form sent to the backend is encoded once, here, and shared by
/// every verify call.
#[derive(Debug, Clone)]
pub struct VerifyingKeyStore {
    key: Arc<VerifyingKey>,
    json: Arc<str>,
    origin: VerifyingKeyOrigin,
}

impl VerifyingKeyStore {
    /// Normalize any accepted shape into the canonical key.
    pub fn load(source: impl Into<VerifyingKeySource>) -> Result<Self, ConfigError> {
        let source = source.into();
        let origin = source.kind();
        let key = match source {
            VerifyingKeySource::Inline(vk) => vk,
            VerifyingKeySource::Mapping(map) => {
                serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| {
                    ConfigError::VerifyingKey(format!("mapping is not a verifying key: {e}"))
                })?
            }
            VerifyingKeySource::FilePath(path) => {
                let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                codec::decode_verifying_key(&text).map_err(|e| {
                    ConfigError::VerifyingKey(format!(
                        "{} is not a verifying key document: {e}",
                        path.display()
                    ))
                })?
            }
            VerifyingKeySource::RawJson(text) => codec::decode_verifying_key(&text)
                .map_err(|e| {
                    ConfigError::VerifyingKey(format!(
                        "not an existing file and not verifying key JSON: {e}"
                    ))
                })?,
        };

        if key.gamma_abc.len() != PUBLIC_INPUT_COUNT + 1 {
            return Err(ConfigError::VerifyingKey(format!(
                "expected {} gammaABC points for {} public inputs, found {}",
                PUBLIC_INPUT_COUNT + 1,
                PUBLIC_INPUT_COUNT,
                key.gamma_abc.len()
            )));
        }

        let json = codec::encode_verifying_key(&key)
            .map_err(|e| ConfigError::VerifyingKey(format!("failed to encode: {e}")))?;

        Ok(Self {
            key: Arc::new(key),
            json: Arc::from(json),
            origin,
        })
    }

    /// The canonical key.
    pub fn key(&self) -> &VerifyingKey {
        &self.key
    }

    /// The key's JSON wire form.
    pub fn json(&self) -> &str {
        &self.json
    }

    /// Which shape the key was normalized from.
    pub fn origin(&self) -> VerifyingKeyOrigin {
        self.origin
    }
}

/// Handle to proving-key material, e.g. a `.pk.raw` file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvingKeyRef(PathBuf);

impl ProvingKeyRef {
    /// Wrap a path. Existence is not checked here.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// The referenced path.
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Fail with [`ConfigError::ProvingKeyNotFound`] unless the file exists.
    pub fn ensure_exists(&self) -> Result<(), ConfigError> {
        if self.0.is_file() {
            Ok(())
        } else {
            Err(ConfigError::ProvingKeyNotFound(self.0.clone()))
        }
    }
}

impl From<PathBuf> for ProvingKeyRef {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&Path> for ProvingKeyRef {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

impl From<&str> for ProvingKeyRef {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

impl fmt::Display for ProvingKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
