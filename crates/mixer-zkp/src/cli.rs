//! # Process Backend Adapter
//!
//! Drives the circuit's command-line prover through temporary files:
//!
//! ```text
//! <program> [args..] prove  <pk> <proof.json> <root> <wallet> <nullifier> <secret> <address> <path..>
//! <program> [args..] verify <vk.json> <proof.json>
//! ```
//!
//! `verify` exit status 0 means valid. A non-zero `prove` exit, or an empty
//! or missing proof file, is the prover's "no result".
//!
//! The command-line tool has no capability query, so its tree depth comes
//! from configuration. Witness arguments, the nullifier secret included,
//! are visible in the local process table for the duration of the call.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::backend::MixerBackend;
use crate::codec::EncodedWitness;
use crate::error::BackendError;

/// A [`MixerBackend`] backed by an external prover executable.
#[derive(Debug, Clone)]
pub struct CliBackend {
    program: PathBuf,
    args: Vec<String>,
    tree_depth: usize,
}

impl CliBackend {
    /// Backend running `program` for a circuit of `tree_depth` levels.
    pub fn new(program: impl Into<PathBuf>, tree_depth: usize) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            tree_depth,
        }
    }

    /// Leading arguments placed before the subcommand, e.g. an interpreter
    /// script.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// The prover executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, subcommand: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command.arg(subcommand);
        command.stdin(Stdio::null());
        command
    }

    fn run(&self, mut command: Command) -> Result<Output, BackendError> {
        command.output().map_err(|source| BackendError::Spawn {
            program: self.program.clone(),
            source,
        })
    }
}

impl MixerBackend for CliBackend {
    fn tree_depth(&self) -> usize {
        self.tree_depth
    }

    #[tracing::instrument(skip_all, fields(program = %self.program.display()))]
    fn prove(
        &self,
        proving_key: &Path,
        witness: &EncodedWitness,
    ) -> Result<Option<Vec<u8>>, BackendError> {
        let workdir = tempfile::tempdir()?;
        let proof_path = workdir.path().join("proof.json");

        let mut command = self.command("prove");
        command.arg(proving_key).arg(&proof_path);
        command.args(witness.scalar_args());
        command.arg(&witness.address_bits);
        command.args(&witness.path);

        let output = self.run(command)?;
        if !output.status.success() {
            tracing::warn!(status = %output.status, "prover exited unsuccessfully");
            return Ok(None);
        }

        match std::fs::read(&proof_path) {
            Ok(bytes) if !bytes.is_empty() => Ok(Some(bytes)),
            Ok(_) => {
                tracing::warn!("prover wrote an empty proof file");
                Ok(None)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("prover wrote no proof file");
                Ok(None)
            }
            Err(e) => Err(BackendError::Io(e)),
        }
    }

    #[tracing::instrument(skip_all, fields(program = %self.program.display()))]
    fn verify(&self, verifying_key_json: &str, proof_json: &str) -> Result<bool, BackendError> {
        let workdir = tempfile::tempdir()?;
        let vk_path = workdir.path().join("vk.json");
        let proof_path = workdir.path().join("proof.json");
        std::fs::write(&vk_path, verifying_key_json)?;
        std::fs::write(&proof_path, proof_json)?;

        let mut command = self.command("verify");
        command.arg(&vk_path).arg(&proof_path);
        let output = self.run(command)?;
        tracing::debug!(status = %output.status, "verifier finished");
        Ok(output.status.success())
    }

    fn name(&self) -> &str {
        "cli"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    const PROOF: &str = r#"{"A":["0x1","0x2"],"B":[["0x3","0x4"],["0x5","0x6"]],"C":["0x7","0x8"],"input":["0x9","0xa","0xb"]}"#;

    /// A stand-in prover run through `sh`. `prove` succeeds only when the
    /// secret (argument 7) is `42`; `verify` accepts proofs containing `"A"`.
    fn script(dir: &Path) -> PathBuf {
        let path = dir.join("prover.sh");
        let body = format!(
            r#"case "$1" in
  prove)
    out="$3"
    [ "$7" = "42" ] || exit 1
    shift 3
    echo "$@" > "$(dirname "$0")/args.txt"
    printf '%s' '{PROOF}' > "$out"
    ;;
  verify)
    grep -q '"A"' "$3"
    ;;
  *) exit 2 ;;
esac
"#
        );
        std::fs::write(&path, body).unwrap();
        path
    }

    fn backend(dir: &Path) -> CliBackend {
        CliBackend::new("sh", 2).with_args([script(dir).to_string_lossy().into_owned()])
    }

    fn witness(secret: &str) -> EncodedWitness {
        EncodedWitness {
            root: "1".into(),
            wallet_address: "2".into(),
            nullifier_hash: "3".into(),
            nullifier_secret: secret.into(),
            address_bits: "10".into(),
            path: vec!["5".into(), "6".into()],
        }
    }

    #[test]
    fn prove_passes_decimal_arguments_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path());
        let bytes = backend
            .prove(Path::new("/keys/mixer.pk.raw"), &witness("42"))
            .unwrap()
            .unwrap();
        assert_eq!(bytes, PROOF.as_bytes());

        let args = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
        assert_eq!(args.trim(), "1 2 3 42 10 5 6");
    }

    #[test]
    fn failed_prove_is_no_result() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path());
        assert_eq!(
            backend
                .prove(Path::new("/keys/mixer.pk.raw"), &witness("7"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn verify_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path());
        assert!(backend.verify("{}", PROOF).unwrap());
        assert!(!backend.verify("{}", "{}").unwrap());
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let backend = CliBackend::new("/definitely/not/a/prover", 20);
        match backend.verify("{}", "{}").unwrap_err() {
            BackendError::Spawn { program, .. } => {
                assert_eq!(program, PathBuf::from("/definitely/not/a/prover"))
            }
            other => panic!("expected Spawn, got: {other}"),
        }
        assert_eq!(backend.tree_depth(), 20);
        assert_eq!(backend.name(), "cli");
    }
}
