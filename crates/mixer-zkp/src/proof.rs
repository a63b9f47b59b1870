//! # Proof and Key Shapes
//!
//! Groth16-style proof and verifying-key objects in the JSON layout the
//! circuit toolchain emits:
//!
//! ```text
//! Proof         {"A": [x, y], "B": [[x0, x1], [y0, y1]], "C": [x, y], "input": [..]}
//! VerifyingKey  {"alpha": G1, "beta": G2, "gamma": G2, "delta": G2, "gammaABC": [G1, ..]}
//! ```
//!
//! Curve coordinates are opaque strings. This layer never interprets them;
//! it only carries them between the backend and the caller unchanged. Keys a
//! backend adds beyond these are carried along the same way.

use mixer_core::FieldElement;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Number of public inputs the withdrawal circuit declares:
/// `root`, `wallet_address`, `nullifier_hash`.
pub const PUBLIC_INPUT_COUNT: usize = 3;

/// A point on G1 as `[x, y]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct G1Point(pub [String; 2]);

/// A point on G2 as `[[x0, x1], [y0, y1]]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct G2Point(pub [[String; 2]; 2]);

/// A backend-produced withdrawal proof. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Proof element A.
    #[serde(rename = "A")]
    pub a: G1Point,
    /// Proof element B.
    #[serde(rename = "B")]
    pub b: G2Point,
    /// Proof element C.
    #[serde(rename = "C")]
    pub c: G1Point,
    /// Public inputs the proof was generated against.
    pub input: Vec<String>,
    /// Any further keys the backend emitted, passed back to it on verify.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Proof {
    /// The public inputs as field elements. Backends may emit them as
    /// `0x`-prefixed hex or as decimal.
    pub fn public_inputs(&self) -> Result<Vec<FieldElement>, CodecError> {
        self.input
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                FieldElement::from_prefixed(raw).map_err(|_| CodecError::PublicInput { index })
            })
            .collect()
    }
}

/// Circuit-specific public verification parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerifyingKey {
    /// `[alpha]_1`.
    pub alpha: G1Point,
    /// `[beta]_2`.
    pub beta: G2Point,
    /// `[gamma]_2`.
    pub gamma: G2Point,
    /// `[delta]_2`.
    pub delta: G2Point,
    /// Input commitment bases, one more than the public input count.
    #[serde(rename = "gammaABC")]
    pub gamma_abc: Vec<G1Point>,
}

impl VerifyingKey {
    /// Number of public inputs this key verifies.
    pub fn public_input_count(&self) -> usize {
        self.gamma_abc.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn g1(x: &str, y: &str) -> G1Point {
        G1Point([x.to_string(), y.to_string()])
    }

    #[test]
    fn proof_json_layout() {
        let proof = Proof {
            a: g1("0x1", "0x2"),
            b: G2Point([
                ["0x3".to_string(), "0x4".to_string()],
                ["0x5".to_string(), "0x6".to_string()],
            ]),
            c: g1("0x7", "0x8"),
            input: vec!["0x9".to_string()],
            extra: serde_json::Map::new(),
        };
        let value = serde_json::to_value(&proof).unwrap();
        assert_eq!(
            value,
            json!({
                "A": ["0x1", "0x2"],
                "B": [["0x3", "0x4"], ["0x5", "0x6"]],
                "C": ["0x7", "0x8"],
                "input": ["0x9"]
            })
        );
    }

    #[test]
    fn backend_specific_keys_survive_a_round_trip() {
        let text = r#"{"A":["1","2"],"B":[["3","4"],["5","6"]],"C":["7","8"],"input":["9"],"protocol":"groth16","curve":"bn128"}"#;
        let proof: Proof = serde_json::from_str(text).unwrap();
        assert_eq!(proof.extra.get("protocol"), Some(&json!("groth16")));
        assert_eq!(proof.extra.len(), 2);

        let value = serde_json::to_value(&proof).unwrap();
        assert_eq!(value["curve"], json!("bn128"));
        assert_eq!(value["A"], json!(["1", "2"]));
        assert_eq!(serde_json::from_value::<Proof>(value).unwrap(), proof);
    }

    #[test]
    fn public_inputs_accept_hex_and_decimal() {
        let proof = Proof {
            a: g1("0", "0"),
            b: G2Point([
                ["0".to_string(), "0".to_string()],
                ["0".to_string(), "0".to_string()],
            ]),
            c: g1("0", "0"),
            input: vec!["0x10".to_string(), "16".to_string()],
            extra: serde_json::Map::new(),
        };
        let inputs = proof.public_inputs().unwrap();
        assert_eq!(inputs, vec![FieldElement::from_u64(16); 2]);
    }

    #[test]
    fn public_inputs_report_bad_index() {
        let proof = Proof {
            a: g1("0", "0"),
            b: G2Point([
                ["0".to_string(), "0".to_string()],
                ["0".to_string(), "0".to_string()],
            ]),
            c: g1("0", "0"),
            input: vec!["1".to_string(), "one".to_string()],
            extra: serde_json::Map::new(),
        };
        match proof.public_inputs().unwrap_err() {
            CodecError::PublicInput { index } => assert_eq!(index, 1),
            other => panic!("expected PublicInput, got: {other}"),
        }
    }

    #[test]
    fn verifying_key_uses_gamma_abc_name() {
        let vk: VerifyingKey = serde_json::from_value(json!({
            "alpha": ["1", "2"],
            "beta": [["1", "2"], ["3", "4"]],
            "gamma": [["1", "2"], ["3", "4"]],
            "delta": [["1", "2"], ["3", "4"]],
            "gammaABC": [["1", "2"], ["3", "4"], ["5", "6"], ["7", "8"]]
        }))
        .unwrap();
        assert_eq!(vk.public_input_count(), PUBLIC_INPUT_COUNT);
    }
}
