//! # Field Elements
//!
//! A `FieldElement` is an unbounded non-negative integer that is meant to be
//! interpreted modulo the BN254 scalar field. Construction never reduces it;
//! out-of-range values survive intact until the validator applies its
//! range policy.
//!
//! ## Text Forms
//!
//! - Decimal (`"1234"`) is the only form accepted from callers and the only
//!   form ever emitted towards a backend.
//! - Hexadecimal (`"0x04d2"`) is accepted only through
//!   [`FieldElement::from_prefixed`], for reading values a backend produced.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use num_bigint::BigUint;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FieldError;

/// Decimal representation of the BN254 scalar field modulus `r`.
pub const SNARK_SCALAR_FIELD: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// Width of a field element in big-endian byte form.
pub const FIELD_ELEMENT_BYTES: usize = 32;

/// `r` as little-endian 32-bit limbs (`0x30644e72...f0000001`).
const MODULUS_LIMBS: [u32; 8] = [
    0xf000_0001,
    0x43e1_f593,
    0x79b9_7091,
    0x2833_e848,
    0x8181_585d,
    0xb850_45b6,
    0xe131_a029,
    0x3064_4e72,
];

fn modulus() -> &'static BigUint {
    static MODULUS: OnceLock<BigUint> = OnceLock::new();
    MODULUS.get_or_init(|| BigUint::from_slice(&MODULUS_LIMBS))
}

/// An integer destined to be used as a scalar field element.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(BigUint);

impl FieldElement {
    /// The additive identity.
    pub fn zero() -> Self {
        Self(BigUint::from(0u8))
    }

    /// Build from a machine integer.
    pub fn from_u64(value: u64) -> Self {
        Self(BigUint::from(value))
    }

    /// Wrap an arbitrary-precision integer without reducing it.
    pub fn from_biguint(value: BigUint) -> Self {
        Self(value)
    }

    /// Interpret big-endian bytes as an integer and reduce it modulo `r`.
    pub fn from_be_bytes_mod_order(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes) % modulus())
    }

    /// Parse a base-10 integer. Only ASCII digits are accepted: no sign,
    /// no separators, no whitespace, no radix prefix.
    pub fn from_decimal(text: &str) -> Result<Self, FieldError> {
        parse_radix(text, 10)
    }

    /// Parse either a `0x`-prefixed hexadecimal or a base-10 integer.
    pub fn from_prefixed(text: &str) -> Result<Self, FieldError> {
        match text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
        {
            Some(hex) => parse_radix(hex, 16),
            None => parse_radix(text, 10),
        }
    }

    /// Parse a JSON scalar: a decimal string or a non-negative JSON integer.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, FieldError> {
        match value {
            serde_json::Value::String(s) => Self::from_decimal(s),
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(Self::from_u64)
                .ok_or(FieldError::UnsupportedJson("a negative or fractional number")),
            serde_json::Value::Null => Err(FieldError::UnsupportedJson("null")),
            serde_json::Value::Bool(_) => Err(FieldError::UnsupportedJson("a boolean")),
            serde_json::Value::Array(_) => Err(FieldError::UnsupportedJson("an array")),
            serde_json::Value::Object(_) => Err(FieldError::UnsupportedJson("an object")),
        }
    }

    /// Parse a JSON scalar from its source text, so integers wider than
    /// 64 bits keep every digit. A bare number must be a plain base-10
    /// integer; anything else is classified by [`from_json`](Self::from_json).
    pub fn from_json_text(text: &str) -> Result<Self, FieldError> {
        let text = text.trim();
        if text.starts_with(|c: char| c.is_ascii_digit()) {
            return Self::from_decimal(text)
                .map_err(|_| FieldError::UnsupportedJson("a fractional or exponent number"));
        }
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|_| FieldError::UnsupportedJson("malformed JSON"))?;
        Self::from_json(&value)
    }

    /// Access the underlying integer.
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// The BN254 scalar field modulus.
    pub fn modulus() -> &'static BigUint {
        modulus()
    }

    /// Whether the value is strictly below the field modulus.
    pub fn is_canonical(&self) -> bool {
        &self.0 < modulus()
    }

    /// Canonical base-10 form (no leading zeros, `"0"` for zero).
    pub fn to_decimal(&self) -> String {
        self.0.to_str_radix(10)
    }

    /// Lowercase `0x`-prefixed hexadecimal form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", self.0.to_str_radix(16))
    }

    /// Fixed-width big-endian bytes, or `None` if the value needs more
    /// than [`FIELD_ELEMENT_BYTES`] bytes.
    pub fn to_be_bytes(&self) -> Option<[u8; FIELD_ELEMENT_BYTES]> {
        let raw = self.0.to_bytes_be();
        if raw.len() > FIELD_ELEMENT_BYTES {
            return None;
        }
        let mut out = [0u8; FIELD_ELEMENT_BYTES];
        out[FIELD_ELEMENT_BYTES - raw.len()..].copy_from_slice(&raw);
        Some(out)
    }
}

fn parse_radix(text: &str, radix: u32) -> Result<FieldElement, FieldError> {
    if text.is_empty() {
        return Err(FieldError::Empty);
    }
    // BigUint's own parser tolerates `_` separators and a leading `+`.
    if !text.chars().all(|c| c.is_digit(radix)) {
        return Err(FieldError::NotAnInteger {
            input: text.chars().take(32).collect(),
            radix,
        });
    }
    BigUint::parse_bytes(text.as_bytes(), radix)
        .map(FieldElement)
        .ok_or_else(|| FieldError::NotAnInteger {
            input: text.chars().take(32).collect(),
            radix,
        })
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.0)
    }
}

impl FromStr for FieldElement {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal(s)
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<BigUint> for FieldElement {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldElementVisitor)
    }
}

struct FieldElementVisitor;

impl<'de> Visitor<'de> for FieldElementVisitor {
    type Value = FieldElement;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or a non-negative integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        FieldElement::from_decimal(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(FieldElement::from_u64(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(FieldElement::from_u64)
            .map_err(|_| E::custom("field element must not be negative"))
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> Result<Self::Value, E> {
        Err(E::custom("field element must be an integer"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decimal_round_trip_is_canonical() {
        let fe = FieldElement::from_decimal("00042").unwrap();
        assert_eq!(fe.to_decimal(), "42");
        assert_eq!(fe.to_string(), "42");
        assert_eq!(FieldElement::zero().to_decimal(), "0");
    }

    #[test]
    fn decimal_rejects_non_digits() {
        for bad in ["", "+1", "-1", "1_000", " 1", "1.5", "0x10", "1e3", "abc"] {
            assert!(FieldElement::from_decimal(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn prefixed_accepts_hex_and_decimal() {
        assert_eq!(
            FieldElement::from_prefixed("0x1f").unwrap(),
            FieldElement::from_u64(31)
        );
        assert_eq!(
            FieldElement::from_prefixed("31").unwrap(),
            FieldElement::from_u64(31)
        );
        assert!(FieldElement::from_prefixed("0x").is_err());
        assert!(FieldElement::from_prefixed("0xzz").is_err());
    }

    #[test]
    fn modulus_limbs_match_decimal_constant() {
        assert_eq!(FieldElement::modulus().to_str_radix(10), SNARK_SCALAR_FIELD);
    }

    #[test]
    fn modulus_is_not_canonical() {
        let r = FieldElement::from_decimal(SNARK_SCALAR_FIELD).unwrap();
        assert!(!r.is_canonical());
        let below = FieldElement::from_biguint(FieldElement::modulus().clone() - 1u32);
        assert!(below.is_canonical());
    }

    #[test]
    fn reduction_lands_in_field() {
        let fe = FieldElement::from_be_bytes_mod_order(&[0xff; 32]);
        assert!(fe.is_canonical());
    }

    #[test]
    fn be_bytes_are_left_padded() {
        let bytes = FieldElement::from_u64(0x0102).to_be_bytes().unwrap();
        assert_eq!(bytes[30], 0x01);
        assert_eq!(bytes[31], 0x02);
        assert!(bytes[..30].iter().all(|b| *b == 0));

        let huge = FieldElement::from_biguint(BigUint::from(1u8) << 256usize);
        assert!(huge.to_be_bytes().is_none());
    }

    #[test]
    fn json_scalars() {
        assert_eq!(
            FieldElement::from_json(&json!("7")).unwrap(),
            FieldElement::from_u64(7)
        );
        assert_eq!(
            FieldElement::from_json(&json!(7)).unwrap(),
            FieldElement::from_u64(7)
        );
        assert!(FieldElement::from_json(&json!(1.5)).is_err());
        assert!(FieldElement::from_json(&json!(-3)).is_err());
        assert!(FieldElement::from_json(&json!(null)).is_err());
        assert!(FieldElement::from_json(&json!([1])).is_err());
    }

    #[test]
    fn json_text_keeps_wide_integers_exact() {
        let wide = "123456789012345678901234567890";
        assert_eq!(
            FieldElement::from_json_text(wide).unwrap().to_decimal(),
            wide
        );
        assert_eq!(
            FieldElement::from_json_text("18446744073709551616").unwrap(),
            FieldElement::from_biguint(BigUint::from(1u8) << 64usize)
        );
        let modulus_minus_one = FieldElement::from_biguint(FieldElement::modulus().clone() - 1u32);
        assert_eq!(
            FieldElement::from_json_text(&modulus_minus_one.to_decimal()).unwrap(),
            modulus_minus_one
        );
        assert_eq!(
            FieldElement::from_json_text(r#""42""#).unwrap(),
            FieldElement::from_u64(42)
        );
    }

    #[test]
    fn json_text_rejects_non_integers() {
        for text in ["1.5", "1e3", "-3", "null", "true", "[1]", r#""0x10""#, "{"] {
            assert!(
                FieldElement::from_json_text(text).is_err(),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn serde_uses_decimal_strings() {
        let fe = FieldElement::from_u64(1234);
        assert_eq!(serde_json::to_string(&fe).unwrap(), "\"1234\"");
        let back: FieldElement = serde_json::from_str("\"1234\"").unwrap();
        assert_eq!(back, fe);
        let from_int: FieldElement = serde_json::from_str("1234").unwrap();
        assert_eq!(from_int, fe);
        assert!(serde_json::from_str::<FieldElement>("12.5").is_err());
        assert!(serde_json::from_str::<FieldElement>("-1").is_err());
    }
}
