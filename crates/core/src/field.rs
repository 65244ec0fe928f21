//! BN254 scalar field helpers
//!
//! Conversions between field elements, big integers and the decimal strings
//! used in input/output JSON files.

use crate::error::{AadharError, Result};
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint_dig::BigUint;

/// The field modulus as a big integer
pub fn modulus() -> BigUint {
    BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le())
}

/// Canonical integer representative of a field element
pub fn fr_to_biguint(value: &Fr) -> BigUint {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le())
}

/// Convert an integer to a field element, rejecting values >= modulus
pub fn fr_from_biguint(value: &BigUint) -> Result<Fr> {
    if value >= &modulus() {
        return Err(AadharError::InvalidInput(format!(
            "value {} is not a canonical field element",
            value
        )));
    }
    Ok(Fr::from_le_bytes_mod_order(&value.to_bytes_le()))
}

/// Decimal string of the canonical representative
pub fn fr_to_decimal(value: &Fr) -> String {
    fr_to_biguint(value).to_str_radix(10)
}

/// Parse a decimal string into a field element
pub fn fr_from_decimal(s: &str) -> Result<Fr> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AadharError::InvalidInput(format!("not a decimal integer: {:?}", s)));
    }
    let value = BigUint::parse_bytes(trimmed.as_bytes(), 10)
        .ok_or_else(|| AadharError::InvalidInput(format!("not a decimal integer: {:?}", s)))?;
    fr_from_biguint(&value)
}

/// Little-endian byte packing; callers keep `bytes` under 32 bytes
pub fn fr_from_le_bytes(bytes: &[u8]) -> Fr {
    Fr::from_le_bytes_mod_order(bytes)
}

/// Serde adapter: a single field element as a decimal string
pub mod decimal {
    use super::{fr_from_decimal, fr_to_decimal};
    use ark_bn254::Fr;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Fr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&fr_to_decimal(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fr, D::Error> {
        let s = String::deserialize(deserializer)?;
        fr_from_decimal(&s).map_err(D::Error::custom)
    }
}

/// Serde adapter: a list of field elements as decimal strings
pub mod decimal_vec {
    use super::{fr_from_decimal, fr_to_decimal};
    use ark_bn254::Fr;
    use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[Fr], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&fr_to_decimal(value))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Fr>, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .iter()
            .map(|s| fr_from_decimal(s).map_err(D::Error::custom))
            .collect()
    }
}

/// Serde adapter: a list of lists of field elements (sibling paths)
pub mod decimal_matrix {
    use super::{fr_from_decimal, fr_to_decimal};
    use ark_bn254::Fr;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(rows: &[Vec<Fr>], serializer: S) -> Result<S::Ok, S::Error> {
        let strings: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(fr_to_decimal).collect())
            .collect();
        strings.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<Fr>>, D::Error> {
        let strings = Vec::<Vec<String>>::deserialize(deserializer)?;
        strings
            .iter()
            .map(|row| {
                row.iter()
                    .map(|s| fr_from_decimal(s).map_err(D::Error::custom))
                    .collect()
            })
            .collect()
    }
}
