//! Public outputs and the disclosed-attribute packing

use crate::circuit::config::RevealPolicy;
use crate::circuit::range::sum;
use crate::crypto::limbs::fr_pow2;
use crate::error::{AadharError, Result};
use crate::field::{decimal, fr_from_le_bytes, fr_to_biguint};
use crate::qr::{QrDocument, STATE_MAX_BYTES};
use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use num_bigint_dig::BigUint;
use serde::{Deserialize, Serialize};

/// Number of trailing instance values that are outputs
pub const PUBLIC_OUTPUT_COUNT: usize = 5;

/// Bit offset of `ageAbove18` in `revealedDataPacked`
pub const AGE_OFFSET: usize = 0;
/// Bit offset of the gender byte
pub const GENDER_OFFSET: usize = 1;
/// Bit offset of the pin code
pub const PIN_CODE_OFFSET: usize = 9;
/// Bit offset of the packed state name
pub const STATE_OFFSET: usize = 29;

/// Values the circuit exposes after its public inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicOutputs {
    #[serde(with = "decimal")]
    pub public_key_hash: Fr,
    #[serde(with = "decimal")]
    pub nullifier: Fr,
    #[serde(with = "decimal")]
    pub revealed_data_packed: Fr,
    #[serde(with = "decimal")]
    pub signal_hash: Fr,
    #[serde(with = "decimal")]
    pub claims_root: Fr,
}

impl PublicOutputs {
    /// Read the outputs from the tail of a full instance assignment
    pub fn from_instance(instance: &[Fr]) -> Result<Self> {
        if instance.len() < PUBLIC_OUTPUT_COUNT {
            return Err(AadharError::InvalidInput(format!(
                "instance of {} values has no room for {} outputs",
                instance.len(),
                PUBLIC_OUTPUT_COUNT
            )));
        }
        let tail = &instance[instance.len() - PUBLIC_OUTPUT_COUNT..];
        Ok(Self {
            public_key_hash: tail[0],
            nullifier: tail[1],
            revealed_data_packed: tail[2],
            signal_hash: tail[3],
            claims_root: tail[4],
        })
    }

    /// Outputs in instance order
    pub fn to_vec(&self) -> Vec<Fr> {
        vec![
            self.public_key_hash,
            self.nullifier,
            self.revealed_data_packed,
            self.signal_hash,
            self.claims_root,
        ]
    }

    pub fn revealed(&self, policy: &RevealPolicy) -> Result<RevealedData> {
        RevealedData::unpack(&self.revealed_data_packed, policy)
    }
}

/// Attributes disclosed through `revealedDataPacked`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedData {
    pub age_above_18: Option<bool>,
    pub gender: Option<String>,
    pub pin_code: Option<u32>,
    pub state: Option<String>,
}

impl RevealedData {
    /// Attributes of `document` selected by `policy`
    pub fn from_document(document: &QrDocument, policy: &RevealPolicy) -> Result<Self> {
        Ok(Self {
            age_above_18: if policy.age_above_18 {
                Some(document.age_above_18()?)
            } else {
                None
            },
            gender: policy.gender.then(|| document.poi.gender.clone()),
            pin_code: if policy.pin_code {
                Some(document.poa.pin_code_value()?)
            } else {
                None
            },
            state: policy.state.then(|| document.poa.state.clone()),
        })
    }

    /// Pack the present attributes
    pub fn pack(&self) -> Result<Fr> {
        let mut packed = Fr::from(0u64);
        if let Some(age) = self.age_above_18 {
            packed += Fr::from(age as u64) * fr_pow2(AGE_OFFSET);
        }
        if let Some(gender) = &self.gender {
            let code = match gender.as_bytes() {
                [] => 0,
                [b] => *b as u64,
                _ => {
                    return Err(AadharError::InvalidField {
                        field: "gender".to_string(),
                        reason: "more than one byte".to_string(),
                    })
                }
            };
            packed += Fr::from(code) * fr_pow2(GENDER_OFFSET);
        }
        if let Some(pin) = self.pin_code {
            if pin >= 1 << (STATE_OFFSET - PIN_CODE_OFFSET) {
                return Err(AadharError::InvalidField {
                    field: "pin code".to_string(),
                    reason: format!("{} does not fit the packed layout", pin),
                });
            }
            packed += Fr::from(pin as u64) * fr_pow2(PIN_CODE_OFFSET);
        }
        if let Some(state) = &self.state {
            if state.len() > STATE_MAX_BYTES {
                return Err(AadharError::InvalidField {
                    field: "state".to_string(),
                    reason: format!("{} bytes exceeds {}", state.len(), STATE_MAX_BYTES),
                });
            }
            packed += fr_from_le_bytes(state.as_bytes()) * fr_pow2(STATE_OFFSET);
        }
        Ok(packed)
    }

    /// Decode the slots enabled by `policy`
    pub fn unpack(packed: &Fr, policy: &RevealPolicy) -> Result<Self> {
        let value = fr_to_biguint(packed);
        let slot = |offset: usize, bits: usize| -> BigUint {
            (&value >> offset) & ((BigUint::from(1u32) << bits) - 1u32)
        };
        let to_u64 = |v: BigUint| -> u64 {
            v.to_bytes_le()
                .iter()
                .rev()
                .fold(0u64, |acc, b| (acc << 8) | *b as u64)
        };

        let gender = if policy.gender {
            let code = to_u64(slot(GENDER_OFFSET, 8)) as u8;
            Some(if code == 0 { String::new() } else { (code as char).to_string() })
        } else {
            None
        };

        let state = if policy.state {
            let mut bytes = slot(STATE_OFFSET, STATE_MAX_BYTES * 8).to_bytes_le();
            while bytes.last() == Some(&0) {
                bytes.pop();
            }
            Some(String::from_utf8(bytes)?)
        } else {
            None
        };

        Ok(Self {
            age_above_18: policy.age_above_18.then(|| to_u64(slot(AGE_OFFSET, 1)) == 1),
            gender,
            pin_code: policy
                .pin_code
                .then(|| to_u64(slot(PIN_CODE_OFFSET, STATE_OFFSET - PIN_CODE_OFFSET)) as u32),
            state,
        })
    }
}

/// In-circuit packing of the attributes enabled by `policy`
pub fn pack_revealed_var(
    policy: &RevealPolicy,
    age_above_18: &FpVar<Fr>,
    gender: &FpVar<Fr>,
    pin_code: &FpVar<Fr>,
    state: &FpVar<Fr>,
) -> FpVar<Fr> {
    let slots = [
        (policy.age_above_18, age_above_18, AGE_OFFSET),
        (policy.gender, gender, GENDER_OFFSET),
        (policy.pin_code, pin_code, PIN_CODE_OFFSET),
        (policy.state, state, STATE_OFFSET),
    ];
    let terms: Vec<FpVar<Fr>> = slots
        .iter()
        .filter(|(enabled, _, _)| *enabled)
        .map(|(_, var, offset)| *var * fr_pow2(*offset))
        .collect();
    sum(&terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_revealed() -> RevealedData {
        RevealedData {
            age_above_18: Some(true),
            gender: Some("M".to_string()),
            pin_code: Some(110051),
            state: Some("Delhi".to_string()),
        }
    }

    #[test]
    fn test_pack_unpack_all_slots() {
        let revealed = create_test_revealed();
        let packed = revealed.pack().unwrap();
        let unpacked = RevealedData::unpack(&packed, &RevealPolicy::all()).unwrap();
        assert_eq!(unpacked, revealed);
    }

    #[test]
    fn test_unpack_respects_policy() {
        let packed = create_test_revealed().pack().unwrap();
        let unpacked = RevealedData::unpack(&packed, &RevealPolicy::default()).unwrap();
        assert_eq!(unpacked.age_above_18, Some(true));
        assert_eq!(unpacked.pin_code, None);
        assert_eq!(unpacked.state, None);
    }

    #[test]
    fn test_packed_layout() {
        let revealed = RevealedData {
            age_above_18: Some(true),
            pin_code: Some(3),
            ..Default::default()
        };
        assert_eq!(revealed.pack().unwrap(), Fr::from(1u64 + (3 << 9)));
    }

    #[test]
    fn test_outputs_from_instance() {
        let instance: Vec<Fr> = (0..26u64).map(Fr::from).collect();
        let outputs = PublicOutputs::from_instance(&instance).unwrap();
        assert_eq!(outputs.public_key_hash, Fr::from(21u64));
        assert_eq!(outputs.claims_root, Fr::from(25u64));
        assert_eq!(outputs.to_vec(), instance[21..].to_vec());
        assert!(PublicOutputs::from_instance(&instance[..3]).is_err());
    }
}
