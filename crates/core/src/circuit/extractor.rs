//! Field extraction from the padded QR buffer
//!
//! A one-hot counter over 19 states walks the buffer and advances on every
//! `0xFF` until 18 delimiters have been seen. State `f` marks the bytes of
//! field `f`; state 18 marks the photo. Every field decode is a masked scan
//! over the whole buffer, so the shape never depends on where fields lie.

use crate::circuit::range::{enforce_bits, enforce_less_than_const, masked_horner, small_value, sum, weighted_sum};
use crate::circuit::sha256::ByteVar;
use crate::inputs::photo::{CHUNK_BYTES, PHOTO_BYTES};
use crate::qr::{FieldPosition, DELIMITER, DELIMITER_COUNT, GENDER_MAX_BYTES, PIN_CODE_DIGITS, REFERENCE_ID_DIGITS, STATE_MAX_BYTES};
use ark_bn254::Fr;
use ark_ff::{Field, One, Zero};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Counter states: one per field plus the photo
const STATES: usize = DELIMITER_COUNT + 1;

/// `YYYYMMDD` difference that marks an 18th birthday
const ADULT_YMD_OFFSET: u64 = 180_000;

/// Width of the age comparison; both dates are below 2^27
const AGE_BITS: usize = 28;

/// Values decoded from the buffer
pub struct ExtractedFields {
    pub delimiter_positions: Vec<FpVar<Fr>>,
    /// `1` if the holder was at least 18 on the signing date
    pub age_above_18: FpVar<Fr>,
    pub reference_ymd: FpVar<Fr>,
    pub dob_ymd: FpVar<Fr>,
    pub gender: FpVar<Fr>,
    pub pin_code: FpVar<Fr>,
    /// State name packed little-endian
    pub state: FpVar<Fr>,
    /// 32 little-endian chunks of 31 photo bytes
    pub photo_chunks: Vec<FpVar<Fr>>,
}

struct DelimiterScan {
    /// Delimiter positions derived from the scan
    positions: Vec<FpVar<Fr>>,
    /// Per-byte membership mask of every state
    masks: Vec<Vec<FpVar<Fr>>>,
}

fn scan_delimiters(data: &[ByteVar]) -> Result<DelimiterScan, SynthesisError> {
    let delimiter = FpVar::constant(Fr::from(DELIMITER as u64));
    let mut state: Vec<FpVar<Fr>> = (0..STATES)
        .map(|k| FpVar::constant(if k == 0 { Fr::one() } else { Fr::zero() }))
        .collect();
    let mut position_terms: Vec<Vec<FpVar<Fr>>> = vec![Vec::with_capacity(data.len()); DELIMITER_COUNT];
    let mut masks: Vec<Vec<FpVar<Fr>>> = vec![Vec::with_capacity(data.len()); STATES];

    for (j, byte) in data.iter().enumerate() {
        let is_delimiter = FpVar::from(byte.value.is_eq(&delimiter)?);
        // delimiters inside the photo do not count
        let mark = &is_delimiter * &(FpVar::one() - &state[DELIMITER_COUNT]);
        let advance: Vec<FpVar<Fr>> = state[..DELIMITER_COUNT].iter().map(|s| &mark * s).collect();

        for k in 0..STATES {
            let inside = if k < DELIMITER_COUNT {
                &state[k] - &advance[k]
            } else {
                state[k].clone()
            };
            masks[k].push(inside);
        }
        for (terms, a) in position_terms.iter_mut().zip(&advance) {
            terms.push(a * Fr::from(j as u64));
        }

        state = (0..STATES)
            .map(|k| {
                let mut next = state[k].clone();
                if k < DELIMITER_COUNT {
                    next -= &advance[k];
                }
                if k > 0 {
                    next += &advance[k - 1];
                }
                next
            })
            .collect();
    }

    state[DELIMITER_COUNT].enforce_equal(&FpVar::one())?;

    Ok(DelimiterScan {
        positions: position_terms.iter().map(|t| sum(t)).collect(),
        masks,
    })
}

/// Decimal value of the masked digits; exactly `digits` members allowed
fn decimal_field(
    cs: &ConstraintSystemRef<Fr>,
    data: &[ByteVar],
    mask: &[FpVar<Fr>],
    digits: usize,
) -> Result<FpVar<Fr>, SynthesisError> {
    let zero_char = Fr::from(b'0' as u64);
    let six = Fr::from(6u64);
    let mut values = Vec::with_capacity(data.len());
    for (m, byte) in mask.iter().zip(data) {
        let d = &byte.value - zero_char;
        let gated = m * &d;
        enforce_bits(cs.clone(), &gated, 4)?;
        enforce_bits(cs.clone(), &(&gated + m * six), 4)?;
        values.push(d);
    }
    sum(mask).enforce_equal(&FpVar::constant(Fr::from(digits as u64)))?;
    masked_horner(mask, &values, 10, false)
}

/// Little-endian packing of the masked bytes; at most `max_bytes` members
fn packed_field(
    cs: &ConstraintSystemRef<Fr>,
    data: &[ByteVar],
    mask: &[FpVar<Fr>],
    max_bytes: usize,
) -> Result<FpVar<Fr>, SynthesisError> {
    let spare = FpVar::constant(Fr::from(max_bytes as u64)) - sum(mask);
    enforce_bits(cs.clone(), &spare, bit_length(max_bytes as u64))?;
    let values: Vec<FpVar<Fr>> = data.iter().map(|b| b.value.clone()).collect();
    masked_horner(mask, &values, 256, true)
}

/// Split a decimal value into parts of the given digit widths, most
/// significant first, each range-checked
fn split_decimal(
    cs: &ConstraintSystemRef<Fr>,
    value: &FpVar<Fr>,
    widths: &[u32],
) -> Result<Vec<FpVar<Fr>>, SynthesisError> {
    let native = small_value(value).ok();
    let mut parts = Vec::with_capacity(widths.len());
    let mut weights = Vec::with_capacity(widths.len());
    let mut below: u32 = widths.iter().sum();

    for width in widths {
        below -= width;
        let weight = 10u128.pow(below);
        let bound = 10u64.pow(*width);
        let part = FpVar::new_witness(cs.clone(), || {
            native
                .map(|v| Fr::from(((v / weight) % bound as u128) as u64))
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        enforce_less_than_const(cs.clone(), &part, bound, bit_length(bound))?;
        parts.push(part);
        weights.push(Fr::from(weight));
    }

    weighted_sum(&parts, &weights).enforce_equal(value)?;
    Ok(parts)
}

fn bit_length(value: u64) -> usize {
    (u64::BITS - value.leading_zeros()) as usize
}

/// Photo bytes shifted to the start of the buffer and packed
fn photo_chunks(
    cs: &ConstraintSystemRef<Fr>,
    data: &[ByteVar],
    mask: &[FpVar<Fr>],
    last_delimiter: &FpVar<Fr>,
) -> Result<Vec<FpVar<Fr>>, SynthesisError> {
    let mut current: Vec<FpVar<Fr>> = mask.iter().zip(data).map(|(m, b)| m * &b.value).collect();

    let shift = last_delimiter + Fr::one();
    let layers = bit_length(data.len() as u64);
    let shift_bits = enforce_bits(cs.clone(), &shift, layers)?;

    let zero = FpVar::<Fr>::zero();
    for l in (0..layers).rev() {
        let step = 1usize << l;
        let keep = (PHOTO_BYTES + step - 1).min(current.len());
        current = (0..keep)
            .map(|i| {
                let shifted = current.get(i + step).unwrap_or(&zero);
                FpVar::conditionally_select(&shift_bits[l], shifted, &current[i])
            })
            .collect::<Result<_, _>>()?;
    }
    current.resize(PHOTO_BYTES, zero);

    let weights: Vec<Fr> = (0..CHUNK_BYTES).map(|k| Fr::from(256u64).pow([k as u64])).collect();
    Ok(current.chunks(CHUNK_BYTES).map(|chunk| weighted_sum(chunk, &weights)).collect())
}

/// Decode every field the claims and the nullifier need
///
/// Unsatisfiable unless `delimiter_indices` are the first 18 `0xFF`
/// positions, all of them before `padded_len`, and every decoded field is
/// well formed.
pub fn extract_fields(
    cs: ConstraintSystemRef<Fr>,
    data: &[ByteVar],
    padded_len: &FpVar<Fr>,
    delimiter_indices: &[FpVar<Fr>],
) -> Result<ExtractedFields, SynthesisError> {
    if delimiter_indices.len() != DELIMITER_COUNT {
        return Err(SynthesisError::Unsatisfiable);
    }

    let scan = scan_delimiters(data)?;
    for (claimed, derived) in delimiter_indices.iter().zip(&scan.positions) {
        claimed.enforce_equal(derived)?;
    }
    let last_delimiter = &scan.positions[DELIMITER_COUNT - 1];
    enforce_bits(cs.clone(), &(padded_len - last_delimiter - Fr::one()), 12)?;

    let mask = |position: FieldPosition| scan.masks[position.index()].as_slice();

    // reference id: last 4 of the number, signing date, signing time
    let reference = decimal_field(&cs, data, mask(FieldPosition::ReferenceId), REFERENCE_ID_DIGITS)?;
    let reference_parts = split_decimal(&cs, &reference, &[4, 8, 9])?;
    let reference_ymd = reference_parts[1].clone();

    // date of birth: DD-MM-YYYY
    let dob_mask = mask(FieldPosition::DateOfBirth);
    let dash = FpVar::constant(Fr::from(b'-' as u64));
    let mut dashes = Vec::with_capacity(data.len());
    let mut dob_digits = Vec::with_capacity(data.len());
    for (m, byte) in dob_mask.iter().zip(data) {
        let is_dash = m * &FpVar::from(byte.value.is_eq(&dash)?);
        dob_digits.push(m - &is_dash);
        dashes.push(is_dash);
    }
    sum(&dashes).enforce_equal(&FpVar::constant(Fr::from(2u64)))?;
    let ddmmyyyy = decimal_field(&cs, data, &dob_digits, 8)?;
    let dob_parts = split_decimal(&cs, &ddmmyyyy, &[2, 2, 4])?;
    let dob_ymd = &dob_parts[2] * Fr::from(10_000u64) + &dob_parts[1] * Fr::from(100u64) + &dob_parts[0];

    let age_offset = Fr::from(2u64).pow([(AGE_BITS - 1) as u64]) - Fr::from(ADULT_YMD_OFFSET);
    let age_bits = enforce_bits(cs.clone(), &(&reference_ymd - &dob_ymd + age_offset), AGE_BITS)?;
    let age_above_18 = FpVar::from(age_bits[AGE_BITS - 1].clone());

    let gender = packed_field(&cs, data, mask(FieldPosition::Gender), GENDER_MAX_BYTES)?;
    let pin_code = decimal_field(&cs, data, mask(FieldPosition::PinCode), PIN_CODE_DIGITS)?;
    let state = packed_field(&cs, data, mask(FieldPosition::State), STATE_MAX_BYTES)?;
    let photo_chunks = photo_chunks(&cs, data, mask(FieldPosition::Photo), last_delimiter)?;

    Ok(ExtractedFields {
        delimiter_positions: scan.positions.clone(),
        age_above_18,
        reference_ymd,
        dob_ymd,
        gender,
        pin_code,
        state,
        photo_chunks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::sha256::alloc_bytes;
    use crate::inputs::padding::{find_delimiters, sha256_pad};
    use crate::inputs::photo::{extract_photo, pack_photo};
    use ark_relations::r1cs::ConstraintSystem;

    fn create_test_signed_data(dob: &str, pin: &str) -> Vec<u8> {
        let fields = [
            "V2", "3", "269720190308114407437", "Sumit Kumar", dob, "M", "C/O Ishwar Chand", "East Delhi", "",
            "B-31, 3rd Floor", "", pin, "Krishna Nagar", "Delhi", "Gali No 6", "Krishna Nagar", "Krishna Nagar",
            "1234",
        ];
        let mut data = Vec::new();
        for field in fields {
            data.extend_from_slice(field.as_bytes());
            data.push(DELIMITER);
        }
        data.extend((0..40u32).map(|i| (i * 37 + 11) as u8));
        data
    }

    struct Run {
        satisfied: bool,
        fields: ExtractedFields,
    }

    fn run_extractor(signed: &[u8], tamper: impl Fn(&mut Vec<usize>)) -> (Run, Vec<u8>, usize) {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let (padded, padded_len) = sha256_pad(signed, 256).unwrap();
        let mut delimiters = find_delimiters(&padded).unwrap().to_vec();
        tamper(&mut delimiters);

        let data = alloc_bytes(cs.clone(), &padded).unwrap();
        let len = FpVar::new_witness(cs.clone(), || Ok(Fr::from(padded_len as u64))).unwrap();
        let indices: Vec<FpVar<Fr>> = delimiters
            .iter()
            .map(|d| FpVar::new_witness(cs.clone(), || Ok(Fr::from(*d as u64))).unwrap())
            .collect();

        let fields = extract_fields(cs.clone(), &data, &len, &indices).unwrap();
        let satisfied = cs.is_satisfied().unwrap();
        (Run { satisfied, fields }, padded, padded_len)
    }

    #[test]
    fn test_extracts_fixture_fields() {
        env_logger::try_init().ok();

        let signed = create_test_signed_data("01-01-1984", "110051");
        let (result, padded, padded_len) = run_extractor(&signed, |_| {});
        assert!(result.satisfied);

        let f = &result.fields;
        assert_eq!(f.reference_ymd.value().unwrap(), Fr::from(20190308u64));
        assert_eq!(f.dob_ymd.value().unwrap(), Fr::from(19840101u64));
        assert_eq!(f.age_above_18.value().unwrap(), Fr::one());
        assert_eq!(f.gender.value().unwrap(), Fr::from(b'M' as u64));
        assert_eq!(f.pin_code.value().unwrap(), Fr::from(110051u64));
        assert_eq!(f.state.value().unwrap(), Fr::from(452723500356u64));

        let delimiters = find_delimiters(&padded).unwrap();
        let expected = pack_photo(&extract_photo(&padded, padded_len, &delimiters).unwrap()).unwrap();
        let chunks: Vec<Fr> = f.photo_chunks.iter().map(|c| c.value().unwrap()).collect();
        assert_eq!(chunks, expected);
        println!("✓ Extracted fields match the native parser");
    }

    #[test]
    fn test_minor_on_signing_date() {
        // signed 2019-03-08, born 2001-03-09: one day short of 18
        let signed = create_test_signed_data("09-03-2001", "110051");
        let (result, _, _) = run_extractor(&signed, |_| {});
        assert!(result.satisfied);
        assert_eq!(result.fields.age_above_18.value().unwrap(), Fr::zero());

        let signed = create_test_signed_data("08-03-2001", "110051");
        let (result, _, _) = run_extractor(&signed, |_| {});
        assert_eq!(result.fields.age_above_18.value().unwrap(), Fr::one());
    }

    #[test]
    fn test_shifted_delimiter_is_unsatisfiable() {
        let signed = create_test_signed_data("01-01-1984", "110051");
        let (result, _, _) = run_extractor(&signed, |d| d[5] += 1);
        assert!(!result.satisfied);
    }

    #[test]
    fn test_malformed_pin_is_unsatisfiable() {
        let signed = create_test_signed_data("01-01-1984", "11005A");
        let (result, _, _) = run_extractor(&signed, |_| {});
        assert!(!result.satisfied);

        let signed = create_test_signed_data("01-01-1984", "1100511");
        let (result, _, _) = run_extractor(&signed, |_| {});
        assert!(!result.satisfied);
    }
}
