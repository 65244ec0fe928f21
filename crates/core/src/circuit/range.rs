//! Range checks and small arithmetic helpers over R1CS field variables

use crate::crypto::limbs::fr_pow2;
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

/// Decompose `x` into `n` little-endian bits and enforce the recomposition
///
/// A value that does not fit in `n` bits leaves the system unsatisfiable;
/// synthesis itself still succeeds.
pub fn enforce_bits(
    cs: ConstraintSystemRef<Fr>,
    x: &FpVar<Fr>,
    n: usize,
) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
    debug_assert!(n > 0 && n < Fr::MODULUS_BIT_SIZE as usize);
    let value_bits = x.value().ok().map(|v| v.into_bigint().to_bits_le());

    let bits = (0..n)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                value_bits
                    .as_ref()
                    .map(|b| b[i])
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Boolean::le_bits_to_fp_var(&bits)?.enforce_equal(x)?;
    Ok(bits)
}

/// Enforce `0 <= x < bound` where `bound <= 2^n`
pub fn enforce_less_than_const(
    cs: ConstraintSystemRef<Fr>,
    x: &FpVar<Fr>,
    bound: u64,
    n: usize,
) -> Result<(), SynthesisError> {
    enforce_bits(cs.clone(), x, n)?;
    let offset = fr_pow2(n) - Fr::from(bound);
    enforce_bits(cs, &(x + offset), n)?;
    Ok(())
}

/// Sum of variables as one linear combination
pub fn sum(vars: &[FpVar<Fr>]) -> FpVar<Fr> {
    if vars.iter().all(|v| v.is_constant()) {
        let total = vars
            .iter()
            .filter_map(|v| v.value().ok())
            .fold(Fr::zero(), |acc, v| acc + v);
        FpVar::constant(total)
    } else {
        vars.iter().sum()
    }
}

/// `Σ coeff_i · var_i` as one linear combination
pub fn weighted_sum(vars: &[FpVar<Fr>], coeffs: &[Fr]) -> FpVar<Fr> {
    let terms: Vec<FpVar<Fr>> = vars.iter().zip(coeffs).map(|(v, c)| v * *c).collect();
    sum(&terms)
}

/// Masked Horner scan: `acc ← acc + mask·((base − 1)·acc + value)`
///
/// Member positions (mask = 1) accumulate `acc·base + value`; other positions
/// pass `acc` through. With `reverse` the scan runs from the last position,
/// which packs members little-endian.
pub fn masked_horner(
    mask: &[FpVar<Fr>],
    values: &[FpVar<Fr>],
    base: u64,
    reverse: bool,
) -> Result<FpVar<Fr>, SynthesisError> {
    let scale = Fr::from(base - 1);
    let step = |acc: FpVar<Fr>, (m, v): (&FpVar<Fr>, &FpVar<Fr>)| -> Result<FpVar<Fr>, SynthesisError> {
        let term = m * &(&acc * scale + v);
        Ok(acc + term)
    };

    let pairs = mask.iter().zip(values);
    let mut acc = FpVar::zero();
    if reverse {
        for pair in pairs.rev() {
            acc = step(acc, pair)?;
        }
    } else {
        for pair in pairs {
            acc = step(acc, pair)?;
        }
    }
    Ok(acc)
}

/// Value of a variable as a small integer (low 128 bits)
pub fn small_value(x: &FpVar<Fr>) -> Result<u128, SynthesisError> {
    let limbs = x.value()?.into_bigint().0;
    Ok(limbs[0] as u128 | ((limbs[1] as u128) << 64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;

    fn witness(cs: &ConstraintSystemRef<Fr>, v: Fr) -> FpVar<Fr> {
        FpVar::new_witness(cs.clone(), || Ok(v)).unwrap()
    }

    #[test]
    fn test_enforce_bits() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let x = witness(&cs, Fr::from(0b1011u64));
        let bits = enforce_bits(cs.clone(), &x, 4).unwrap();
        let values: Vec<bool> = bits.iter().map(|b| b.value().unwrap()).collect();
        assert_eq!(values, vec![true, true, false, true]);
        assert!(cs.is_satisfied().unwrap());

        let cs = ConstraintSystem::<Fr>::new_ref();
        let x = witness(&cs, Fr::from(16u64));
        enforce_bits(cs.clone(), &x, 4).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_negative_values_do_not_fit() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let x = witness(&cs, -Fr::from(1u64));
        enforce_bits(cs.clone(), &x, 200).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_less_than_const() {
        for (value, ok) in [(99u64, true), (100, false), (0, true)] {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let x = witness(&cs, Fr::from(value));
            enforce_less_than_const(cs.clone(), &x, 100, 7).unwrap();
            assert_eq!(cs.is_satisfied().unwrap(), ok, "value {}", value);
        }
    }

    #[test]
    fn test_sum_of_constants() {
        let total = sum(&[FpVar::constant(Fr::from(2u64)), FpVar::constant(Fr::from(3u64))]);
        assert!(total.is_constant());
        assert_eq!(total.value().unwrap(), Fr::from(5u64));
        assert_eq!(sum(&[]).value().unwrap(), Fr::zero());
    }

    #[test]
    fn test_masked_horner() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let digits: Vec<FpVar<Fr>> = [9u64, 1, 2, 3, 9]
            .iter()
            .map(|d| witness(&cs, Fr::from(*d)))
            .collect();
        let mask: Vec<FpVar<Fr>> = [0u64, 1, 1, 1, 0]
            .iter()
            .map(|m| witness(&cs, Fr::from(*m)))
            .collect();

        let forward = masked_horner(&mask, &digits, 10, false).unwrap();
        let backward = masked_horner(&mask, &digits, 256, true).unwrap();
        assert_eq!(forward.value().unwrap(), Fr::from(123u64));
        assert_eq!(backward.value().unwrap(), Fr::from(1 + 2 * 256 + 3 * 65536u64));
        assert!(cs.is_satisfied().unwrap());
    }
}
