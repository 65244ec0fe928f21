//! Big-integer gadgets over 121-bit limbs
//!
//! Integers are 17 little-endian limbs. Modular multiplication witnesses the
//! quotient and remainder and checks `a·b = q·n + r` over the integers one
//! coefficient at a time, carrying signed overflow between coefficients.

use crate::circuit::range::{enforce_bits, sum};
use crate::crypto::limbs::{fr_pow2, from_limbs, LIMB_BITS, NUM_LIMBS};
use crate::field::fr_from_biguint;
use ark_bn254::Fr;
use ark_ff::Field;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use num_bigint_dig::BigUint;

/// Bits reserved for a signed carry
const CARRY_BITS: usize = 128;

/// Integer held as range-checked 121-bit limbs
#[derive(Clone)]
pub struct LimbVar {
    pub limbs: Vec<FpVar<Fr>>,
}

impl LimbVar {
    /// Private integer given as limbs; every limb is range-checked
    pub fn new_witness(cs: ConstraintSystemRef<Fr>, limbs: &[Fr]) -> Result<Self, SynthesisError> {
        let limbs = limbs
            .iter()
            .map(|l| FpVar::new_witness(cs.clone(), || Ok(*l)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::range_checked(cs, limbs)
    }

    /// Public integer given as limbs; every limb is range-checked
    pub fn new_input(cs: ConstraintSystemRef<Fr>, limbs: &[Fr]) -> Result<Self, SynthesisError> {
        let limbs = limbs
            .iter()
            .map(|l| FpVar::new_input(cs.clone(), || Ok(*l)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::range_checked(cs, limbs)
    }

    /// Private integer given by value; bits above 17 limbs are dropped
    fn new_witness_truncated(cs: ConstraintSystemRef<Fr>, value: Option<&BigUint>) -> Result<Self, SynthesisError> {
        let words = value.map(truncated_limbs);
        let limbs = (0..NUM_LIMBS)
            .map(|i| {
                FpVar::new_witness(cs.clone(), || {
                    words
                        .as_ref()
                        .map(|w| w[i])
                        .ok_or(SynthesisError::AssignmentMissing)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::range_checked(cs, limbs)
    }

    fn range_checked(cs: ConstraintSystemRef<Fr>, limbs: Vec<FpVar<Fr>>) -> Result<Self, SynthesisError> {
        if limbs.len() != NUM_LIMBS {
            return Err(SynthesisError::Unsatisfiable);
        }
        for limb in &limbs {
            enforce_bits(cs.clone(), limb, LIMB_BITS)?;
        }
        Ok(Self { limbs })
    }

    /// Integer value, limbs taken at face value
    pub fn value(&self) -> Result<BigUint, SynthesisError> {
        let values = self.limbs.iter().map(|l| l.value()).collect::<Result<Vec<_>, _>>()?;
        Ok(from_limbs(&values))
    }

    /// Enforce limb-wise equality with `other`
    pub fn enforce_equal_limbs(&self, other: &[FpVar<Fr>]) -> Result<(), SynthesisError> {
        for (a, b) in self.limbs.iter().zip(other) {
            a.enforce_equal(b)?;
        }
        Ok(())
    }
}

/// `value mod 2^(17·121)` as limbs
fn truncated_limbs(value: &BigUint) -> Vec<Fr> {
    let mask = (BigUint::from(1u32) << LIMB_BITS) - 1u32;
    let mut rest = value.clone();
    let mut limbs = Vec::with_capacity(NUM_LIMBS);
    for _ in 0..NUM_LIMBS {
        // a 121-bit word is always a canonical field element
        limbs.push(fr_from_biguint(&(&rest & &mask)).unwrap_or_default());
        rest >>= LIMB_BITS;
    }
    limbs
}

/// Polynomial product coefficients `Σ_{i+j=t} a_i·b_j`
fn product_coefficients(
    a: &[FpVar<Fr>],
    b: &[FpVar<Fr>],
) -> Result<Vec<Vec<FpVar<Fr>>>, SynthesisError> {
    let mut terms: Vec<Vec<FpVar<Fr>>> = vec![Vec::new(); a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            terms[i + j].push(x * y);
        }
    }
    Ok(terms)
}

/// `a·b mod n`
///
/// With `n = 0` the quotient and remainder are witnessed as zero, which only
/// satisfies the constraints when `a·b = 0`.
pub fn mod_mul(
    cs: ConstraintSystemRef<Fr>,
    a: &LimbVar,
    b: &LimbVar,
    n: &LimbVar,
) -> Result<LimbVar, SynthesisError> {
    let (q_value, r_value) = match (a.value(), b.value(), n.value()) {
        (Ok(a), Ok(b), Ok(n)) => {
            let product = a * b;
            if n.bits() == 0 {
                (Some(BigUint::from(0u32)), Some(BigUint::from(0u32)))
            } else {
                (Some(&product / &n), Some(&product % &n))
            }
        }
        _ => (None, None),
    };

    let q = LimbVar::new_witness_truncated(cs.clone(), q_value.as_ref())?;
    let r = LimbVar::new_witness_truncated(cs.clone(), r_value.as_ref())?;

    let ab = product_coefficients(&a.limbs, &b.limbs)?;
    let qn = product_coefficients(&q.limbs, &n.limbs)?;

    let shift = fr_pow2(LIMB_BITS);
    let shift_inv = shift.inverse().ok_or(SynthesisError::DivisionByZero)?;
    let carry_offset = fr_pow2(CARRY_BITS - 1);

    let mut carry = FpVar::<Fr>::zero();
    let last = ab.len() - 1;
    for t in 0..=last {
        let mut coefficient = sum(&ab[t]) - sum(&qn[t]);
        if t < NUM_LIMBS {
            coefficient -= &r.limbs[t];
        }
        let incoming = coefficient + &carry;

        if t == last {
            incoming.enforce_equal(&FpVar::zero())?;
        } else {
            let next = FpVar::new_witness(cs.clone(), || Ok(incoming.value()? * shift_inv))?;
            enforce_bits(cs.clone(), &(&next + carry_offset), CARRY_BITS)?;
            incoming.enforce_equal(&(&next * shift))?;
            carry = next;
        }
    }

    Ok(r)
}

/// `base^65537 mod n`: sixteen squarings and one multiplication
pub fn mod_pow_65537(cs: ConstraintSystemRef<Fr>, base: &LimbVar, n: &LimbVar) -> Result<LimbVar, SynthesisError> {
    let mut acc = base.clone();
    for _ in 0..16 {
        acc = mod_mul(cs.clone(), &acc, &acc, n)?;
    }
    mod_mul(cs, &acc, base, n)
}
