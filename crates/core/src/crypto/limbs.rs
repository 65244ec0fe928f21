//! Fixed-width limb representation of RSA integers

use crate::crypto::poseidon::poseidon_hash;
use crate::error::{AadharError, Result};
use crate::field::{fr_from_biguint, fr_to_biguint};
use ark_bn254::Fr;
use num_bigint_dig::BigUint;
use rsa::{traits::PublicKeyParts, RsaPublicKey};

/// Width of one limb in bits
pub const LIMB_BITS: usize = 121;

/// Number of limbs; 17 × 121 = 2057 bits covers a 2048-bit modulus
pub const NUM_LIMBS: usize = 17;

/// Number of 242-bit chunks hashed into the public key commitment
pub const KEY_HASH_CHUNKS: usize = 9;

/// Split `value` into `num_words` little-endian words of `word_bits` bits
///
/// # Returns
/// An error if `value` does not fit in `word_bits * num_words` bits
pub fn split_to_words(value: &BigUint, word_bits: usize, num_words: usize) -> Result<Vec<BigUint>> {
    if value.bits() > word_bits * num_words {
        return Err(AadharError::InvalidInput(format!(
            "{}-bit value does not fit in {} words of {} bits",
            value.bits(),
            num_words,
            word_bits
        )));
    }

    let mask = (BigUint::from(1u32) << word_bits) - 1u32;
    let mut rest = value.clone();
    let mut words = Vec::with_capacity(num_words);
    for _ in 0..num_words {
        words.push(&rest & &mask);
        rest >>= word_bits;
    }
    Ok(words)
}

/// Reassemble little-endian words into an integer
pub fn words_to_biguint(words: &[BigUint], word_bits: usize) -> BigUint {
    words
        .iter()
        .rev()
        .fold(BigUint::from(0u32), |acc, w| (acc << word_bits) + w)
}

/// RSA integer as 17 field-element limbs
pub fn to_limbs(value: &BigUint) -> Result<Vec<Fr>> {
    split_to_words(value, LIMB_BITS, NUM_LIMBS)?
        .iter()
        .map(fr_from_biguint)
        .collect()
}

/// Inverse of [`to_limbs`]; limbs are taken at face value
pub fn from_limbs(limbs: &[Fr]) -> BigUint {
    let words: Vec<BigUint> = limbs.iter().map(fr_to_biguint).collect();
    words_to_biguint(&words, LIMB_BITS)
}

/// Pair adjacent limbs into the 242-bit chunks that are hashed
pub fn key_hash_chunks(limbs: &[Fr]) -> Vec<Fr> {
    let shift = fr_pow2(LIMB_BITS);
    limbs
        .chunks(2)
        .map(|pair| match pair {
            [lo, hi] => *lo + *hi * shift,
            [lo] => *lo,
            _ => unreachable!("chunks(2) yields one or two limbs"),
        })
        .collect()
}

/// Poseidon commitment to a modulus given as limbs
pub fn limbs_hash(limbs: &[Fr]) -> Result<Fr> {
    if limbs.len() != NUM_LIMBS {
        return Err(AadharError::InvalidInput(format!(
            "expected {} limbs, got {}",
            NUM_LIMBS,
            limbs.len()
        )));
    }
    poseidon_hash(&key_hash_chunks(limbs))
}

/// Poseidon commitment to an RSA public key modulus
pub fn public_key_hash(key: &RsaPublicKey) -> Result<Fr> {
    let limbs = to_limbs(key.n())?;
    limbs_hash(&limbs)
}

/// `2^exp` as a field element
pub fn fr_pow2(exp: usize) -> Fr {
    use ark_ff::Field;
    Fr::from(2u64).pow([exp as u64])
}
