//! RSA-2048 PKCS#1 v1.5 signature verification with SHA-256
//!
//! Proves `signature^65537 mod n == EM` where EM is the PKCS#1 v1.5 encoding
//! of the in-circuit digest. The constant part of EM (padding and DigestInfo)
//! is fixed; only the low 256 bits come from the digest.

use crate::circuit::bigint::{mod_pow_65537, LimbVar};
use crate::circuit::poseidon::poseidon_var;
use crate::circuit::range::sum;
use crate::crypto::limbs::{fr_pow2, to_limbs, LIMB_BITS, NUM_LIMBS};
use crate::crypto::rsa_verifier::{emsa_pkcs1v15_encode, SIGNATURE_BYTES};
use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use num_bigint_dig::BigUint;

/// EM limbs with the 256 digest bits supplied by `digest_bits`
fn encoded_message_limbs(digest_bits: &[Boolean<Fr>]) -> Result<Vec<FpVar<Fr>>, SynthesisError> {
    let template = emsa_pkcs1v15_encode(&[0u8; 32], SIGNATURE_BYTES).map_err(|_| SynthesisError::Unsatisfiable)?;
    let constant_limbs = to_limbs(&BigUint::from_bytes_be(&template)).map_err(|_| SynthesisError::Unsatisfiable)?;

    let mut limbs = Vec::with_capacity(NUM_LIMBS);
    for (l, constant) in constant_limbs.into_iter().enumerate() {
        let mut terms = vec![FpVar::constant(constant)];
        let start = l * LIMB_BITS;
        let end = ((l + 1) * LIMB_BITS).min(digest_bits.len());
        for k in start..end {
            terms.push(FpVar::from(digest_bits[k].clone()) * fr_pow2(k - start));
        }
        limbs.push(sum(&terms));
    }
    Ok(limbs)
}

/// Enforce that `signature` is a valid signature of the digest under `modulus`
///
/// `digest_bits` is the SHA-256 digest as an integer, little-endian bits.
pub fn verify_rsa_sha256(
    cs: ConstraintSystemRef<Fr>,
    digest_bits: &[Boolean<Fr>],
    signature: &LimbVar,
    modulus: &LimbVar,
) -> Result<(), SynthesisError> {
    if digest_bits.len() != 256 {
        return Err(SynthesisError::Unsatisfiable);
    }
    let result = mod_pow_65537(cs, signature, modulus)?;
    let expected = encoded_message_limbs(digest_bits)?;
    result.enforce_equal_limbs(&expected)
}

/// Poseidon commitment to the modulus limbs, paired into 242-bit chunks
pub fn public_key_hash_var(modulus: &LimbVar) -> Result<FpVar<Fr>, SynthesisError> {
    let shift = fr_pow2(LIMB_BITS);
    let chunks: Vec<FpVar<Fr>> = modulus
        .limbs
        .chunks(2)
        .map(|pair| match pair {
            [lo, hi] => lo + hi * shift,
            _ => pair[0].clone(),
        })
        .collect();
    poseidon_var(&chunks)
}

/// Enforce membership of `key_hash` in a fixed set: `Π (key_hash − h_i) = 0`
pub fn enforce_trusted_key(key_hash: &FpVar<Fr>, trusted: &[Fr]) -> Result<(), SynthesisError> {
    let mut factors = trusted.iter().map(|h| key_hash - *h);
    let first = match factors.next() {
        Some(f) => f,
        None => return Ok(()),
    };
    let product = factors.fold(first, |acc, f| acc * f);
    product.enforce_equal(&FpVar::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::sha256::{alloc_bytes, sha256_padded};
    use crate::crypto::limbs::limbs_hash;
    use crate::inputs::padding::sha256_pad;
    use ark_relations::r1cs::ConstraintSystem;
    use rsa::{pkcs1::DecodeRsaPrivateKey, traits::PublicKeyParts, Pkcs1v15Sign, RsaPrivateKey};
    use sha2::{Digest, Sha256};

    fn create_test_key() -> RsaPrivateKey {
        let pem = include_str!("../../../../tests/fixtures/test_private_key.pem");
        RsaPrivateKey::from_pkcs1_pem(pem).unwrap()
    }

    fn run(message: &[u8], signed: &[u8], trusted: &[Fr]) -> bool {
        let key = create_test_key();
        let signature = key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(signed))
            .unwrap();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let (padded, padded_len) = sha256_pad(message, 128).unwrap();
        let data = alloc_bytes(cs.clone(), &padded).unwrap();
        let len = FpVar::new_witness(cs.clone(), || Ok(Fr::from(padded_len as u64))).unwrap();
        let digest = sha256_padded(cs.clone(), &data, &len).unwrap();

        let sig_limbs = to_limbs(&BigUint::from_bytes_be(&signature)).unwrap();
        let key_limbs = to_limbs(key.n()).unwrap();
        let sig = LimbVar::new_witness(cs.clone(), &sig_limbs).unwrap();
        let modulus = LimbVar::new_input(cs.clone(), &key_limbs).unwrap();

        verify_rsa_sha256(cs.clone(), &digest.digest_bits, &sig, &modulus).unwrap();
        let key_hash = public_key_hash_var(&modulus).unwrap();
        assert_eq!(key_hash.value().unwrap(), limbs_hash(&key_limbs).unwrap());
        enforce_trusted_key(&key_hash, trusted).unwrap();

        cs.is_satisfied().unwrap()
    }

    #[test]
    fn test_valid_signature() {
        env_logger::try_init().ok();
        assert!(run(b"V2\xff3\xffsigned body", b"V2\xff3\xffsigned body", &[]));
    }

    #[test]
    fn test_signature_over_other_message() {
        assert!(!run(b"V2\xff3\xffsigned body", b"V2\xff3\xffother body", &[]));
    }

    #[test]
    fn test_trusted_key_set() {
        let key = create_test_key();
        let hash = limbs_hash(&to_limbs(key.n()).unwrap()).unwrap();
        let message = b"trusted";
        assert!(run(message, message, &[Fr::from(7u64), hash]));
        assert!(!run(message, message, &[Fr::from(7u64)]));
    }
}
