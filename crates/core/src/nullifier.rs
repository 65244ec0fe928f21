//! Per-context pseudonym derived from the photo
//!
//! `nullifier = Poseidon(seed, Poseidon(chunks[0..16]), Poseidon(chunks[16..32]))`
//!
//! The photo never changes between QR downloads, so the nullifier is stable
//! for a holder within one verifier context and unlinkable across contexts.

use crate::error::{AadharError, Result};
use crate::field::decimal;
use crate::crypto::poseidon::poseidon_hash;
use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

/// Number of 31-byte photo chunks
pub const PHOTO_CHUNKS: usize = 32;

/// Verifier-chosen scope of a nullifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NullifierSeed(#[serde(with = "decimal")] pub Fr);

/// Pseudonymous holder tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nullifier(#[serde(with = "decimal")] pub Fr);

impl From<u64> for NullifierSeed {
    fn from(value: u64) -> Self {
        NullifierSeed(Fr::from(value))
    }
}

impl std::fmt::Display for Nullifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&crate::field::fr_to_decimal(&self.0))
    }
}

/// Derive the nullifier for packed photo chunks
pub fn derive_nullifier(seed: NullifierSeed, photo_chunks: &[Fr]) -> Result<Nullifier> {
    if photo_chunks.len() != PHOTO_CHUNKS {
        return Err(AadharError::InvalidInput(format!(
            "expected {} photo chunks, got {}",
            PHOTO_CHUNKS,
            photo_chunks.len()
        )));
    }
    let (first, second) = photo_chunks.split_at(PHOTO_CHUNKS / 2);
    let h1 = poseidon_hash(first)?;
    let h2 = poseidon_hash(second)?;
    Ok(Nullifier(poseidon_hash(&[seed.0, h1, h2])?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_chunks(offset: u64) -> Vec<Fr> {
        (0..PHOTO_CHUNKS as u64).map(|i| Fr::from(i * 1_000 + offset)).collect()
    }

    #[test]
    fn test_nullifier_is_deterministic() {
        let chunks = create_test_chunks(7);
        let a = derive_nullifier(NullifierSeed::from(12345678), &chunks).unwrap();
        let b = derive_nullifier(NullifierSeed::from(12345678), &chunks).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_nullifier_depends_on_seed_and_photo() {
        let chunks = create_test_chunks(7);
        let base = derive_nullifier(NullifierSeed::from(1), &chunks).unwrap();
        assert_ne!(base, derive_nullifier(NullifierSeed::from(2), &chunks).unwrap());
        assert_ne!(base, derive_nullifier(NullifierSeed::from(1), &create_test_chunks(8)).unwrap());
    }

    #[test]
    fn test_wrong_chunk_count() {
        assert!(derive_nullifier(NullifierSeed::from(1), &[Fr::from(1u64); 31]).is_err());
    }

    #[test]
    fn test_serializes_as_decimal() {
        let json = serde_json::to_string(&NullifierSeed::from(42)).unwrap();
        assert_eq!(json, "\"42\"");
    }
}
