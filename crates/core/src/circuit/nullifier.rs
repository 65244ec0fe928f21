//! Nullifier gadget

use crate::circuit::poseidon::poseidon_var;
use crate::nullifier::PHOTO_CHUNKS;
use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::SynthesisError;

/// `Poseidon(seed, Poseidon(chunks[0..16]), Poseidon(chunks[16..32]))`
pub fn nullifier_var(seed: &FpVar<Fr>, photo_chunks: &[FpVar<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    if photo_chunks.len() != PHOTO_CHUNKS {
        return Err(SynthesisError::Unsatisfiable);
    }
    let (first, second) = photo_chunks.split_at(PHOTO_CHUNKS / 2);
    let h1 = poseidon_var(first)?;
    let h2 = poseidon_var(second)?;
    poseidon_var(&[seed.clone(), h1, h2])
}
