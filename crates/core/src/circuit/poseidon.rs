//! Poseidon gadget sharing parameters with the native hash

use crate::circuit::range::weighted_sum;
use crate::crypto::poseidon::params;
use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

fn sbox(x: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let x2 = x.square()?;
    let x4 = x2.square()?;
    Ok(x4 * x)
}

/// Poseidon hash of `inputs` (1 to 16 elements)
///
/// Constant inputs fold to a constant output without constraints.
pub fn poseidon_var(inputs: &[FpVar<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    let params = params(inputs.len()).map_err(|_| SynthesisError::Unsatisfiable)?;

    let mut state = Vec::with_capacity(params.width);
    state.push(FpVar::zero());
    state.extend_from_slice(inputs);

    for r in 0..params.total_rounds() {
        for (s, c) in state.iter_mut().zip(&params.ark[r]) {
            *s += *c;
        }
        if params.is_full_round(r) {
            state = state.iter().map(sbox).collect::<Result<_, _>>()?;
        } else {
            state[0] = sbox(&state[0])?;
        }
        state = params.mds.iter().map(|row| weighted_sum(&state, row)).collect();
    }

    Ok(state.swap_remove(0))
}
