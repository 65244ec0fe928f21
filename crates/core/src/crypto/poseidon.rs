//! Native Poseidon hash over the BN254 scalar field
//!
//! Follows the circomlib construction: width `t = n + 1` for `n` inputs, the
//! state starts as `[0, inputs...]`, 8 full rounds are split around the
//! partial rounds, the S-box is `x^5` and the digest is `state[0]`.
//!
//! Round constants and the MDS matrix are generated once per width with the
//! Grain LFSR procedure and cached for the lifetime of the process. The
//! generated parameters reproduce circomlib's `Poseidon(n)` digests, so hashes
//! computed here match circom witnesses and circomlibjs.

use crate::error::{AadharError, Result};
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::find_poseidon_ark_and_mds;
use ark_ff::{Field, PrimeField, Zero};
use once_cell::sync::{Lazy, OnceCell};

/// Number of full rounds, identical for every width
pub const FULL_ROUNDS: usize = 8;

/// Partial rounds indexed by `t - 2`
pub const PARTIAL_ROUNDS: [usize; 16] = [56, 57, 56, 60, 60, 63, 64, 63, 60, 66, 60, 65, 70, 60, 64, 68];

/// Largest supported number of inputs
pub const MAX_INPUTS: usize = 16;

/// Round constants and MDS matrix for one state width
#[derive(Debug, Clone)]
pub struct PoseidonParams {
    pub width: usize,
    pub partial_rounds: usize,
    /// One row of `width` constants per round
    pub ark: Vec<Vec<Fr>>,
    pub mds: Vec<Vec<Fr>>,
}

impl PoseidonParams {
    fn generate(n_inputs: usize) -> Self {
        let partial_rounds = PARTIAL_ROUNDS[n_inputs - 1];
        let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
            Fr::MODULUS_BIT_SIZE as u64,
            n_inputs,
            FULL_ROUNDS as u64,
            partial_rounds as u64,
            0,
        );
        log::debug!(
            "Generated Poseidon parameters: t={}, RF={}, RP={}",
            n_inputs + 1,
            FULL_ROUNDS,
            partial_rounds
        );
        Self {
            width: n_inputs + 1,
            partial_rounds,
            ark,
            mds,
        }
    }

    pub fn total_rounds(&self) -> usize {
        FULL_ROUNDS + self.partial_rounds
    }

    /// Whether round `r` applies the S-box to the whole state
    pub fn is_full_round(&self, r: usize) -> bool {
        r < FULL_ROUNDS / 2 || r >= FULL_ROUNDS / 2 + self.partial_rounds
    }
}

static PARAMS: Lazy<Vec<OnceCell<PoseidonParams>>> =
    Lazy::new(|| (0..MAX_INPUTS).map(|_| OnceCell::new()).collect());

/// Parameters for hashing `n_inputs` elements
pub fn params(n_inputs: usize) -> Result<&'static PoseidonParams> {
    if n_inputs == 0 || n_inputs > MAX_INPUTS {
        return Err(AadharError::InvalidInput(format!(
            "Poseidon supports 1..={} inputs, got {}",
            MAX_INPUTS, n_inputs
        )));
    }
    Ok(PARAMS[n_inputs - 1].get_or_init(|| PoseidonParams::generate(n_inputs)))
}

/// Hash `inputs` with the width matching their count
pub fn poseidon_hash(inputs: &[Fr]) -> Result<Fr> {
    let params = params(inputs.len())?;

    let mut state = Vec::with_capacity(params.width);
    state.push(Fr::zero());
    state.extend_from_slice(inputs);

    for r in 0..params.total_rounds() {
        for (s, c) in state.iter_mut().zip(&params.ark[r]) {
            *s += c;
        }
        if params.is_full_round(r) {
            for s in state.iter_mut() {
                *s = sbox(*s);
            }
        } else {
            state[0] = sbox(state[0]);
        }
        state = params
            .mds
            .iter()
            .map(|row| row.iter().zip(&state).map(|(m, s)| *m * s).sum())
            .collect();
    }

    Ok(state[0])
}

fn sbox(x: Fr) -> Fr {
    let x2 = x.square();
    x2.square() * x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::fr_from_decimal;

    #[test]
    fn test_supported_widths() {
        for n in 1..=MAX_INPUTS {
            let p = params(n).unwrap();
            assert_eq!(p.width, n + 1);
            assert_eq!(p.ark.len(), p.total_rounds());
            assert!(p.ark.iter().all(|row| row.len() == n + 1));
            assert_eq!(p.mds.len(), n + 1);
        }
        assert!(params(0).is_err());
        assert!(params(17).is_err());
    }

    fn hash_u64(inputs: &[u64]) -> Fr {
        let inputs: Vec<Fr> = inputs.iter().map(|&v| Fr::from(v)).collect();
        poseidon_hash(&inputs).unwrap()
    }

    #[test]
    fn test_circomlib_vectors() {
        assert_eq!(
            hash_u64(&[1]),
            fr_from_decimal("18586133768512220936620570745912940619677854269274689475585506675881198879027").unwrap()
        );
        assert_eq!(
            hash_u64(&[1, 2]),
            fr_from_decimal("7853200120776062878684798364095072458815029376092732009249414926327459813530").unwrap()
        );
        assert_eq!(
            hash_u64(&[1, 2, 3, 4]),
            fr_from_decimal("18821383157269793795438455681495246036402687001665670618754263018637548127333").unwrap()
        );
    }

    #[test]
    fn test_hash_is_deterministic() {
        let inputs = [Fr::from(1u64), Fr::from(2u64)];
        assert_eq!(poseidon_hash(&inputs).unwrap(), poseidon_hash(&inputs).unwrap());
    }

    #[test]
    fn test_hash_depends_on_order_and_arity() {
        let a = poseidon_hash(&[Fr::from(1u64), Fr::from(2u64)]).unwrap();
        let b = poseidon_hash(&[Fr::from(2u64), Fr::from(1u64)]).unwrap();
        let c = poseidon_hash(&[Fr::from(1u64), Fr::from(2u64), Fr::zero()]).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
