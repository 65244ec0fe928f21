//! In-circuit fold of claim updates into the template tree

use crate::circuit::poseidon::poseidon_var;
use crate::claims::smt::{key_bits, MAX_DEPTH};
use ark_bn254::Fr;
use ark_ff::One;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

/// One leaf update: constant key, new value and its sibling path
pub struct ClaimUpdateVar {
    pub key: Fr,
    pub value: FpVar<Fr>,
    pub siblings: Vec<FpVar<Fr>>,
}

/// Leaf-level selectors of a zero-padded sibling path
///
/// `tail_zero[i]` is `1` when siblings `i..` are all zero; the leaf sits at
/// the first such level.
struct PathLevels {
    tail_zero: Vec<FpVar<Fr>>,
    leaf_level: Vec<FpVar<Fr>>,
}

fn path_levels(siblings: &[FpVar<Fr>]) -> Result<PathLevels, SynthesisError> {
    siblings[MAX_DEPTH - 1].enforce_equal(&FpVar::zero())?;

    let mut tail = Boolean::TRUE;
    let mut tail_zero = vec![FpVar::zero(); MAX_DEPTH];
    for i in (0..MAX_DEPTH).rev() {
        tail = tail.and(&siblings[i].is_zero()?)?;
        tail_zero[i] = FpVar::from(tail.clone());
    }

    let leaf_level = (0..MAX_DEPTH)
        .map(|i| {
            if i == 0 {
                tail_zero[0].clone()
            } else {
                &tail_zero[i] - &tail_zero[i - 1]
            }
        })
        .collect();

    Ok(PathLevels { tail_zero, leaf_level })
}

/// Root reached from `leaf` along `siblings`
fn path_root(
    key: &Fr,
    leaf: &FpVar<Fr>,
    siblings: &[FpVar<Fr>],
    levels: &PathLevels,
) -> Result<FpVar<Fr>, SynthesisError> {
    let bits = key_bits(key);
    let mut node = FpVar::zero();
    for i in (0..MAX_DEPTH).rev() {
        let pair = if bits[i] {
            [siblings[i].clone(), node]
        } else {
            [node, siblings[i].clone()]
        };
        let hash = poseidon_var(&pair)?;
        let inner = (FpVar::one() - &levels.tail_zero[i]) * hash;
        node = &levels.leaf_level[i] * leaf + inner;
    }
    Ok(node)
}

fn leaf_var(key: &Fr, value: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    poseidon_var(&[FpVar::constant(*key), value.clone(), FpVar::constant(Fr::one())])
}

/// Apply every update to `template_root` in order
///
/// Each step proves that `key` still holds `0` under the running root and
/// moves the running root to the tree where it holds the new value. Sibling
/// paths that do not match the running root leave the system unsatisfiable.
pub fn fold_updates(template_root: &FpVar<Fr>, updates: &[ClaimUpdateVar]) -> Result<FpVar<Fr>, SynthesisError> {
    let mut root = template_root.clone();
    for update in updates {
        if update.siblings.len() != MAX_DEPTH {
            return Err(SynthesisError::Unsatisfiable);
        }
        let levels = path_levels(&update.siblings)?;

        let old_leaf = leaf_var(&update.key, &FpVar::zero())?;
        let old_root = path_root(&update.key, &old_leaf, &update.siblings, &levels)?;
        old_root.enforce_equal(&root)?;

        let new_leaf = leaf_var(&update.key, &update.value)?;
        root = path_root(&update.key, &new_leaf, &update.siblings, &levels)?;
    }
    Ok(root)
}
