//! Native sparse Merkle tree
//!
//! Compressed binary tree in the circomlib layout:
//! - leaf = `Poseidon(key, value, 1)`, inner node = `Poseidon(left, right)`,
//!   empty subtree = `0`
//! - the path of a key follows its bits least-significant first
//! - a leaf sits at the shallowest level where its key prefix is unique
//!
//! The shape depends only on the key set, so the root of a tree is the same
//! whatever order its leaves were inserted or updated in.

use crate::crypto::poseidon::poseidon_hash;
use crate::error::{AadharError, Result};
use crate::field::fr_to_decimal;
use ark_bn254::Fr;
use ark_ff::{BigInteger, One, PrimeField, Zero};
use std::collections::BTreeMap;

/// Sibling paths are padded to this many levels; the last entry is always 0
pub const MAX_DEPTH: usize = 10;

/// Leaf commitment
pub fn leaf_hash(key: &Fr, value: &Fr) -> Result<Fr> {
    poseidon_hash(&[*key, *value, Fr::one()])
}

/// Inner node commitment
pub fn node_hash(left: &Fr, right: &Fr) -> Result<Fr> {
    poseidon_hash(&[*left, *right])
}

/// Path bits of a key, least-significant first
pub fn key_bits(key: &Fr) -> Vec<bool> {
    key.into_bigint().to_bits_le()
}

/// Result of updating one leaf
#[derive(Debug, Clone)]
pub struct UpdateProof {
    pub key: Fr,
    pub old_value: Fr,
    pub new_value: Fr,
    pub old_root: Fr,
    pub new_root: Fr,
    /// Padded to [`MAX_DEPTH`]
    pub siblings: Vec<Fr>,
}

/// In-memory sparse Merkle tree keyed by field elements
#[derive(Debug, Clone, Default)]
pub struct SparseMerkleTree {
    leaves: BTreeMap<Fr, Fr>,
}

impl SparseMerkleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from `(key, value)` pairs; keys must be distinct
    pub fn from_leaves<I: IntoIterator<Item = (Fr, Fr)>>(leaves: I) -> Result<Self> {
        let mut tree = Self::new();
        for (key, value) in leaves {
            tree.insert(key, value)?;
        }
        Ok(tree)
    }

    pub fn insert(&mut self, key: Fr, value: Fr) -> Result<()> {
        if self.leaves.contains_key(&key) {
            return Err(AadharError::ClaimsTreeError(format!("duplicate key {}", fr_to_decimal(&key))));
        }
        self.leaves.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &Fr) -> Option<Fr> {
        self.leaves.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn root(&self) -> Result<Fr> {
        let entries = self.entries();
        let refs: Vec<&Entry> = entries.iter().collect();
        subtree_root(&refs, 0)
    }

    /// Siblings from the root down to the leaf of `key`, unpadded
    pub fn siblings(&self, key: &Fr) -> Result<Vec<Fr>> {
        if !self.leaves.contains_key(key) {
            return Err(AadharError::ClaimsTreeError(format!("key {} not in tree", fr_to_decimal(key))));
        }

        let bits = key_bits(key);
        let entries = self.entries();
        let mut current: Vec<&Entry> = entries.iter().collect();
        let mut siblings = Vec::new();
        let mut level = 0;

        while current.len() > 1 {
            let (own, other): (Vec<&Entry>, Vec<&Entry>) =
                current.into_iter().partition(|e| e.bits[level] == bits[level]);
            siblings.push(subtree_root(&other, level + 1)?);
            current = own;
            level += 1;
        }

        Ok(siblings)
    }

    /// Replace the value under an existing key
    pub fn update(&mut self, key: &Fr, new_value: Fr) -> Result<UpdateProof> {
        let old_value = self
            .get(key)
            .ok_or_else(|| AadharError::ClaimsTreeError(format!("key {} not in tree", fr_to_decimal(key))))?;
        let old_root = self.root()?;
        let siblings = pad_siblings(self.siblings(key)?)?;

        self.leaves.insert(*key, new_value);
        let new_root = self.root()?;

        Ok(UpdateProof {
            key: *key,
            old_value,
            new_value,
            old_root,
            new_root,
            siblings,
        })
    }

    fn entries(&self) -> Vec<Entry> {
        self.leaves
            .iter()
            .map(|(key, value)| Entry {
                key: *key,
                value: *value,
                bits: key_bits(key),
            })
            .collect()
    }
}

/// Root reached from a leaf and a padded sibling path
///
/// The leaf level is the first level from which every sibling is zero.
pub fn compute_root(key: &Fr, leaf: &Fr, siblings: &[Fr]) -> Result<Fr> {
    let depth = siblings
        .iter()
        .rposition(|s| !s.is_zero())
        .map_or(0, |i| i + 1);
    let bits = key_bits(key);

    let mut node = *leaf;
    for level in (0..depth).rev() {
        node = if bits[level] {
            node_hash(&siblings[level], &node)?
        } else {
            node_hash(&node, &siblings[level])?
        };
    }
    Ok(node)
}

/// Check both roots of an update against its sibling path
pub fn verify_update(proof: &UpdateProof) -> Result<bool> {
    if proof.siblings.len() != MAX_DEPTH || !proof.siblings[MAX_DEPTH - 1].is_zero() {
        return Ok(false);
    }
    let old_leaf = leaf_hash(&proof.key, &proof.old_value)?;
    let new_leaf = leaf_hash(&proof.key, &proof.new_value)?;
    Ok(compute_root(&proof.key, &old_leaf, &proof.siblings)? == proof.old_root
        && compute_root(&proof.key, &new_leaf, &proof.siblings)? == proof.new_root)
}

/// Zero-pad a sibling path to [`MAX_DEPTH`]
pub fn pad_siblings(mut siblings: Vec<Fr>) -> Result<Vec<Fr>> {
    if siblings.len() >= MAX_DEPTH {
        return Err(AadharError::ClaimsTreeError(format!(
            "leaf depth {} exceeds the supported {} levels",
            siblings.len(),
            MAX_DEPTH - 1
        )));
    }
    siblings.resize(MAX_DEPTH, Fr::zero());
    Ok(siblings)
}

struct Entry {
    key: Fr,
    value: Fr,
    bits: Vec<bool>,
}

fn subtree_root(entries: &[&Entry], level: usize) -> Result<Fr> {
    match entries {
        [] => Ok(Fr::zero()),
        [single] => leaf_hash(&single.key, &single.value),
        _ => {
            if level >= Fr::MODULUS_BIT_SIZE as usize {
                return Err(AadharError::ClaimsTreeError("keys collide on every bit".to_string()));
            }
            let (left, right): (Vec<&Entry>, Vec<&Entry>) =
                entries.iter().copied().partition(|e| !e.bits[level]);
            node_hash(&subtree_root(&left, level + 1)?, &subtree_root(&right, level + 1)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn create_test_tree() -> SparseMerkleTree {
        // keys 1 (0b001), 2 (0b010), 5 (0b101), 6 (0b110)
        SparseMerkleTree::from_leaves([
            (Fr::from(1u64), Fr::from(10u64)),
            (Fr::from(2u64), Fr::from(20u64)),
            (Fr::from(5u64), Fr::from(50u64)),
            (Fr::from(6u64), Fr::from(60u64)),
        ])
        .unwrap()
    }

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let tree = SparseMerkleTree::from_leaves([(Fr::from(3u64), Fr::from(7u64))]).unwrap();
        assert_eq!(tree.root().unwrap(), leaf_hash(&Fr::from(3u64), &Fr::from(7u64)).unwrap());
        assert!(tree.siblings(&Fr::from(3u64)).unwrap().is_empty());
    }

    #[test]
    fn test_two_leaves_split_on_first_bit() {
        let tree = SparseMerkleTree::from_leaves([
            (Fr::from(2u64), Fr::from(1u64)),
            (Fr::from(1u64), Fr::from(1u64)),
        ])
        .unwrap();
        let l = leaf_hash(&Fr::from(2u64), &Fr::from(1u64)).unwrap();
        let r = leaf_hash(&Fr::from(1u64), &Fr::from(1u64)).unwrap();
        assert_eq!(tree.root().unwrap(), node_hash(&l, &r).unwrap());
    }

    #[test]
    fn test_siblings_reproduce_root() {
        let tree = create_test_tree();
        let root = tree.root().unwrap();
        for (key, value) in [(1u64, 10u64), (2, 20), (5, 50), (6, 60)] {
            let key = Fr::from(key);
            let siblings = pad_siblings(tree.siblings(&key).unwrap()).unwrap();
            let leaf = leaf_hash(&key, &Fr::from(value)).unwrap();
            assert_eq!(compute_root(&key, &leaf, &siblings).unwrap(), root);
        }
    }

    #[test]
    fn test_update_proof_verifies() {
        let mut tree = create_test_tree();
        let proof = tree.update(&Fr::from(5u64), Fr::from(99u64)).unwrap();
        assert!(verify_update(&proof).unwrap());
        assert_eq!(proof.new_root, tree.root().unwrap());

        let mut forged = proof.clone();
        forged.siblings[0] += Fr::one();
        assert!(!verify_update(&forged).unwrap());
    }

    #[test]
    fn test_missing_and_duplicate_keys() {
        let mut tree = create_test_tree();
        assert!(tree.update(&Fr::from(4u64), Fr::one()).is_err());
        assert!(tree.insert(Fr::from(1u64), Fr::one()).is_err());
    }

    #[test]
    fn test_too_deep_path_rejected() {
        // keys sharing their 12 low bits force a leaf below level 10
        let a = Fr::from(1u64);
        let b = Fr::from(1u64 + (1 << 12));
        let tree = SparseMerkleTree::from_leaves([(a, Fr::one()), (b, Fr::one())]).unwrap();
        assert!(pad_siblings(tree.siblings(&a).unwrap()).is_err());
    }

    proptest! {
        #[test]
        fn prop_update_order_does_not_change_root(
            values in proptest::collection::vec(1u64..1_000_000, 4),
            swap in any::<bool>(),
        ) {
            let mut forward = create_test_tree();
            let mut backward = create_test_tree();
            let keys = [1u64, 2, 5, 6];

            for (k, v) in keys.iter().zip(&values) {
                forward.update(&Fr::from(*k), Fr::from(*v)).unwrap();
            }
            let mut order: Vec<usize> = (0..4).rev().collect();
            if swap {
                order.swap(0, 1);
            }
            for i in order {
                let proof = backward.update(&Fr::from(keys[i]), Fr::from(values[i])).unwrap();
                prop_assert!(verify_update(&proof).unwrap());
            }

            prop_assert_eq!(forward.root().unwrap(), backward.root().unwrap());
        }
    }
}
