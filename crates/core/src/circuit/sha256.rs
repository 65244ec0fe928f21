//! SHA-256 over a padded buffer with a private message length
//!
//! The buffer is already SHA-256 padded and zero-filled to the capacity. The
//! compression runs over every block, and the state after block `i` is
//! selected when `paddedLength == 64·(i + 1)`. Words are little-endian
//! vectors of [`Boolean`]s.

use crate::circuit::range::{enforce_bits, sum};
use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

const BLOCK_BYTES: usize = 64;

const IV: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

const K: [u32; 64] = [
    0x428a2f98, 0x71374491, 0xb5c0fbcf, 0xe9b5dba5, 0x3956c25b, 0x59f111f1, 0x923f82a4, 0xab1c5ed5,
    0xd807aa98, 0x12835b01, 0x243185be, 0x550c7dc3, 0x72be5d74, 0x80deb1fe, 0x9bdc06a7, 0xc19bf174,
    0xe49b69c1, 0xefbe4786, 0x0fc19dc6, 0x240ca1cc, 0x2de92c6f, 0x4a7484aa, 0x5cb0a9dc, 0x76f988da,
    0x983e5152, 0xa831c66d, 0xb00327c8, 0xbf597fc7, 0xc6e00bf3, 0xd5a79147, 0x06ca6351, 0x14292967,
    0x27b70a85, 0x2e1b2138, 0x4d2c6dfc, 0x53380d13, 0x650a7354, 0x766a0abb, 0x81c2c92e, 0x92722c85,
    0xa2bfe8a1, 0xa81a664b, 0xc24b8b70, 0xc76c51a3, 0xd192e819, 0xd6990624, 0xf40e3585, 0x106aa070,
    0x19a4c116, 0x1e376c08, 0x2748774c, 0x34b0bcb5, 0x391c0cb3, 0x4ed8aa4a, 0x5b9cca4f, 0x682e6ff3,
    0x748f82ee, 0x78a5636f, 0x84c87814, 0x8cc70208, 0x90befffa, 0xa4506ceb, 0xbef9a3f7, 0xc67178f2,
];

type Word = Vec<Boolean<Fr>>;

/// A range-checked byte with its little-endian bits
#[derive(Clone)]
pub struct ByteVar {
    pub value: FpVar<Fr>,
    pub bits: Vec<Boolean<Fr>>,
}

impl ByteVar {
    pub fn new_witness(cs: ConstraintSystemRef<Fr>, byte: u8) -> Result<Self, SynthesisError> {
        let bits = (0..8)
            .map(|i| Boolean::new_witness(cs.clone(), || Ok((byte >> i) & 1 == 1)))
            .collect::<Result<Vec<_>, _>>()?;
        let value = Boolean::le_bits_to_fp_var(&bits)?;
        Ok(Self { value, bits })
    }
}

/// Allocate a private byte buffer
pub fn alloc_bytes(cs: ConstraintSystemRef<Fr>, bytes: &[u8]) -> Result<Vec<ByteVar>, SynthesisError> {
    bytes.iter().map(|b| ByteVar::new_witness(cs.clone(), *b)).collect()
}

/// Digest and block selectors of a padded buffer
pub struct Sha256Output {
    /// Digest as an integer, little-endian bits
    pub digest_bits: Vec<Boolean<Fr>>,
    /// `1` for the last block of the message
    pub is_last: Vec<Boolean<Fr>>,
    /// `1` for blocks inside the message
    pub block_active: Vec<FpVar<Fr>>,
}

fn constant_word(value: u32) -> Word {
    (0..32).map(|i| Boolean::constant((value >> i) & 1 == 1)).collect()
}

fn rotr(word: &Word, n: usize) -> Word {
    (0..32).map(|i| word[(i + n) % 32].clone()).collect()
}

fn shr(word: &Word, n: usize) -> Word {
    (0..32)
        .map(|i| word.get(i + n).cloned().unwrap_or(Boolean::FALSE))
        .collect()
}

fn xor3(a: &Word, b: &Word, c: &Word) -> Result<Word, SynthesisError> {
    a.iter()
        .zip(b)
        .zip(c)
        .map(|((x, y), z)| x.xor(y)?.xor(z))
        .collect()
}

fn ch(e: &Word, f: &Word, g: &Word) -> Result<Word, SynthesisError> {
    e.iter()
        .zip(f)
        .zip(g)
        .map(|((e, f), g)| e.and(&f.xor(g)?)?.xor(g))
        .collect()
}

fn maj(a: &Word, b: &Word, c: &Word) -> Result<Word, SynthesisError> {
    a.iter()
        .zip(b)
        .zip(c)
        .map(|((a, b), c)| a.and(b)?.xor(&c.and(&a.xor(b)?)?))
        .collect()
}

/// Sum words modulo 2^32
fn add_mod32(cs: &ConstraintSystemRef<Fr>, words: &[&Word], constant: u32) -> Result<Word, SynthesisError> {
    let mut terms = words
        .iter()
        .map(|w| Boolean::le_bits_to_fp_var(w))
        .collect::<Result<Vec<_>, _>>()?;
    terms.push(FpVar::constant(Fr::from(constant)));

    let carry_bits = usize::BITS as usize - terms.len().leading_zeros() as usize;
    let mut bits = enforce_bits(cs.clone(), &sum(&terms), 32 + carry_bits)?;
    bits.truncate(32);
    Ok(bits)
}

/// Big-endian word from four bytes
fn word_from_bytes(bytes: &[ByteVar]) -> Word {
    bytes.iter().rev().flat_map(|b| b.bits.iter().cloned()).collect()
}

fn compress(cs: &ConstraintSystemRef<Fr>, state: &[Word], block: &[ByteVar]) -> Result<Vec<Word>, SynthesisError> {
    let mut w: Vec<Word> = block.chunks(4).map(word_from_bytes).collect();
    for t in 16..64 {
        let s0 = xor3(&rotr(&w[t - 15], 7), &rotr(&w[t - 15], 18), &shr(&w[t - 15], 3))?;
        let s1 = xor3(&rotr(&w[t - 2], 17), &rotr(&w[t - 2], 19), &shr(&w[t - 2], 10))?;
        let next = add_mod32(cs, &[&s1, &w[t - 7], &s0, &w[t - 16]], 0)?;
        w.push(next);
    }

    let mut v: Vec<Word> = state.to_vec();
    for t in 0..64 {
        let s1 = xor3(&rotr(&v[4], 6), &rotr(&v[4], 11), &rotr(&v[4], 25))?;
        let ch = ch(&v[4], &v[5], &v[6])?;
        let s0 = xor3(&rotr(&v[0], 2), &rotr(&v[0], 13), &rotr(&v[0], 22))?;
        let maj = maj(&v[0], &v[1], &v[2])?;

        let e = add_mod32(cs, &[&v[3], &v[7], &s1, &ch, &w[t]], K[t])?;
        let a = add_mod32(cs, &[&v[7], &s1, &ch, &w[t], &s0, &maj], K[t])?;

        v.rotate_right(1);
        v[0] = a;
        v[4] = e;
    }

    state
        .iter()
        .zip(&v)
        .map(|(h, x)| add_mod32(cs, &[h, x], 0))
        .collect()
}

/// Hash the first `padded_len` bytes of `data`
///
/// Unsatisfiable unless `padded_len` is a positive multiple of 64 no larger
/// than `data.len()` and every byte past `padded_len` is zero.
pub fn sha256_padded(
    cs: ConstraintSystemRef<Fr>,
    data: &[ByteVar],
    padded_len: &FpVar<Fr>,
) -> Result<Sha256Output, SynthesisError> {
    if data.is_empty() || data.len() % BLOCK_BYTES != 0 {
        return Err(SynthesisError::Unsatisfiable);
    }
    let blocks = data.len() / BLOCK_BYTES;

    let is_last = (0..blocks)
        .map(|i| padded_len.is_eq(&FpVar::constant(Fr::from(((i + 1) * BLOCK_BYTES) as u64))))
        .collect::<Result<Vec<_>, _>>()?;
    let selectors: Vec<FpVar<Fr>> = is_last.iter().cloned().map(FpVar::from).collect();
    sum(&selectors).enforce_equal(&FpVar::one())?;

    let block_active: Vec<FpVar<Fr>> = (0..blocks).map(|i| sum(&selectors[i..])).collect();
    for (i, block) in data.chunks(BLOCK_BYTES).enumerate() {
        let inactive = FpVar::one() - &block_active[i];
        for byte in block {
            inactive.mul_equals(&byte.value, &FpVar::zero())?;
        }
    }

    let mut state: Vec<Word> = IV.iter().map(|h| constant_word(*h)).collect();
    let mut selected: Vec<Vec<FpVar<Fr>>> = vec![Vec::with_capacity(blocks); 8];
    for (i, block) in data.chunks(BLOCK_BYTES).enumerate() {
        state = compress(&cs, &state, block)?;
        for (j, word) in state.iter().enumerate() {
            selected[j].push(&selectors[i] * &Boolean::le_bits_to_fp_var(word)?);
        }
    }

    let mut digest_bits = vec![Boolean::FALSE; 256];
    for (j, terms) in selected.iter().enumerate() {
        let word_bits = enforce_bits(cs.clone(), &sum(terms), 32)?;
        for (t, bit) in word_bits.into_iter().enumerate() {
            digest_bits[32 * (7 - j) + t] = bit;
        }
    }

    Ok(Sha256Output {
        digest_bits,
        is_last,
        block_active,
    })
}
