//! R1CS verifier circuit for anonymous Aadhaar proofs
//!
//! The circuit proves, over the BN254 scalar field, that a padded QR payload
//! carries a valid issuer signature, decodes its attributes, folds them into
//! the claims tree and derives the holder's nullifier.
//!
//! # Gadgets
//!
//! - [`range`]: bit decomposition, range checks and masked scans
//! - [`bigint`]: 121-bit limb arithmetic and `x^65537 mod n`
//! - [`sha256`]: SHA-256 over a buffer with a private length
//! - [`poseidon`]: Poseidon sharing parameters with the native hash
//! - [`rsa`]: PKCS#1 v1.5 verification and the key commitment
//! - [`extractor`]: delimiter scan and field decoding
//! - [`claims_tree`]: the claims tree update fold
//! - [`nullifier`]: nullifier derivation
//!
//! # Entry points
//!
//! - [`AadhaarVerifierCircuit`] implements `ConstraintSynthesizer<Fr>` for
//!   any arkworks R1CS backend
//! - [`generate_witness`] synthesizes in memory and returns the public
//!   outputs

pub mod aadhaar;
pub mod bigint;
pub mod claims_tree;
pub mod config;
pub mod extractor;
pub mod nullifier;
pub mod outputs;
pub mod poseidon;
pub mod prover;
pub mod range;
pub mod rsa;
pub mod sha256;

pub use aadhaar::AadhaarVerifierCircuit;
pub use config::{create_config, CircuitConfig, RevealPolicy};
pub use outputs::{PublicOutputs, RevealedData};
pub use prover::generate_witness;
