//! Anonymous Aadhaar core library
//!
//! This library parses decompressed Aadhaar secure QR payloads, prepares the
//! inputs of the verifier circuit and synthesizes the circuit over BN254. A
//! satisfied circuit shows that the payload carries a valid issuer signature
//! and exposes only the attributes the verifier asked for, a nullifier scoped
//! to the verifier's seed and the root of the holder's claims tree.

pub mod circuit;
pub mod claims;
pub mod context;
pub mod crypto;
pub mod error;
pub mod field;
pub mod inputs;
pub mod nullifier;
pub mod qr;

pub use circuit::{generate_witness, CircuitConfig, PublicOutputs, RevealPolicy};
pub use error::{AadharError, Result};
pub use inputs::{prepare_circuit_inputs, CircuitInputs};
