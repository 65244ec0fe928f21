//! Native cryptography for issuer keys and signatures

pub mod cert;
pub mod limbs;
pub mod poseidon;
pub mod rsa_verifier;

pub use cert::{load_public_key, parse_public_key};
pub use limbs::public_key_hash;
pub use poseidon::poseidon_hash;
pub use rsa_verifier::{check_raw_signature, verify_document, verify_signature};
