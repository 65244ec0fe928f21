//! Binding proofs to a verifier context
//!
//! A verifier hands the holder a nonce, a hash of its request and a session
//! id. They reach the circuit as two public inputs:
//! - `signalHash` commits to all three, so a proof answers one request only;
//! - `nullifierSeed` depends on the request hash alone, so the same holder
//!   gets the same nullifier across sessions of one verifier context.

use crate::error::{AadharError, Result};
use ark_bn254::Fr;
use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Context for binding proofs to specific sessions/requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofContext {
    /// Random 32-byte nonce from the verifier
    pub nonce: [u8; 32],
    /// SHA256 hash of the request context
    pub context_hash: [u8; 32],
    /// 16-byte session identifier
    pub session_id: [u8; 16],
}

impl ProofContext {
    pub fn new(nonce: [u8; 32], context_hash: [u8; 32], session_id: [u8; 16]) -> Self {
        Self {
            nonce,
            context_hash,
            session_id,
        }
    }

    /// SHA-256 over all three values
    pub fn binding_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.nonce);
        hasher.update(self.context_hash);
        hasher.update(self.session_id);
        hasher.finalize().into()
    }

    /// Binding hash as a field element (top 3 bits cleared)
    pub fn signal_hash(&self) -> Fr {
        digest_to_field(self.binding_hash())
    }

    /// Nullifier scope of the request context
    pub fn nullifier_seed(&self) -> Fr {
        digest_to_field(self.context_hash)
    }

    /// Encode context as hex strings for transport
    pub fn to_hex_strings(&self) -> ProofContextHex {
        ProofContextHex {
            nonce: format!("0x{}", hex::encode(self.nonce)),
            context_hash: format!("0x{}", hex::encode(self.context_hash)),
            session_id: format!("0x{}", hex::encode(self.session_id)),
        }
    }

    /// Decode context from hex strings
    pub fn from_hex_strings(hex: &ProofContextHex) -> Result<Self> {
        Ok(Self {
            nonce: decode_hex_array(&hex.nonce, "nonce")?,
            context_hash: decode_hex_array(&hex.context_hash, "context_hash")?,
            session_id: decode_hex_array(&hex.session_id, "session_id")?,
        })
    }
}

/// Hex-encoded version of ProofContext for JSON serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofContextHex {
    pub nonce: String,        // "0x..." (32 bytes hex)
    pub context_hash: String, // "0x..." (32 bytes hex)
    pub session_id: String,   // "0x..." (16 bytes hex)
}

fn digest_to_field(mut digest: [u8; 32]) -> Fr {
    digest[0] &= 0x1f;
    Fr::from_be_bytes_mod_order(&digest)
}

fn decode_hex_array<const N: usize>(hex_str: &str, field_name: &str) -> Result<[u8; N]> {
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let bytes = hex::decode(hex_str)
        .map_err(|e| AadharError::InvalidInput(format!("Invalid hex for {}: {}", field_name, e)))?;

    bytes.try_into().map_err(|bytes: Vec<u8>| {
        AadharError::InvalidInput(format!("{} must be {} bytes, got {}", field_name, N, bytes.len()))
    })
}
