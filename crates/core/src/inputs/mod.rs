//! Circuit input preparation
//!
//! Turns a decompressed QR payload and an issuer key into the complete input
//! set of the constraint system. Malformed documents are diagnosed here with
//! specific errors; the constraint system itself only ever reports that no
//! witness exists.

pub mod padding;
pub mod photo;

use crate::circuit::config::CircuitConfig;
use crate::claims::{build_claim_updates, template_root, ClaimValues, CredentialClaims, CLAIM_COUNT, MAX_DEPTH};
use crate::crypto::limbs::{to_limbs, NUM_LIMBS};
use crate::crypto::rsa_verifier::verify_signature;
use crate::error::{AadharError, Result};
use crate::field::{decimal, decimal_matrix, decimal_vec};
use crate::nullifier::NullifierSeed;
use crate::qr::{parse_document, split_document, DELIMITER_COUNT};
use ark_bn254::Fr;
use rsa::{traits::PublicKeyParts, RsaPublicKey};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use padding::{find_delimiters, sha256_pad};
pub use photo::{extract_photo, pack_photo};

/// Every public and private input of the verifier circuit
///
/// Field elements serialize as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInputs {
    /// Signed data, SHA-256 padded and zero-filled to the capacity
    pub qr_data_padded: Vec<u8>,
    pub qr_data_padded_length: usize,
    pub delimiter_indices: Vec<usize>,
    /// 17 little-endian limbs of the signature
    #[serde(with = "decimal_vec")]
    pub signature: Vec<Fr>,
    /// 17 little-endian limbs of the issuer modulus
    #[serde(with = "decimal_vec")]
    pub pub_key: Vec<Fr>,
    #[serde(with = "decimal")]
    pub nullifier_seed: Fr,
    #[serde(with = "decimal")]
    pub signal_hash: Fr,
    #[serde(with = "decimal")]
    pub template_root: Fr,
    /// One zero-padded sibling path per claim update
    #[serde(with = "decimal_matrix")]
    pub claim_siblings: Vec<Vec<Fr>>,
    pub credential: CredentialClaims,
}

impl CircuitInputs {
    /// Check that every vector has the length the circuit expects
    pub fn validate(&self, config: &CircuitConfig) -> Result<()> {
        let check = |name: &str, actual: usize, expected: usize| -> Result<()> {
            if actual != expected {
                return Err(AadharError::InvalidInput(format!(
                    "{} has length {}, expected {}",
                    name, actual, expected
                )));
            }
            Ok(())
        };
        check("qrDataPadded", self.qr_data_padded.len(), config.max_data_bytes)?;
        check("delimiterIndices", self.delimiter_indices.len(), DELIMITER_COUNT)?;
        check("signature", self.signature.len(), NUM_LIMBS)?;
        check("pubKey", self.pub_key.len(), NUM_LIMBS)?;
        check("claimSiblings", self.claim_siblings.len(), CLAIM_COUNT)?;
        for path in &self.claim_siblings {
            check("claimSiblings row", path.len(), MAX_DEPTH)?;
        }
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Build circuit inputs from a decompressed QR payload
///
/// # Arguments
/// * `document` - `signedData || signature`
/// * `public_key` - Issuer key
/// * `config` - Circuit capacity and disclosure policy
/// * `nullifier_seed` - Verifier-chosen nullifier scope
/// * `signal_hash` - Application value bound into the proof
/// * `credential` - Holder-supplied credential metadata
pub fn prepare_circuit_inputs(
    document: &[u8],
    public_key: &RsaPublicKey,
    config: &CircuitConfig,
    nullifier_seed: NullifierSeed,
    signal_hash: Fr,
    credential: &CredentialClaims,
) -> Result<CircuitInputs> {
    log::info!("Preparing circuit inputs");
    config.validate()?;

    let parsed = parse_document(document)?;
    let (signed_data, signature) = split_document(document)?;
    verify_signature(signed_data, signature, public_key)?;

    let (padded, padded_len) = sha256_pad(signed_data, config.max_data_bytes)?;
    let delimiters = find_delimiters(&padded)?;
    log::debug!("Delimiters: {:?}", delimiters);

    let values = ClaimValues::from_document(&parsed, credential)?;
    let (updates, claims_root) = build_claim_updates(&values)?;
    log::debug!("Expected claims root: {}", crate::field::fr_to_decimal(&claims_root));

    let inputs = CircuitInputs {
        qr_data_padded: padded,
        qr_data_padded_length: padded_len,
        delimiter_indices: delimiters.to_vec(),
        signature: to_limbs(&rsa::BigUint::from_bytes_be(signature))?,
        pub_key: to_limbs(public_key.n())?,
        nullifier_seed: nullifier_seed.0,
        signal_hash,
        template_root: template_root()?,
        claim_siblings: updates.into_iter().map(|u| u.siblings).collect(),
        credential: credential.clone(),
    };
    inputs.validate(config)?;

    log::info!("✓ Circuit inputs ready ({} padded bytes)", padded_len);
    Ok(inputs)
}
