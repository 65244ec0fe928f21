//! Native RSA signature verification for QR payloads
//!
//! Witness generation only reports "no satisfying witness". Callers that want
//! to know *why* a document is rejected check the signature here first.

use crate::error::{AadharError, Result};
use crate::qr::parser::split_document;
use rsa::{traits::PublicKeyParts, Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};

/// DER prefix of the SHA-256 `DigestInfo` structure
pub const SHA256_DIGEST_INFO: [u8; 19] = [
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01, 0x05,
    0x00, 0x04, 0x20,
];

/// Size of the signature appended to the signed data
pub const SIGNATURE_BYTES: usize = 256;

/// Verify the issuer signature over `signed_data`
///
/// # Arguments
/// * `signed_data` - QR payload without the trailing signature
/// * `signature` - Raw big-endian signature bytes
/// * `public_key` - Issuer key
///
/// # Returns
/// `Ok(true)` if the signature is valid
pub fn verify_signature(signed_data: &[u8], signature: &[u8], public_key: &RsaPublicKey) -> Result<bool> {
    log::info!("Verifying QR payload signature");
    log::debug!("Signed data size: {} bytes", signed_data.len());
    log::debug!("Signature size: {} bytes", signature.len());

    let hash = Sha256::digest(signed_data);
    log::debug!("Signed data hash (SHA256): {}", hex::encode(hash));

    match public_key.verify(Pkcs1v15Sign::new::<Sha256>(), &hash, signature) {
        Ok(()) => {
            log::info!("✓ Signature verification successful");
            Ok(true)
        }
        Err(e) => {
            log::warn!("✗ Signature verification failed: {}", e);
            Err(AadharError::SignatureVerificationFailed(e.to_string()))
        }
    }
}

/// Split a decompressed payload and verify its trailing signature
pub fn verify_document(document: &[u8], public_key: &RsaPublicKey) -> Result<bool> {
    let (signed_data, signature) = split_document(document)?;
    verify_signature(signed_data, signature, public_key)
}

/// EMSA-PKCS1-v1_5 encoding of a SHA-256 digest for a key of `em_len` bytes
///
/// `00 01 FF..FF 00 || DigestInfo || H`
pub fn emsa_pkcs1v15_encode(digest: &[u8; 32], em_len: usize) -> Result<Vec<u8>> {
    let t_len = SHA256_DIGEST_INFO.len() + digest.len();
    if em_len < t_len + 11 {
        return Err(AadharError::CryptoError(format!(
            "encoded message length {} too short",
            em_len
        )));
    }

    let mut em = Vec::with_capacity(em_len);
    em.push(0x00);
    em.push(0x01);
    em.resize(em_len - t_len - 1, 0xff);
    em.push(0x00);
    em.extend_from_slice(&SHA256_DIGEST_INFO);
    em.extend_from_slice(digest);
    Ok(em)
}

/// Textbook RSA check `signature^e mod n == EM(SHA-256(signed_data))`
///
/// Mirrors the arithmetic the constraint system performs.
pub fn check_raw_signature(signed_data: &[u8], signature: &[u8], public_key: &RsaPublicKey) -> Result<bool> {
    let digest: [u8; 32] = Sha256::digest(signed_data).into();
    let em = emsa_pkcs1v15_encode(&digest, public_key.size())?;
    let s = rsa::BigUint::from_bytes_be(signature);
    let m = s.modpow(public_key.e(), public_key.n());
    Ok(m == rsa::BigUint::from_bytes_be(&em))
}
