//! Issuer public key loading
//!
//! The issuer key reaches us as an X.509 certificate (PEM or DER) or as a bare
//! RSA public key (SPKI or PKCS#1 PEM).

use crate::error::{AadharError, Result};
use rsa::{pkcs1::DecodeRsaPublicKey, pkcs8::DecodePublicKey, traits::PublicKeyParts, RsaPublicKey};
use std::path::Path;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

/// Load an issuer public key from a file
pub fn load_public_key<P: AsRef<Path>>(path: P) -> Result<RsaPublicKey> {
    let path = path.as_ref();
    log::info!("Loading issuer public key: {}", path.display());
    let bytes = std::fs::read(path)?;
    parse_public_key(&bytes)
}

/// Parse an issuer public key from certificate or key bytes
pub fn parse_public_key(bytes: &[u8]) -> Result<RsaPublicKey> {
    let key = if is_pem(bytes) {
        let (_, pem) = parse_x509_pem(bytes)
            .map_err(|e| AadharError::InvalidCertificate(format!("Failed to parse PEM: {}", e)))?;

        log::debug!("PEM block: {}", pem.label);

        match pem.label.as_str() {
            "CERTIFICATE" => public_key_from_certificate(&pem.contents)?,
            "PUBLIC KEY" => RsaPublicKey::from_public_key_der(&pem.contents)
                .map_err(|e| AadharError::CryptoError(format!("Failed to parse SPKI key: {}", e)))?,
            "RSA PUBLIC KEY" => RsaPublicKey::from_pkcs1_der(&pem.contents)
                .map_err(|e| AadharError::CryptoError(format!("Failed to parse PKCS#1 key: {}", e)))?,
            other => {
                return Err(AadharError::InvalidCertificate(format!(
                    "Unsupported PEM block: {}",
                    other
                )))
            }
        }
    } else {
        public_key_from_certificate(bytes)
            .or_else(|_| RsaPublicKey::from_public_key_der(bytes))
            .or_else(|_| RsaPublicKey::from_pkcs1_der(bytes))
            .map_err(|e| AadharError::CryptoError(format!("Failed to parse DER key: {}", e)))?
    };

    log::info!("Loaded RSA public key, size: {} bits", key.size() * 8);

    Ok(key)
}

/// Whether a PEM or DER certificate is inside its validity window now
pub fn certificate_is_current(bytes: &[u8]) -> Result<bool> {
    let der = if is_pem(bytes) {
        let (_, pem) = parse_x509_pem(bytes)
            .map_err(|e| AadharError::InvalidCertificate(format!("Failed to parse PEM: {}", e)))?;
        pem.contents
    } else {
        bytes.to_vec()
    };

    let (_, cert) = X509Certificate::from_der(&der)
        .map_err(|e| AadharError::InvalidCertificate(format!("Failed to parse certificate: {}", e)))?;

    let valid = cert.validity().is_valid();
    if !valid {
        log::warn!(
            "Certificate outside validity window: {:?} to {:?}",
            cert.validity().not_before,
            cert.validity().not_after
        );
    }
    Ok(valid)
}

fn public_key_from_certificate(der: &[u8]) -> Result<RsaPublicKey> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| AadharError::InvalidCertificate(format!("Failed to parse certificate: {}", e)))?;

    log::debug!("Certificate subject: {}", cert.subject());
    log::debug!("Certificate issuer: {}", cert.issuer());

    let spki = cert.public_key().raw;
    RsaPublicKey::from_public_key_der(spki)
        .or_else(|_| RsaPublicKey::from_pkcs1_der(&cert.public_key().subject_public_key.data))
        .map_err(|e| AadharError::CryptoError(format!("Failed to parse RSA public key: {}", e)))
}

fn is_pem(bytes: &[u8]) -> bool {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    bytes[start..].starts_with(b"-----BEGIN")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.pop();
        path.pop();
        path.push("tests");
        path.push("fixtures");
        path.push(name);
        path
    }

    #[test]
    fn test_load_certificate_and_key_agree() {
        env_logger::try_init().ok();

        let from_cert = load_public_key(fixture("test_certificate.pem")).unwrap();
        let from_spki = load_public_key(fixture("test_public_key.pem")).unwrap();

        assert_eq!(from_cert.size(), 256);
        assert_eq!(from_cert, from_spki);
        assert_eq!(from_cert.e(), &rsa::BigUint::from(65537u32));
    }

    #[test]
    fn test_certificate_validity() {
        let bytes = std::fs::read(fixture("test_certificate.pem")).unwrap();
        assert!(certificate_is_current(&bytes).unwrap());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_public_key(b"not a key").is_err());
        assert!(parse_public_key(b"-----BEGIN FOO-----\nAAAA\n-----END FOO-----\n").is_err());
    }
}
