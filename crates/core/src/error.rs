//! Error types for the anonymous Aadhaar core library

use ark_relations::r1cs::SynthesisError;
use thiserror::Error;

/// Result type alias for Aadhaar operations
pub type Result<T> = std::result::Result<T, AadharError>;

/// Error types that can occur during Aadhaar operations
#[derive(Error, Debug)]
pub enum AadharError {
    /// The constraint system has no satisfying assignment for the inputs.
    ///
    /// This is the only failure witness generation reports: a bad signature,
    /// a shifted delimiter and a stale sibling path are indistinguishable.
    #[error("No satisfying witness exists for the supplied inputs")]
    WitnessUnsatisfied,

    /// Constraint synthesis failed for a reason other than unsatisfiability
    #[error("Constraint synthesis failed: {0}")]
    SynthesisError(String),

    /// Malformed QR payload
    #[error("Malformed QR payload: {0}")]
    MalformedDocument(String),

    /// Missing required field in the QR payload
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Field present but not in the expected format
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// Cryptographic error
    #[error("Cryptographic operation failed: {0}")]
    CryptoError(String),

    /// Signature verification failed
    #[error("Signature verification failed: {0}")]
    SignatureVerificationFailed(String),

    /// Invalid certificate
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Claims tree inconsistency
    #[error("Claims tree error: {0}")]
    ClaimsTreeError(String),

    /// Invalid circuit configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    /// Base64 decode error
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Data exceeds the circuit capacity
    #[error("Data too large: {0}")]
    DataTooLarge(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<rsa::Error> for AadharError {
    fn from(err: rsa::Error) -> Self {
        AadharError::CryptoError(err.to_string())
    }
}

impl From<x509_parser::error::X509Error> for AadharError {
    fn from(err: x509_parser::error::X509Error) -> Self {
        AadharError::InvalidCertificate(err.to_string())
    }
}

impl From<SynthesisError> for AadharError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::Unsatisfiable => AadharError::WitnessUnsatisfied,
            other => AadharError::SynthesisError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AadharError::WitnessUnsatisfied;
        assert_eq!(err.to_string(), "No satisfying witness exists for the supplied inputs");

        let err = AadharError::MissingField("pin code".to_string());
        assert!(err.to_string().contains("pin code"));

        let err = AadharError::InvalidField {
            field: "dob".to_string(),
            reason: "expected DD-MM-YYYY".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid field dob: expected DD-MM-YYYY");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AadharError = io_err.into();
        assert!(matches!(err, AadharError::IoError(_)));
    }

    #[test]
    fn test_error_from_synthesis() {
        let err: AadharError = SynthesisError::Unsatisfiable.into();
        assert!(matches!(err, AadharError::WitnessUnsatisfied));

        let err: AadharError = SynthesisError::AssignmentMissing.into();
        assert!(matches!(err, AadharError::SynthesisError(_)));
    }
}
