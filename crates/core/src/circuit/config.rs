//! Circuit configuration
//!
//! A configuration fixes the shape of one circuit instance:
//! - `max_data_bytes`: capacity of the padded QR buffer (a multiple of 64)
//! - `reveal`: which attributes are packed into `revealedDataPacked`
//! - `trusted_key_hashes`: optional set of accepted issuer key commitments

use crate::error::{AadharError, Result};
use crate::field::decimal_vec;
use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default capacity: 24 SHA-256 blocks
pub const DEFAULT_MAX_DATA_BYTES: usize = 1536;

/// Largest capacity the photo shifter can address
pub const MAX_SUPPORTED_DATA_BYTES: usize = 2048;

/// Attributes disclosed through `revealedDataPacked`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealPolicy {
    pub age_above_18: bool,
    pub gender: bool,
    pub pin_code: bool,
    pub state: bool,
}

impl Default for RevealPolicy {
    fn default() -> Self {
        Self {
            age_above_18: true,
            gender: false,
            pin_code: false,
            state: false,
        }
    }
}

impl RevealPolicy {
    /// Disclose every supported attribute
    pub fn all() -> Self {
        Self {
            age_above_18: true,
            gender: true,
            pin_code: true,
            state: true,
        }
    }

    /// Disclose nothing
    pub fn none() -> Self {
        Self {
            age_above_18: false,
            gender: false,
            pin_code: false,
            state: false,
        }
    }
}

/// Shape and policy of one circuit instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    pub max_data_bytes: usize,
    pub reveal: RevealPolicy,
    /// Poseidon hashes of accepted issuer keys; empty accepts any key
    #[serde(with = "decimal_vec")]
    pub trusted_key_hashes: Vec<Fr>,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            max_data_bytes: DEFAULT_MAX_DATA_BYTES,
            reveal: RevealPolicy::default(),
            trusted_key_hashes: Vec::new(),
        }
    }
}

impl CircuitConfig {
    /// Default configuration with a custom capacity
    pub fn with_capacity(max_data_bytes: usize) -> Self {
        Self {
            max_data_bytes,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_data_bytes == 0 || self.max_data_bytes % 64 != 0 {
            return Err(AadharError::InvalidConfig(format!(
                "max_data_bytes must be a positive multiple of 64, got {}",
                self.max_data_bytes
            )));
        }
        if self.max_data_bytes > MAX_SUPPORTED_DATA_BYTES {
            return Err(AadharError::InvalidConfig(format!(
                "max_data_bytes {} exceeds {}",
                self.max_data_bytes, MAX_SUPPORTED_DATA_BYTES
            )));
        }
        Ok(())
    }

    /// Number of SHA-256 blocks the capacity spans
    pub fn max_blocks(&self) -> usize {
        self.max_data_bytes / 64
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading circuit configuration: {}", path.display());
        let config: Self = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }
}

/// Create the default circuit configuration
pub fn create_config() -> CircuitConfig {
    let config = CircuitConfig::default();
    log::debug!(
        "Circuit configuration: {} bytes, reveal {:?}",
        config.max_data_bytes,
        config.reveal
    );
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_config() {
        let config = create_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_blocks(), 24);
        assert!(config.reveal.age_above_18);
        assert!(!config.reveal.state);
    }

    #[test]
    fn test_invalid_capacity() {
        assert!(CircuitConfig::with_capacity(100).validate().is_err());
        assert!(CircuitConfig::with_capacity(0).validate().is_err());
        assert!(CircuitConfig::with_capacity(4096).validate().is_err());
        assert!(CircuitConfig::with_capacity(384).validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: CircuitConfig =
            serde_json::from_str(r#"{"max_data_bytes": 512, "reveal": {"state": true}}"#).unwrap();
        assert_eq!(config.max_data_bytes, 512);
        assert!(config.reveal.state);
        assert!(config.reveal.age_above_18);
        assert!(config.trusted_key_hashes.is_empty());
    }
}
