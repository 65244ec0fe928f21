//! SHA-256 message padding to a fixed circuit capacity

use crate::error::{AadharError, Result};
use crate::qr::{delimiter_positions, DELIMITER_COUNT};

/// SHA-256 block size in bytes
pub const BLOCK_BYTES: usize = 64;

/// Pad `data` as SHA-256 does and zero-fill to `capacity`
///
/// # Returns
/// The `capacity`-byte buffer and the padded length (a multiple of 64)
pub fn sha256_pad(data: &[u8], capacity: usize) -> Result<(Vec<u8>, usize)> {
    if capacity % BLOCK_BYTES != 0 {
        return Err(AadharError::InvalidConfig(format!(
            "capacity {} is not a multiple of {}",
            capacity, BLOCK_BYTES
        )));
    }

    let bit_len = (data.len() as u64) * 8;
    let mut padded = data.to_vec();
    padded.push(0x80);
    while padded.len() % BLOCK_BYTES != BLOCK_BYTES - 8 {
        padded.push(0);
    }
    padded.extend_from_slice(&bit_len.to_be_bytes());

    let padded_len = padded.len();
    if padded_len > capacity {
        return Err(AadharError::DataTooLarge(format!(
            "{} padded bytes exceed the {}-byte capacity",
            padded_len, capacity
        )));
    }
    padded.resize(capacity, 0);

    log::debug!("Padded {} bytes to {} ({} capacity)", data.len(), padded_len, capacity);
    Ok((padded, padded_len))
}

/// Positions of the first 18 delimiters of a padded message
pub fn find_delimiters(padded: &[u8]) -> Result<[usize; DELIMITER_COUNT]> {
    delimiter_positions(padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_message() {
        let (padded, len) = sha256_pad(&[], 128).unwrap();
        assert_eq!(len, 64);
        assert_eq!(padded.len(), 128);
        assert_eq!(padded[0], 0x80);
        assert!(padded[1..128].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_length_suffix() {
        let data = [0x61u8; 56];
        let (padded, len) = sha256_pad(&data, 256).unwrap();
        // 56 bytes leave no room for the length in the first block
        assert_eq!(len, 128);
        assert_eq!(padded[56], 0x80);
        assert_eq!(&padded[120..128], &(56u64 * 8).to_be_bytes());
    }

    #[test]
    fn test_capacity_errors() {
        assert!(matches!(sha256_pad(&[0u8; 100], 64), Err(AadharError::DataTooLarge(_))));
        assert!(matches!(sha256_pad(&[0u8; 10], 100), Err(AadharError::InvalidConfig(_))));
    }

    proptest! {
        #[test]
        fn prop_padding_shape(data in proptest::collection::vec(any::<u8>(), 0..300)) {
            let (padded, len) = sha256_pad(&data, 384).unwrap();
            prop_assert_eq!(len % BLOCK_BYTES, 0);
            prop_assert!(len >= data.len() + 9 && len < data.len() + 9 + BLOCK_BYTES);
            prop_assert_eq!(&padded[..data.len()], &data[..]);
            prop_assert!(padded[len..].iter().all(|&b| b == 0));
        }
    }
}
