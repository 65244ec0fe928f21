//! Photo extraction and packing for the nullifier

use crate::error::{AadharError, Result};
use crate::field::fr_from_le_bytes;
use crate::nullifier::PHOTO_CHUNKS;
use crate::qr::DELIMITER_COUNT;
use ark_bn254::Fr;

/// Bytes packed into one field element
pub const CHUNK_BYTES: usize = 31;

/// Photo bytes that reach the nullifier; the rest is ignored
pub const PHOTO_BYTES: usize = PHOTO_CHUNKS * CHUNK_BYTES;

/// Bytes after the 18th delimiter up to `padded_len`, zero-filled to 992
///
/// This includes the SHA-256 padding tail, exactly as the circuit sees it.
pub fn extract_photo(padded: &[u8], padded_len: usize, delimiters: &[usize; DELIMITER_COUNT]) -> Result<Vec<u8>> {
    let start = delimiters[DELIMITER_COUNT - 1] + 1;
    if padded_len > padded.len() || start > padded_len {
        return Err(AadharError::InvalidInput(format!(
            "photo start {} outside padded length {}",
            start, padded_len
        )));
    }
    let mut photo: Vec<u8> = padded[start..padded_len].iter().copied().take(PHOTO_BYTES).collect();
    photo.resize(PHOTO_BYTES, 0);
    Ok(photo)
}

/// Little-endian 31-byte chunks
pub fn bytes_to_int_chunks(bytes: &[u8]) -> Vec<Fr> {
    bytes.chunks(CHUNK_BYTES).map(fr_from_le_bytes).collect()
}

/// Pack an extracted photo into the 32 nullifier inputs
pub fn pack_photo(photo: &[u8]) -> Result<Vec<Fr>> {
    if photo.len() != PHOTO_BYTES {
        return Err(AadharError::InvalidInput(format!(
            "photo must be {} bytes, got {}",
            PHOTO_BYTES,
            photo.len()
        )));
    }
    Ok(bytes_to_int_chunks(photo))
}
