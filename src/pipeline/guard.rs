//! Size guard: reject oversized payloads before they are decoded.
//!
//! Two forms of the same ceiling:
//!
//! * [`check_raw_size`] for byte counts that are already known (fetched
//!   bodies, file lengths).
//! * [`check_encoded_size`] for base64 text. The decoded length is estimated
//!   from the text length and padding, without decoding, so a 100 MB payload
//!   costs nothing to reject. The estimate is authoritative for rejection
//!   even where malformed padding makes it inexact.

use crate::error::ImgOpsError;
use tracing::debug;

/// Reject `byte_len` when it exceeds `limit`.
pub fn check_raw_size(byte_len: u64, limit: u64) -> Result<(), ImgOpsError> {
    if byte_len > limit {
        debug!("Rejecting payload: {} bytes > {} limit", byte_len, limit);
        return Err(ImgOpsError::PayloadTooLarge {
            size: byte_len,
            limit,
        });
    }
    Ok(())
}

/// Estimated decoded length of base64 text: `3 * floor(len / 4) - padding`.
///
/// `padding` counts every `=` in the string.
pub fn estimate_decoded_size(encoded: &str) -> u64 {
    let padding = encoded.bytes().filter(|&b| b == b'=').count() as u64;
    let groups = (encoded.len() / 4) as u64;
    (3 * groups).saturating_sub(padding)
}

/// Reject base64 text whose estimated decoded size exceeds `limit`.
pub fn check_encoded_size(encoded: &str, limit: u64) -> Result<u64, ImgOpsError> {
    let estimate = estimate_decoded_size(encoded);
    check_raw_size(estimate, limit)?;
    Ok(estimate)
}
