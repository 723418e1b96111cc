//! Payload compression.
//!
//! Every binary part sent to the server is a single zstd frame.

use std::io::Cursor;

/// Zstd level 3 (good balance of speed and ratio)
const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, thiserror::Error)]
#[error("compression failed: {0}")]
pub struct CompressionError(#[from] std::io::Error);

/// Input to `decompress` was not a complete zstd frame.
#[derive(Debug, thiserror::Error)]
#[error("corrupt compressed data: {0}")]
pub struct CorruptDataError(#[from] std::io::Error);

/// Compress `data` into one zstd frame. Empty input yields a valid empty frame.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    Ok(zstd::encode_all(Cursor::new(data), ZSTD_LEVEL)?)
}

/// Inverse of [`compress`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CorruptDataError> {
    Ok(zstd::decode_all(Cursor::new(data))?)
}
