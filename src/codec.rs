//! Object codec: serialize-then-compress and its inverse.
//!
//! Format (before compression): ['G','S','K','O'][version][bincode payload...]
//! - Magic: 4 bytes "GSKO"
//! - Version: 1 byte (0x01 = bincode 1.x, fixed-int little endian)
//! - Payload: remaining bytes

use crate::compression::{self, CompressionError, CorruptDataError};
use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

const MAGIC: &[u8; 4] = b"GSKO";
const FORMAT_VERSION_1: u8 = 0x01;
const HEADER_SIZE: usize = 4 + 1;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("failed to encode object: {0}")]
    Encode(#[from] bincode::Error),
    #[error(transparent)]
    Compression(#[from] CompressionError),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializationError {
    #[error(transparent)]
    Corrupt(#[from] CorruptDataError),
    #[error("serialized object too short")]
    TooShort,
    #[error("invalid magic bytes (not a serialized Giskard object)")]
    InvalidMagic,
    #[error("unsupported object format version: {0}")]
    UnsupportedVersion(u8),
    #[error("failed to decode object: {0}")]
    Decode(#[from] bincode::Error),
}

// Same settings as `bincode::serialize`, but trailing bytes are an error.
fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Serialize `value` and compress the result.
pub fn serialize_compress<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let payload = bincode_options().serialize(value)?;

    let mut framed = Vec::with_capacity(HEADER_SIZE + payload.len());
    framed.extend_from_slice(MAGIC);
    framed.push(FORMAT_VERSION_1);
    framed.extend_from_slice(&payload);

    Ok(compression::compress(&framed)?)
}

/// Decompress `data` and deserialize the object written by [`serialize_compress`].
pub fn load_decompress<T: DeserializeOwned>(data: &[u8]) -> Result<T, DeserializationError> {
    let framed = compression::decompress(data)?;

    if framed.len() < HEADER_SIZE {
        return Err(DeserializationError::TooShort);
    }
    if &framed[0..4] != MAGIC {
        return Err(DeserializationError::InvalidMagic);
    }
    let version = framed[4];
    if version != FORMAT_VERSION_1 {
        return Err(DeserializationError::UnsupportedVersion(version));
    }

    Ok(bincode_options().deserialize(&framed[HEADER_SIZE..])?)
}
