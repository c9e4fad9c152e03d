//! Serialization helpers for wire payloads.
//!
//! All lobby traffic is encoded with bincode's standard configuration. Both
//! sides must agree on it, so the helpers live here rather than in the server
//! or client crates.

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Errors raised while (de)serializing wire payloads.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("bincode encode error: {0}")]
    Encode(bincode::error::EncodeError),
    #[error("bincode decode error: {0}")]
    Decode(bincode::error::DecodeError),
}

/// Encodes a value into a bincode byte vector.
pub fn encode<T>(value: &T) -> Result<Vec<u8>, SerializationError>
where
    T: Serialize,
{
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(SerializationError::Encode)
}

/// Decodes a value from bincode bytes. Trailing bytes are rejected implicitly
/// by the framing layer, not here.
pub fn decode<T>(bytes: &[u8]) -> Result<T, SerializationError>
where
    T: DeserializeOwned,
{
    let (value, _len) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map_err(SerializationError::Decode)?;
    Ok(value)
}
