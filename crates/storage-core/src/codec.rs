//! Value codecs
//!
//! A codec turns a typed value into bytes and back. The facade never looks
//! inside the bytes, so any format that round-trips the value type works.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StorageError};

/// Encode/decode pair used by [`Storage`](crate::Storage)
pub trait Codec: Send + Sync {
    /// Encode a value to bytes
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode bytes back into a value
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// Compact JSON codec (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(StorageError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(StorageError::Decode)
    }
}

/// Indented JSON codec, for document files meant to be read by people
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyJsonCodec;

impl Codec for PrettyJsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(value).map_err(StorageError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(StorageError::Decode)
    }
}
