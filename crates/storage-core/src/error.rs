//! Error types for storage-core

use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode stored value: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Storage environment unavailable: {0}")]
    Environment(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Key-value store error: {0}")]
    KeyValue(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid storage name: {0}")]
    InvalidName(String),
}

impl StorageError {
    /// Whether this error came from decoding stored bytes
    pub fn is_decode(&self) -> bool {
        matches!(self, StorageError::Decode(_))
    }
}
