//! Key-value store trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// Capability shared by every key-based backend
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store bytes under a key, replacing any previous value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve the bytes stored under a key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Ask the store to propagate pending writes.
    ///
    /// Best effort: `true` means the request was accepted, not that the
    /// data is durable everywhere.
    async fn flush(&self) -> bool;

    /// Get a human-readable name for this store
    fn backend_name(&self) -> &'static str;
}
