//! In-memory key-value store
//!
//! Counts `set`, `remove` and `flush` calls so tests can check how the
//! facade drives a store without touching real platform state.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::error::Result;

/// In-memory test double for [`KeyValueStore`]
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    set_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    flush_calls: AtomicUsize,
    flush_result: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            set_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
            flush_calls: AtomicUsize::new(0),
            flush_result: AtomicBool::new(true),
        }
    }

    /// Make subsequent `flush` calls report `result`
    pub fn set_flush_result(&self, result: bool) {
        self.flush_result.store(result, Ordering::SeqCst);
    }

    /// Put bytes in place without counting a `set` call
    pub async fn insert_raw(&self, key: &str, value: &[u8]) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn flush_calls(&self) -> usize {
        self.flush_calls.load(Ordering::SeqCst)
    }

    /// Drop all entries and zero the counters
    pub async fn reset(&self) {
        self.entries.write().await.clear();
        self.set_calls.store(0, Ordering::SeqCst);
        self.remove_calls.store(0, Ordering::SeqCst);
        self.flush_calls.store(0, Ordering::SeqCst);
        self.flush_result.store(true, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn flush(&self) -> bool {
        self.flush_calls.fetch_add(1, Ordering::SeqCst);
        self.flush_result.load(Ordering::SeqCst)
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory Store"
    }
}
