//! Cloud-synchronized key-value store
//!
//! Writes land in a local pending buffer and become visible to other
//! processes only after [`flush`](KeyValueStore::flush), which merges the
//! buffer with the shared file in the sync directory and pulls in whatever
//! other clients published. Point the directory at a folder mirrored by a
//! sync client to share values between machines.
//!
//! The store is eventually consistent: a value set here is not observed by
//! another instance until this one flushes and the other one flushes too.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::file::{decode_value, encode_value, open_entries, read_entries, write_entries};
use super::KeyValueStore;
use crate::error::Result;

const SYNC_FILE_NAME: &str = "ubiquitous-kv.json";

#[derive(Debug, Default)]
struct SyncState {
    /// Last snapshot pulled from the sync directory
    synced: HashMap<String, String>,
    /// Local changes not yet published; `None` marks a removal
    pending: HashMap<String, Option<String>>,
}

/// Key-value store synchronized through a shared directory
pub struct SyncedStore {
    file_path: PathBuf,
    state: RwLock<SyncState>,
}

impl SyncedStore {
    /// Open the store published in `sync_dir`.
    ///
    /// An unreadable shared file is moved aside to `<file>.corrupt` and the
    /// store starts empty.
    pub fn open(sync_dir: &Path) -> Result<Self> {
        let file_path = sync_dir.join(SYNC_FILE_NAME);
        let synced = open_entries(&file_path)?;
        debug!("Synced store opened at {:?} with {} entries", file_path, synced.len());

        Ok(Self {
            file_path,
            state: RwLock::new(SyncState {
                synced,
                pending: HashMap::new(),
            }),
        })
    }

    /// Number of local changes waiting for the next flush
    pub async fn pending_changes(&self) -> usize {
        self.state.read().await.pending.len()
    }

    /// Get the path of the shared file
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Pull the shared file, apply pending changes on top, publish the result
    async fn synchronize(&self) -> Result<usize> {
        let mut state = self.state.write().await;

        // Re-read so changes published by other clients since our last sync survive
        let mut merged = read_entries(&self.file_path).await?;
        let published = state.pending.len();

        for (key, change) in state.pending.iter() {
            match change {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        if published > 0 {
            write_entries(&self.file_path, &merged).await?;
        }

        state.synced = merged;
        state.pending.clear();
        Ok(published)
    }
}

#[async_trait]
impl KeyValueStore for SyncedStore {
    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .pending
            .insert(key.to_string(), Some(encode_value(value)));
        debug!("Queued synced key: {}", key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let state = self.state.read().await;

        let encoded = match state.pending.get(key) {
            Some(change) => change.as_ref(),
            None => state.synced.get(key),
        };

        encoded.map(|value| decode_value(value)).transpose()
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.pending.insert(key.to_string(), None);
        debug!("Queued removal of synced key: {}", key);
        Ok(())
    }

    async fn flush(&self) -> bool {
        match self.synchronize().await {
            Ok(published) => {
                debug!("Synchronized {} change(s) to {:?}", published, self.file_path);
                true
            }
            Err(e) => {
                warn!("Synchronization with {:?} failed: {}", self.file_path, e);
                false
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "Synced Key-Value Store"
    }
}
