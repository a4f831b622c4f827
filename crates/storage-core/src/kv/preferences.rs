//! Local preference store
//!
//! A small key-value store persisted as one JSON file per application
//! namespace, in the platform's preference directory. Every change is
//! written through to disk.
//!
//! The file is the only source of truth. Each write re-reads it and applies
//! one change on top, so several stores opened on the same file (for example
//! two contexts in one process) never drop each other's keys.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::file::{decode_value, encode_value, open_entries, read_entries, write_entries};
use super::KeyValueStore;
use crate::error::Result;

/// Local key-value preference store
pub struct PreferenceStore {
    file_path: PathBuf,
    /// Serializes read-modify-write cycles from this instance
    write_lock: Mutex<()>,
}

impl PreferenceStore {
    /// Open the preference file for `namespace` inside `dir`
    pub fn open(dir: &Path, namespace: &str) -> Result<Self> {
        let file_path = dir.join(format!("{}.preferences.json", namespace));
        Self::with_file(file_path)
    }

    /// Open a preference store backed by an explicit file.
    ///
    /// An unreadable file is moved aside to `<file>.corrupt` and the store
    /// starts empty.
    pub fn with_file(file_path: PathBuf) -> Result<Self> {
        let entries = open_entries(&file_path)?;
        debug!("Opened {} preferences at {:?}", entries.len(), file_path);

        Ok(Self {
            file_path,
            write_lock: Mutex::new(()),
        })
    }

    /// Get the path of the backing file
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Re-read the file, apply `change`, and write the result back.
    ///
    /// Nothing is written when `change` reports no modification.
    async fn update<F>(&self, change: F) -> Result<bool>
    where
        F: FnOnce(&mut HashMap<String, String>) -> bool,
    {
        let _guard = self.write_lock.lock().await;

        let mut entries = read_entries(&self.file_path).await?;
        if !change(&mut entries) {
            return Ok(false);
        }

        write_entries(&self.file_path, &entries).await?;
        debug!("Saved {} preferences", entries.len());
        Ok(true)
    }
}

#[async_trait]
impl KeyValueStore for PreferenceStore {
    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let encoded = encode_value(value);
        self.update(|entries| {
            entries.insert(key.to_string(), encoded);
            true
        })
        .await?;

        debug!("Stored preference: {}", key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = read_entries(&self.file_path).await?;

        match entries.get(key) {
            Some(encoded) => Ok(Some(decode_value(encoded)?)),
            None => {
                debug!("Preference not found: {}", key);
                Ok(None)
            }
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.update(|entries| entries.remove(key).is_some()).await? {
            debug!("Removed preference: {}", key);
        }

        Ok(())
    }

    /// Writes are already on disk; this only checks the file is readable
    async fn flush(&self) -> bool {
        match read_entries(&self.file_path).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Preference file {:?} is unreadable: {}", self.file_path, e);
                false
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "Preference Store"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::open(temp_dir.path(), "com.example.storage").unwrap();

        store.set("greeting", b"hello").await.unwrap();

        assert_eq!(store.get("greeting").await.unwrap(), Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::open(temp_dir.path(), "com.example.storage").unwrap();

        assert_eq!(store.get("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::open(temp_dir.path(), "com.example.storage").unwrap();

        store.set("greeting", b"hello").await.unwrap();
        store.remove("greeting").await.unwrap();
        store.remove("greeting").await.unwrap();

        assert_eq!(store.get("greeting").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = PreferenceStore::open(temp_dir.path(), "com.example.storage").unwrap();
            store.set("persistent-key", b"persistent-value").await.unwrap();
        }

        {
            let store = PreferenceStore::open(temp_dir.path(), "com.example.storage").unwrap();
            assert_eq!(
                store.get("persistent-key").await.unwrap(),
                Some(b"persistent-value".to_vec())
            );
        }
    }

    #[tokio::test]
    async fn test_file_named_after_namespace() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::open(temp_dir.path(), "org.acme").unwrap();

        store.set("k", b"v").await.unwrap();

        assert!(temp_dir.path().join("org.acme.preferences.json").exists());
        assert!(store.flush().await);
    }

    #[tokio::test]
    async fn test_two_stores_on_one_file_keep_each_others_keys() {
        let temp_dir = TempDir::new().unwrap();
        let first = PreferenceStore::open(temp_dir.path(), "com.example.storage").unwrap();
        let second = PreferenceStore::open(temp_dir.path(), "com.example.storage").unwrap();

        first.set("a", b"1").await.unwrap();
        second.set("b", b"2").await.unwrap();

        assert_eq!(first.get("b").await.unwrap(), Some(b"2".to_vec()));
        assert_eq!(second.get("a").await.unwrap(), Some(b"1".to_vec()));

        second.remove("a").await.unwrap();
        assert_eq!(first.get("a").await.unwrap(), None);
        assert_eq!(first.get("b").await.unwrap(), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn test_failed_write_changes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = PreferenceStore::open(temp_dir.path(), "com.example.storage").unwrap();
        store.set("kept", b"1").await.unwrap();

        // A directory where the temp file goes makes every write fail
        std::fs::create_dir_all(store.file_path().with_extension("tmp").join("x")).unwrap();

        assert!(store.set("k", b"v").await.is_err());
        assert!(store.remove("kept").await.is_err());

        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.get("kept").await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_open_quarantines_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("com.example.storage.preferences.json");
        std::fs::write(&path, "{").unwrap();

        let store = PreferenceStore::open(temp_dir.path(), "com.example.storage").unwrap();

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(temp_dir
            .path()
            .join("com.example.storage.preferences.json.corrupt")
            .exists());

        store.set("k", b"v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
    }
}
