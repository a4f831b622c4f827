//! On-disk format shared by the file-backed key-value stores
//!
//! Values are opaque bytes, kept base64-encoded inside a versioned JSON map.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Result, StorageError};

const FORMAT_VERSION: u32 = 1;

/// File format for a persisted key-value map
#[derive(Debug, Serialize, Deserialize)]
struct EntryFile {
    version: u32,
    entries: BTreeMap<String, String>,
}

fn parse_entries(path: &Path, contents: &str) -> Result<HashMap<String, String>> {
    let file: EntryFile = serde_json::from_str(contents)
        .map_err(|e| StorageError::KeyValue(format!("corrupt store file {:?}: {}", path, e)))?;

    Ok(file.entries.into_iter().collect())
}

/// Read every entry from `path`. A missing file is an empty map.
pub(super) async fn read_entries(path: &Path) -> Result<HashMap<String, String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => parse_entries(path, &contents),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(e.into()),
    }
}

/// Read the entries a store starts from.
///
/// A file that cannot be parsed is renamed to `<file>.corrupt` and the store
/// starts empty, so one bad file does not take the whole context down.
/// Runs once when a store is opened, hence the blocking read.
pub(super) fn open_entries(path: &Path) -> Result<HashMap<String, String>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };

    match parse_entries(path, &contents) {
        Ok(entries) => Ok(entries),
        Err(e) => {
            let quarantine = quarantine_path(path);
            warn!("{}; moving it to {:?} and starting empty", e, quarantine);
            std::fs::rename(path, &quarantine)?;
            Ok(HashMap::new())
        }
    }
}

/// Where an unreadable store file is moved aside
pub(super) fn quarantine_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}

/// Write every entry to `path` atomically via a temp file
pub(super) async fn write_entries(path: &Path, entries: &HashMap<String, String>) -> Result<()> {
    let file = EntryFile {
        version: FORMAT_VERSION,
        entries: entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    };

    let contents = serde_json::to_string_pretty(&file)
        .map_err(|e| StorageError::KeyValue(e.to_string()))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    let written = match tokio::fs::write(&temp_path, &contents).await {
        Ok(()) => tokio::fs::rename(&temp_path, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }

    Ok(())
}

/// Base64 encode bytes
pub(super) fn encode_value(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Base64 decode string
pub(super) fn decode_value(encoded: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| StorageError::KeyValue(format!("Base64 decode error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");

        assert!(read_entries(&path).await.unwrap().is_empty());
        assert!(open_entries(&path).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_creates_parent_and_leaves_no_temp() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("store.json");

        let mut entries = HashMap::new();
        entries.insert("a".to_string(), encode_value(b"1"));
        write_entries(&path, &entries).await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let read = read_entries(&path).await.unwrap();
        assert_eq!(decode_value(&read["a"]).unwrap(), b"1".to_vec());
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(read_entries(&path).await, Err(StorageError::KeyValue(_))));
    }

    #[test]
    fn test_open_moves_corrupt_file_aside() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "{").unwrap();

        let entries = open_entries(&path).unwrap();

        assert!(entries.is_empty());
        assert!(!path.exists());
        let quarantined = temp_dir.path().join("store.json.corrupt");
        assert_eq!(std::fs::read_to_string(quarantined).unwrap(), "{");
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp() {
        let temp_dir = TempDir::new().unwrap();
        // A non-empty directory at the target makes the rename fail
        let path = temp_dir.path().join("store.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let result = write_entries(&path, &HashMap::new()).await;

        assert!(matches!(result, Err(StorageError::Io(_))));
        assert!(!path.with_extension("tmp").exists());
    }
}
