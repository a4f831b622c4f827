//! Backend kinds and location resolution

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::config::StorageRoots;
use crate::error::{Result, StorageError};

/// Where a value is persisted
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Platform cache directory (may be purged by the OS)
    Cache,
    /// Platform document directory
    Document,
    /// Local key-value preference store
    Preferences,
    /// Cloud-synchronized key-value store
    CloudKv,
    /// Explicit root directory
    Custom(PathBuf),
}

/// Which key-value store a key lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValueTarget {
    Preferences,
    Cloud,
}

/// Physical location a `(kind, name)` pair resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A file inside the backend's application subfolder
    File {
        /// Application subfolder (created on save, possibly removed on clear)
        dir: PathBuf,
        /// Full file path
        path: PathBuf,
    },
    /// A key in one of the key-value stores
    Key { store: KeyValueTarget, key: String },
}

impl BackendKind {
    /// Short name used when building key-value keys
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Cache => "cache",
            BackendKind::Document => "document",
            BackendKind::Preferences => "preferences",
            BackendKind::CloudKv => "cloudKv",
            BackendKind::Custom(_) => "custom",
        }
    }

    /// Resolve the physical location for `name`. Pure; touches nothing on disk.
    ///
    /// Preference keys are `<namespace>.<kind>.<name>`. Cloud keys are the
    /// bare name because the cloud store has a flat namespace shared with
    /// other clients; callers keep those names unique themselves.
    ///
    /// File names must be a single path segment so every file stays inside
    /// the application subfolder.
    pub fn resolve(&self, roots: &StorageRoots, namespace: &str, name: &str) -> Result<Location> {
        if name.is_empty() {
            return Err(StorageError::InvalidName("name must not be empty".to_string()));
        }

        Ok(match self {
            BackendKind::Cache => {
                check_file_name(name)?;
                file_location(&roots.cache_dir, namespace, name)
            }
            BackendKind::Document => {
                check_file_name(name)?;
                file_location(&roots.document_dir, namespace, name)
            }
            BackendKind::Custom(root) => {
                check_file_name(name)?;
                file_location(root, namespace, name)
            }
            BackendKind::Preferences => Location::Key {
                store: KeyValueTarget::Preferences,
                key: format!("{}.{}.{}", namespace, self.name(), name),
            },
            BackendKind::CloudKv => Location::Key {
                store: KeyValueTarget::Cloud,
                key: name.to_string(),
            },
        })
    }
}

fn file_location(root: &Path, namespace: &str, name: &str) -> Location {
    let dir = root.join(namespace);
    let path = dir.join(name);
    Location::File { dir, path }
}

/// Reject names that are not a single normal path segment
fn check_file_name(name: &str) -> Result<()> {
    let is_segment = !name.contains(['/', '\\', '\0'])
        && name != "."
        && name != ".."
        && matches!(
            Path::new(name).components().next(),
            Some(Component::Normal(_))
        );

    if is_segment {
        Ok(())
    } else {
        Err(StorageError::InvalidName(format!(
            "'{}' is not a plain file name",
            name
        )))
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Custom(root) => write!(f, "custom({})", root.display()),
            other => f.write_str(other.name()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File { path, .. } => write!(f, "{}", path.display()),
            Location::Key { store, key } => write!(f, "{:?}:{}", store, key),
        }
    }
}
