//! Storage configuration and root directory resolution
//!
//! Roots are resolved once, when the process sets up its [`StorageContext`],
//! from explicit overrides or the platform's well-known directories.
//!
//! [`StorageContext`]: crate::StorageContext

use directories::{BaseDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, StorageError};

/// Default application namespace for subfolders and key prefixes
pub const DEFAULT_NAMESPACE: &str = "com.example.storage";

const ENV_NAMESPACE: &str = "TYPED_STORAGE_NAMESPACE";
const ENV_CACHE_DIR: &str = "TYPED_STORAGE_CACHE_DIR";
const ENV_DOCUMENT_DIR: &str = "TYPED_STORAGE_DOCUMENT_DIR";
const ENV_PREFERENCES_DIR: &str = "TYPED_STORAGE_PREFERENCES_DIR";
const ENV_CLOUD_DIR: &str = "TYPED_STORAGE_CLOUD_DIR";

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Application namespace (subfolder name and key prefix)
    pub namespace: String,
    /// Override for the cache root
    pub cache_dir: Option<PathBuf>,
    /// Override for the document root
    pub document_dir: Option<PathBuf>,
    /// Override for where the preference file lives
    pub preferences_dir: Option<PathBuf>,
    /// Override for the synced store directory (e.g. a folder a sync client mirrors)
    pub cloud_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            cache_dir: None,
            document_dir: None,
            preferences_dir: None,
            cloud_dir: None,
        }
    }
}

impl StorageConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a JSON file, falling back to defaults if it is missing
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No storage config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: StorageConfig = serde_json::from_str(&contents)
            .map_err(|e| StorageError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;

        debug!("Loaded storage config from {:?}", path);
        Ok(config)
    }

    /// Apply `TYPED_STORAGE_*` environment variables on top of this config
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(namespace) = std::env::var(ENV_NAMESPACE) {
            if !namespace.is_empty() {
                self.namespace = namespace;
            }
        }
        if let Some(dir) = env_path(ENV_CACHE_DIR) {
            self.cache_dir = Some(dir);
        }
        if let Some(dir) = env_path(ENV_DOCUMENT_DIR) {
            self.document_dir = Some(dir);
        }
        if let Some(dir) = env_path(ENV_PREFERENCES_DIR) {
            self.preferences_dir = Some(dir);
        }
        if let Some(dir) = env_path(ENV_CLOUD_DIR) {
            self.cloud_dir = Some(dir);
        }
        self
    }

    /// Use the same base directory for every root (handy for tests and sandboxes)
    pub fn rooted_at(base: &Path) -> Self {
        Self {
            cache_dir: Some(base.join("cache")),
            document_dir: Some(base.join("documents")),
            preferences_dir: Some(base.join("preferences")),
            cloud_dir: Some(base.join("cloud")),
            ..Self::default()
        }
    }

    /// Check that the namespace can be used as a path segment and key prefix
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(StorageError::Config("namespace must not be empty".to_string()));
        }
        if self.namespace.contains(['/', '\\']) || self.namespace == "." || self.namespace == ".." {
            return Err(StorageError::Config(format!(
                "namespace '{}' is not a valid folder name",
                self.namespace
            )));
        }
        Ok(())
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Resolved root directories for every backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoots {
    /// Root for [`BackendKind::Cache`](crate::BackendKind::Cache)
    pub cache_dir: PathBuf,
    /// Root for [`BackendKind::Document`](crate::BackendKind::Document)
    pub document_dir: PathBuf,
    /// Directory holding the preference file
    pub preferences_dir: PathBuf,
    /// Directory the synced store publishes to
    pub cloud_dir: PathBuf,
}

impl StorageRoots {
    /// Build roots from explicit directories
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        document_dir: impl Into<PathBuf>,
        preferences_dir: impl Into<PathBuf>,
        cloud_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            document_dir: document_dir.into(),
            preferences_dir: preferences_dir.into(),
            cloud_dir: cloud_dir.into(),
        }
    }

    /// Resolve roots from config overrides, falling back to platform directories.
    ///
    /// Fails with [`StorageError::Environment`] if a root is needed and the
    /// platform cannot supply one. Call this at startup.
    pub fn resolve(config: &StorageConfig) -> Result<Self> {
        let needs_platform = config.cache_dir.is_none()
            || config.document_dir.is_none()
            || config.preferences_dir.is_none()
            || config.cloud_dir.is_none();

        let base = if needs_platform {
            Some(BaseDirs::new().ok_or_else(|| {
                StorageError::Environment("could not determine home directory".to_string())
            })?)
        } else {
            None
        };

        let cache_dir = match (&config.cache_dir, &base) {
            (Some(dir), _) => dir.clone(),
            (None, Some(base)) => base.cache_dir().to_path_buf(),
            (None, None) => return Err(missing("cache")),
        };

        let document_dir = match &config.document_dir {
            Some(dir) => dir.clone(),
            None => platform_document_dir().ok_or_else(|| missing("document"))?,
        };

        let preferences_dir = match (&config.preferences_dir, &base) {
            (Some(dir), _) => dir.clone(),
            (None, Some(base)) => base.preference_dir().to_path_buf(),
            (None, None) => return Err(missing("preferences")),
        };

        let cloud_dir = match (&config.cloud_dir, &base) {
            (Some(dir), _) => dir.clone(),
            (None, Some(base)) => base.data_dir().join(&config.namespace).join("synced"),
            (None, None) => return Err(missing("cloud")),
        };

        let roots = Self {
            cache_dir,
            document_dir,
            preferences_dir,
            cloud_dir,
        };
        debug!("Resolved storage roots: {:?}", roots);
        Ok(roots)
    }

    /// Resolve roots purely from the platform
    pub fn from_system() -> Result<Self> {
        Self::resolve(&StorageConfig::default())
    }
}

/// Platform document directory, or `~/Documents` where XDG user dirs are unset
fn platform_document_dir() -> Option<PathBuf> {
    let user = UserDirs::new()?;
    Some(
        user.document_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| user.home_dir().join("Documents")),
    )
}

fn missing(kind: &str) -> StorageError {
    StorageError::Environment(format!("could not determine the {} directory", kind))
}
