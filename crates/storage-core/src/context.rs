//! Handles shared by every [`Storage`](crate::Storage) instance
//!
//! The context is the only place platform lookups happen. Build it once at
//! startup and hand an `Arc` of it to each storage instance.

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::{StorageConfig, StorageRoots, DEFAULT_NAMESPACE};
use crate::error::Result;
use crate::kv::{KeyValueStore, MemoryStore, PreferenceStore, SyncedStore};

/// Resolved roots, key namespace and key-value store handles
pub struct StorageContext {
    namespace: String,
    roots: StorageRoots,
    preferences: Arc<dyn KeyValueStore>,
    cloud: Arc<dyn KeyValueStore>,
}

impl StorageContext {
    /// Create a context from explicit parts
    pub fn new(
        namespace: impl Into<String>,
        roots: StorageRoots,
        preferences: Arc<dyn KeyValueStore>,
        cloud: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            roots,
            preferences,
            cloud,
        }
    }

    /// Resolve roots and open the preference and synced stores.
    ///
    /// Fails with [`StorageError::Environment`](crate::StorageError::Environment)
    /// when the platform cannot supply a required directory.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        config.validate()?;
        let roots = StorageRoots::resolve(config)?;

        let preferences = PreferenceStore::open(&roots.preferences_dir, &config.namespace)?;
        let cloud = SyncedStore::open(&roots.cloud_dir)?;

        info!(
            "Storage context ready (namespace: {}, preferences: {}, cloud: {})",
            config.namespace,
            preferences.backend_name(),
            cloud.backend_name()
        );

        Ok(Self::new(
            config.namespace.clone(),
            roots,
            Arc::new(preferences),
            Arc::new(cloud),
        ))
    }

    /// Default config with `TYPED_STORAGE_*` environment overrides
    pub fn from_env() -> Result<Self> {
        Self::from_config(&StorageConfig::from_env())
    }

    /// Filesystem roots under `base` and in-memory key-value stores
    pub fn in_memory(base: &Path) -> Self {
        let roots = StorageRoots::new(
            base.join("cache"),
            base.join("documents"),
            base.join("preferences"),
            base.join("cloud"),
        );

        Self::new(
            DEFAULT_NAMESPACE,
            roots,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    /// Replace the cloud store (e.g. with a test double)
    pub fn with_cloud_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.cloud = store;
        self
    }

    /// Replace the preference store
    pub fn with_preference_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.preferences = store;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn roots(&self) -> &StorageRoots {
        &self.roots
    }

    pub fn preferences(&self) -> &Arc<dyn KeyValueStore> {
        &self.preferences
    }

    pub fn cloud(&self) -> &Arc<dyn KeyValueStore> {
        &self.cloud
    }
}
