//! Typed storage facade
//!
//! [`Storage`] binds a backend kind and a logical name to one value type and
//! offers the same save/load/clear contract for every backend:
//!
//! - `save` replaces whatever was stored at the location
//! - `stored_value` reads the current value, treating unreadable data as absent
//! - `clear` removes the value; clearing an empty location is a no-op
//!
//! Filesystem saves re-check the application subfolder every time, because
//! `clear` removes the subfolder once it is empty.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::backend::{BackendKind, KeyValueTarget, Location};
use crate::codec::{Codec, JsonCodec};
use crate::context::StorageContext;
use crate::error::Result;
use crate::kv::KeyValueStore;

/// Typed persistence for one value at one location
pub struct Storage<T, C = JsonCodec> {
    kind: BackendKind,
    name: String,
    location: Location,
    context: Arc<StorageContext>,
    /// Cloud store injected for this instance only
    cloud: Option<Arc<dyn KeyValueStore>>,
    codec: C,
    _value: PhantomData<fn() -> T>,
}

impl<T> Storage<T, JsonCodec>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a storage for `name` under `kind`, encoded as JSON
    pub fn new(
        context: Arc<StorageContext>,
        kind: BackendKind,
        name: impl Into<String>,
    ) -> Result<Self> {
        Self::with_codec(context, kind, name, JsonCodec)
    }
}

impl<T, C> Storage<T, C>
where
    T: Serialize + DeserializeOwned,
    C: Codec,
{
    /// Create a storage with an explicit codec.
    ///
    /// Fails with [`StorageError::InvalidName`](crate::StorageError::InvalidName)
    /// if `name` is empty, or is not a plain file name for a filesystem kind.
    pub fn with_codec(
        context: Arc<StorageContext>,
        kind: BackendKind,
        name: impl Into<String>,
        codec: C,
    ) -> Result<Self> {
        let name = name.into();
        let location = kind.resolve(context.roots(), context.namespace(), &name)?;

        Ok(Self {
            kind,
            name,
            location,
            context,
            cloud: None,
            codec,
            _value: PhantomData,
        })
    }

    /// Use `store` instead of the context's cloud store
    pub fn with_cloud_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.cloud = Some(store);
        self
    }

    pub fn kind(&self) -> &BackendKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical location this storage reads and writes
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Encode `value` and replace whatever is stored at this location
    pub async fn save(&self, value: &T) -> Result<()> {
        let bytes = self.codec.encode(value).map_err(|e| {
            warn!("Not saving {}: {}", self.location, e);
            e
        })?;

        match &self.location {
            Location::File { dir, path } => {
                ensure_directory(dir).await?;
                write_file(path, &bytes).await.map_err(|e| {
                    error!("Failed to write {:?}: {}", path, e);
                    e
                })?;
            }
            Location::Key { store, key } => {
                let kv = self.kv_store(*store);
                kv.set(key, &bytes).await.map_err(|e| {
                    error!("Failed to store {} in {}: {}", key, kv.backend_name(), e);
                    e
                })?;

                if *store == KeyValueTarget::Cloud && !kv.flush().await {
                    warn!("{} did not accept flush after saving {}", kv.backend_name(), key);
                }
            }
        }

        debug!("Saved {} bytes to {}", bytes.len(), self.location);
        Ok(())
    }

    /// Current value, or `None` if nothing readable is stored.
    ///
    /// Missing data, unreadable data and data that no longer decodes all
    /// come back as `None`; the cause is logged. Use
    /// [`try_load`](Self::try_load) to tell them apart.
    pub async fn stored_value(&self) -> Option<T> {
        match self.try_load().await {
            Ok(value) => value,
            Err(e) => {
                warn!("Treating {} as empty: {}", self.location, e);
                None
            }
        }
    }

    /// Alias for [`stored_value`](Self::stored_value)
    pub async fn load(&self) -> Option<T> {
        self.stored_value().await
    }

    /// Current value, surfacing read and decode errors
    pub async fn try_load(&self) -> Result<Option<T>> {
        let bytes = match &self.location {
            Location::File { path, .. } => match tokio::fs::read(path).await {
                Ok(bytes) => Some(bytes),
                Err(e) if e.kind() == ErrorKind::NotFound => None,
                Err(e) => return Err(e.into()),
            },
            Location::Key { store, key } => self.kv_store(*store).get(key).await?,
        };

        match bytes {
            Some(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            None => {
                debug!("Nothing stored at {}", self.location);
                Ok(None)
            }
        }
    }

    /// Remove the stored value. Failures are logged, never returned.
    pub async fn clear(&self) {
        match &self.location {
            Location::File { dir, path } => {
                match tokio::fs::remove_file(path).await {
                    Ok(()) => debug!("Removed {:?}", path),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!("Failed to remove {:?}: {}", path, e);
                        return;
                    }
                }

                // Only succeeds once nothing else lives in the subfolder
                if tokio::fs::remove_dir(dir).await.is_ok() {
                    debug!("Removed empty folder {:?}", dir);
                }
            }
            Location::Key { store, key } => {
                let kv = self.kv_store(*store);
                if let Err(e) = kv.remove(key).await {
                    warn!("Failed to remove {} from {}: {}", key, kv.backend_name(), e);
                }

                if *store == KeyValueTarget::Cloud && !kv.flush().await {
                    warn!("{} did not accept flush after clearing {}", kv.backend_name(), key);
                }
            }
        }
    }

    fn kv_store(&self, target: KeyValueTarget) -> &Arc<dyn KeyValueStore> {
        match target {
            KeyValueTarget::Preferences => self.context.preferences(),
            KeyValueTarget::Cloud => self.cloud.as_ref().unwrap_or_else(|| self.context.cloud()),
        }
    }
}

/// Make sure `dir` is a directory, replacing a file that squats on the path
async fn ensure_directory(dir: &Path) -> Result<()> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => {
            warn!("Replacing non-directory entry at {:?}", dir);
            tokio::fs::remove_file(dir).await?;
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    tokio::fs::create_dir_all(dir).await?;
    debug!("Created storage folder {:?}", dir);
    Ok(())
}

/// Write atomically using a temp file next to the target
async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(path);

    if let Err(e) = tokio::fs::write(&temp_path, bytes).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", file_name))
}
