//! # storage-core
//!
//! Typed persistence facade including:
//! - One save/load/clear contract over cache, document and custom folders
//! - Local preference and cloud-synchronized key-value stores
//! - Pluggable codecs (JSON by default)
//! - An in-memory store with call counters for tests

pub mod backend;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod kv;
pub mod location;
mod storage;

pub use backend::{BackendKind, KeyValueTarget, Location};
pub use codec::{Codec, JsonCodec, PrettyJsonCodec};
pub use config::{StorageConfig, StorageRoots, DEFAULT_NAMESPACE};
pub use context::StorageContext;
pub use error::{Result, StorageError};
pub use kv::{KeyValueStore, MemoryStore, PreferenceStore, SyncedStore};
pub use location::{GeoLocation, LocationStorage};
pub use storage::Storage;
