//! Key-value stores
//!
//! This module provides three stores behind one trait:
//! 1. Preference store (local, write-through JSON file)
//! 2. Synced store (buffered writes published to a sync directory on flush)
//! 3. Memory store (in-process test double with call counters)

mod traits;
mod file;
mod preferences;
mod synced;
mod memory;

pub use traits::KeyValueStore;
pub use preferences::PreferenceStore;
pub use synced::SyncedStore;
pub use memory::MemoryStore;
