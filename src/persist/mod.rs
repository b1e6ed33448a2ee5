// src/persist/mod.rs

//! Project persistence: snapshot stores and the debounced writer.

use std::path::Path;
use std::sync::Arc;

use blake3::Hasher;

use crate::fs::FileSystem;
use crate::types::PersistenceMode;

pub mod store;
pub mod writer;

pub use store::{FileSnapshotStore, MemorySnapshotStore, NullSnapshotStore, SnapshotStore};
pub use writer::{DEFAULT_DEBOUNCE, PersistReport, WriterHandle, spawn_writer};

/// Stable digest of a payload, used to skip rewriting identical content.
pub fn payload_digest(payload: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(payload.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Build the store matching `mode`.
pub fn open_store(
    mode: PersistenceMode,
    fs: Arc<dyn FileSystem>,
    path: &Path,
) -> Box<dyn SnapshotStore> {
    match mode {
        PersistenceMode::File => Box::new(FileSnapshotStore::new(fs, path)),
        PersistenceMode::Memory => Box::new(MemorySnapshotStore::new()),
        PersistenceMode::None => Box::new(NullSnapshotStore),
    }
}
