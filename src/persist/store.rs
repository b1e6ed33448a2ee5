// src/persist/store.rs

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::errors::{GanttError, Result};
use crate::fs::FileSystem;
use crate::types::PersistenceMode;

/// Abstract storage for the serialized project payload.
pub trait SnapshotStore: Send + Sync + Debug {
    fn mode(&self) -> PersistenceMode;
    /// The stored payload, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<String>>;
    fn save(&mut self, payload: &str) -> Result<()>;
}

/// Stores the payload as a JSON file.
#[derive(Debug)]
pub struct FileSnapshotStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn mode(&self) -> PersistenceMode {
        PersistenceMode::File
    }

    fn load(&self) -> Result<Option<String>> {
        if !self.fs.exists(&self.path) {
            debug!(path = ?self.path, "no saved project");
            return Ok(None);
        }
        let text = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| GanttError::Persistence(format!("{e:#}")))?;
        Ok(Some(text))
    }

    fn save(&mut self, payload: &str) -> Result<()> {
        self.fs
            .write(&self.path, payload.as_bytes())
            .map_err(|e| GanttError::Persistence(format!("{e:#}")))?;
        info!(path = ?self.path, bytes = payload.len(), "saved project (file)");
        Ok(())
    }
}

/// Keeps the payload in memory only.
///
/// Clones share the same slot, so a caller can keep a handle to inspect what
/// the writer stored.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(payload.into()))),
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn mode(&self) -> PersistenceMode {
        PersistenceMode::Memory
    }

    fn load(&self) -> Result<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| GanttError::Persistence("memory store lock poisoned".to_string()))?;
        Ok(slot.clone())
    }

    fn save(&mut self, payload: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| GanttError::Persistence("memory store lock poisoned".to_string()))?;
        *slot = Some(payload.to_string());
        debug!(bytes = payload.len(), "saved project (memory)");
        Ok(())
    }
}

/// Store used when persistence is switched off: loads nothing, drops writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSnapshotStore;

impl SnapshotStore for NullSnapshotStore {
    fn mode(&self) -> PersistenceMode {
        PersistenceMode::None
    }

    fn load(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn save(&mut self, _payload: &str) -> Result<()> {
        Ok(())
    }
}
