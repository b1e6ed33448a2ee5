use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use ganttdag::errors::{GanttError, Result};
use ganttdag::persist::SnapshotStore;
use ganttdag::types::PersistenceMode;

/// A store that:
/// - records every payload it was asked to save
/// - can be switched to fail every save.
///
/// Clones share the same log, so a test keeps one handle and boxes another.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    saved: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Vec<String> {
        self.saved.lock().unwrap().clone()
    }
}

impl SnapshotStore for RecordingStore {
    fn mode(&self) -> PersistenceMode {
        PersistenceMode::Memory
    }

    fn load(&self) -> Result<Option<String>> {
        Ok(self.saved.lock().unwrap().last().cloned())
    }

    fn save(&mut self, payload: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GanttError::Persistence("disk full".to_string()));
        }
        self.saved.lock().unwrap().push(payload.to_string());
        Ok(())
    }
}
