// src/history.rs

//! Whole-state snapshot history for undo/redo.
//!
//! Snapshots are the serialized project payload, so equality of two
//! snapshots is plain string equality and restoring one is a full
//! deserialize. The stack is bounded; the oldest entry is dropped once the
//! limit is exceeded.

use std::collections::VecDeque;

use tracing::{debug, trace};

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: VecDeque<String>,
    /// Position of the snapshot matching the current state. `None` until
    /// the first commit.
    index: Option<usize>,
    limit: usize,
    /// Set while a snapshot is being applied; commits are ignored.
    suspended: bool,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryStack {
    /// `limit` is clamped to at least 1.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            index: None,
            limit: limit.max(1),
            suspended: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current(&self) -> Option<&str> {
        self.index
            .and_then(|i| self.entries.get(i))
            .map(String::as_str)
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        match self.index {
            Some(i) => i + 1 < self.entries.len(),
            None => false,
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    /// Record `snapshot` as the new current state.
    ///
    /// Returns `false` (and records nothing) while suspended or when the
    /// snapshot equals the current one. Otherwise the redo tail is discarded.
    pub fn commit(&mut self, snapshot: String) -> bool {
        if self.suspended {
            trace!("history suspended; ignoring commit");
            return false;
        }
        if self.current() == Some(snapshot.as_str()) {
            trace!("snapshot unchanged; not recording");
            return false;
        }

        match self.index {
            Some(i) => self.entries.truncate(i + 1),
            None => self.entries.clear(),
        }
        self.entries.push_back(snapshot);
        if self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.index = Some(self.entries.len() - 1);

        debug!(
            index = self.entries.len() - 1,
            len = self.entries.len(),
            "recorded history snapshot"
        );
        true
    }

    /// Step back one snapshot and return it.
    pub fn undo(&mut self) -> Option<&str> {
        let i = self.index.filter(|i| *i > 0)?;
        self.index = Some(i - 1);
        self.entries.get(i - 1).map(String::as_str)
    }

    /// Step forward one snapshot and return it.
    pub fn redo(&mut self) -> Option<&str> {
        let i = self.index?;
        if i + 1 >= self.entries.len() {
            return None;
        }
        self.index = Some(i + 1);
        self.entries.get(i + 1).map(String::as_str)
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.index = None;
        self.suspended = false;
    }
}
