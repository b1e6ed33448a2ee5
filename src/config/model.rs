// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::interchange::mermaid::{DEFAULT_CHART_TITLE, MermaidOptions};
use crate::types::{DateMode, GroupKey, PersistenceMode};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [storage]
/// path = "ganttdag.json"
/// mode = "file"
/// debounce_ms = 400
///
/// [history]
/// limit = 100
///
/// [export]
/// group_by = "category"
/// date_mode = "duration"
/// title = "Project"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub history: HistorySection,

    #[serde(default)]
    pub export: ExportSection,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub storage: StorageSection,
    pub history: HistorySection,
    pub export: ExportSection,
}

impl ConfigFile {
    /// Assemble a config without validation. Prefer `TryFrom<RawConfigFile>`.
    pub fn new_unchecked(
        storage: StorageSection,
        history: HistorySection,
        export: ExportSection,
    ) -> Self {
        Self {
            storage,
            history,
            export,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.storage.debounce_ms)
    }

    pub fn mermaid_options(&self) -> MermaidOptions {
        MermaidOptions {
            group_by: self.export.group_by,
            date_mode: self.export.date_mode,
            title: self.export.title.clone(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            StorageSection::default(),
            HistorySection::default(),
            ExportSection::default(),
        )
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// Project file used in `file` mode.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// `"file"` (default), `"memory"` or `"none"`.
    #[serde(default)]
    pub mode: PersistenceMode,

    /// Quiet window before a pending save is written.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("ganttdag.json")
}

fn default_debounce_ms() -> u64 {
    400
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            mode: PersistenceMode::default(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[history]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct HistorySection {
    /// Maximum number of undo snapshots kept.
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

/// `[export]` section: text Gantt import/export settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSection {
    /// Task field that chart sections map to.
    #[serde(default)]
    pub group_by: GroupKey,

    /// `"duration"` writes `<start>, <N>d`; `"end"` writes `<start>, <end>`.
    #[serde(default)]
    pub date_mode: DateMode,

    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    DEFAULT_CHART_TITLE.to_string()
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            group_by: GroupKey::default(),
            date_mode: DateMode::default(),
            title: default_title(),
        }
    }
}
