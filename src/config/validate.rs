// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{GanttError, Result};
use crate::types::PersistenceMode;

/// Longest accepted debounce window.
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::GanttError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.storage, raw.history, raw.export))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_storage(cfg)?;
    validate_history(cfg)?;
    validate_export(cfg)?;
    Ok(())
}

fn validate_storage(cfg: &RawConfigFile) -> Result<()> {
    // `mode` is strongly typed and validated during deserialization.
    if cfg.storage.mode == PersistenceMode::File && cfg.storage.path.as_os_str().is_empty() {
        return Err(GanttError::Config(
            "[storage].path must not be empty when mode = \"file\"".to_string(),
        ));
    }
    if cfg.storage.debounce_ms > MAX_DEBOUNCE_MS {
        return Err(GanttError::Config(format!(
            "[storage].debounce_ms must be <= {MAX_DEBOUNCE_MS} (got {})",
            cfg.storage.debounce_ms
        )));
    }
    Ok(())
}

fn validate_history(cfg: &RawConfigFile) -> Result<()> {
    if cfg.history.limit == 0 {
        return Err(GanttError::Config(
            "[history].limit must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_export(cfg: &RawConfigFile) -> Result<()> {
    if cfg.export.title.contains(['\n', '\r']) {
        return Err(GanttError::Config(
            "[export].title must be a single line".to_string(),
        ));
    }
    Ok(())
}
