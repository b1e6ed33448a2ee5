// src/errors.rs

//! Crate-wide error aliases and helpers.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GanttError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cyclic dependency detected involving task '{task}'")]
    CyclicDependency { task: String },

    #[error("Task '{0}' cannot depend on itself")]
    SelfDependency(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task '{task}' has no dependency at index {index}")]
    DependencyNotFound { task: String, index: usize },

    #[error("Import format error: {0}")]
    ImportFormat(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Calendar exhausted: no workday found stepping from {from}")]
    CalendarExhausted { from: NaiveDate },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GanttError>;
