// src/project/payload.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dag::task::{Task, TaskId};

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Serialized form of the whole project.
///
/// Used verbatim as the history snapshot, the persisted payload and the
/// JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePayload {
    pub schema_version: u32,
    pub tasks: Vec<Task>,
    pub holidays: Vec<NaiveDate>,
    pub manual_order: Vec<TaskId>,
}

/// Lenient envelope for payloads of unknown provenance (older schema
/// versions, hand edits, third-party exports). Every field is optional and
/// untyped; [`crate::project::ProjectState::from_value`] repairs them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoosePayload {
    #[serde(default)]
    pub schema_version: Option<Value>,
    #[serde(default)]
    pub tasks: Option<Value>,
    #[serde(default)]
    pub holidays: Option<Value>,
    #[serde(default)]
    pub manual_order: Option<Value>,
}

/// What happened while loading a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Task records that survived normalization.
    pub accepted: usize,
    /// Task records dropped because they could not be normalized.
    pub discarded: usize,
    /// Holiday entries that were not valid dates.
    pub skipped_holidays: usize,
}

impl LoadReport {
    pub fn task_records(&self) -> usize {
        self.accepted + self.discarded
    }
}
