use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Progress status of a task.
///
/// Anything that is not recognisably `active` or `done` is treated as
/// `none`; see [`TaskStatus::coerce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    None,
    Active,
    Done,
}

impl TaskStatus {
    /// Lenient conversion used by the normalizer: never fails.
    pub fn coerce(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::None => "none",
            TaskStatus::Active => "active",
            TaskStatus::Done => "done",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(TaskStatus::None),
            "active" => Ok(TaskStatus::Active),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!(
                "invalid status: {other} (expected \"none\", \"active\" or \"done\")"
            )),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relation between a predecessor and a successor.
///
/// - `FS`: successor starts after the predecessor finishes.
/// - `SS`: successor starts no earlier than the predecessor starts.
/// - `FF`: successor finishes no earlier than the predecessor finishes.
/// - `SF`: successor finishes no earlier than the predecessor starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DependencyType {
    #[default]
    FS,
    SS,
    FF,
    SF,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::FS => "FS",
            DependencyType::SS => "SS",
            DependencyType::FF => "FF",
            DependencyType::SF => "SF",
        }
    }

    /// Whether the constraint produced by this relation bounds the
    /// successor's start (as opposed to its end).
    pub fn constrains_start(&self) -> bool {
        matches!(self, DependencyType::FS | DependencyType::SS)
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FS" => Ok(DependencyType::FS),
            "SS" => Ok(DependencyType::SS),
            "FF" => Ok(DependencyType::FF),
            "SF" => Ok(DependencyType::SF),
            other => Err(format!(
                "invalid dependency type: {other} (expected FS, SS, FF or SF)"
            )),
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where snapshots of the project are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// JSON file on disk.
    File,
    /// In memory only (lost on exit).
    Memory,
    /// Persistence disabled, usually after a write failure.
    None,
}

impl Default for PersistenceMode {
    fn default() -> Self {
        PersistenceMode::File
    }
}

impl FromStr for PersistenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(PersistenceMode::File),
            "memory" => Ok(PersistenceMode::Memory),
            "none" => Ok(PersistenceMode::None),
            other => Err(format!(
                "invalid storage mode: {other} (expected \"file\", \"memory\" or \"none\")"
            )),
        }
    }
}

/// Task field used as the section label in text Gantt import/export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    #[default]
    Category,
    Assignee,
}

impl FromStr for GroupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "category" => Ok(GroupKey::Category),
            "assignee" => Ok(GroupKey::Assignee),
            other => Err(format!(
                "invalid group key: {other} (expected \"category\" or \"assignee\")"
            )),
        }
    }
}

/// How task timing is written in text Gantt export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DateMode {
    /// `<start>, <N>d`
    #[default]
    Duration,
    /// `<start>, <end>`
    End,
}

impl FromStr for DateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "duration" => Ok(DateMode::Duration),
            "end" => Ok(DateMode::End),
            other => Err(format!(
                "invalid date mode: {other} (expected \"duration\" or \"end\")"
            )),
        }
    }
}
