// src/dag/task.rs

//! Task records and the normalizer that makes arbitrary input records
//! satisfy the task invariants.
//!
//! Input records are loosely typed ([`RawTask`]): every field is an optional
//! JSON value, because persisted payloads from older schema versions and
//! hand-written imports may carry missing or mistyped fields. [`normalize`]
//! never rejects a record that is a JSON object; bad fields fall back to
//! defaults.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::calendar::{self, Calendar, Direction};
use crate::errors::{GanttError, Result};
use crate::types::{DependencyType, TaskStatus};

/// Opaque task identifier.
pub type TaskId = String;

/// Title given to records that arrive without one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Upper bound for a task duration, in workdays.
pub const MAX_DURATION: u32 = 10_000;

/// Incoming edge: this task depends on `id` with relation `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub id: TaskId,
    #[serde(rename = "type", default)]
    pub kind: DependencyType,
}

impl DependencyEdge {
    pub fn new(id: impl Into<TaskId>, kind: DependencyType) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn finish_to_start(id: impl Into<TaskId>) -> Self {
        Self::new(id, DependencyType::FS)
    }
}

/// A normalized task. All invariants hold for values produced by
/// [`normalize`] and kept by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub category: String,
    pub assignee: String,
    pub status: TaskStatus,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub duration: u32,
    pub notes: String,
    pub is_milestone: bool,
    pub dependencies: Vec<DependencyEdge>,
}

impl Task {
    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies.iter().any(|d| d.id == id)
    }

    pub fn predecessor_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.id.as_str())
    }

    /// Drop every edge pointing at `id`. Returns how many were removed.
    pub fn remove_edges_to(&mut self, id: &str) -> usize {
        let before = self.dependencies.len();
        self.dependencies.retain(|d| d.id != id);
        before - self.dependencies.len()
    }
}

/// Loosely-typed task record as found in imports and persisted payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_milestone: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Value>,
}

impl RawTask {
    /// Interpret an arbitrary JSON value as a task record.
    ///
    /// Only non-objects are rejected; field-level problems are left for
    /// [`normalize`] to repair.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(GanttError::Validation(format!(
                "task record must be an object, got {}",
                json_kind(&value)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl From<&Task> for RawTask {
    fn from(task: &Task) -> Self {
        let deps = task
            .dependencies
            .iter()
            .map(|d| serde_json::json!({ "id": d.id, "type": d.kind.as_str() }))
            .collect();
        Self {
            id: Some(Value::from(task.id.clone())),
            title: Some(Value::from(task.title.clone())),
            category: Some(Value::from(task.category.clone())),
            assignee: Some(Value::from(task.assignee.clone())),
            status: Some(Value::from(task.status.as_str())),
            start: Some(Value::from(calendar::format_date(task.start))),
            end: Some(Value::from(calendar::format_date(task.end))),
            duration: Some(Value::from(task.duration)),
            notes: Some(Value::from(task.notes.clone())),
            is_milestone: Some(Value::from(task.is_milestone)),
            dependencies: Some(Value::Array(deps)),
        }
    }
}

/// Bring an arbitrary record into a state satisfying every task invariant.
///
/// `today` is the fallback start for records without a usable start date.
/// The only error is [`GanttError::CalendarExhausted`]; everything else is
/// repaired with defaults.
pub fn normalize(raw: RawTask, calendar: &Calendar, today: NaiveDate) -> Result<Task> {
    let id = text(raw.id.as_ref())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let title = text(raw.title.as_ref())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let status = text(raw.status.as_ref())
        .map(|s| TaskStatus::coerce(&s))
        .unwrap_or_default();

    let is_milestone = flag(raw.is_milestone.as_ref());
    let mut duration = duration(raw.duration.as_ref());

    let start = date(raw.start.as_ref()).unwrap_or(today);
    let start = calendar.next_workday(start, Direction::Forward)?;

    if let Some(explicit_end) = date(raw.end.as_ref()) {
        let explicit_end = calendar.next_workday(explicit_end, Direction::Forward)?;
        duration = calendar.workday_count(start, explicit_end).min(MAX_DURATION);
    }

    let end = if is_milestone {
        duration = 1;
        start
    } else {
        calendar.add_workdays(start, i64::from(duration) - 1)?
    };

    let dependencies = dependencies(raw.dependencies.as_ref(), &id);

    Ok(Task {
        id,
        title,
        category: text(raw.category.as_ref()).unwrap_or_default(),
        assignee: text(raw.assignee.as_ref()).unwrap_or_default(),
        status,
        start,
        end,
        duration,
        notes: text(raw.notes.as_ref()).unwrap_or_default(),
        is_milestone,
        dependencies,
    })
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

fn duration(value: Option<&Value>) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() && f >= 1.0 => (f.trunc() as u32).min(MAX_DURATION),
        _ => 1,
    }
}

fn date(value: Option<&Value>) -> Option<NaiveDate> {
    match value? {
        Value::String(s) => calendar::parse_date(s),
        _ => None,
    }
}

fn dependencies(value: Option<&Value>, own_id: &str) -> Vec<DependencyEdge> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let id = text(item.get("id"))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())?;
            if id == own_id {
                debug!(task = %own_id, "dropping self-referencing dependency");
                return None;
            }
            let kind = match item.get("type") {
                None | Some(Value::Null) => DependencyType::FS,
                Some(Value::String(s)) => match s.parse() {
                    Ok(kind) => kind,
                    Err(e) => {
                        warn!(task = %own_id, predecessor = %id, "dropping dependency: {e}");
                        return None;
                    }
                },
                Some(other) => {
                    warn!(
                        task = %own_id,
                        predecessor = %id,
                        "dropping dependency with non-string type ({})",
                        json_kind(other)
                    );
                    return None;
                }
            };
            Some(DependencyEdge { id, kind })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
