// src/project/mod.rs

//! The schedulable state of one project.
//!
//! [`ProjectState`] owns the tasks, the calendar and the manual row order.
//! It keeps the cross-task invariants (unique ids, no dangling or
//! self-referencing edges, manual order in sync with the task set) whenever
//! a whole state is built or a task is added/removed. Field-level edits and
//! history live in [`crate::engine::PlannerCore`].

pub mod order;
pub mod payload;

use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::calendar::{self, Calendar};
use crate::dag::scheduler::Scheduler;
use crate::dag::scheduler_step::ScheduleOutcome;
use crate::dag::task::{RawTask, Task, normalize};
use crate::errors::{GanttError, Result};

pub use order::ManualOrder;
pub use payload::{LoadReport, LoosePayload, SCHEMA_VERSION, StatePayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectState {
    schema_version: u32,
    tasks: Vec<Task>,
    calendar: Calendar,
    manual_order: ManualOrder,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectState {
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            tasks: Vec::new(),
            calendar: Calendar::new(),
            manual_order: ManualOrder::default(),
        }
    }

    /// Build a state from already-normalized parts, restoring the
    /// cross-task invariants.
    pub fn from_parts(tasks: Vec<Task>, calendar: Calendar, manual_order: ManualOrder) -> Self {
        let mut state = Self {
            schema_version: SCHEMA_VERSION,
            tasks,
            calendar,
            manual_order,
        };
        state.reconcile();
        state
    }

    /// Parse a JSON payload text leniently. See [`ProjectState::from_value`].
    pub fn from_json(text: &str, today: NaiveDate) -> Result<(Self, LoadReport)> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| GanttError::ImportFormat(format!("payload is not valid JSON: {e}")))?;
        Self::from_value(value, today)
    }

    /// Build a state from a payload of unknown provenance.
    ///
    /// Every task record is re-normalized; records that cannot be are
    /// discarded and counted in the returned [`LoadReport`]. Only a payload
    /// that is not a JSON object is an error.
    pub fn from_value(value: Value, today: NaiveDate) -> Result<(Self, LoadReport)> {
        if !value.is_object() {
            return Err(GanttError::ImportFormat(
                "payload must be a JSON object".to_string(),
            ));
        }
        let loose: LoosePayload = serde_json::from_value(value)?;
        let mut report = LoadReport::default();

        let schema_version = loose
            .schema_version
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(SCHEMA_VERSION);
        if schema_version > SCHEMA_VERSION {
            warn!(
                schema_version,
                supported = SCHEMA_VERSION,
                "payload written by a newer schema; loading best-effort"
            );
        }

        let mut holidays = Vec::new();
        if let Some(Value::Array(items)) = &loose.holidays {
            for item in items {
                match item.as_str().and_then(calendar::parse_date) {
                    Some(date) => holidays.push(date),
                    None => report.skipped_holidays += 1,
                }
            }
        }
        let calendar = Calendar::with_holidays(holidays);

        let mut tasks = Vec::new();
        if let Some(Value::Array(records)) = loose.tasks {
            for (pos, record) in records.into_iter().enumerate() {
                let normalized =
                    RawTask::from_value(record).and_then(|raw| normalize(raw, &calendar, today));
                match normalized {
                    Ok(task) => {
                        tasks.push(task);
                        report.accepted += 1;
                    }
                    Err(e) => {
                        warn!(record = pos, "discarding task record: {e}");
                        report.discarded += 1;
                    }
                }
            }
        }

        let manual_order = match &loose.manual_order {
            Some(Value::Array(ids)) => {
                ManualOrder::from_ids(ids.iter().filter_map(Value::as_str).map(str::to_string))
            }
            _ => ManualOrder::default(),
        };

        let mut state = Self::from_parts(tasks, calendar, manual_order);
        state.schema_version = schema_version.min(SCHEMA_VERSION);
        debug!(
            accepted = report.accepted,
            discarded = report.discarded,
            holidays = state.calendar.holiday_count(),
            "loaded project payload"
        );
        Ok((state, report))
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn manual_order(&self) -> &ManualOrder {
        &self.manual_order
    }

    /// Tasks in manual row order.
    pub fn ordered_tasks(&self) -> Vec<&Task> {
        self.manual_order
            .as_slice()
            .iter()
            .filter_map(|id| self.task(id))
            .collect()
    }

    pub fn is_workday(&self, date: NaiveDate) -> bool {
        self.calendar.is_workday(date)
    }

    pub(crate) fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub(crate) fn calendar_mut(&mut self) -> &mut Calendar {
        &mut self.calendar
    }

    pub(crate) fn manual_order_mut(&mut self) -> &mut ManualOrder {
        &mut self.manual_order
    }

    /// Append a task and keep the manual order in sync.
    pub(crate) fn push_task(&mut self, task: Task) {
        self.tasks.push(task);
        self.manual_order.sync(&self.tasks);
    }

    /// Remove a task, cascading to every edge that referenced it.
    pub(crate) fn remove_task(&mut self, id: &str) -> Option<Task> {
        let pos = self.position(id)?;
        let removed = self.tasks.remove(pos);
        let mut edges = 0;
        for task in &mut self.tasks {
            edges += task.remove_edges_to(id);
        }
        self.manual_order.sync(&self.tasks);
        debug!(task = %id, edges_removed = edges, "removed task");
        Some(removed)
    }

    /// Run a full scheduling pass over the tasks.
    pub fn schedule(&mut self) -> Result<ScheduleOutcome> {
        Scheduler::new(&self.calendar).schedule_all(&mut self.tasks)
    }

    /// Unique ids, no dangling or self edges, manual order synchronized.
    fn reconcile(&mut self) {
        let mut seen = HashSet::with_capacity(self.tasks.len());
        for task in &mut self.tasks {
            if !seen.insert(task.id.clone()) {
                let fresh = Uuid::new_v4().to_string();
                warn!(duplicate = %task.id, new_id = %fresh, "duplicate task id; assigning a new one");
                task.id = fresh.clone();
                seen.insert(fresh);
            }
        }

        for task in &mut self.tasks {
            let own = task.id.clone();
            let before = task.dependencies.len();
            task.dependencies
                .retain(|d| d.id != own && seen.contains(&d.id));
            let dropped = before - task.dependencies.len();
            if dropped > 0 {
                debug!(task = %own, dropped, "dropped dangling dependencies");
            }
        }

        self.manual_order.sync(&self.tasks);
    }

    pub fn to_payload(&self) -> StatePayload {
        StatePayload {
            schema_version: self.schema_version,
            tasks: self.tasks.clone(),
            holidays: self.calendar.holidays().collect(),
            manual_order: self.manual_order.as_slice().to_vec(),
        }
    }

    /// Serialized payload; the unit stored in history and persistence.
    pub fn snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_payload())?)
    }

    /// Human-readable descriptions of every violated invariant. Empty for a
    /// consistent state.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let cal = &self.calendar;

        for t in &self.tasks {
            if t.duration < 1 {
                problems.push(format!("task '{}' has duration {}", t.id, t.duration));
            }
            if !cal.is_workday(t.start) {
                problems.push(format!("task '{}' starts on non-workday {}", t.id, t.start));
            }
            if !cal.is_workday(t.end) {
                problems.push(format!("task '{}' ends on non-workday {}", t.id, t.end));
            }
            if t.is_milestone && (t.duration != 1 || t.start != t.end) {
                problems.push(format!("milestone '{}' spans more than one day", t.id));
            }
            if !t.is_milestone && cal.workday_count(t.start, t.end) != t.duration {
                problems.push(format!(
                    "task '{}' spans {} workdays but has duration {}",
                    t.id,
                    cal.workday_count(t.start, t.end),
                    t.duration
                ));
            }
            if t.depends_on(&t.id) {
                problems.push(format!("task '{}' depends on itself", t.id));
            }
        }

        if crate::dag::has_cycle(&self.tasks) {
            problems.push("dependency graph contains a cycle".to_string());
        }

        let live: HashSet<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
        let ordered: HashSet<&str> = self.manual_order.as_slice().iter().map(String::as_str).collect();
        if live != ordered || self.manual_order.len() != self.tasks.len() {
            problems.push("manual order is out of sync with the task set".to_string());
        }

        problems
    }
}
