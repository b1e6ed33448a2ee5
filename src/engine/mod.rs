// src/engine/mod.rs

//! Planning engine for ganttdag.
//!
//! This module ties together:
//! - the project state (tasks, calendar, manual order)
//! - the scheduler and cycle detector
//! - the undo/redo history
//! - the runtime loop that reacts to:
//!   - edit requests
//!   - shutdown signals
//!
//! The pure controller lives in [`core`]; the async/IO shell is implemented
//! in [`runtime`].

use chrono::NaiveDate;

use crate::dag::{DependencyEdge, TaskId};
use crate::types::{DependencyType, TaskStatus};

/// Which part of a bar a drag gesture grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Shift the whole task, keeping its duration.
    Move,
    /// Move the start date; the end stays put.
    ResizeStart,
    /// Move the end date; the start stays put.
    ResizeEnd,
}

/// Fields of a task created through [`core::PlannerCore::add_task`].
///
/// Unset fields fall back to the defaults of a freshly added row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: Option<String>,
    pub category: String,
    pub assignee: String,
    pub notes: String,
    pub start: Option<NaiveDate>,
    pub duration: Option<u32>,
    pub is_milestone: bool,
    pub dependencies: Vec<DependencyEdge>,
}

/// Text and status fields of a task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub assignee: Option<String>,
    pub notes: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.assignee.is_none()
            && self.notes.is_none()
            && self.status.is_none()
    }
}

/// A single controlled mutation, as sent to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    AddTask(NewTask),
    DeleteTask(TaskId),
    UpdateTask { id: TaskId, patch: TaskPatch },
    SetStart { id: TaskId, date: NaiveDate },
    SetEnd { id: TaskId, date: NaiveDate },
    SetDuration { id: TaskId, duration: u32 },
    SetMilestone { id: TaskId, milestone: bool },
    Drag { id: TaskId, mode: DragMode, delta_days: i64 },
    AddDependency { task: TaskId, predecessor: TaskId, kind: DependencyType },
    UpdateDependency { task: TaskId, index: usize, edge: DependencyEdge },
    RemoveDependency { task: TaskId, index: usize },
    MoveInOrder { from: TaskId, to: TaskId },
    AddHoliday(NaiveDate),
    RemoveHoliday(NaiveDate),
    SetHolidays(Vec<NaiveDate>),
    ImportHolidays(String),
    ImportJson(String),
    ImportMermaid(String),
    Reset,
    Undo,
    Redo,
}

/// Events flowing into the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// Apply an edit to the project.
    Edit(Edit),
    /// Graceful shutdown requested (e.g. Ctrl-C or end of a batch).
    ShutdownRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Non-fatal message for the user (the toast of a UI, a stderr line of the
/// CLI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use self::core::PlannerCore;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::{EVENT_CHANNEL_CAPACITY, Runtime, RuntimeReport, run_batch};
