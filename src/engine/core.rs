// src/engine/core.rs

//! Pure planning controller.
//!
//! [`PlannerCore`] is a synchronous, deterministic controller that owns the
//! project state and its undo history. Every mutation:
//! - works on a clone of the state,
//! - re-runs the scheduler when dates may have moved,
//! - swaps the clone in only if everything succeeded,
//! - records a history snapshot and leaves a payload for persistence.
//!
//! A rejected edit therefore never leaves the state partially mutated.
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for
//! reading edit requests from a channel, forwarding payloads to the
//! persistence writer and surfacing notifications. The core has no channels,
//! no Tokio types, and does not perform any IO.

use chrono::{Days, NaiveDate};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::calendar::{self, Direction};
use crate::dag::task::{MAX_DURATION, RawTask, Task, TaskId, normalize};
use crate::dag::{DependencyEdge, ensure_acyclic};
use crate::engine::event_handlers::{CoreStep, handle_edit};
use crate::engine::{DragMode, NewTask, RuntimeEvent, TaskPatch};
use crate::errors::{GanttError, Result};
use crate::history::HistoryStack;
use crate::interchange::json as json_io;
use crate::interchange::mermaid::{self, MermaidOptions};
use crate::project::{LoadReport, ProjectState};
use crate::types::DependencyType;

/// Title of a task added without one.
pub const NEW_TASK_TITLE: &str = "New Task";

/// Duration, in workdays, of a task added without one.
pub const NEW_TASK_DURATION: u32 = 3;

#[derive(Debug)]
pub struct PlannerCore {
    state: ProjectState,
    history: HistoryStack,
    clock: fn() -> NaiveDate,
    mermaid: MermaidOptions,
    /// Newest payload not yet handed to persistence.
    pending_payload: Option<String>,
}

impl PlannerCore {
    /// Empty project with a history bounded to `history_limit` snapshots.
    pub fn new(history_limit: usize) -> Result<Self> {
        Self::with_state(ProjectState::new(), history_limit)
    }

    /// Wrap an existing state. It is scheduled and becomes the history base.
    pub fn with_state(mut state: ProjectState, history_limit: usize) -> Result<Self> {
        state.schedule()?;
        let mut core = Self {
            state,
            history: HistoryStack::new(history_limit),
            clock: calendar::today,
            mermaid: MermaidOptions::default(),
            pending_payload: None,
        };
        core.rebase()?;
        Ok(core)
    }

    /// Replace the source of "today" (new task starts, missing dates).
    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_mermaid_options(mut self, options: MermaidOptions) -> Self {
        self.mermaid = options;
        self
    }

    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    pub fn tasks(&self) -> &[Task] {
        self.state.tasks()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.state.task(id)
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn mermaid_options(&self) -> &MermaidOptions {
        &self.mermaid
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Payload produced by the latest successful mutation, if not yet taken.
    pub fn take_pending_payload(&mut self) -> Option<String> {
        self.pending_payload.take()
    }

    /// Handle a single runtime event and return the commands for the IO
    /// shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::Edit(edit) => handle_edit(self, edit),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    // ----- tasks -------------------------------------------------------------

    pub fn add_task(&mut self, new: NewTask) -> Result<TaskId> {
        self.mutate(true, |state, today| {
            for edge in &new.dependencies {
                if state.task(&edge.id).is_none() {
                    return Err(GanttError::TaskNotFound(edge.id.clone()));
                }
            }
            let start = new.start.unwrap_or(today);
            let deps: Vec<Value> = new
                .dependencies
                .iter()
                .map(|d| json!({ "id": d.id, "type": d.kind.as_str() }))
                .collect();
            let raw = RawTask {
                title: Some(Value::from(
                    new.title.unwrap_or_else(|| NEW_TASK_TITLE.to_string()),
                )),
                category: Some(Value::from(new.category)),
                assignee: Some(Value::from(new.assignee)),
                notes: Some(Value::from(new.notes)),
                start: Some(Value::from(calendar::format_date(start))),
                duration: Some(Value::from(new.duration.unwrap_or(NEW_TASK_DURATION))),
                is_milestone: Some(Value::from(new.is_milestone)),
                dependencies: Some(Value::Array(deps)),
                ..RawTask::default()
            };
            let task = normalize(raw, state.calendar(), today)?;
            let id = task.id.clone();
            info!(task = %id, title = %task.title, "adding task");
            state.push_task(task);
            Ok(id)
        })
    }

    /// Remove a task and every edge pointing at it.
    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        self.mutate(true, |state, _| {
            let removed = state
                .remove_task(id)
                .ok_or_else(|| GanttError::TaskNotFound(id.to_string()))?;
            info!(task = %id, "deleted task");
            Ok(removed)
        })
    }

    /// Apply a text/status patch. Dates cannot move, so the scheduler is
    /// skipped.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<()> {
        if self.state.task(id).is_none() {
            return Err(GanttError::TaskNotFound(id.to_string()));
        }
        if patch.is_empty() {
            return Ok(());
        }
        self.mutate(false, |state, _| {
            let task = task_mut(state, id)?;
            if let Some(title) = patch.title {
                let title = title.trim().to_string();
                task.title = if title.is_empty() {
                    crate::dag::task::DEFAULT_TITLE.to_string()
                } else {
                    title
                };
            }
            if let Some(category) = patch.category {
                task.category = category;
            }
            if let Some(assignee) = patch.assignee {
                task.assignee = assignee;
            }
            if let Some(notes) = patch.notes {
                task.notes = notes;
            }
            if let Some(status) = patch.status {
                task.status = status;
            }
            debug!(task = %id, "updated task fields");
            Ok(())
        })
    }

    /// Move the start, keeping the duration.
    pub fn set_start(&mut self, id: &str, date: NaiveDate) -> Result<()> {
        self.mutate(true, |state, _| {
            let task = find(state, id)?;
            let cal = state.calendar();
            let start = cal.next_workday(date, Direction::Forward)?;
            let (end, duration) = if task.is_milestone {
                (start, 1)
            } else {
                (cal.add_workdays(start, i64::from(task.duration) - 1)?, task.duration)
            };
            set_dates(state, id, start, end, duration)
        })
    }

    /// Move the end, recomputing the duration. A milestone moves as a whole.
    pub fn set_end(&mut self, id: &str, date: NaiveDate) -> Result<()> {
        self.mutate(true, |state, _| {
            let task = find(state, id)?;
            let cal = state.calendar();
            if task.is_milestone {
                let day = cal.next_workday(date, Direction::Forward)?;
                return set_dates(state, id, day, day, 1);
            }
            let start = task.start;
            let end = cal.next_workday(date, Direction::Backward)?;
            let duration = cal.workday_count(start, end).min(MAX_DURATION);
            set_dates(state, id, start, end, duration)
        })
    }

    pub fn set_duration(&mut self, id: &str, duration: u32) -> Result<()> {
        self.mutate(true, |state, _| {
            let task = find(state, id)?;
            let duration = if task.is_milestone {
                1
            } else {
                duration.clamp(1, MAX_DURATION)
            };
            let start = task.start;
            let end = state
                .calendar()
                .add_workdays(start, i64::from(duration) - 1)?;
            set_dates(state, id, start, end, duration)
        })
    }

    /// Collapse a task into a milestone or expand it back to its duration.
    pub fn set_milestone(&mut self, id: &str, milestone: bool) -> Result<()> {
        self.mutate(true, |state, _| {
            let task = find(state, id)?;
            let cal = state.calendar();
            let start = cal.next_workday(task.start, Direction::Forward)?;
            let duration = if milestone { 1 } else { task.duration.max(1) };
            let end = cal.add_workdays(start, i64::from(duration) - 1)?;
            set_dates(state, id, start, end, duration)?;
            task_mut(state, id)?.is_milestone = milestone;
            Ok(())
        })
    }

    /// Apply a horizontal drag of `delta_days` calendar days.
    ///
    /// Milestones can only be moved.
    pub fn drag_task(&mut self, id: &str, mode: DragMode, delta_days: i64) -> Result<()> {
        self.mutate(true, |state, _| {
            let task = find(state, id)?;
            if task.is_milestone && mode != DragMode::Move {
                return Err(GanttError::Validation(format!(
                    "milestone '{id}' cannot be resized"
                )));
            }
            let cal = state.calendar();
            let (start, end, duration) = match mode {
                DragMode::Move => {
                    let start = cal.next_workday(shift(task.start, delta_days)?, Direction::Forward)?;
                    let end = cal.add_workdays(start, i64::from(task.duration) - 1)?;
                    (start, end, task.duration)
                }
                DragMode::ResizeEnd => {
                    let start = task.start;
                    let end = cal
                        .next_workday(shift(task.end, delta_days)?, Direction::Backward)?
                        .max(start);
                    (start, end, cal.workday_count(start, end).min(MAX_DURATION))
                }
                DragMode::ResizeStart => {
                    let end = task.end;
                    let start = cal
                        .next_workday(shift(task.start, delta_days)?, Direction::Forward)?
                        .min(end);
                    (start, end, cal.workday_count(start, end).min(MAX_DURATION))
                }
            };
            debug!(task = %id, ?mode, delta_days, %start, %end, "drag applied");
            set_dates(state, id, start, end, duration)
        })
    }

    // ----- dependencies ------------------------------------------------------

    /// Make `task` depend on `predecessor`. Rejected if it would close a
    /// cycle.
    pub fn add_dependency(
        &mut self,
        task: &str,
        predecessor: &str,
        kind: DependencyType,
    ) -> Result<()> {
        if task == predecessor {
            return Err(GanttError::SelfDependency(task.to_string()));
        }
        self.mutate(true, |state, _| {
            find(state, predecessor)?;
            task_mut(state, task)?
                .dependencies
                .push(DependencyEdge::new(predecessor, kind));
            ensure_acyclic(state.tasks())?;
            info!(task = %task, predecessor = %predecessor, %kind, "added dependency");
            Ok(())
        })
    }

    /// Retarget or retype the dependency at `index`.
    pub fn update_dependency(&mut self, task: &str, index: usize, edge: DependencyEdge) -> Result<()> {
        if edge.id == task {
            return Err(GanttError::SelfDependency(task.to_string()));
        }
        self.mutate(true, |state, _| {
            find(state, &edge.id)?;
            let slot = task_mut(state, task)?
                .dependencies
                .get_mut(index)
                .ok_or_else(|| GanttError::DependencyNotFound {
                    task: task.to_string(),
                    index,
                })?;
            *slot = edge;
            ensure_acyclic(state.tasks())?;
            debug!(task = %task, index, "updated dependency");
            Ok(())
        })
    }

    pub fn remove_dependency(&mut self, task: &str, index: usize) -> Result<DependencyEdge> {
        self.mutate(true, |state, _| {
            let deps = &mut task_mut(state, task)?.dependencies;
            if index >= deps.len() {
                return Err(GanttError::DependencyNotFound {
                    task: task.to_string(),
                    index,
                });
            }
            let removed = deps.remove(index);
            debug!(task = %task, predecessor = %removed.id, "removed dependency");
            Ok(removed)
        })
    }

    // ----- ordering ----------------------------------------------------------

    /// Move `from` into the row currently held by `to`. Returns `false` if
    /// nothing moved.
    pub fn move_in_order(&mut self, from: &str, to: &str) -> Result<bool> {
        for id in [from, to] {
            if self.state.task(id).is_none() {
                return Err(GanttError::TaskNotFound(id.to_string()));
            }
        }
        if from == to {
            return Ok(false);
        }
        self.mutate(false, |state, _| Ok(state.manual_order_mut().move_to(from, to)))
    }

    // ----- calendar ----------------------------------------------------------

    /// Returns `false` (and records nothing) if `date` already was a holiday.
    pub fn add_holiday(&mut self, date: NaiveDate) -> Result<bool> {
        if self.state.calendar().is_holiday(date) {
            return Ok(false);
        }
        self.mutate(true, |state, _| Ok(state.calendar_mut().add_holiday(date)))
    }

    /// Returns `false` (and records nothing) if `date` was not a holiday.
    pub fn remove_holiday(&mut self, date: NaiveDate) -> Result<bool> {
        if !self.state.calendar().is_holiday(date) {
            return Ok(false);
        }
        self.mutate(true, |state, _| Ok(state.calendar_mut().remove_holiday(date)))
    }

    pub fn set_holidays(&mut self, holidays: Vec<NaiveDate>) -> Result<()> {
        self.mutate(true, |state, _| {
            state.calendar_mut().set_holidays(holidays);
            Ok(())
        })
    }

    /// Replace the holiday set from a holiday document. Returns the number
    /// of holidays now in effect.
    pub fn import_holidays(&mut self, text: &str) -> Result<usize> {
        let holidays = json_io::parse_holidays(text)?;
        self.set_holidays(holidays)?;
        Ok(self.state.calendar().holiday_count())
    }

    pub fn export_holidays(&self) -> Result<String> {
        json_io::export_holidays(&self.state)
    }

    // ----- interchange -------------------------------------------------------

    /// Replace the whole project with a structured JSON payload.
    pub fn import_json(&mut self, text: &str) -> Result<LoadReport> {
        let (next, report) = json_io::import_project(text, self.today())?;
        self.install(next, true)?;
        info!(
            tasks = report.accepted,
            discarded = report.discarded,
            "imported JSON project"
        );
        Ok(report)
    }

    /// Replace the whole project with a text Gantt chart. Returns the number
    /// of tasks imported.
    pub fn import_mermaid(&mut self, text: &str) -> Result<usize> {
        let next = mermaid::import(text, self.mermaid.group_by, self.today())?;
        let count = next.tasks().len();
        self.install(next, true)?;
        info!(tasks = count, "imported text Gantt chart");
        Ok(count)
    }

    pub fn export_json(&self) -> Result<String> {
        json_io::export_project(&self.state)
    }

    pub fn export_mermaid(&self) -> String {
        mermaid::export(&self.state, &self.mermaid)
    }

    // ----- lifecycle ---------------------------------------------------------

    /// Load a persisted payload as the new base state. History restarts and
    /// nothing is queued for persistence.
    pub fn load_payload(&mut self, text: &str) -> Result<LoadReport> {
        let (mut next, report) = ProjectState::from_json(text, self.today())?;
        next.schedule()?;
        self.state = next;
        self.history.reset();
        self.rebase()?;
        self.pending_payload = None;
        info!(
            tasks = report.accepted,
            discarded = report.discarded,
            skipped_holidays = report.skipped_holidays,
            "loaded persisted project"
        );
        Ok(report)
    }

    /// Drop every task and holiday and restart history from the empty state.
    pub fn reset(&mut self) -> Result<()> {
        self.state = ProjectState::new();
        self.history.reset();
        let snapshot = self.state.snapshot()?;
        self.record(snapshot);
        info!("project reset");
        Ok(())
    }

    /// Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(snapshot) = self.history.undo().map(str::to_string) else {
            return Ok(false);
        };
        if let Err(e) = self.apply_snapshot(&snapshot) {
            self.history.redo();
            return Err(e);
        }
        debug!(index = ?self.history.index(), "undo applied");
        Ok(true)
    }

    /// Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(snapshot) = self.history.redo().map(str::to_string) else {
            return Ok(false);
        };
        if let Err(e) = self.apply_snapshot(&snapshot) {
            self.history.undo();
            return Err(e);
        }
        debug!(index = ?self.history.index(), "redo applied");
        Ok(true)
    }

    fn apply_snapshot(&mut self, snapshot: &str) -> Result<()> {
        self.history.suspend();
        let result = self.restore(snapshot);
        self.history.resume();
        result
    }

    fn restore(&mut self, snapshot: &str) -> Result<()> {
        let (mut next, report) = ProjectState::from_json(snapshot, self.today())?;
        if report.discarded > 0 {
            warn!(discarded = report.discarded, "snapshot contained unusable task records");
        }
        next.schedule()?;
        let payload = next.snapshot()?;
        self.state = next;
        self.record(payload);
        Ok(())
    }

    // ----- internals ---------------------------------------------------------

    fn mutate<T>(
        &mut self,
        schedule: bool,
        edit: impl FnOnce(&mut ProjectState, NaiveDate) -> Result<T>,
    ) -> Result<T> {
        let mut next = self.state.clone();
        let out = edit(&mut next, self.today())?;
        self.install(next, schedule)?;
        Ok(out)
    }

    fn install(&mut self, mut next: ProjectState, schedule: bool) -> Result<()> {
        if schedule {
            next.schedule()?;
        }
        let snapshot = next.snapshot()?;
        self.state = next;
        self.record(snapshot);
        Ok(())
    }

    fn record(&mut self, snapshot: String) {
        self.history.commit(snapshot.clone());
        self.pending_payload = Some(snapshot);
    }

    fn rebase(&mut self) -> Result<()> {
        let snapshot = self.state.snapshot()?;
        self.history.commit(snapshot);
        Ok(())
    }
}

fn find<'s>(state: &'s ProjectState, id: &str) -> Result<&'s Task> {
    state
        .task(id)
        .ok_or_else(|| GanttError::TaskNotFound(id.to_string()))
}

fn task_mut<'s>(state: &'s mut ProjectState, id: &str) -> Result<&'s mut Task> {
    state
        .task_mut(id)
        .ok_or_else(|| GanttError::TaskNotFound(id.to_string()))
}

fn set_dates(
    state: &mut ProjectState,
    id: &str,
    start: NaiveDate,
    end: NaiveDate,
    duration: u32,
) -> Result<()> {
    let task = task_mut(state, id)?;
    task.start = start;
    task.end = end;
    task.duration = duration;
    Ok(())
}

fn shift(date: NaiveDate, delta_days: i64) -> Result<NaiveDate> {
    let days = Days::new(delta_days.unsigned_abs());
    let shifted = if delta_days >= 0 {
        date.checked_add_days(days)
    } else {
        date.checked_sub_days(days)
    };
    shifted.ok_or_else(|| {
        GanttError::Validation(format!("shifting {date} by {delta_days} days is out of range"))
    })
}
