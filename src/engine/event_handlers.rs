// src/engine/event_handlers.rs

//! Edit handling logic for the planner core.

use tracing::{debug, warn};

use crate::engine::core::PlannerCore;
use crate::engine::{Edit, Notification};
use crate::errors::Result;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Hand this payload to the persistence writer.
    Persist(String),
    /// Show this message to the user.
    Notify(Notification),
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute (persist, notify).
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Apply one edit to the core.
///
/// A failed edit is reported as an error notification and never stops the
/// runtime; the state is untouched in that case. A successful edit yields a
/// `Persist` command carrying the new payload, plus an informational
/// notification for edits a user would expect feedback on.
pub fn handle_edit(core: &mut PlannerCore, edit: Edit) -> CoreStep {
    let label = edit_label(&edit);
    let mut commands = Vec::new();

    match apply_edit(core, edit) {
        Ok(note) => {
            debug!(edit = label, "edit applied");
            if let Some(payload) = core.take_pending_payload() {
                commands.push(CoreCommand::Persist(payload));
            }
            if let Some(note) = note {
                commands.push(CoreCommand::Notify(note));
            }
        }
        Err(e) => {
            warn!(edit = label, error = %e, "edit rejected");
            commands.push(CoreCommand::Notify(Notification::error(format!(
                "{label} failed: {e}"
            ))));
        }
    }

    CoreStep::running(commands)
}

/// Dispatch an edit to the matching controller operation. Returns an
/// optional message for the user.
fn apply_edit(core: &mut PlannerCore, edit: Edit) -> Result<Option<Notification>> {
    match edit {
        Edit::AddTask(new) => {
            let id = core.add_task(new)?;
            Ok(Some(Notification::info(format!("added task {id}"))))
        }
        Edit::DeleteTask(id) => {
            let removed = core.delete_task(&id)?;
            Ok(Some(Notification::info(format!(
                "deleted task '{}'",
                removed.title
            ))))
        }
        Edit::UpdateTask { id, patch } => core.update_task(&id, patch).map(|_| None),
        Edit::SetStart { id, date } => core.set_start(&id, date).map(|_| None),
        Edit::SetEnd { id, date } => core.set_end(&id, date).map(|_| None),
        Edit::SetDuration { id, duration } => core.set_duration(&id, duration).map(|_| None),
        Edit::SetMilestone { id, milestone } => core.set_milestone(&id, milestone).map(|_| None),
        Edit::Drag {
            id,
            mode,
            delta_days,
        } => core.drag_task(&id, mode, delta_days).map(|_| None),
        Edit::AddDependency {
            task,
            predecessor,
            kind,
        } => core.add_dependency(&task, &predecessor, kind).map(|_| None),
        Edit::UpdateDependency { task, index, edge } => {
            core.update_dependency(&task, index, edge).map(|_| None)
        }
        Edit::RemoveDependency { task, index } => {
            core.remove_dependency(&task, index).map(|_| None)
        }
        Edit::MoveInOrder { from, to } => core.move_in_order(&from, &to).map(|_| None),
        Edit::AddHoliday(date) => core.add_holiday(date).map(|_| None),
        Edit::RemoveHoliday(date) => core.remove_holiday(date).map(|_| None),
        Edit::SetHolidays(dates) => core.set_holidays(dates).map(|_| None),
        Edit::ImportHolidays(text) => {
            let count = core.import_holidays(&text)?;
            Ok(Some(Notification::info(format!(
                "holidays updated ({count} in effect)"
            ))))
        }
        Edit::ImportJson(text) => {
            let report = core.import_json(&text)?;
            let message = format!("imported {} task(s) from JSON", report.accepted);
            Ok(Some(if report.discarded > 0 {
                Notification::warning(format!(
                    "{message}; {} unusable record(s) discarded",
                    report.discarded
                ))
            } else {
                Notification::info(message)
            }))
        }
        Edit::ImportMermaid(text) => {
            let count = core.import_mermaid(&text)?;
            Ok(Some(Notification::info(format!(
                "imported {count} task(s) from Gantt text"
            ))))
        }
        Edit::Reset => {
            core.reset()?;
            Ok(Some(Notification::info("project reset")))
        }
        Edit::Undo => core
            .undo()
            .map(|applied| (!applied).then(|| Notification::info("nothing to undo"))),
        Edit::Redo => core
            .redo()
            .map(|applied| (!applied).then(|| Notification::info("nothing to redo"))),
    }
}

fn edit_label(edit: &Edit) -> &'static str {
    match edit {
        Edit::AddTask(_) => "add task",
        Edit::DeleteTask(_) => "delete task",
        Edit::UpdateTask { .. } => "update task",
        Edit::SetStart { .. } => "set start",
        Edit::SetEnd { .. } => "set end",
        Edit::SetDuration { .. } => "set duration",
        Edit::SetMilestone { .. } => "set milestone",
        Edit::Drag { .. } => "drag",
        Edit::AddDependency { .. } => "add dependency",
        Edit::UpdateDependency { .. } => "update dependency",
        Edit::RemoveDependency { .. } => "remove dependency",
        Edit::MoveInOrder { .. } => "reorder",
        Edit::AddHoliday(_) => "add holiday",
        Edit::RemoveHoliday(_) => "remove holiday",
        Edit::SetHolidays(_) => "set holidays",
        Edit::ImportHolidays(_) => "import holidays",
        Edit::ImportJson(_) => "import JSON",
        Edit::ImportMermaid(_) => "import Gantt text",
        Edit::Reset => "reset",
        Edit::Undo => "undo",
        Edit::Redo => "redo",
    }
}
