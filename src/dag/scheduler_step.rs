// src/dag/scheduler_step.rs

//! Result type of a scheduling pass.

use crate::dag::task::TaskId;

/// Structured result of one full scheduling pass.
///
/// Useful for tests and diagnostics that want to know what the pass
/// actually did, not just the final dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleOutcome {
    /// Task ids in the order they were evaluated.
    pub order: Vec<TaskId>,
    /// Tasks whose start, end or duration changed during the pass.
    pub shifted: Vec<TaskId>,
    /// Whether the topological order was unusable and declaration order
    /// was used instead.
    pub fell_back_to_declaration_order: bool,
}

impl ScheduleOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.shifted.is_empty()
    }
}
