#![allow(dead_code)]

pub use ganttdag_test_utils::builders::{NewTaskBuilder, RawTaskBuilder, project};
pub use ganttdag_test_utils::stores::RecordingStore;
pub use ganttdag_test_utils::{core, date, fixed_today, init_tracing, with_timeout};

use ganttdag::dag::Task;
use ganttdag::project::ProjectState;

/// Build a project from raw records and run one scheduling pass.
pub fn scheduled(
    records: Vec<ganttdag::dag::RawTask>,
    holidays: &[chrono::NaiveDate],
) -> ProjectState {
    let mut state = project(records, holidays);
    state.schedule().expect("acyclic project");
    state
}

pub fn task<'s>(state: &'s ProjectState, id: &str) -> &'s Task {
    state
        .task(id)
        .unwrap_or_else(|| panic!("task {id} should exist"))
}
