#![allow(dead_code)]

use chrono::NaiveDate;
use serde_json::{Value, json};

use ganttdag::calendar::{Calendar, format_date};
use ganttdag::dag::{DependencyEdge, RawTask, Task, normalize};
use ganttdag::engine::NewTask;
use ganttdag::project::{ManualOrder, ProjectState};
use ganttdag::types::{DependencyType, TaskStatus};

use crate::fixed_today;

/// Builder for loosely-typed task records, as found in payloads.
pub struct RawTaskBuilder {
    raw: RawTask,
    deps: Vec<Value>,
}

impl RawTaskBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            raw: RawTask {
                id: Some(Value::from(id)),
                title: Some(Value::from(id.to_uppercase())),
                ..RawTask::default()
            },
            deps: Vec::new(),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.raw.title = Some(Value::from(title));
        self
    }

    pub fn start(mut self, date: NaiveDate) -> Self {
        self.raw.start = Some(Value::from(format_date(date)));
        self
    }

    pub fn end(mut self, date: NaiveDate) -> Self {
        self.raw.end = Some(Value::from(format_date(date)));
        self
    }

    pub fn duration(mut self, days: u32) -> Self {
        self.raw.duration = Some(Value::from(days));
        self
    }

    pub fn milestone(mut self) -> Self {
        self.raw.is_milestone = Some(Value::from(true));
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.raw.category = Some(Value::from(category));
        self
    }

    pub fn assignee(mut self, assignee: &str) -> Self {
        self.raw.assignee = Some(Value::from(assignee));
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.raw.status = Some(Value::from(status.as_str()));
        self
    }

    /// Finish-to-start dependency on `id`.
    pub fn after(self, id: &str) -> Self {
        self.dep(id, DependencyType::FS)
    }

    pub fn dep(mut self, id: &str, kind: DependencyType) -> Self {
        self.deps.push(json!({ "id": id, "type": kind.as_str() }));
        self
    }

    pub fn build(mut self) -> RawTask {
        if !self.deps.is_empty() {
            self.raw.dependencies = Some(Value::Array(self.deps));
        }
        self.raw
    }

    /// Normalize against `calendar` with the fixed test date as today.
    pub fn normalized(self, calendar: &Calendar) -> Task {
        normalize(self.build(), calendar, fixed_today()).expect("normalizable record")
    }
}

/// Build a (not yet scheduled) project from raw records.
pub fn project(records: Vec<RawTask>, holidays: &[NaiveDate]) -> ProjectState {
    let calendar = Calendar::with_holidays(holidays.iter().copied());
    let tasks: Vec<Task> = records
        .into_iter()
        .map(|raw| normalize(raw, &calendar, fixed_today()).expect("normalizable record"))
        .collect();
    ProjectState::from_parts(tasks, calendar, ManualOrder::default())
}

/// Builder for tasks added through the controller.
#[derive(Default)]
pub struct NewTaskBuilder {
    task: NewTask,
}

impl NewTaskBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            task: NewTask {
                title: Some(title.to_string()),
                ..NewTask::default()
            },
        }
    }

    pub fn start(mut self, date: NaiveDate) -> Self {
        self.task.start = Some(date);
        self
    }

    pub fn duration(mut self, days: u32) -> Self {
        self.task.duration = Some(days);
        self
    }

    pub fn milestone(mut self) -> Self {
        self.task.is_milestone = true;
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.task.category = category.to_string();
        self
    }

    pub fn after(mut self, id: &str) -> Self {
        self.task.dependencies.push(DependencyEdge::finish_to_start(id));
        self
    }

    pub fn build(self) -> NewTask {
        self.task
    }
}
