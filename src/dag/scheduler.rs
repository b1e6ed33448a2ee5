// src/dag/scheduler.rs

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::calendar::{Calendar, Direction};
use crate::dag::cycle::ensure_acyclic;
use crate::dag::graph::TaskGraph;
use crate::dag::scheduler_step::ScheduleOutcome;
use crate::dag::task::Task;
use crate::errors::Result;
use crate::types::DependencyType;

/// Topological date propagation over a task set.
///
/// One pass over the tasks in topological order is enough: every
/// predecessor has its final dates before any of its successors is
/// evaluated, so constraints never need re-checking.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler<'c> {
    calendar: &'c Calendar,
}

/// Bounds derived from a task's incoming edges. `None` means unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Constraints {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl Constraints {
    /// Latest date wins, regardless of the order edges are declared in.
    fn raise(slot: &mut Option<NaiveDate>, candidate: NaiveDate) {
        if slot.is_none_or(|current| candidate > current) {
            *slot = Some(candidate);
        }
    }
}

impl<'c> Scheduler<'c> {
    pub fn new(calendar: &'c Calendar) -> Self {
        Self { calendar }
    }

    /// Kahn's algorithm over declaration positions.
    ///
    /// The queue is seeded in declaration order, so independent tasks are
    /// evaluated in the order they were declared. Returns `None` if not every
    /// task could be ordered (a cycle slipped through).
    pub fn evaluation_order(tasks: &[Task]) -> Option<Vec<usize>> {
        let graph = TaskGraph::from_tasks(tasks);
        let mut in_degree: Vec<usize> = (0..graph.len()).map(|pos| graph.in_degree(pos)).collect();

        let mut queue: VecDeque<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(pos, _)| pos)
            .collect();

        let mut order = Vec::with_capacity(graph.len());
        while let Some(pos) = queue.pop_front() {
            order.push(pos);
            for next in graph.dependents_of(pos) {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        (order.len() == tasks.len()).then_some(order)
    }

    /// Recompute start/end of every task in place.
    ///
    /// Refuses (leaving every date untouched) if the dependency graph has a
    /// cycle.
    pub fn schedule_all(&self, tasks: &mut [Task]) -> Result<ScheduleOutcome> {
        ensure_acyclic(tasks)?;

        let mut outcome = ScheduleOutcome::default();
        let order = match Self::evaluation_order(tasks) {
            Some(order) => order,
            None => {
                warn!("topological order incomplete; falling back to declaration order");
                outcome.fell_back_to_declaration_order = true;
                (0..tasks.len()).collect()
            }
        };

        let positions: HashMap<String, usize> = tasks
            .iter()
            .enumerate()
            .rev()
            .map(|(pos, t)| (t.id.clone(), pos))
            .collect();

        for pos in order {
            let (start, end, duration) = self.resolve(&tasks[pos], tasks, &positions)?;
            let task = &mut tasks[pos];
            if task.start != start || task.end != end || task.duration != duration {
                debug!(
                    task = %task.id,
                    old_start = %task.start,
                    old_end = %task.end,
                    new_start = %start,
                    new_end = %end,
                    "scheduler moved task"
                );
                outcome.shifted.push(task.id.clone());
            }
            task.start = start;
            task.end = end;
            task.duration = duration;
            outcome.order.push(task.id.clone());
        }

        debug!(
            tasks = outcome.order.len(),
            shifted = outcome.shifted.len(),
            "scheduling pass complete"
        );
        Ok(outcome)
    }

    /// Dates for one task given the (already final) dates of its
    /// predecessors.
    fn resolve(
        &self,
        task: &Task,
        tasks: &[Task],
        positions: &HashMap<String, usize>,
    ) -> Result<(NaiveDate, NaiveDate, u32)> {
        let duration = if task.is_milestone {
            1
        } else {
            task.duration.max(1)
        };
        let span = i64::from(duration) - 1;
        let constraints = self.constraints_for(task, tasks, positions)?;

        let mut start = task.start;
        if let Some(bound) = constraints.start {
            if bound > start {
                start = bound;
            }
        }
        start = self.calendar.next_workday(start, Direction::Forward)?;
        let mut end = self.calendar.add_workdays(start, span)?;

        if let Some(bound) = constraints.end {
            if bound > end {
                end = self.calendar.next_workday(bound, Direction::Forward)?;
                start = self.calendar.add_workdays(end, -span)?;
            }
        }

        Ok((start, end, duration))
    }

    fn constraints_for(
        &self,
        task: &Task,
        tasks: &[Task],
        positions: &HashMap<String, usize>,
    ) -> Result<Constraints> {
        let mut constraints = Constraints::default();

        for edge in &task.dependencies {
            let Some(&pred_pos) = positions.get(&edge.id) else {
                continue;
            };
            let pred = &tasks[pred_pos];
            let cal = self.calendar;
            match edge.kind {
                DependencyType::FS => {
                    let bound = cal.add_workdays(pred.end, 1)?;
                    Constraints::raise(&mut constraints.start, bound);
                }
                DependencyType::SS => {
                    let bound = cal.next_workday(pred.start, Direction::Forward)?;
                    Constraints::raise(&mut constraints.start, bound);
                }
                DependencyType::FF => {
                    let bound = cal.next_workday(pred.end, Direction::Forward)?;
                    Constraints::raise(&mut constraints.end, bound);
                }
                DependencyType::SF => {
                    let bound = cal.next_workday(pred.start, Direction::Forward)?;
                    Constraints::raise(&mut constraints.end, bound);
                }
            }
        }

        Ok(constraints)
    }
}

/// Convenience wrapper: schedule `tasks` under `calendar`.
pub fn schedule_all(tasks: &mut [Task], calendar: &Calendar) -> Result<ScheduleOutcome> {
    Scheduler::new(calendar).schedule_all(tasks)
}
