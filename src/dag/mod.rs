// src/dag/mod.rs

//! Task graph, normalization and scheduling.
//!
//! - [`task`] holds the task record and the normalizer.
//! - [`graph`] builds predecessor/successor adjacency over a task slice.
//! - [`cycle`] rejects dependency sets that would form a cycle.
//! - [`scheduler`] propagates dates in topological order.
//! - [`scheduler_step`] describes what a scheduling pass changed.

pub mod cycle;
pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod task;

pub use cycle::{ensure_acyclic, has_cycle};
pub use graph::TaskGraph;
pub use scheduler::{Scheduler, schedule_all};
pub use scheduler_step::ScheduleOutcome;
pub use task::{DependencyEdge, RawTask, Task, TaskId, normalize};
