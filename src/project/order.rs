// src/project/order.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dag::task::{Task, TaskId};

/// User-defined row order: always a permutation of the live task ids once
/// [`ManualOrder::sync`] has run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManualOrder(Vec<TaskId>);

impl ManualOrder {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn as_slice(&self) -> &[TaskId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.0.iter().position(|x| x == id)
    }

    /// Drop ids that are not live (and repeats), then append live ids that
    /// are missing, in task declaration order.
    pub fn sync(&mut self, tasks: &[Task]) {
        let live: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        let mut seen = HashSet::with_capacity(self.0.len());
        self.0
            .retain(|id| live.contains(id.as_str()) && seen.insert(id.clone()));

        for task in tasks {
            if !seen.contains(&task.id) {
                seen.insert(task.id.clone());
                self.0.push(task.id.clone());
            }
        }
    }

    /// Move `from` into the slot currently occupied by `to`.
    ///
    /// Returns `false` if either id is unknown or they are the same.
    pub fn move_to(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return false;
        }
        let (Some(from_idx), Some(to_idx)) = (self.position(from), self.position(to)) else {
            return false;
        };
        let id = self.0.remove(from_idx);
        self.0.insert(to_idx, id);
        true
    }
}
