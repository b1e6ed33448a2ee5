// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;

use crate::dag::task::Task;

/// Dependency graph over a task slice.
///
/// Nodes are positions in the slice (declaration order), edges point from a
/// predecessor to its successor. Edges to ids that are not in the slice are
/// ignored. Several edges between the same pair collapse into one, which is
/// all the cycle detector and the topological order need.
#[derive(Debug, Clone)]
pub struct TaskGraph<'a> {
    ids: Vec<&'a str>,
    graph: DiGraphMap<usize, ()>,
}

impl<'a> TaskGraph<'a> {
    pub fn from_tasks(tasks: &'a [Task]) -> Self {
        let mut graph = DiGraphMap::new();
        let mut index = HashMap::with_capacity(tasks.len());
        let mut ids = Vec::with_capacity(tasks.len());

        // First pass: one node per task, in declaration order.
        for (pos, task) in tasks.iter().enumerate() {
            graph.add_node(pos);
            index.entry(task.id.as_str()).or_insert(pos);
            ids.push(task.id.as_str());
        }

        // Second pass: predecessor -> successor edges.
        for (pos, task) in tasks.iter().enumerate() {
            for pred in task.predecessor_ids() {
                if let Some(&from) = index.get(pred) {
                    graph.add_edge(from, pos, ());
                }
            }
        }

        Self { ids, graph }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id_at(&self, pos: usize) -> &'a str {
        self.ids[pos]
    }

    /// Positions of the tasks `pos` depends on.
    pub fn dependencies_of(&self, pos: usize) -> Vec<usize> {
        self.graph
            .neighbors_directed(pos, Direction::Incoming)
            .collect()
    }

    /// Positions of the tasks that depend on `pos`.
    pub fn dependents_of(&self, pos: usize) -> Vec<usize> {
        self.graph
            .neighbors_directed(pos, Direction::Outgoing)
            .collect()
    }

    /// Number of distinct known predecessors of `pos`.
    pub fn in_degree(&self, pos: usize) -> usize {
        self.graph
            .neighbors_directed(pos, Direction::Incoming)
            .count()
    }

    pub fn as_graphmap(&self) -> &DiGraphMap<usize, ()> {
        &self.graph
    }
}
