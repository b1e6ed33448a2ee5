// src/dag/cycle.rs

//! Cyclic-dependency detection.
//!
//! Depth-first search with three-state colouring: a node is unvisited, in
//! progress (on the current DFS path) or done. Reaching an in-progress node
//! again means a back-edge, i.e. a cycle. The search keeps its own explicit
//! stack so deep dependency chains cannot overflow the call stack.

use std::collections::HashSet;

use tracing::debug;

use crate::dag::graph::TaskGraph;
use crate::dag::task::Task;
use crate::errors::{GanttError, Result};

struct Frame {
    node: usize,
    targets: Vec<usize>,
    cursor: usize,
}

/// Position of a task on some cycle, if the graph has one.
pub fn find_cycle(graph: &TaskGraph<'_>) -> Option<usize> {
    let mut in_progress = HashSet::new();
    let mut done = HashSet::new();

    (0..graph.len()).find_map(|root| {
        if done.contains(&root) {
            None
        } else {
            visit(graph, root, &mut in_progress, &mut done)
        }
    })
}

/// Walk from `root` along dependency edges. Returns the node where a
/// back-edge landed.
fn visit(
    graph: &TaskGraph<'_>,
    root: usize,
    in_progress: &mut HashSet<usize>,
    done: &mut HashSet<usize>,
) -> Option<usize> {
    in_progress.insert(root);
    let mut stack = vec![Frame {
        node: root,
        targets: graph.dependencies_of(root),
        cursor: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        if frame.cursor < frame.targets.len() {
            let next = frame.targets[frame.cursor];
            frame.cursor += 1;

            if in_progress.contains(&next) {
                return Some(next);
            }
            if done.contains(&next) {
                continue;
            }
            in_progress.insert(next);
            stack.push(Frame {
                node: next,
                targets: graph.dependencies_of(next),
                cursor: 0,
            });
        } else {
            let node = frame.node;
            stack.pop();
            in_progress.remove(&node);
            done.insert(node);
        }
    }

    None
}

pub fn has_cycle(tasks: &[Task]) -> bool {
    find_cycle(&TaskGraph::from_tasks(tasks)).is_some()
}

/// `Err(CyclicDependency)` naming a task on the cycle, if there is one.
pub fn ensure_acyclic(tasks: &[Task]) -> Result<()> {
    let graph = TaskGraph::from_tasks(tasks);
    match find_cycle(&graph) {
        None => Ok(()),
        Some(pos) => {
            let task = graph.id_at(pos).to_string();
            debug!(task = %task, "cycle detected in dependency graph");
            Err(GanttError::CyclicDependency { task })
        }
    }
}
