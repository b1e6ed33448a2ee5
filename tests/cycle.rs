// tests/cycle.rs

mod common;
use crate::common::RawTaskBuilder;

use petgraph::algo::is_cyclic_directed;
use proptest::prelude::*;

use ganttdag::calendar::Calendar;
use ganttdag::dag::{DependencyEdge, Task, TaskGraph, ensure_acyclic, has_cycle};
use ganttdag::errors::GanttError;

fn tasks(edges: &[(&str, &[&str])]) -> Vec<Task> {
    let cal = Calendar::new();
    edges
        .iter()
        .map(|(id, preds)| {
            let mut task = RawTaskBuilder::new(id).normalized(&cal);
            task.dependencies = preds
                .iter()
                .map(|p| DependencyEdge::finish_to_start(*p))
                .collect();
            task
        })
        .collect()
}

#[test]
fn chain_and_diamond_are_acyclic() {
    let chain = tasks(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);
    assert!(!has_cycle(&chain));
    assert!(ensure_acyclic(&chain).is_ok());

    let diamond = tasks(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);
    assert!(!has_cycle(&diamond));
}

#[test]
fn three_cycle_is_detected_and_named() {
    let cyclic = tasks(&[("a", &["c"]), ("b", &["a"]), ("c", &["b"])]);
    assert!(has_cycle(&cyclic));

    let err = ensure_acyclic(&cyclic).unwrap_err();
    match err {
        GanttError::CyclicDependency { task } => {
            assert!(["a", "b", "c"].contains(&task.as_str()), "unexpected task {task}");
        }
        other => panic!("expected CyclicDependency, got {other:?}"),
    }
}

#[test]
fn self_edge_counts_as_a_cycle() {
    let looped = tasks(&[("a", &["a"])]);
    assert!(has_cycle(&looped));
}

#[test]
fn cycle_off_the_first_root_is_found() {
    let graph = tasks(&[("x", &[]), ("y", &["x"]), ("p", &["q"]), ("q", &["p"])]);
    assert!(has_cycle(&graph));
}

#[test]
fn dangling_edges_are_ignored() {
    let graph = tasks(&[("a", &["ghost"]), ("b", &["a", "missing"])]);
    assert!(!has_cycle(&graph));
    let g = TaskGraph::from_tasks(&graph);
    assert_eq!(g.in_degree(0), 0);
    assert_eq!(g.in_degree(1), 1);
}

#[test]
fn deep_chain_does_not_overflow() {
    let cal = Calendar::new();
    let mut chain: Vec<Task> = Vec::new();
    for i in 0..20_000 {
        let mut task = RawTaskBuilder::new(&format!("t{i}")).normalized(&cal);
        if i > 0 {
            task.dependencies
                .push(DependencyEdge::finish_to_start(format!("t{}", i - 1)));
        }
        chain.push(task);
    }
    assert!(!has_cycle(&chain));

    chain[0]
        .dependencies
        .push(DependencyEdge::finish_to_start("t19999"));
    assert!(has_cycle(&chain));
}

proptest! {
    #[test]
    fn agrees_with_petgraph(
        n in 1usize..9,
        raw_edges in proptest::collection::vec((0usize..9, 0usize..9), 0..20),
    ) {
        let ids: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
        let cal = Calendar::new();
        let mut set: Vec<Task> = ids
            .iter()
            .map(|id| RawTaskBuilder::new(id).normalized(&cal))
            .collect();
        for (from, to) in raw_edges {
            let (from, to) = (from % n, to % n);
            set[to]
                .dependencies
                .push(DependencyEdge::finish_to_start(ids[from].clone()));
        }

        let graph = TaskGraph::from_tasks(&set);
        prop_assert_eq!(has_cycle(&set), is_cyclic_directed(graph.as_graphmap()));
    }
}
