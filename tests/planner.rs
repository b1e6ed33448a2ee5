// tests/planner.rs

mod common;
use crate::common::{NewTaskBuilder, RawTaskBuilder, core, date, init_tracing, project};

use ganttdag::dag::DependencyEdge;
use ganttdag::engine::core::{NEW_TASK_DURATION, NEW_TASK_TITLE};
use ganttdag::engine::{
    CoreCommand, DragMode, Edit, NewTask, NotificationLevel, PlannerCore, RuntimeEvent, TaskPatch,
};
use ganttdag::errors::GanttError;
use ganttdag::types::{DependencyType, TaskStatus};

/// A: Mon 2024-06-03 .. Wed 2024-06-05; B after A.
fn two_task_core() -> (PlannerCore, String, String) {
    let mut c = core();
    let a = c
        .add_task(NewTaskBuilder::new("A").start(date(2024, 6, 3)).duration(3).build())
        .unwrap();
    let b = c
        .add_task(NewTaskBuilder::new("B").duration(2).after(&a).build())
        .unwrap();
    c.take_pending_payload();
    (c, a, b)
}

/// Runs `edit` and asserts it failed without changing anything.
fn assert_rejected<T: std::fmt::Debug>(
    c: &mut PlannerCore,
    edit: impl FnOnce(&mut PlannerCore) -> ganttdag::errors::Result<T>,
) -> GanttError {
    c.take_pending_payload();
    let before = c.state().snapshot().unwrap();
    let history = c.history().len();

    let err = edit(c).unwrap_err();

    assert_eq!(c.state().snapshot().unwrap(), before);
    assert_eq!(c.history().len(), history);
    assert_eq!(c.take_pending_payload(), None);
    err
}

#[test]
fn new_task_gets_row_defaults() {
    let mut c = core();
    let id = c.add_task(NewTask::default()).unwrap();
    let t = c.task(&id).unwrap();

    assert_eq!(t.title, NEW_TASK_TITLE);
    assert_eq!(t.start, date(2024, 6, 3));
    assert_eq!(t.duration, NEW_TASK_DURATION);
    assert_eq!(t.end, date(2024, 6, 5));
    assert_eq!(c.state().manual_order().as_slice(), &[id]);
}

#[test]
fn new_task_is_scheduled_after_its_predecessor() {
    let (c, _, b) = two_task_core();
    let b = c.task(&b).unwrap();
    assert_eq!(b.start, date(2024, 6, 6));
    assert_eq!(b.end, date(2024, 6, 7));
}

#[test]
fn new_milestone_is_one_day() {
    let mut c = core();
    let id = c
        .add_task(NewTaskBuilder::new("Go live").duration(4).milestone().build())
        .unwrap();
    let t = c.task(&id).unwrap();
    assert_eq!(t.duration, 1);
    assert_eq!(t.start, t.end);
}

#[test]
fn new_task_with_unknown_predecessor_is_rejected() {
    let (mut c, _, _) = two_task_core();
    let err = assert_rejected(&mut c, |c| {
        c.add_task(NewTaskBuilder::new("C").after("ghost").build())
    });
    assert!(matches!(err, GanttError::TaskNotFound(id) if id == "ghost"));
}

#[test]
fn deleting_a_task_removes_edges_to_it() {
    let (mut c, a, b) = two_task_core();
    let removed = c.delete_task(&a).unwrap();

    assert_eq!(removed.title, "A");
    assert!(c.task(&b).unwrap().dependencies.is_empty());
    assert_eq!(c.state().manual_order().as_slice(), &[b]);

    let err = assert_rejected(&mut c, |c| c.delete_task("nope"));
    assert!(matches!(err, GanttError::TaskNotFound(_)));
}

#[test]
fn text_patch_updates_fields_without_moving_dates() {
    let (mut c, a, _) = two_task_core();
    let before = c.task(&a).unwrap().clone();

    c.update_task(
        &a,
        TaskPatch {
            title: Some("  Design  ".into()),
            status: Some(TaskStatus::Done),
            category: Some("Eng".into()),
            ..TaskPatch::default()
        },
    )
    .unwrap();

    let t = c.task(&a).unwrap();
    assert_eq!(t.title, "Design");
    assert_eq!(t.status, TaskStatus::Done);
    assert_eq!(t.category, "Eng");
    assert_eq!((t.start, t.end, t.duration), (before.start, before.end, before.duration));

    c.update_task(&a, TaskPatch { title: Some("   ".into()), ..TaskPatch::default() })
        .unwrap();
    assert_eq!(c.task(&a).unwrap().title, "Untitled");
}

#[test]
fn empty_patch_records_nothing() {
    let (mut c, a, _) = two_task_core();
    let len = c.history().len();
    c.update_task(&a, TaskPatch::default()).unwrap();
    assert_eq!(c.history().len(), len);

    let err = assert_rejected(&mut c, |c| c.update_task("nope", TaskPatch::default()));
    assert!(matches!(err, GanttError::TaskNotFound(_)));
}

#[test]
fn set_start_snaps_forward_keeps_duration_and_pushes_successors() {
    let (mut c, a, b) = two_task_core();
    c.set_start(&a, date(2024, 6, 8)).unwrap();

    let a = c.task(&a).unwrap();
    assert_eq!(a.start, date(2024, 6, 10));
    assert_eq!(a.end, date(2024, 6, 12));
    assert_eq!(a.duration, 3);
    assert_eq!(c.task(&b).unwrap().start, date(2024, 6, 13));
}

#[test]
fn set_end_snaps_backward_and_recomputes_duration() {
    let (mut c, a, _) = two_task_core();
    c.set_end(&a, date(2024, 6, 8)).unwrap();
    let t = c.task(&a).unwrap();
    assert_eq!(t.end, date(2024, 6, 7));
    assert_eq!(t.duration, 5);

    // An end before the start collapses the task to its first day.
    c.set_end(&a, date(2024, 5, 31)).unwrap();
    let t = c.task(&a).unwrap();
    assert_eq!(t.duration, 1);
    assert_eq!(t.end, t.start);
}

#[test]
fn set_duration_is_clamped() {
    let (mut c, a, _) = two_task_core();
    c.set_duration(&a, 0).unwrap();
    assert_eq!(c.task(&a).unwrap().duration, 1);

    c.set_duration(&a, 10).unwrap();
    let t = c.task(&a).unwrap();
    assert_eq!(t.duration, 10);
    assert_eq!(t.end, date(2024, 6, 14));
}

#[test]
fn toggling_milestone_collapses_the_task() {
    let (mut c, a, _) = two_task_core();
    c.set_milestone(&a, true).unwrap();
    let t = c.task(&a).unwrap();
    assert!(t.is_milestone);
    assert_eq!(t.duration, 1);
    assert_eq!(t.start, t.end);

    c.set_duration(&a, 7).unwrap();
    assert_eq!(c.task(&a).unwrap().duration, 1);
}

#[test]
fn drag_move_keeps_duration_and_skips_weekends() {
    let (mut c, a, b) = two_task_core();
    c.drag_task(&a, DragMode::Move, 5).unwrap();

    let t = c.task(&a).unwrap();
    assert_eq!(t.start, date(2024, 6, 10));
    assert_eq!(t.end, date(2024, 6, 12));
    assert_eq!(t.duration, 3);
    assert_eq!(c.task(&b).unwrap().start, date(2024, 6, 13));
}

#[test]
fn drag_resize_end_keeps_the_start() {
    let (mut c, a, _) = two_task_core();
    c.drag_task(&a, DragMode::ResizeEnd, 3).unwrap();
    let t = c.task(&a).unwrap();
    assert_eq!(t.start, date(2024, 6, 3));
    assert_eq!(t.end, date(2024, 6, 7));
    assert_eq!(t.duration, 5);

    c.drag_task(&a, DragMode::ResizeEnd, -30).unwrap();
    let t = c.task(&a).unwrap();
    assert_eq!(t.end, t.start);
    assert_eq!(t.duration, 1);
}

#[test]
fn drag_resize_start_keeps_the_end() {
    let (mut c, a, _) = two_task_core();
    c.drag_task(&a, DragMode::ResizeStart, 1).unwrap();
    let t = c.task(&a).unwrap();
    assert_eq!(t.start, date(2024, 6, 4));
    assert_eq!(t.end, date(2024, 6, 5));
    assert_eq!(t.duration, 2);

    c.drag_task(&a, DragMode::ResizeStart, 10).unwrap();
    let t = c.task(&a).unwrap();
    assert_eq!(t.start, date(2024, 6, 5));
    assert_eq!(t.duration, 1);
}

#[test]
fn milestones_can_move_but_not_resize() {
    let mut c = core();
    let m = c
        .add_task(NewTaskBuilder::new("M").milestone().build())
        .unwrap();

    let err = assert_rejected(&mut c, |c| c.drag_task(&m, DragMode::ResizeEnd, 2));
    assert!(matches!(err, GanttError::Validation(_)));

    c.drag_task(&m, DragMode::Move, 1).unwrap();
    assert_eq!(c.task(&m).unwrap().start, date(2024, 6, 4));
}

#[test]
fn cycle_closing_dependency_is_rejected_atomically() {
    init_tracing();
    let (mut c, a, b) = two_task_core();
    let err = assert_rejected(&mut c, |c| c.add_dependency(&a, &b, DependencyType::FS));
    assert!(matches!(err, GanttError::CyclicDependency { .. }));

    let err = assert_rejected(&mut c, |c| c.add_dependency(&a, &a, DependencyType::SS));
    assert!(matches!(err, GanttError::SelfDependency(_)));

    let err = assert_rejected(&mut c, |c| c.add_dependency(&a, "ghost", DependencyType::FS));
    assert!(matches!(err, GanttError::TaskNotFound(_)));
}

#[test]
fn dependency_edits_by_index() {
    let (mut c, a, b) = two_task_core();
    let extra = c.add_task(NewTaskBuilder::new("C").build()).unwrap();

    c.add_dependency(&b, &extra, DependencyType::SS).unwrap();
    assert_eq!(c.task(&b).unwrap().dependencies.len(), 2);

    c.update_dependency(&b, 0, DependencyEdge::new(a.clone(), DependencyType::FF))
        .unwrap();
    assert_eq!(c.task(&b).unwrap().dependencies[0].kind, DependencyType::FF);

    let err = assert_rejected(&mut c, |c| {
        c.update_dependency(&b, 9, DependencyEdge::finish_to_start(a.clone()))
    });
    assert!(matches!(err, GanttError::DependencyNotFound { index: 9, .. }));

    let err = assert_rejected(&mut c, |c| {
        c.update_dependency(&b, 0, DependencyEdge::finish_to_start(b.clone()))
    });
    assert!(matches!(err, GanttError::SelfDependency(_)));

    let removed = c.remove_dependency(&b, 1).unwrap();
    assert_eq!(removed.id, extra);
    assert_eq!(c.task(&b).unwrap().dependencies.len(), 1);

    let err = assert_rejected(&mut c, |c| c.remove_dependency(&b, 1));
    assert!(matches!(err, GanttError::DependencyNotFound { .. }));
}

#[test]
fn manual_order_moves_rows() {
    let mut c = core();
    let ids: Vec<String> = ["A", "B", "C"]
        .iter()
        .map(|t| c.add_task(NewTaskBuilder::new(t).build()).unwrap())
        .collect();

    assert!(c.move_in_order(&ids[2], &ids[0]).unwrap());
    assert_eq!(
        c.state().manual_order().as_slice(),
        &[ids[2].clone(), ids[0].clone(), ids[1].clone()]
    );
    // Declaration order is untouched.
    assert_eq!(c.tasks()[0].id, ids[0]);

    let len = c.history().len();
    assert!(!c.move_in_order(&ids[1], &ids[1]).unwrap());
    assert_eq!(c.history().len(), len);

    let err = assert_rejected(&mut c, |c| c.move_in_order("nope", &ids[0]));
    assert!(matches!(err, GanttError::TaskNotFound(_)));
}

#[test]
fn holidays_reschedule_and_no_ops_record_nothing() {
    let (mut c, a, _) = two_task_core();

    assert!(c.add_holiday(date(2024, 6, 4)).unwrap());
    assert_eq!(c.task(&a).unwrap().end, date(2024, 6, 6));

    let len = c.history().len();
    assert!(!c.add_holiday(date(2024, 6, 4)).unwrap());
    assert_eq!(c.history().len(), len);

    assert!(c.remove_holiday(date(2024, 6, 4)).unwrap());
    assert_eq!(c.task(&a).unwrap().end, date(2024, 6, 5));
    assert!(!c.remove_holiday(date(2024, 6, 4)).unwrap());

    c.add_holiday(date(2024, 6, 3)).unwrap();
    let t = c.task(&a).unwrap();
    assert_eq!(t.start, date(2024, 6, 4));
    assert_eq!(t.end, date(2024, 6, 6));
}

#[test]
fn holidays_that_exhaust_the_calendar_reject_the_edit() {
    let (mut c, a, _) = two_task_core();
    let endless: Vec<_> = date(2024, 6, 3).iter_days().take(12_000).collect();

    let err = assert_rejected(&mut c, |c| c.set_holidays(endless));
    assert!(matches!(err, GanttError::CalendarExhausted { .. }), "{err:?}");
    assert!(!c.state().calendar().is_holiday(date(2024, 6, 3)));
    assert_eq!(c.task(&a).unwrap().start, date(2024, 6, 3));
}

#[test]
fn holiday_import_replaces_the_set() {
    let (mut c, _, _) = two_task_core();
    c.add_holiday(date(2024, 12, 25)).unwrap();

    let count = c
        .import_holidays(r#"{"holidays": ["2024-06-04", "bad", "2024-06-04", 7]}"#)
        .unwrap();
    assert_eq!(count, 1);
    assert!(!c.state().calendar().is_holiday(date(2024, 12, 25)));

    let err = assert_rejected(&mut c, |c| c.import_holidays(r#"{"dates": []}"#));
    assert!(matches!(err, GanttError::ImportFormat(_)));
}

#[test]
fn reset_clears_project_and_history() {
    let (mut c, _, _) = two_task_core();
    c.add_holiday(date(2024, 6, 4)).unwrap();
    c.reset().unwrap();

    assert!(c.tasks().is_empty());
    assert_eq!(c.state().calendar().holiday_count(), 0);
    assert!(!c.can_undo());
    assert!(c.take_pending_payload().is_some());
}

#[test]
fn loading_a_payload_restarts_history() {
    let mut c = core();
    c.add_task(NewTask::default()).unwrap();

    let payload = project(
        vec![
            RawTaskBuilder::new("a").start(date(2024, 6, 3)).duration(5).build(),
            RawTaskBuilder::new("b").after("a").build(),
        ],
        &[],
    )
    .snapshot()
    .unwrap();

    let report = c.load_payload(&payload).unwrap();
    assert_eq!(report.accepted, 2);
    assert_eq!(c.history().len(), 1);
    assert!(!c.can_undo());
    assert_eq!(c.take_pending_payload(), None);
    // Loading schedules.
    assert_eq!(c.task("b").unwrap().start, date(2024, 6, 10));
}

#[test]
fn cyclic_payload_is_refused_on_load() {
    let (mut c, _, _) = two_task_core();
    let cyclic = r#"{
        "schemaVersion": 1,
        "tasks": [
            { "id": "a", "dependencies": [{ "id": "b" }] },
            { "id": "b", "dependencies": [{ "id": "a" }] }
        ]
    }"#;
    let err = assert_rejected(&mut c, |c| c.load_payload(cyclic));
    assert!(matches!(err, GanttError::CyclicDependency { .. }));
}

#[test]
fn edits_keep_every_invariant() {
    let (mut c, a, b) = two_task_core();
    c.add_holiday(date(2024, 6, 6)).unwrap();
    c.drag_task(&a, DragMode::ResizeEnd, 4).unwrap();
    c.set_milestone(&b, true).unwrap();
    c.add_task(NewTaskBuilder::new("C").after(&b).duration(4).build())
        .unwrap();
    c.undo().unwrap();
    c.redo().unwrap();

    assert!(
        c.state().invariant_violations().is_empty(),
        "{:?}",
        c.state().invariant_violations()
    );
}

#[test]
fn step_turns_edits_into_commands() {
    let mut c = core();

    let step = c.step(RuntimeEvent::Edit(Edit::AddTask(NewTaskBuilder::new("A").build())));
    assert!(step.keep_running);
    assert_eq!(step.commands.len(), 2);
    match &step.commands[0] {
        CoreCommand::Persist(payload) => {
            assert_eq!(payload, &c.state().snapshot().unwrap());
        }
        other => panic!("expected Persist, got {other:?}"),
    }
    assert!(matches!(
        &step.commands[1],
        CoreCommand::Notify(n) if n.level == NotificationLevel::Info
    ));

    let step = c.step(RuntimeEvent::Edit(Edit::DeleteTask("nope".into())));
    assert!(step.keep_running);
    match step.commands.as_slice() {
        [CoreCommand::Notify(n)] => {
            assert_eq!(n.level, NotificationLevel::Error);
            assert!(n.message.starts_with("delete task failed"), "{}", n.message);
        }
        other => panic!("expected one error notification, got {other:?}"),
    }

    let step = c.step(RuntimeEvent::Edit(Edit::Redo));
    assert!(matches!(
        step.commands.as_slice(),
        [CoreCommand::Notify(n)] if n.message == "nothing to redo"
    ));

    let step = c.step(RuntimeEvent::ShutdownRequested);
    assert!(!step.keep_running);
    assert!(step.commands.is_empty());
}

#[test]
fn partial_json_import_warns_about_discarded_records() {
    let mut c = core();

    let step = c.step(RuntimeEvent::Edit(Edit::ImportJson(
        r#"{"tasks": [{"id": "a", "title": "Keep"}, 7]}"#.to_string(),
    )));
    assert_eq!(c.tasks().len(), 1);
    match step.commands.as_slice() {
        [CoreCommand::Persist(_), CoreCommand::Notify(n)] => {
            assert_eq!(n.level, NotificationLevel::Warning);
            assert!(n.message.contains("1 unusable record"), "{}", n.message);
        }
        other => panic!("expected persist and warning, got {other:?}"),
    }

    let step = c.step(RuntimeEvent::Edit(Edit::ImportJson(
        r#"{"tasks": [{"id": "b"}]}"#.to_string(),
    )));
    assert!(matches!(
        step.commands.as_slice(),
        [CoreCommand::Persist(_), CoreCommand::Notify(n)] if n.level == NotificationLevel::Info
    ));
}
