// tests/interchange_mermaid.rs

mod common;
use crate::common::{NewTaskBuilder, core, date, fixed_today};

use ganttdag::engine::TaskPatch;
use ganttdag::errors::GanttError;
use ganttdag::interchange::MermaidOptions;
use ganttdag::interchange::mermaid::{self, translate_date_format};
use ganttdag::types::{DateMode, DependencyType, GroupKey, TaskStatus};

const CHART: &str = "\
```mermaid
gantt
    title Launch
    dateFormat YYYY-MM-DD
    axisFormat %m/%d
    excludes weekends, 2024-06-10
    %% design first
    section Design
    Wireframes :done, w1, 2024-06-03, 3d
    Review     :active, r1, after w1, 2d
    section Build
    Backend    :crit, b1, after r1 w1, 1w
    Ship it    :milestone, after b1 ghost, 0d
```";

fn by_title<'s>(
    state: &'s ganttdag::project::ProjectState,
    title: &str,
) -> &'s ganttdag::dag::Task {
    state
        .tasks()
        .iter()
        .find(|t| t.title == title)
        .unwrap_or_else(|| panic!("no task titled {title}"))
}

#[test]
fn parses_sections_tags_and_after_references() {
    let parsed = mermaid::parse(CHART, GroupKey::Category);
    assert_eq!(parsed.tasks.len(), 4);
    assert_eq!(parsed.holidays, vec![date(2024, 6, 10)]);

    let state = mermaid::import(CHART, GroupKey::Category, fixed_today()).unwrap();
    let w = by_title(&state, "Wireframes");
    let r = by_title(&state, "Review");
    let b = by_title(&state, "Backend");
    let s = by_title(&state, "Ship it");

    assert_eq!(w.status, TaskStatus::Done);
    assert_eq!(r.status, TaskStatus::Active);
    assert_eq!(w.category, "Design");
    assert_eq!(b.category, "Build");

    assert_eq!(r.dependencies.len(), 1);
    assert_eq!(r.dependencies[0].id, w.id);
    assert_eq!(r.dependencies[0].kind, DependencyType::FS);
    assert_eq!(b.dependencies.len(), 2);
    // The unknown reference is dropped.
    assert_eq!(s.dependencies.len(), 1);
    assert!(s.is_milestone);

    assert_eq!(b.duration, 5);
    let ids: Vec<&str> = state.tasks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(state.manual_order().as_slice(), ids.as_slice());
}

#[test]
fn imported_chart_is_scheduled_through_the_controller() {
    let mut c = core();
    let count = c.import_mermaid(CHART).unwrap();
    assert_eq!(count, 4);

    let state = c.state();
    assert_eq!(by_title(state, "Wireframes").end, date(2024, 6, 5));
    assert_eq!(by_title(state, "Review").start, date(2024, 6, 6));
    // 2024-06-10 is excluded, so Backend starts on the 11th.
    let backend = by_title(state, "Backend");
    assert_eq!(backend.start, date(2024, 6, 11));
    assert_eq!(backend.end, date(2024, 6, 17));
    assert_eq!(by_title(state, "Ship it").start, date(2024, 6, 18));
    assert!(c.can_undo());
}

#[test]
fn lines_without_ids_get_sequential_auto_ids() {
    let text = "gantt\n  A : 2024-06-03, 2d\n  B : 2024-06-03, 1d\n  C : after auto2 auto1, 1d";
    let state = mermaid::import(text, GroupKey::Category, fixed_today()).unwrap();
    let c = by_title(&state, "C");
    assert_eq!(c.dependencies.len(), 2);
    assert_eq!(c.dependencies[0].id, by_title(&state, "B").id);
    assert_eq!(c.dependencies[1].id, by_title(&state, "A").id);
    assert_eq!(by_title(&state, "A").category, "");
}

#[test]
fn active_after_done_is_read_as_the_line_id() {
    let text = "gantt\n A :done, active, 2024-06-03, 1d\n B :after active, 1d\n C :active, done, c1, 2024-06-03, 1d";
    let state = mermaid::import(text, GroupKey::Category, fixed_today()).unwrap();

    let a = by_title(&state, "A");
    assert_eq!(a.status, TaskStatus::Done);
    let b = by_title(&state, "B");
    assert_eq!(b.dependencies.len(), 1);
    assert_eq!(b.dependencies[0].id, a.id);
    assert_eq!(by_title(&state, "C").status, TaskStatus::Done);
}

#[test]
fn custom_date_formats_are_honoured() {
    assert_eq!(translate_date_format("YYYY-MM-DD"), "%Y-%m-%d");
    assert_eq!(translate_date_format("DD/MM/YYYY"), "%d/%m/%Y");

    let text = "gantt\n dateFormat DD/MM/YYYY\n excludes 25/12/2024\n A :a, 03/06/2024, 04/06/2024";
    let state = mermaid::import(text, GroupKey::Category, fixed_today()).unwrap();
    let a = by_title(&state, "A");
    assert_eq!(a.start, date(2024, 6, 3));
    assert_eq!(a.end, date(2024, 6, 4));
    assert_eq!(a.duration, 2);
    assert!(state.calendar().is_holiday(date(2024, 12, 25)));
}

#[test]
fn sections_can_map_to_assignees() {
    let text = "gantt\n section Alice\n A :a, 2024-06-03, 1d";
    let state = mermaid::import(text, GroupKey::Assignee, fixed_today()).unwrap();
    let a = by_title(&state, "A");
    assert_eq!(a.assignee, "Alice");
    assert_eq!(a.category, "");
}

#[test]
fn charts_without_tasks_or_with_cycles_are_refused() {
    let err = mermaid::import("gantt\n title Empty\n section S", GroupKey::Category, fixed_today())
        .unwrap_err();
    assert!(matches!(err, GanttError::ImportFormat(_)));

    let cyclic = "gantt\n A :a, after b, 1d\n B :b, after a, 1d";
    let err = mermaid::import(cyclic, GroupKey::Category, fixed_today()).unwrap_err();
    assert!(matches!(err, GanttError::CyclicDependency { .. }));

    let mut c = core();
    c.add_task(NewTaskBuilder::new("Keep").build()).unwrap();
    let before = c.state().clone();
    assert!(c.import_mermaid(cyclic).is_err());
    assert_eq!(c.state(), &before);
}

/// Design (Eng, active), Build: api after Design, Ship (Eng, milestone)
/// after Build, Docs SS-linked to Design.
fn export_fixture() -> ganttdag::engine::PlannerCore {
    let mut c = core();
    let a = c
        .add_task(
            NewTaskBuilder::new("Design")
                .category("Eng")
                .start(date(2024, 6, 3))
                .duration(3)
                .build(),
        )
        .unwrap();
    c.update_task(
        &a,
        TaskPatch {
            status: Some(TaskStatus::Active),
            ..TaskPatch::default()
        },
    )
    .unwrap();
    let b = c
        .add_task(NewTaskBuilder::new("Build: api").after(&a).duration(2).build())
        .unwrap();
    c.add_task(NewTaskBuilder::new("Ship").category("Eng").milestone().after(&b).build())
        .unwrap();
    let d = c
        .add_task(NewTaskBuilder::new("Docs").start(date(2024, 6, 3)).duration(1).build())
        .unwrap();
    c.add_dependency(&d, &a, DependencyType::SS).unwrap();
    c.add_holiday(date(2024, 12, 25)).unwrap();
    c
}

#[test]
fn export_writes_sections_positional_ids_and_fs_edges_only() {
    let c = export_fixture();
    let expected = "\
gantt
  title Project
  dateFormat  YYYY-MM-DD
  excludes weekends,2024-12-25
  section Eng
  Design :active, t1, 2024-06-03, 3d
  Ship :milestone, t3, after t2, 1d
  section Uncategorized
  Build  api :t2, after t1, 2d
  Docs :t4, 2024-06-03, 1d";
    assert_eq!(c.export_mermaid(), expected);
}

#[test]
fn end_date_mode_writes_end_dates() {
    let c = export_fixture();
    let options = MermaidOptions {
        date_mode: DateMode::End,
        title: "Roadmap\nQ3".to_string(),
        ..MermaidOptions::default()
    };
    let text = mermaid::export(c.state(), &options);

    assert!(text.contains("  title Roadmap Q3\n"));
    assert!(text.contains("  Ship :milestone, t3, after t2, 2024-06-10\n"));
    assert!(text.ends_with("  Docs :t4, 2024-06-03, 2024-06-03"));
}

#[test]
fn exported_chart_imports_to_the_same_dates() {
    let c = export_fixture();
    let mut state =
        mermaid::import(&c.export_mermaid(), GroupKey::Category, fixed_today()).unwrap();
    state.schedule().unwrap();

    assert_eq!(state.tasks().len(), 4);
    for title in ["Design", "Ship", "Docs"] {
        let original = c.tasks().iter().find(|t| t.title == title).unwrap();
        let back = by_title(&state, title);
        assert_eq!((back.start, back.end), (original.start, original.end), "{title}");
    }
    assert!(state.calendar().is_holiday(date(2024, 12, 25)));
    // The SS relation cannot be expressed in the chart.
    assert!(by_title(&state, "Docs").dependencies.is_empty());
}
