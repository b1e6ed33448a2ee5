// tests/normalize.rs

mod common;
use crate::common::{RawTaskBuilder, date, fixed_today};

use proptest::prelude::*;
use serde_json::{Value, json};

use ganttdag::calendar::Calendar;
use ganttdag::dag::task::{DEFAULT_TITLE, MAX_DURATION};
use ganttdag::dag::{RawTask, Task, normalize};
use ganttdag::errors::GanttError;
use ganttdag::types::{DependencyType, TaskStatus};

fn from_json(value: Value) -> Task {
    let raw = RawTask::from_value(value).expect("object record");
    normalize(raw, &Calendar::new(), fixed_today()).expect("normalizes")
}

#[test]
fn empty_record_gets_defaults() {
    let task = from_json(json!({}));

    assert!(!task.id.is_empty());
    assert_eq!(task.title, DEFAULT_TITLE);
    assert_eq!(task.status, TaskStatus::None);
    assert_eq!(task.start, fixed_today());
    assert_eq!(task.end, fixed_today());
    assert_eq!(task.duration, 1);
    assert!(!task.is_milestone);
    assert!(task.dependencies.is_empty());
}

#[test]
fn generated_ids_are_unique() {
    let a = from_json(json!({}));
    let b = from_json(json!({}));
    assert_ne!(a.id, b.id);
}

#[test]
fn weekend_start_snaps_to_monday() {
    let task = from_json(json!({ "id": "a", "start": "2024-06-08", "duration": 2 }));
    assert_eq!(task.start, date(2024, 6, 10));
    assert_eq!(task.end, date(2024, 6, 11));
}

#[test]
fn explicit_end_wins_over_duration() {
    let task = from_json(json!({
        "id": "a",
        "start": "2024-06-03",
        "end": "2024-06-14",
        "duration": 2,
    }));
    assert_eq!(task.duration, 10);
    assert_eq!(task.end, date(2024, 6, 14));
}

#[test]
fn weekend_end_snaps_forward_before_counting() {
    let task = from_json(json!({ "id": "a", "start": "2024-06-03", "end": "2024-06-08" }));
    assert_eq!(task.end, date(2024, 6, 10));
    assert_eq!(task.duration, 6);
}

#[test]
fn milestone_collapses_to_one_day() {
    let task = from_json(json!({
        "id": "m",
        "start": "2024-06-04",
        "duration": 5,
        "isMilestone": true,
    }));
    assert!(task.is_milestone);
    assert_eq!(task.duration, 1);
    assert_eq!(task.start, task.end);
}

#[test]
fn bad_durations_are_repaired() {
    let cases = [
        (json!("abc"), 1),
        (json!(0), 1),
        (json!(-4), 1),
        (json!(2.7), 2),
        (json!("4"), 4),
        (json!(1e12), MAX_DURATION),
    ];
    for (input, expected) in cases {
        let task = from_json(json!({ "id": "a", "duration": input }));
        assert_eq!(task.duration, expected, "duration input {input}");
    }
}

#[test]
fn loose_field_types_are_coerced() {
    let task = from_json(json!({
        "id": 42,
        "title": "Ship",
        "status": "ACTIVE",
        "isMilestone": "yes",
        "start": 20240603,
    }));
    assert_eq!(task.id, "42");
    assert_eq!(task.status, TaskStatus::Active);
    assert!(task.is_milestone);
    // A non-string start falls back to today.
    assert_eq!(task.start, fixed_today());

    let unknown = from_json(json!({ "id": "b", "status": "blocked", "title": "" }));
    assert_eq!(unknown.status, TaskStatus::None);
    assert_eq!(unknown.title, DEFAULT_TITLE);
}

#[test]
fn dependency_edges_are_cleaned() {
    let task = from_json(json!({
        "id": "c",
        "dependencies": [
            { "id": "a" },
            { "id": "b", "type": "ss" },
            { "id": "c", "type": "FS" },
            { "id": "d", "type": "XX" },
            { "id": "e", "type": 3 },
            { "type": "FF" },
        ],
    }));

    let edges: Vec<(&str, DependencyType)> = task
        .dependencies
        .iter()
        .map(|d| (d.id.as_str(), d.kind))
        .collect();
    assert_eq!(edges, vec![("a", DependencyType::FS), ("b", DependencyType::SS)]);
}

#[test]
fn non_object_records_are_rejected() {
    let err = RawTask::from_value(json!([1, 2])).unwrap_err();
    assert!(matches!(err, GanttError::Validation(_)));
}

#[test]
fn holidays_are_respected_when_spanning() {
    let cal = Calendar::with_holidays([date(2024, 6, 5)]);
    let task = RawTaskBuilder::new("a")
        .start(date(2024, 6, 3))
        .duration(3)
        .normalized(&cal);
    assert_eq!(task.end, date(2024, 6, 6));
}

proptest! {
    #[test]
    fn normalizing_twice_changes_nothing(
        start_offset in 0u64..400,
        duration in 0u32..40,
        milestone in any::<bool>(),
        holiday_offsets in proptest::collection::vec(0u64..400, 0..12),
        status in prop::sample::select(vec!["none", "active", "done", "bogus"]),
    ) {
        let base = date(2024, 1, 1);
        let cal = Calendar::with_holidays(
            holiday_offsets.iter().map(|o| base + chrono::Days::new(*o)),
        );
        let raw = RawTask::from_value(json!({
            "id": "t",
            "title": "Task",
            "status": status,
            "start": (base + chrono::Days::new(start_offset)).format("%Y-%m-%d").to_string(),
            "duration": duration,
            "isMilestone": milestone,
        }))
        .unwrap();

        let once = normalize(raw, &cal, fixed_today()).unwrap();
        let twice = normalize(RawTask::from(&once), &cal, fixed_today()).unwrap();

        prop_assert!(cal.is_workday(once.start));
        prop_assert!(cal.is_workday(once.end));
        prop_assert_eq!(cal.workday_count(once.start, once.end), once.duration);
        prop_assert_eq!(once, twice);
    }
}
