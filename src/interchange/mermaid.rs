// src/interchange/mermaid.rs

//! Text Gantt (Mermaid `gantt`) import and export.
//!
//! Import is lenient: unknown keywords and malformed lines are ignored,
//! after-references to unknown ids are dropped and only finish-to-start
//! relations can be expressed. Export writes every task with a positional
//! id (`t1`, `t2`, ...) and keeps only finish-to-start edges.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde_json::{Value, json};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::calendar::{self, Calendar};
use crate::dag::task::{RawTask, normalize};
use crate::dag::{Task, ensure_acyclic};
use crate::errors::{GanttError, Result};
use crate::project::{ManualOrder, ProjectState};
use crate::types::{DateMode, DependencyType, GroupKey, TaskStatus};

/// Section label for tasks with an empty grouping field.
pub const UNGROUPED_SECTION: &str = "Uncategorized";

/// Chart title used when none is configured.
pub const DEFAULT_CHART_TITLE: &str = "Project";

/// `dateFormat` assumed when a chart does not declare one.
pub const DEFAULT_MERMAID_DATE_FORMAT: &str = "YYYY-MM-DD";

static DURATION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)\s*([dw])$").expect("valid duration regex"));

static WEEKENDS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^weekends?$").expect("valid weekends regex"));

static FORMAT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"YYYY|YY|MMMM|MMM|MM|M|DD|D|%").expect("valid format regex")
});

/// Chart-level keywords that carry no task data.
const IGNORED_KEYWORDS: &[&str] = &[
    "title",
    "axisformat",
    "tickinterval",
    "todaymarker",
    "weekday",
    "includes",
    "inclusiveenddates",
    "topaxis",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MermaidOptions {
    /// Task field that sections map to.
    pub group_by: GroupKey,
    /// How task timing is written on export.
    pub date_mode: DateMode,
    /// Chart title written on export.
    pub title: String,
}

impl Default for MermaidOptions {
    fn default() -> Self {
        Self {
            group_by: GroupKey::default(),
            date_mode: DateMode::default(),
            title: DEFAULT_CHART_TITLE.to_string(),
        }
    }
}

/// Result of parsing a chart, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedGantt {
    /// One record per task line, with after-references already resolved to
    /// the generated task ids.
    pub tasks: Vec<RawTask>,
    /// Dates listed under `excludes`, sorted and deduplicated.
    pub holidays: Vec<NaiveDate>,
}

struct TaskLine {
    record: RawTask,
    chart_id: String,
    after: Vec<String>,
}

/// Parse a chart into raw task records.
pub fn parse(text: &str, group_by: GroupKey) -> ParsedGantt {
    let has_header = text
        .lines()
        .any(|l| l.trim().to_lowercase().starts_with("gantt"));
    let mut in_chart = !has_header;
    let mut date_format = translate_date_format(DEFAULT_MERMAID_DATE_FORMAT);
    let mut section = String::new();
    let mut auto_index = 1usize;
    let mut holidays = Vec::new();
    let mut lines = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("```") || line.starts_with("%%") {
            continue;
        }
        let lower = line.to_lowercase();
        if lower.starts_with("gantt") {
            in_chart = true;
            continue;
        }
        if !in_chart {
            continue;
        }

        if let Some(rest) = keyword_rest(line, "dateformat") {
            if !rest.is_empty() {
                date_format = translate_date_format(rest);
            }
            continue;
        }
        if let Some(rest) = keyword_rest(line, "excludes") {
            for token in rest.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                if WEEKENDS_TOKEN.is_match(token) {
                    continue;
                }
                if let Some(date) = parse_chart_date(token, &date_format) {
                    holidays.push(date);
                }
            }
            continue;
        }
        if let Some(rest) = keyword_rest(line, "section") {
            section = rest.to_string();
            continue;
        }
        if IGNORED_KEYWORDS
            .iter()
            .any(|kw| keyword_rest(line, kw).is_some())
        {
            trace!(line, "ignoring chart keyword");
            continue;
        }

        if let Some(parsed) = parse_task_line(line, &date_format, group_by, &section, &mut auto_index)
        {
            lines.push(parsed);
        }
    }

    let ids: HashMap<String, String> = lines
        .iter()
        .filter_map(|l| {
            let id = l.record.id.as_ref()?.as_str()?;
            Some((l.chart_id.clone(), id.to_string()))
        })
        .collect();

    let tasks = lines
        .into_iter()
        .map(|line| {
            let deps: Vec<Value> = line
                .after
                .iter()
                .filter_map(|r| ids.get(r))
                .map(|id| json!({ "id": id, "type": DependencyType::FS.as_str() }))
                .collect();
            RawTask {
                dependencies: Some(Value::Array(deps)),
                ..line.record
            }
        })
        .collect();

    holidays.sort();
    holidays.dedup();
    ParsedGantt { tasks, holidays }
}

/// Parse and normalize a chart into a whole project state.
///
/// Fails if the chart has no task lines or its after-references form a
/// cycle. Manual order follows the order of the task lines.
pub fn import(text: &str, group_by: GroupKey, today: NaiveDate) -> Result<ProjectState> {
    let parsed = parse(text, group_by);
    if parsed.tasks.is_empty() {
        return Err(GanttError::ImportFormat(
            "no tasks found in Gantt text".to_string(),
        ));
    }

    let calendar = Calendar::with_holidays(parsed.holidays);
    let tasks = parsed
        .tasks
        .into_iter()
        .map(|raw| normalize(raw, &calendar, today))
        .collect::<Result<Vec<Task>>>()?;
    ensure_acyclic(&tasks)?;

    let order = ManualOrder::from_ids(tasks.iter().map(|t| t.id.clone()));
    debug!(
        tasks = tasks.len(),
        holidays = calendar.holiday_count(),
        "parsed Gantt text"
    );
    Ok(ProjectState::from_parts(tasks, calendar, order))
}

/// Render the project as a Mermaid `gantt` chart.
pub fn export(state: &ProjectState, options: &MermaidOptions) -> String {
    let tasks = state.tasks();
    let chart_ids: HashMap<&str, String> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), format!("t{}", i + 1)))
        .collect();

    let mut groups: Vec<(String, Vec<&Task>)> = Vec::new();
    for task in tasks {
        let key = group_label(task, options.group_by);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(task),
            None => groups.push((key, vec![task])),
        }
    }

    let mut out = String::new();
    out.push_str("gantt\n");
    let _ = writeln!(out, "  title {}", single_line(&options.title));
    let _ = writeln!(out, "  dateFormat  {DEFAULT_MERMAID_DATE_FORMAT}");
    let mut excludes = vec!["weekends".to_string()];
    excludes.extend(state.calendar().holidays().map(calendar::format_date));
    let _ = writeln!(out, "  excludes {}", excludes.join(","));

    for (group, members) in &groups {
        let _ = writeln!(out, "  section {group}");
        for task in members {
            out.push_str(&task_line(task, &chart_ids, options.date_mode));
            out.push('\n');
        }
    }

    // Drop the trailing newline so the chart ends on its last line.
    out.pop();
    out
}

fn task_line(task: &Task, chart_ids: &HashMap<&str, String>, mode: DateMode) -> String {
    let after: Vec<&str> = task
        .dependencies
        .iter()
        .filter(|d| d.kind == DependencyType::FS)
        .filter_map(|d| chart_ids.get(d.id.as_str()).map(String::as_str))
        .collect();

    let start = calendar::format_date(task.start);
    let end = calendar::format_date(task.end);
    let duration = if task.is_milestone { 1 } else { task.duration };
    let timing = match (after.is_empty(), mode) {
        (false, DateMode::Duration) => format!("{duration}d"),
        (false, DateMode::End) => end,
        (true, DateMode::Duration) => format!("{start}, {duration}d"),
        (true, DateMode::End) => format!("{start}, {end}"),
    };

    let mut head: Vec<&str> = Vec::new();
    match task.status {
        TaskStatus::Active => head.push("active"),
        TaskStatus::Done => head.push("done"),
        TaskStatus::None => {}
    }
    if task.is_milestone {
        head.push("milestone");
    }
    if let Some(id) = chart_ids.get(task.id.as_str()) {
        head.push(id);
    }

    let mut parts = vec![format!("  {} :{}", chart_title(&task.title), head.join(", "))];
    if !after.is_empty() {
        parts.push(format!("after {}", after.join(" ")));
    }
    parts.push(timing);
    parts.join(", ")
}

fn parse_task_line(
    line: &str,
    date_format: &str,
    group_by: GroupKey,
    section: &str,
    auto_index: &mut usize,
) -> Option<TaskLine> {
    let (title, rest) = line.split_once(':')?;
    let title = title.trim();
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    let mut chart_id: Option<String> = None;
    let mut after = Vec::new();
    let mut dates = Vec::new();
    let mut duration: Option<u64> = None;
    let mut is_milestone = false;
    let mut status = TaskStatus::None;

    for part in rest.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(refs) = keyword_rest(part, "after") {
            after.extend(refs.split_whitespace().map(str::to_string));
            continue;
        }
        let lower = part.to_lowercase();
        match lower.as_str() {
            "milestone" => {
                is_milestone = true;
                continue;
            }
            "done" => {
                status = TaskStatus::Done;
                continue;
            }
            // After `done`, a later `active` is read as an ordinary token.
            "active" if status != TaskStatus::Done => {
                status = TaskStatus::Active;
                continue;
            }
            "crit" => continue,
            _ => {}
        }
        if let Some(days) = parse_duration(part) {
            if duration.is_none() {
                duration = Some(days);
            }
            continue;
        }
        if let Some(date) = parse_chart_date(part, date_format) {
            dates.push(date);
            continue;
        }
        if chart_id.is_none() {
            chart_id = Some(part.to_string());
        }
    }

    let chart_id = chart_id.unwrap_or_else(|| {
        let id = format!("auto{auto_index}");
        *auto_index += 1;
        id
    });

    let group = (!section.is_empty()).then(|| Value::from(section));
    let mut record = RawTask {
        id: Some(Value::from(Uuid::new_v4().to_string())),
        title: Some(Value::from(title)),
        status: Some(Value::from(status.as_str())),
        is_milestone: Some(Value::from(is_milestone)),
        start: dates.first().map(|d| Value::from(calendar::format_date(*d))),
        end: dates.get(1).map(|d| Value::from(calendar::format_date(*d))),
        duration: duration.map(Value::from),
        ..RawTask::default()
    };
    match group_by {
        GroupKey::Category => record.category = group,
        GroupKey::Assignee => record.assignee = group,
    }

    Some(TaskLine {
        record,
        chart_id,
        after,
    })
}

/// `Nd` or `Nw` (a week is five workdays).
fn parse_duration(token: &str) -> Option<u64> {
    let caps = DURATION_TOKEN.captures(token)?;
    let amount: u64 = caps[1].parse().ok()?;
    if caps[2].eq_ignore_ascii_case("w") {
        amount.checked_mul(5)
    } else {
        Some(amount)
    }
}

/// Parse with the chart's declared format, falling back to `YYYY-MM-DD`.
fn parse_chart_date(token: &str, chrono_format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(token.trim(), chrono_format)
        .ok()
        .or_else(|| calendar::parse_date(token))
}

/// Translate a dayjs-style `dateFormat` into a chrono format string.
pub fn translate_date_format(format: &str) -> String {
    FORMAT_TOKEN
        .replace_all(format.trim(), |caps: &Captures| {
            match &caps[0] {
                "YYYY" => "%Y",
                "YY" => "%y",
                "MMMM" => "%B",
                "MMM" => "%b",
                "MM" | "M" => "%m",
                "DD" | "D" => "%d",
                _ => "%%",
            }
            .to_string()
        })
        .into_owned()
}

/// Remainder of `line` if its first word is `keyword` (case-insensitive).
fn keyword_rest<'l>(line: &'l str, keyword: &str) -> Option<&'l str> {
    let head = line.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &line[keyword.len()..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn group_label(task: &Task, key: GroupKey) -> String {
    let value = match key {
        GroupKey::Category => task.category.as_str(),
        GroupKey::Assignee => task.assignee.as_str(),
    };
    let value = single_line(value);
    if value.trim().is_empty() {
        UNGROUPED_SECTION.to_string()
    } else {
        value.trim().to_string()
    }
}

/// A colon would end the title early on re-import.
fn chart_title(title: &str) -> String {
    single_line(title).replace(':', " ")
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
