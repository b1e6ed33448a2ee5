// src/interchange/json.rs

//! Structured JSON interchange: whole projects and holiday lists.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::calendar;
use crate::errors::{GanttError, Result};
use crate::project::{LoadReport, ProjectState};

/// Holiday document written by [`export_holidays`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayFile {
    pub schema_version: u32,
    pub holidays: Vec<NaiveDate>,
}

/// Parse a project payload for import.
///
/// Records that fail normalization are discarded. The import is refused if
/// the text is not a JSON object, if `tasks` is present but not an array, or
/// if no usable task remains.
pub fn import_project(text: &str, today: NaiveDate) -> Result<(ProjectState, LoadReport)> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| GanttError::ImportFormat(format!("payload is not valid JSON: {e}")))?;
    if let Some(tasks) = value.get("tasks") {
        if !tasks.is_array() {
            return Err(GanttError::ImportFormat(
                "\"tasks\" must be an array".to_string(),
            ));
        }
    }

    let (state, report) = ProjectState::from_value(value, today)?;
    if report.accepted == 0 {
        let message = match report.task_records() {
            0 => "payload contains no tasks".to_string(),
            n => format!("none of the {n} task records could be used"),
        };
        return Err(GanttError::ImportFormat(message));
    }
    Ok((state, report))
}

/// Pretty-printed project payload.
pub fn export_project(state: &ProjectState) -> Result<String> {
    Ok(serde_json::to_string_pretty(&state.to_payload())?)
}

/// Read a holiday list: either a bare array of dates or an object with a
/// `holidays` array. Entries that are not `YYYY-MM-DD` strings are skipped.
/// The result is sorted and deduplicated.
pub fn parse_holidays(text: &str) -> Result<Vec<NaiveDate>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| GanttError::ImportFormat(format!("holiday file is not valid JSON: {e}")))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("holidays") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(GanttError::ImportFormat(
                    "holiday file has no \"holidays\" array".to_string(),
                ));
            }
        },
        _ => {
            return Err(GanttError::ImportFormat(
                "holiday file must be an array or an object".to_string(),
            ));
        }
    };

    let mut dates: Vec<NaiveDate> = items
        .iter()
        .filter_map(|item| item.as_str().and_then(calendar::parse_date))
        .collect();
    let skipped = items.len() - dates.len();
    dates.sort();
    dates.dedup();
    debug!(holidays = dates.len(), skipped, "parsed holiday list");
    Ok(dates)
}

pub fn export_holidays(state: &ProjectState) -> Result<String> {
    let file = HolidayFile {
        schema_version: state.schema_version(),
        holidays: state.calendar().holidays().collect(),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}
