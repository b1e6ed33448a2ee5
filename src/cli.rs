// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::calendar;
use crate::engine::DragMode;
use crate::types::{DateMode, DependencyType, GroupKey, TaskStatus};

/// Command-line arguments for `ganttdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ganttdag",
    version,
    about = "Keep task dates consistent under dependencies and a workday calendar.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Ganttdag.toml` in the current working directory, if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project file to operate on; overrides `[storage].path`.
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GANTTDAG_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the schedule in manual row order.
    Show,
    /// Add a task.
    Add(AddArgs),
    /// Delete a task and every dependency on it.
    Remove {
        /// Task id, unique id prefix or unique title.
        task: String,
    },
    /// Change fields of a task.
    Edit(EditArgs),
    /// Shift a task (or one of its edges) by a number of calendar days.
    Shift {
        task: String,
        /// Calendar days; negative moves earlier.
        #[arg(long, allow_hyphen_values = true)]
        days: i64,
        #[arg(long, value_enum, default_value_t = ShiftMode::Move)]
        mode: ShiftMode,
    },
    /// Make TASK depend on another task.
    Depend {
        task: String,
        /// The predecessor.
        #[arg(long)]
        on: String,
        /// FS, SS, FF or SF.
        #[arg(long = "type", default_value = "FS")]
        kind: DependencyType,
    },
    /// Remove a dependency of TASK.
    Undepend {
        task: String,
        /// Drop every edge to this predecessor.
        #[arg(long, conflicts_with = "index", required_unless_present = "index")]
        on: Option<String>,
        /// Drop the edge at this position (0-based).
        #[arg(long)]
        index: Option<usize>,
    },
    /// Move FROM into the row currently held by TO.
    Reorder { from: String, to: String },
    /// Manage holidays.
    #[command(subcommand)]
    Holiday(HolidayCommand),
    /// Replace the project with a JSON payload.
    ImportJson { file: PathBuf },
    /// Replace the project with a Mermaid gantt chart.
    ImportMermaid {
        file: PathBuf,
        #[arg(long, value_enum)]
        group_by: Option<GroupArg>,
    },
    /// Print (or write) the project as JSON.
    ExportJson {
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Print (or write) the project as a Mermaid gantt chart.
    ExportMermaid {
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
        #[arg(long, value_enum)]
        group_by: Option<GroupArg>,
        #[arg(long, value_enum)]
        date_mode: Option<DateModeArg>,
    },
    /// Verify every task and graph invariant of the stored project.
    Check,
    /// Remove every task and holiday.
    Reset,
}

#[derive(Debug, Clone, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub title: Option<String>,
    /// First day (YYYY-MM-DD); defaults to today.
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,
    /// Length in workdays.
    #[arg(long)]
    pub duration: Option<u32>,
    #[arg(long)]
    pub milestone: bool,
    #[arg(long, default_value = "")]
    pub category: String,
    #[arg(long, default_value = "")]
    pub assignee: String,
    #[arg(long, default_value = "")]
    pub notes: String,
    /// Finish-to-start predecessor; repeatable.
    #[arg(long = "after", value_name = "TASK")]
    pub after: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct EditArgs {
    pub task: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// none, active or done.
    #[arg(long)]
    pub status: Option<TaskStatus>,
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,
    #[arg(long, value_parser = parse_date_arg)]
    pub end: Option<NaiveDate>,
    #[arg(long)]
    pub duration: Option<u32>,
    #[arg(long)]
    pub milestone: Option<bool>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum HolidayCommand {
    /// List holidays.
    List,
    Add {
        #[arg(value_parser = parse_date_arg)]
        date: NaiveDate,
    },
    Remove {
        #[arg(value_parser = parse_date_arg)]
        date: NaiveDate,
    },
    /// Replace the holiday set from a JSON file.
    Import { file: PathBuf },
    /// Print (or write) the holiday set as JSON.
    Export {
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShiftMode {
    Move,
    ResizeStart,
    ResizeEnd,
}

impl From<ShiftMode> for DragMode {
    fn from(mode: ShiftMode) -> Self {
        match mode {
            ShiftMode::Move => DragMode::Move,
            ShiftMode::ResizeStart => DragMode::ResizeStart,
            ShiftMode::ResizeEnd => DragMode::ResizeEnd,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GroupArg {
    Category,
    Assignee,
}

impl From<GroupArg> for GroupKey {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Category => GroupKey::Category,
            GroupArg::Assignee => GroupKey::Assignee,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateModeArg {
    Duration,
    End,
}

impl From<DateModeArg> for DateMode {
    fn from(arg: DateModeArg) -> Self {
        match arg {
            DateModeArg::Duration => DateMode::Duration,
            DateModeArg::End => DateMode::End,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    calendar::parse_date(s).ok_or_else(|| format!("invalid date: {s} (expected YYYY-MM-DD)"))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
