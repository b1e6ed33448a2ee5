// src/lib.rs

pub mod calendar;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod history;
pub mod interchange;
pub mod logging;
pub mod persist;
pub mod project;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::{AddArgs, CliArgs, Command, EditArgs, HolidayCommand};
use crate::config::{ConfigFile, default_config_path, load_and_validate, load_or_default};
use crate::dag::{DependencyEdge, Task};
use crate::engine::{Edit, NewTask, Notification, NotificationLevel, PlannerCore, TaskPatch, run_batch};
use crate::errors::GanttError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::interchange::mermaid;
use crate::persist::{open_store, spawn_writer};
use crate::project::ProjectState;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the snapshot store and the debounced writer
/// - the planner core and its runtime
/// - notification printing
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = match &args.config {
        Some(path) => load_and_validate(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => load_or_default(default_config_path())?,
    };
    let state_path = args
        .state
        .clone()
        .unwrap_or_else(|| cfg.storage.path.clone());

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let store = open_store(cfg.storage.mode, fs, &state_path);

    let mut core = PlannerCore::new(cfg.history.limit)?.with_mermaid_options(cfg.mermaid_options());
    if let Some(text) = store.load()? {
        let report = core.load_payload(&text)?;
        if report.discarded > 0 {
            eprintln!(
                "warning: {} task record(s) in {} could not be used and were dropped",
                report.discarded,
                state_path.display()
            );
        }
    }
    debug!(path = %state_path.display(), tasks = core.tasks().len(), "project ready");

    // Read-only commands never start the runtime.
    match &args.command {
        Command::Show => {
            print_schedule(core.state());
            return Ok(());
        }
        Command::Check => return check(core.state()),
        Command::Holiday(HolidayCommand::List) => {
            for date in core.state().calendar().holidays() {
                println!("{}", calendar::format_date(date));
            }
            return Ok(());
        }
        Command::Holiday(HolidayCommand::Export { out }) => {
            return emit(&core.export_holidays()?, out.as_deref());
        }
        Command::ExportJson { out } => return emit(&core.export_json()?, out.as_deref()),
        Command::ExportMermaid {
            out,
            group_by,
            date_mode,
        } => {
            let mut options = cfg.mermaid_options();
            if let Some(g) = group_by {
                options.group_by = (*g).into();
            }
            if let Some(m) = date_mode {
                options.date_mode = (*m).into();
            }
            return emit(&mermaid::export(core.state(), &options), out.as_deref());
        }
        _ => {}
    }

    if let Command::ImportMermaid {
        group_by: Some(g), ..
    } = &args.command
    {
        let mut options = core.mermaid_options().clone();
        options.group_by = (*g).into();
        core = core.with_mermaid_options(options);
    }

    let edits = edits_for(&args.command, core.state())?;
    apply_edits(core, &cfg, store, edits).await
}

/// Feed `edits` through the runtime and persist the result.
async fn apply_edits(
    core: PlannerCore,
    cfg: &ConfigFile,
    store: Box<dyn persist::SnapshotStore>,
    edits: Vec<Edit>,
) -> Result<()> {
    let (note_tx, mut note_rx) = mpsc::channel::<Notification>(64);
    let writer = spawn_writer(store, cfg.debounce(), Some(note_tx.clone()));

    let printer = tokio::spawn(async move {
        let mut errors = 0usize;
        while let Some(note) = note_rx.recv().await {
            match note.level {
                NotificationLevel::Info => println!("{}", note.message),
                NotificationLevel::Warning => eprintln!("warning: {}", note.message),
                NotificationLevel::Error => {
                    errors += 1;
                    eprintln!("error: {}", note.message);
                }
            }
        }
        errors
    });

    let report = run_batch(core, writer, Some(note_tx), edits).await?;
    // The runtime and writer held the only notification senders.
    let errors = printer.await?;
    info!(
        writes = report.persist.writes,
        failures = report.persist.failures,
        "edits applied"
    );

    if errors > 0 {
        bail!("{errors} operation(s) failed");
    }
    Ok(())
}

/// Translate a mutating subcommand into controller edits.
fn edits_for(command: &Command, state: &ProjectState) -> Result<Vec<Edit>> {
    let edits = match command {
        Command::Add(add) => vec![Edit::AddTask(new_task(add, state)?)],
        Command::Remove { task } => vec![Edit::DeleteTask(resolve_task(state, task)?.id.clone())],
        Command::Edit(edit) => edit_task(edit, state)?,
        Command::Shift { task, days, mode } => vec![Edit::Drag {
            id: resolve_task(state, task)?.id.clone(),
            mode: (*mode).into(),
            delta_days: *days,
        }],
        Command::Depend { task, on, kind } => vec![Edit::AddDependency {
            task: resolve_task(state, task)?.id.clone(),
            predecessor: resolve_task(state, on)?.id.clone(),
            kind: *kind,
        }],
        Command::Undepend { task, on, index } => {
            let task = resolve_task(state, task)?;
            let mut indices: Vec<usize> = match (on, index) {
                (_, Some(i)) => vec![*i],
                (Some(on), None) => {
                    let pred = resolve_task(state, on)?;
                    task.dependencies
                        .iter()
                        .enumerate()
                        .filter(|(_, d)| d.id == pred.id)
                        .map(|(i, _)| i)
                        .collect()
                }
                (None, None) => Vec::new(),
            };
            if indices.is_empty() {
                bail!("task '{}' has no matching dependency", task.title);
            }
            // Highest index first so earlier removals do not shift later ones.
            indices.sort_unstable_by(|a, b| b.cmp(a));
            indices
                .into_iter()
                .map(|index| Edit::RemoveDependency {
                    task: task.id.clone(),
                    index,
                })
                .collect()
        }
        Command::Reorder { from, to } => vec![Edit::MoveInOrder {
            from: resolve_task(state, from)?.id.clone(),
            to: resolve_task(state, to)?.id.clone(),
        }],
        Command::Holiday(HolidayCommand::Add { date }) => vec![Edit::AddHoliday(*date)],
        Command::Holiday(HolidayCommand::Remove { date }) => vec![Edit::RemoveHoliday(*date)],
        Command::Holiday(HolidayCommand::Import { file }) => {
            vec![Edit::ImportHolidays(read_input(file)?)]
        }
        Command::ImportJson { file } => vec![Edit::ImportJson(read_input(file)?)],
        Command::ImportMermaid { file, .. } => vec![Edit::ImportMermaid(read_input(file)?)],
        Command::Reset => vec![Edit::Reset],
        Command::Show
        | Command::Check
        | Command::ExportJson { .. }
        | Command::ExportMermaid { .. }
        | Command::Holiday(HolidayCommand::List | HolidayCommand::Export { .. }) => Vec::new(),
    };
    Ok(edits)
}

fn new_task(add: &AddArgs, state: &ProjectState) -> Result<NewTask> {
    let dependencies = add
        .after
        .iter()
        .map(|r| resolve_task(state, r).map(|t| DependencyEdge::finish_to_start(t.id.clone())))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(NewTask {
        title: add.title.clone(),
        category: add.category.clone(),
        assignee: add.assignee.clone(),
        notes: add.notes.clone(),
        start: add.start,
        duration: add.duration,
        is_milestone: add.milestone,
        dependencies,
    })
}

fn edit_task(edit: &EditArgs, state: &ProjectState) -> Result<Vec<Edit>> {
    let id = resolve_task(state, &edit.task)?.id.clone();
    let mut edits = Vec::new();

    let patch = TaskPatch {
        title: edit.title.clone(),
        category: edit.category.clone(),
        assignee: edit.assignee.clone(),
        notes: edit.notes.clone(),
        status: edit.status,
    };
    if !patch.is_empty() {
        edits.push(Edit::UpdateTask {
            id: id.clone(),
            patch,
        });
    }
    if let Some(milestone) = edit.milestone {
        edits.push(Edit::SetMilestone {
            id: id.clone(),
            milestone,
        });
    }
    if let Some(date) = edit.start {
        edits.push(Edit::SetStart { id: id.clone(), date });
    }
    if let Some(duration) = edit.duration {
        edits.push(Edit::SetDuration {
            id: id.clone(),
            duration,
        });
    }
    if let Some(date) = edit.end {
        edits.push(Edit::SetEnd { id, date });
    }

    if edits.is_empty() {
        bail!("nothing to change; pass at least one field");
    }
    Ok(edits)
}

/// Find a task by exact id, unique id prefix or unique title
/// (case-insensitive), in that order.
pub fn resolve_task<'s>(state: &'s ProjectState, reference: &str) -> crate::errors::Result<&'s Task> {
    let reference = reference.trim();
    if let Some(task) = state.task(reference) {
        return Ok(task);
    }

    let by_prefix: Vec<&Task> = state
        .tasks()
        .iter()
        .filter(|t| !reference.is_empty() && t.id.starts_with(reference))
        .collect();
    if let [task] = by_prefix.as_slice() {
        return Ok(task);
    }

    let by_title: Vec<&Task> = state
        .tasks()
        .iter()
        .filter(|t| t.title.eq_ignore_ascii_case(reference))
        .collect();
    match (by_prefix.len(), by_title.as_slice()) {
        (0, [task]) => Ok(task),
        (0, []) => Err(GanttError::TaskNotFound(reference.to_string())),
        _ => Err(GanttError::Validation(format!(
            "'{reference}' matches more than one task; use the task id"
        ))),
    }
}

fn read_input(path: &Path) -> Result<String> {
    RealFileSystem
        .read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))
}

fn emit(text: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            RealFileSystem.write(path, text.as_bytes())?;
            info!(path = %path.display(), "export written");
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn check(state: &ProjectState) -> Result<()> {
    let problems = state.invariant_violations();
    if problems.is_empty() {
        println!("ok: {} task(s), no problems found", state.tasks().len());
        return Ok(());
    }
    for problem in &problems {
        eprintln!("problem: {problem}");
    }
    bail!("{} problem(s) found", problems.len())
}

/// Plain table in manual row order.
fn print_schedule(state: &ProjectState) {
    let tasks = state.ordered_tasks();
    if tasks.is_empty() {
        println!("(no tasks)");
        return;
    }

    let width = tasks
        .iter()
        .map(|t| t.title.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(5, 40);
    println!(
        "{:<8}  {:<width$}  {:<10}  {:<10}  {:>4}  {:<6}  AFTER",
        "ID", "TITLE", "START", "END", "DAYS", "STATUS"
    );
    for task in tasks {
        let title: String = task.title.chars().take(width).collect();
        let marker = if task.is_milestone { "*" } else { "" };
        let after: Vec<String> = task
            .dependencies
            .iter()
            .map(|d| {
                let name = state.task(&d.id).map_or(d.id.as_str(), |p| p.title.as_str());
                format!("{name} ({})", d.kind)
            })
            .collect();
        println!(
            "{:<8}  {:<width$}  {:<10}  {:<10}  {:>4}  {:<6}  {}",
            short_id(&task.id),
            format!("{title}{marker}"),
            calendar::format_date(task.start),
            calendar::format_date(task.end),
            task.duration,
            task.status,
            after.join(", ")
        );
    }
}

fn short_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(i, _)| &id[..i])
}
