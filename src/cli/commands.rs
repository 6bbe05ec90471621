//! Command handlers: call the store and render the outcome.

use super::{Command, ListArgs};
use crate::db::Store;
use crate::error::StoreError;
use crate::format::{OutputFormat, format_error, format_success, format_tasks};
use crate::types::TaskStatus;
use anyhow::Result;
use serde_json::json;
use std::io::Write;
use tracing::{debug, error, info, warn};

/// Run one subcommand against an open store, writing output to `out`.
///
/// Domain failures (blank text, unknown id, already completed) are printed
/// and count as handled. Anything else is returned for the caller to turn
/// into a non-zero exit code; a [`StoreError`] inside the returned error can
/// be recovered with `downcast_ref`.
pub fn run_command<W: Write>(
    store: &Store,
    command: &Command,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let result = match command {
        Command::Add(args) => run_add(store, &args.content, format, out),
        Command::List(args) => run_list(store, args, format, out),
        Command::Complete { id } => run_complete(store, *id, format, out),
        Command::Delete { id } => run_delete(store, *id, format, out),
        Command::Info => run_info(store, format, out),
    };

    match result {
        Ok(()) => Ok(()),
        Err(CommandError::Store(e)) if e.is_reportable() => {
            warn!(error = %e, code = ?e.code(), "Command rejected");
            out.write_all(format_error(&e, format).as_bytes())?;
            Ok(())
        }
        Err(CommandError::Store(e)) => Err(e.into()),
        Err(CommandError::Io(e)) => Err(e.into()),
    }
}

/// Print the message for an error returned by [`run_command`].
///
/// Returns whether the message reached `out`; a failed write is logged.
pub fn report_failure<W: Write>(err: &anyhow::Error, format: OutputFormat, out: &mut W) -> bool {
    error!(error = %err, "Unhandled error in command");
    let message = match err.downcast_ref::<StoreError>() {
        Some(store_err) => format_error(store_err, format),
        None => "[ERROR] An unexpected error occurred.\n".to_string(),
    };

    match out.write_all(message.as_bytes()).and_then(|()| out.flush()) {
        Ok(()) => true,
        Err(write_err) => {
            error!(error = %write_err, "Failed to write error message");
            false
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

type CommandResult = std::result::Result<(), CommandError>;

fn run_add<W: Write>(store: &Store, content: &str, format: OutputFormat, out: &mut W) -> CommandResult {
    let id = store.add_task(content)?;
    let text = content.trim();
    info!(task_id = id, "Added task");

    let message = format!("Task added (id={}): {}", id, text);
    out.write_all(format_success(&message, json!({ "id": id, "text": text }), format).as_bytes())?;
    Ok(())
}

fn run_list<W: Write>(store: &Store, args: &ListArgs, format: OutputFormat, out: &mut W) -> CommandResult {
    let filter = args.to_filter();
    let tasks = store.list_tasks(&filter)?;
    debug!(
        count = tasks.len(),
        status = ?filter.status,
        query = ?filter.query,
        limit = ?filter.limit,
        "Fetched tasks"
    );

    out.write_all(format_tasks(&tasks, format).as_bytes())?;
    Ok(())
}

fn run_complete<W: Write>(store: &Store, id: i64, format: OutputFormat, out: &mut W) -> CommandResult {
    store.complete_task(id)?;
    info!(task_id = id, "Completed task");

    let message = format!("Task [{}] marked as Completed.", id);
    out.write_all(format_success(&message, json!({ "id": id }), format).as_bytes())?;
    Ok(())
}

fn run_delete<W: Write>(store: &Store, id: i64, format: OutputFormat, out: &mut W) -> CommandResult {
    store.delete_task(id)?;
    info!(task_id = id, "Deleted task");

    let message = format!("Task [{}] deleted.", id);
    out.write_all(format_success(&message, json!({ "id": id }), format).as_bytes())?;
    Ok(())
}

fn run_info<W: Write>(store: &Store, format: OutputFormat, out: &mut W) -> CommandResult {
    let engine = store.info()?;
    let total = store.count_tasks(None)?;
    let pending = store.count_tasks(Some(TaskStatus::Pending))?;
    let completed = store.count_tasks(Some(TaskStatus::Completed))?;

    match format {
        OutputFormat::Table => {
            writeln!(out, "SQLite version: {}", engine.sqlite_version)?;
            writeln!(out, "Journal mode:   {}", engine.journal_mode)?;
            writeln!(out, "Busy timeout:   {} ms", engine.busy_timeout_ms)?;
            writeln!(out, "Tasks:          {} ({} pending, {} completed)", total, pending, completed)?;
        }
        OutputFormat::Json => {
            let value = json!({
                "sqlite_version": engine.sqlite_version,
                "journal_mode": engine.journal_mode,
                "busy_timeout_ms": engine.busy_timeout_ms,
                "tasks": { "total": total, "pending": pending, "completed": completed },
            });
            writeln!(out, "{}", value)?;
        }
    }
    Ok(())
}
