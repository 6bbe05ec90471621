//! CLI command definitions for the `todo` binary.
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod commands;

use crate::config::Config;
use crate::format::OutputFormat;
use crate::types::{TaskFilter, TaskStatus};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Exit code for unexpected runtime failures.
pub const EXIT_RUNTIME_ERROR: u8 = 1;

/// Exit code when the database or configuration cannot be set up.
pub const EXIT_SETUP_ERROR: u8 = 2;

/// Simple To-Do CLI (SQLite)
#[derive(Parser, Debug)]
#[command(name = "todo", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to SQLite database file (default: todo_tasks.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Disable write-ahead logging
    #[arg(long, global = true)]
    pub no_wal: bool,

    /// Milliseconds to wait on a locked database before giving up
    #[arg(long, global = true)]
    pub busy_timeout: Option<u64>,

    /// Logging level (DEBUG, INFO, WARNING, ERROR)
    #[arg(long, default_value = "INFO", global = true)]
    pub log_level: String,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(long, default_value = "2", global = true)]
    pub log: String,

    /// Output format (overrides config)
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a new task
    Add(AddArgs),

    /// List tasks, newest first
    List(ListArgs),

    /// Mark a task as completed
    Complete {
        /// Task ID to mark completed
        id: i64,
    },

    /// Delete a task by ID
    Delete {
        /// Task ID to delete
        id: i64,
    },

    /// Show database engine settings and task counts
    Info,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AddArgs {
    /// Task content (quoted if spaces)
    pub content: String,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListArgs {
    /// Limit number of tasks shown
    #[arg(long)]
    pub limit: Option<u32>,

    /// Filter tasks by status (Pending or Completed)
    #[arg(long)]
    pub status: Option<TaskStatus>,

    /// Filter tasks by substring match in the task content (case-insensitive)
    #[arg(long)]
    pub query: Option<String>,
}

impl ListArgs {
    pub fn to_filter(&self) -> TaskFilter {
        TaskFilter {
            limit: self.limit,
            status: self.status,
            query: self.query.clone(),
        }
    }
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref db) = self.db {
            config.store.db_path = db.clone();
        }
        if self.no_wal {
            config.store.wal = false;
        }
        if let Some(timeout) = self.busy_timeout {
            config.store.busy_timeout_ms = timeout;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
    }
}
