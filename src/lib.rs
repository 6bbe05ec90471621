//! Local task-tracking store over SQLite.
//!
//! [`db::Store`] owns the database file and exposes the task operations;
//! [`cli`] maps command-line invocations onto them.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod types;
