//! Output formatting for command results: plain-text table or JSON.

use crate::error::StoreError;
use crate::types::{Task, TaskStatus};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Width of the separator under the table header.
const RULE_WIDTH: usize = 70;

/// Timestamp layout matching SQLite's `datetime('now')`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "PENDING",
        TaskStatus::Completed => "COMPLETED",
    }
}

/// Format tasks as a fixed-width table, newest first as given.
pub fn format_tasks_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "[INFO] To-Do list is empty.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("{:<4} {:<10} {:<20} TASK\n", "ID", "STATUS", "CREATED_AT"));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    for task in tasks {
        out.push_str(&format!(
            "{:<4} {:<10} {:<20} {}\n",
            task.id,
            status_label(task.status),
            task.created_at.format(TIMESTAMP_FORMAT).to_string(),
            task.text
        ));
    }

    out
}

pub fn format_tasks_json(tasks: &[Task]) -> String {
    let value: Vec<Value> = tasks.iter().map(task_to_json).collect();
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "[]".to_string()) + "\n"
}

fn task_to_json(task: &Task) -> Value {
    json!({
        "id": task.id,
        "text": task.text,
        "status": task.status,
        "created_at": task.created_at.format(TIMESTAMP_FORMAT).to_string(),
        "updated_at": task.updated_at.map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
    })
}

pub fn format_tasks(tasks: &[Task], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_tasks_table(tasks),
        OutputFormat::Json => format_tasks_json(tasks),
    }
}

/// A successful mutation. `fields` are merged into the JSON form.
pub fn format_success(message: &str, fields: Value, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format!("[SUCCESS] {}\n", message),
        OutputFormat::Json => {
            let mut value = json!({ "ok": true, "message": message });
            if let (Some(obj), Value::Object(extra)) = (value.as_object_mut(), fields) {
                obj.extend(extra);
            }
            value.to_string() + "\n"
        }
    }
}

pub fn format_error(err: &StoreError, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format!("[ERROR] {}\n", capitalize(&err.to_string())),
        OutputFormat::Json => {
            json!({
                "ok": false,
                "code": err.code(),
                "message": err.to_string(),
                "retryable": err.is_retryable(),
            })
            .to_string()
                + "\n"
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(id: i64, text: &str, status: TaskStatus) -> Task {
        Task {
            id,
            text: text.to_string(),
            status,
            created_at: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn empty_table_prints_info_line() {
        assert_eq!(format_tasks_table(&[]), "[INFO] To-Do list is empty.\n");
    }

    #[test]
    fn table_has_header_rule_and_rows() {
        let out = format_tasks_table(&[
            task(2, "Buy bread", TaskStatus::Completed),
            task(1, "Buy milk", TaskStatus::Pending),
        ]);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID   STATUS     CREATED_AT"));
        assert_eq!(lines[1], "-".repeat(70));
        assert_eq!(lines[2], "2    COMPLETED  2024-05-01 09:30:00  Buy bread");
        assert_eq!(lines[3], "1    PENDING    2024-05-01 09:30:00  Buy milk");
    }

    #[test]
    fn json_list_uses_canonical_status() {
        let out = format_tasks_json(&[task(1, "Pay bill", TaskStatus::Pending)]);
        let value: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["status"], "Pending");
        assert_eq!(value[0]["created_at"], "2024-05-01 09:30:00");
        assert!(value[0]["updated_at"].is_null());
    }

    #[test]
    fn success_json_merges_fields() {
        let out = format_success("Task added", json!({ "id": 7 }), OutputFormat::Json);
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn errors_render_in_both_formats() {
        let err = StoreError::NotFound(9);
        assert_eq!(
            format_error(&err, OutputFormat::Table),
            "[ERROR] Task with ID 9 not found\n"
        );

        let value: Value =
            serde_json::from_str(&format_error(&err, OutputFormat::Json)).unwrap();
        assert_eq!(value["code"], "TASK_NOT_FOUND");
        assert_eq!(value["ok"], false);
    }
}
