//! Task CRUD and filtered listing.

use super::Store;
use crate::error::{StoreError, StoreResult};
use crate::types::{Task, TaskFilter, TaskStatus};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

const TASK_COLUMNS: &str = "id, task, status, created_at, updated_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let status = status.parse::<TaskStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Task {
        id: row.get("id")?,
        text: row.get("task")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Escape `LIKE` wildcards so the query matches as a literal substring.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Build the listing statement and its positional parameters.
fn build_list_query(filter: &TaskFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
    let mut sql = format!("SELECT {} FROM todos", TASK_COLUMNS);
    let mut clauses: Vec<&str> = Vec::new();
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        params_vec.push(Box::new(status.as_str()));
    }

    if let Some(query) = filter.query.as_deref() {
        clauses.push("task LIKE ? ESCAPE '\\'");
        params_vec.push(Box::new(like_pattern(query)));
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    sql.push_str(" ORDER BY id DESC");

    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        params_vec.push(Box::new(limit));
    }

    (sql, params_vec)
}

fn get_task_internal(conn: &Connection, task_id: i64) -> StoreResult<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {} FROM todos WHERE id = ?1", TASK_COLUMNS),
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

impl Store {
    /// Insert a new pending task and return its id.
    ///
    /// Surrounding whitespace is trimmed before storing; blank text is
    /// rejected without touching the database.
    pub fn add_task(&self, text: &str) -> StoreResult<i64> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::validation("task content cannot be empty"));
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO todos (task, status) VALUES (?1, ?2)",
                params![text, TaskStatus::Pending.as_str()],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// List tasks newest first, narrowed by every filter that is set.
    pub fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let (sql, params_vec) = build_list_query(filter);

        self.with_conn(|conn| {
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();

            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_refs.as_slice(), parse_task_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    pub fn get_task(&self, task_id: i64) -> StoreResult<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Count tasks, optionally only those with the given status.
    pub fn count_tasks(&self, status: Option<TaskStatus>) -> StoreResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = match status {
                Some(status) => conn.query_row(
                    "SELECT COUNT(*) FROM todos WHERE status = ?1",
                    params![status.as_str()],
                    |row| row.get(0),
                )?,
                None => conn.query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))?,
            };
            Ok(count.max(0) as u64)
        })
    }

    /// Transition a pending task to completed.
    ///
    /// A task that is already completed is left untouched, including its
    /// `updated_at`, and reported as [`StoreError::AlreadyCompleted`].
    pub fn complete_task(&self, task_id: i64) -> StoreResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let task = get_task_internal(&tx, task_id)?.ok_or(StoreError::NotFound(task_id))?;
            if task.status == TaskStatus::Completed {
                return Err(StoreError::AlreadyCompleted(task_id));
            }

            tx.execute(
                "UPDATE todos SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![TaskStatus::Completed.as_str(), task_id],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Permanently remove a task.
    pub fn delete_task(&self, task_id: i64) -> StoreResult<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM todos WHERE id = ?1", params![task_id])?;
            if deleted == 0 {
                return Err(StoreError::NotFound(task_id));
            }
            Ok(())
        })
    }
}
