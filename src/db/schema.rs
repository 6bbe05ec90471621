//! Table definition and schema introspection for the todo database.

use super::Store;
use crate::error::StoreResult;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// The durable on-disk contract. Files written by earlier versions of the
/// tool use exactly this table.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('Pending','Completed')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT
);";

/// Create the `todos` table if it does not exist yet.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// Information about a table column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// Engine-level facts about an open store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreInfo {
    pub sqlite_version: String,
    pub journal_mode: String,
    pub busy_timeout_ms: i64,
}

impl Store {
    /// Column layout of `todos`, in declaration order.
    pub fn table_columns(&self) -> StoreResult<Vec<ColumnInfo>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("PRAGMA table_info('todos')")?;

            let columns: Vec<ColumnInfo> = stmt
                .query_map([], |row| {
                    Ok(ColumnInfo {
                        name: row.get(1)?,
                        data_type: row.get::<_, String>(2)?.to_uppercase(),
                        nullable: row.get::<_, i32>(3)? == 0,
                        default_value: row.get(4)?,
                        primary_key: row.get::<_, i32>(5)? > 0,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(columns)
        })
    }

    /// Version, journal mode and lock-wait of the underlying connection.
    pub fn info(&self) -> StoreResult<StoreInfo> {
        self.with_conn(|conn| {
            let sqlite_version: String =
                conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
            let journal_mode: String =
                conn.pragma_query_value(None, "journal_mode", |row| row.get(0))?;
            let busy_timeout_ms: i64 =
                conn.pragma_query_value(None, "busy_timeout", |row| row.get(0))?;

            Ok(StoreInfo {
                sqlite_version,
                journal_mode: journal_mode.to_lowercase(),
                busy_timeout_ms,
            })
        })
    }
}
