//! Database layer for the todo store.

pub mod schema;
pub mod tasks;

use crate::error::{StoreError, StoreResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Default lock-wait before a contended operation fails.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Largest lock-wait SQLite accepts (its timeout is a C `int` of milliseconds).
pub const MAX_BUSY_TIMEOUT_MS: u64 = i32::MAX as u64;

/// Connection settings applied when a store is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Use write-ahead logging so readers proceed during a write.
    pub wal: bool,
    pub busy_timeout_ms: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            wal: true,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Store handle wrapping a SQLite connection.
///
/// Clones share the connection. Other processes may open the same file;
/// SQLite's locking is the only coordination between them.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P, options: StoreOptions) -> StoreResult<Self> {
        let path = path.as_ref();
        let busy_timeout =
            busy_timeout(options.busy_timeout_ms).map_err(|e| StoreError::setup(path, e))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::setup(path, e))?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::setup(path, e))?;
        configure(&conn, busy_timeout, options.wal).map_err(|e| StoreError::setup(path, e))?;
        schema::ensure_schema(&conn).map_err(|e| StoreError::setup(path, e))?;

        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::setup(":memory:", e))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| StoreError::setup(":memory:", e))?;
        schema::ensure_schema(&conn).map_err(|e| StoreError::setup(":memory:", e))?;

        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // Poisoning is ignored; SQLite rolls back anything left uncommitted.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.lock();
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T>,
    {
        let mut conn = self.lock();
        f(&mut conn)
    }
}

fn busy_timeout(ms: u64) -> Result<Duration, String> {
    if ms > MAX_BUSY_TIMEOUT_MS {
        return Err(format!(
            "busy timeout of {ms} ms exceeds the maximum of {MAX_BUSY_TIMEOUT_MS} ms"
        ));
    }
    Ok(Duration::from_millis(ms))
}

fn configure(conn: &Connection, busy_timeout: Duration, wal: bool) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    if wal {
        // Returns the resulting mode; "memory" or "delete" on filesystems
        // without shared-memory support, which is still usable.
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    }

    Ok(())
}
