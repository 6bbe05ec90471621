//! Structured error types for store operations.

use serde::Serialize;
use std::path::PathBuf;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Fatal
    SetupFailed,

    // Caller errors
    InvalidFieldValue,
    TaskNotFound,
    AlreadyCompleted,

    // Engine errors
    DatabaseBusy,
    DatabaseError,
}

/// Errors returned by [`crate::db::Store`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database file or schema could not be initialized.
    #[error("cannot initialize database at {}: {source}", path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Caller input violates a precondition.
    #[error("{0}")]
    Validation(String),

    #[error("task with ID {0} not found")]
    NotFound(i64),

    #[error("task with ID {0} is already completed")]
    AlreadyCompleted(i64),

    /// The lock wait elapsed under contention.
    #[error("database is busy, try again")]
    Busy,

    #[error("database error: {0}")]
    Database(rusqlite::Error),
}

impl StoreError {
    pub fn setup(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Setup {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Setup { .. } => ErrorCode::SetupFailed,
            Self::Validation(_) => ErrorCode::InvalidFieldValue,
            Self::NotFound(_) => ErrorCode::TaskNotFound,
            Self::AlreadyCompleted(_) => ErrorCode::AlreadyCompleted,
            Self::Busy => ErrorCode::DatabaseBusy,
            Self::Database(_) => ErrorCode::DatabaseError,
        }
    }

    /// Domain outcomes: the command layer reports them and carries on.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::AlreadyCompleted(_)
        )
    }

    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
                StoreError::Busy
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
