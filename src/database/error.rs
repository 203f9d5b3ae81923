//! Persistence-layer error types.

use thiserror::Error;

/// Result type for database operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors raised while executing statements or reading schema metadata.
///
/// The extraction pipeline treats every variant the same way: drop the
/// run's tables, then hand the error back unchanged.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Error reported by the bundled SQLite driver.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Statement interrupted by the configured query timeout.
    #[error("statement timed out after {seconds} seconds")]
    Timeout {
        /// Configured timeout.
        seconds: u64,
    },

    /// Statement rejected by the database.
    #[error("failed to execute statement: {message}\nSQL: {sql}")]
    Statement {
        /// SQL text that failed.
        sql: String,
        /// Database message.
        message: String,
    },

    /// Metadata requested for a table that does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Connection mutex poisoned by a panicking thread.
    #[error("database connection lock poisoned")]
    LockPoisoned,
}

impl PersistenceError {
    /// Create a statement error.
    pub fn statement(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Statement {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
