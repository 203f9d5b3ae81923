//! Bundled SQLite backend.
//!
//! Implements both [`QueryExecutor`] and [`TableMetadataProvider`] over a
//! single `rusqlite` connection. Used by the CLI and the integration tests.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rusqlite::{params, Connection, ErrorCode};
use tracing::{debug, trace};

use super::{PersistenceError, PersistenceResult, QueryExecutor, Row, SqlValue};
use crate::metadata::{ColumnMetadata, TableMetadata, TableMetadataProvider};

/// Number of VM instructions between two timeout checks.
const PROGRESS_PERIOD: i32 = 1_000;

/// SQLite connection with a per-statement timeout.
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
    timeout: Option<Duration>,
}

impl SqliteDatabase {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> PersistenceResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            timeout: None,
        }
    }

    /// Interrupt any statement running longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Run a batch of statements (schema setup, fixtures).
    pub fn execute_batch(&self, sql: &str) -> PersistenceResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| self.map_error(sql, e))
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        let conn = self.conn.lock().map_err(|_| PersistenceError::LockPoisoned)?;
        match self.timeout {
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                conn.progress_handler(PROGRESS_PERIOD, Some(move || Instant::now() > deadline));
            }
            None => conn.progress_handler(PROGRESS_PERIOD, None::<fn() -> bool>),
        }
        Ok(conn)
    }

    fn map_error(&self, sql: &str, err: rusqlite::Error) -> PersistenceError {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == ErrorCode::OperationInterrupted =>
            {
                PersistenceError::Timeout {
                    seconds: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
                }
            }
            rusqlite::Error::SqliteFailure(_, Some(message)) => {
                PersistenceError::statement(sql, message.clone())
            }
            _ => PersistenceError::Sqlite(err),
        }
    }
}

impl QueryExecutor for SqliteDatabase {
    fn execute_update(&self, sql: &str) -> PersistenceResult<u64> {
        trace!(sql = %sql, "execute update");
        let conn = self.lock()?;
        let changed = conn.execute(sql, []).map_err(|e| self.map_error(sql, e))?;
        Ok(changed as u64)
    }

    fn execute_count(&self, sql: &str) -> PersistenceResult<i64> {
        trace!(sql = %sql, "execute count");
        let conn = self.lock()?;
        conn.query_row(sql, [], |row| row.get::<_, i64>(0))
            .map_err(|e| self.map_error(sql, e))
    }

    fn execute_query(&self, sql: &str) -> PersistenceResult<Vec<Row>> {
        trace!(sql = %sql, "execute query");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql).map_err(|e| self.map_error(sql, e))?;
        let column_count = stmt.column_count();

        let rows = stmt
            .query_map([], |row| {
                (0..column_count)
                    .map(|i| row.get_ref(i).map(SqlValue::from))
                    .collect::<Result<Row, _>>()
            })
            .map_err(|e| self.map_error(sql, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.map_error(sql, e))?;

        Ok(rows)
    }
}

impl TableMetadataProvider for SqliteDatabase {
    fn get_table(&self, name: &str) -> PersistenceResult<TableMetadata> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name, type, \"notnull\", dflt_value FROM pragma_table_info(?1) ORDER BY cid",
        )?;

        let columns = stmt
            .query_map(params![name], |row| {
                let column_name: String = row.get(0)?;
                let type_name: String = row.get(1)?;
                let not_null: bool = row.get(2)?;
                let default_value: Option<String> = row.get(3)?;

                let mut column = ColumnMetadata::new(column_name, type_name, !not_null);
                if let Some(default_value) = default_value {
                    column = column.with_default_value(default_value);
                }
                Ok(column)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(PersistenceError::TableNotFound(name.to_string()));
        }

        debug!(table = %name, columns = columns.len(), "loaded table metadata");
        Ok(TableMetadata::new(name.to_uppercase(), columns))
    }

    fn exists(&self, name: &str) -> PersistenceResult<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND UPPER(name) = UPPER(?1)",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
