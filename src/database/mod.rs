//! Query execution boundary.
//!
//! The extraction engine never holds live handles. It issues SQL text through
//! a [`QueryExecutor`] and reads rows back as positional [`SqlValue`] vectors.
//! Transaction demarcation belongs to whoever owns the connection.

mod error;
mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::SqliteDatabase;

use std::sync::Arc;

use base64::Engine as _;

/// A single row, one value per selected column.
pub type Row = Vec<SqlValue>;

/// Executes SQL statements against the working schema.
///
/// Every call honours the per-statement timeout configured on the executor.
/// A timeout surfaces as [`PersistenceError::Timeout`].
pub trait QueryExecutor: Send + Sync {
    /// Run a DDL or DML statement, returning the number of affected rows.
    ///
    /// DDL statements report zero.
    fn execute_update(&self, sql: &str) -> PersistenceResult<u64>;

    /// Run a `SELECT COUNT(*)`-like statement and return its single value.
    fn execute_count(&self, sql: &str) -> PersistenceResult<i64>;

    /// Run a query and collect all rows.
    fn execute_query(&self, sql: &str) -> PersistenceResult<Vec<Row>>;
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for Arc<T> {
    fn execute_update(&self, sql: &str) -> PersistenceResult<u64> {
        (**self).execute_update(sql)
    }

    fn execute_count(&self, sql: &str) -> PersistenceResult<i64> {
        (**self).execute_count(sql)
    }

    fn execute_query(&self, sql: &str) -> PersistenceResult<Vec<Row>> {
        (**self).execute_query(sql)
    }
}

/// A value read from a result set.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Display form used by result rows: `None` for NULL, text otherwise.
    ///
    /// Floats use the shortest round-tripping representation, blobs are
    /// base64 encoded.
    pub fn to_display(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Integer(i) => Some(i.to_string()),
            SqlValue::Real(f) => {
                let mut buf = ryu::Buffer::new();
                Some(buf.format(*f).to_string())
            }
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Blob(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            SqlValue::Real(f) => Some(*f as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<rusqlite::types::ValueRef<'_>> for SqlValue {
    fn from(value: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        }
    }
}
