//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for the database
//! differences the extraction engine has to care about:
//!
//! - Identifier formatting: bare names, `"quoted"` otherwise
//! - Date literals: `TO_DATE(...)` vs `DATETIME(...)`
//! - Pagination: LIMIT/OFFSET vs OFFSET FETCH
//! - DROP TABLE syntax: `IF EXISTS` placement, Oracle `PURGE`
//! - CREATE TABLE AS syntax
//! - Template group enabled for dialect-specific SQL fragments
//!
//! # Usage
//!
//! ```ignore
//! use sumaris_extraction::sql::{Dialect, SqlDialect};
//!
//! let dialect: Dialect = "oracle".parse()?;
//! let sql = dialect.quote_string("O'Brien"); // 'O''Brien'
//! ```
//!
//! | Feature | PostgreSQL | Oracle | HSQLDB | SQLite |
//! |---------|-----------|--------|--------|--------|
//! | DROP TABLE IF EXISTS | leading | ❌ | trailing | leading |
//! | DROP ... PURGE | ❌ | ✓ | ❌ | ❌ |
//! | ALTER TABLE DROP COLUMN | ✓ | ✓ | ✓ | 3.35+ |
//! | LIMIT/OFFSET | ✓ | ❌ (OFFSET FETCH) | ✓ | ✓ |

mod hsqldb;
pub mod helpers;
mod oracle;
mod postgres;
mod sqlite;

pub use hsqldb::HsqlDb;
pub use oracle::Oracle;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use std::str::FromStr;

use chrono::NaiveDateTime;

use super::token::{Token, TokenStream};

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging. Also the name of the template
    /// group enabled for this dialect.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier unconditionally.
    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    /// Format an identifier, leaving plain names unquoted.
    fn format_identifier(&self, ident: &str) -> String {
        helpers::format_identifier_double(ident)
    }

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a date/timestamp literal.
    fn format_date_literal(&self, value: &NaiveDateTime) -> String {
        helpers::format_to_date(value)
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Emit LIMIT/OFFSET or equivalent pagination clause.
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    // =========================================================================
    // DDL Support
    // =========================================================================

    /// Whether this dialect supports IF EXISTS for DROP statements.
    fn supports_if_exists(&self) -> bool {
        true
    }

    /// Whether IF EXISTS goes after the table name (HSQLDB).
    fn if_exists_after_name(&self) -> bool {
        false
    }

    /// Whether DROP TABLE should skip the recycle bin (Oracle `PURGE`).
    fn drop_purge(&self) -> bool {
        false
    }

    /// Whether this dialect supports CASCADE on DROP TABLE.
    fn supports_drop_cascade(&self) -> bool {
        true
    }

    /// Whether `ALTER TABLE ... DROP COLUMN` is available.
    fn supports_drop_column(&self) -> bool {
        true
    }

    /// Longest identifier accepted by the database.
    fn max_identifier_length(&self) -> usize {
        128
    }

    /// Materialize a query into a new table.
    fn create_table_as(&self, table: &str, select: &str) -> String {
        format!(
            "CREATE TABLE {} AS {}",
            self.format_identifier(table),
            select
        )
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Postgres,
    Oracle,
    HsqlDb,
    Sqlite,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::Oracle => &Oracle,
            Dialect::HsqlDb => &HsqlDb,
            Dialect::Sqlite => &Sqlite,
        }
    }

    /// All dialects, in display order.
    pub fn all() -> [Dialect; 4] {
        [
            Dialect::Postgres,
            Dialect::Oracle,
            Dialect::HsqlDb,
            Dialect::Sqlite,
        ]
    }

    /// Emit a `FUNCTION(args)` call as raw tokens.
    pub fn function_call(&self, name: &str, args: TokenStream) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::FunctionName(name.to_string()))
            .lparen()
            .append(&args)
            .rparen();
        ts
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn format_identifier(&self, ident: &str) -> String {
        self.dialect().format_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_date_literal(&self, value: &NaiveDateTime) -> String {
        self.dialect().format_date_literal(value)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn supports_if_exists(&self) -> bool {
        self.dialect().supports_if_exists()
    }

    fn if_exists_after_name(&self) -> bool {
        self.dialect().if_exists_after_name()
    }

    fn drop_purge(&self) -> bool {
        self.dialect().drop_purge()
    }

    fn supports_drop_cascade(&self) -> bool {
        self.dialect().supports_drop_cascade()
    }

    fn supports_drop_column(&self) -> bool {
        self.dialect().supports_drop_column()
    }

    fn max_identifier_length(&self) -> usize {
        self.dialect().max_identifier_length()
    }

    fn create_table_as(&self, table: &str, select: &str) -> String {
        self.dialect().create_table_as(table, select)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

/// Error returned when a dialect name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported database dialect: {0} (expected postgres, oracle, hsqldb or sqlite)")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" => Ok(Dialect::Postgres),
            "oracle" => Ok(Dialect::Oracle),
            "hsqldb" | "hsql" => Ok(Dialect::HsqlDb),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            other => Err(UnknownDialect(other.to_string())),
        }
    }
}
