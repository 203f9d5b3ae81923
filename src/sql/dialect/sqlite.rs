//! SQLite dialect.
//!
//! Backs the bundled `rusqlite` executor:
//! - Dates are ISO-8601 text, compared with `DATETIME('...')`
//! - No CASCADE on DROP TABLE
//! - `LIMIT -1` when paging with an offset only
//! - DROP COLUMN since 3.35 (the bundled library is newer)

use chrono::NaiveDateTime;

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;

/// SQLite dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn format_date_literal(&self, value: &NaiveDateTime) -> String {
        helpers::format_sqlite_datetime(value)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_sqlite(limit, offset)
    }

    fn supports_drop_cascade(&self) -> bool {
        false
    }
}
