//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use super::super::token::{Token, TokenStream};

/// Plain identifier: letter first, then letters, digits, `_`, `$` or `#`.
static BARE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_$#]*$").expect("valid identifier regex"));

/// Keywords that can never be emitted as bare identifiers.
const RESERVED: &[&str] = &[
    "SELECT", "FROM", "WHERE", "TABLE", "ORDER", "GROUP", "BY", "AND", "OR", "NOT", "NULL", "IN",
    "IS", "BETWEEN", "DATE", "USER", "LEVEL", "COMMENT", "SIZE", "ROWS", "LIMIT", "OFFSET",
];

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, Oracle, HSQLDB, SQLite
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Whether an identifier can be emitted unquoted.
///
/// Extraction tables and their columns are created unquoted by the query
/// templates, so quoting them would change their case on Postgres/Oracle.
pub fn is_bare_identifier(ident: &str) -> bool {
    BARE_IDENTIFIER.is_match(ident) && !RESERVED.contains(&ident.to_uppercase().as_str())
}

/// Emit the identifier bare when possible, double-quoted otherwise.
pub fn format_identifier_double(ident: &str) -> String {
    if is_bare_identifier(ident) {
        ident.to_string()
    } else {
        quote_double(ident)
    }
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
/// Used by: All dialects
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Date Literals
// =============================================================================

/// `TO_DATE('2024-01-31 00:00:00', 'YYYY-MM-DD HH24:MI:SS')`.
/// Used by: Oracle, Postgres, HSQLDB
pub fn format_to_date(value: &NaiveDateTime) -> String {
    format!(
        "TO_DATE('{}', 'YYYY-MM-DD HH24:MI:SS')",
        value.format("%Y-%m-%d %H:%M:%S")
    )
}

/// `DATETIME('2024-01-31 00:00:00')` - SQLite stores dates as ISO text.
pub fn format_sqlite_datetime(value: &NaiveDateTime) -> String {
    format!("DATETIME('{}')", value.format("%Y-%m-%d %H:%M:%S"))
}

// =============================================================================
// Pagination
// =============================================================================

/// Emit LIMIT ... OFFSET ... (standard SQL).
/// Used by: Postgres, HSQLDB
pub fn emit_limit_offset_standard(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    if let Some(lim) = limit {
        ts.push(Token::Limit)
            .space()
            .push(Token::LitInt(lim as i64));
    }

    if let Some(off) = offset {
        if limit.is_some() {
            ts.space();
        }
        ts.push(Token::Offset)
            .space()
            .push(Token::LitInt(off as i64));
    }

    ts
}

/// Emit LIMIT ... OFFSET ..., with `LIMIT -1` when only an offset is given.
/// Used by: SQLite, where OFFSET needs a LIMIT
pub fn emit_limit_offset_sqlite(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    match (limit, offset) {
        (None, Some(_)) => {
            let mut ts = TokenStream::new();
            ts.push(Token::Limit)
                .space()
                .push(Token::LitInt(-1))
                .space()
                .append(&emit_limit_offset_standard(None, offset));
            ts
        }
        _ => emit_limit_offset_standard(limit, offset),
    }
}

/// Emit OFFSET ... ROWS FETCH NEXT ... ROWS ONLY (SQL:2008 style).
/// Used by: Oracle 12c+
pub fn emit_offset_fetch(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    let off = offset.unwrap_or(0);
    ts.push(Token::Offset)
        .space()
        .push(Token::LitInt(off as i64))
        .space()
        .push(Token::Rows);

    if let Some(lim) = limit {
        ts.space()
            .push(Token::Fetch)
            .space()
            .push(Token::Next)
            .space()
            .push(Token::LitInt(lim as i64))
            .space()
            .push(Token::Rows)
            .space()
            .push(Token::Only);
    }

    ts
}
