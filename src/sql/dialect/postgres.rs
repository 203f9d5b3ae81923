//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features used by the extraction engine:
//! - Lowercase case folding for unquoted identifiers
//! - `DROP TABLE IF EXISTS ... CASCADE`
//! - `TO_DATE(text, format)` for date literals
//! - LIMIT/OFFSET pagination

use super::SqlDialect;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)

    fn max_identifier_length(&self) -> usize {
        63
    }
}
