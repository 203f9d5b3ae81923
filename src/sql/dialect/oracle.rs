//! Oracle SQL dialect.
//!
//! Oracle differs from ANSI in a few places that matter here:
//! - No `IF EXISTS` on DROP TABLE (before 23c)
//! - `DROP TABLE ... PURGE` to bypass the recycle bin
//! - `CASCADE CONSTRAINTS` rather than `CASCADE`
//! - OFFSET ... FETCH NEXT pagination (12c+)
//! - 30 character identifiers on pre-12.2 schemas

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;

/// Oracle SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Oracle;

impl SqlDialect for Oracle {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_offset_fetch(limit, offset)
    }

    fn supports_if_exists(&self) -> bool {
        false
    }

    fn drop_purge(&self) -> bool {
        true
    }

    fn supports_drop_cascade(&self) -> bool {
        // Oracle spells it CASCADE CONSTRAINTS
        false
    }

    fn max_identifier_length(&self) -> usize {
        30
    }
}
