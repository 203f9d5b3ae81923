//! HSQLDB dialect.
//!
//! HSQLDB is the embedded database of the SUMARiS desktop/test setups:
//! - `DROP TABLE name IF EXISTS` (trailing IF EXISTS)
//! - `CREATE TABLE ... AS (SELECT ...) WITH DATA`
//! - `TO_DATE` is available in Oracle compatibility mode

use super::SqlDialect;

/// HSQLDB dialect.
#[derive(Debug, Clone, Copy)]
pub struct HsqlDb;

impl SqlDialect for HsqlDb {
    fn name(&self) -> &'static str {
        "hsqldb"
    }

    fn if_exists_after_name(&self) -> bool {
        true
    }

    fn create_table_as(&self, table: &str, select: &str) -> String {
        format!(
            "CREATE TABLE {} AS ({}) WITH DATA",
            self.format_identifier(table),
            select
        )
    }
}
