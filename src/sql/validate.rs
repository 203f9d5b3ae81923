//! Syntax checking of emitted SQL.
//!
//! Uses sqlparser-rs to parse rendered templates and builder output, so an
//! authoring mistake in a query template shows up before it reaches the
//! database.

use sqlparser::dialect::{GenericDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// Validates that a SQL string is syntactically valid for the given dialect.
///
/// sqlparser has no Oracle or HSQLDB dialect; those use the generic one.
///
/// ```ignore
/// use sumaris_extraction::sql::{validate_sql, Dialect};
///
/// validate_sql("SELECT * FROM EXT_PR_1", Dialect::Postgres).unwrap();
/// ```
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::Oracle | Dialect::HsqlDb => Box::new(GenericDialect {}),
    };

    Parser::parse_sql(&*parser_dialect, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL for {}: {}\nSQL: {}", dialect, e, sql))
}
