//! SQL generation module.
//!
//! A small type-safe SQL builder that renders the statements the extraction
//! engine issues on its own (everything else comes from query templates):
//!
//! - [`query`] - SELECT / COUNT used to read extraction tables back
//! - [`ddl`] - DROP TABLE, ALTER TABLE (drop column, rename)
//! - [`dml`] - DELETE for the cleanup pass
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations
//! - [`validate`] - sqlparser-based syntax check

pub mod ddl;
pub mod dialect;
pub mod dml;
pub mod query;
pub mod token;
pub mod validate;

// Re-export commonly used types at the sql module level
pub use ddl::{AlterAction, AlterTable, DropTable};
pub use dialect::{Dialect, SqlDialect, UnknownDialect};
pub use dml::Delete;
pub use query::{CountSelect, OrderByExpr, Select, SortDir, TableRef};
pub use token::{Token, TokenStream};
pub use validate::validate_sql;
