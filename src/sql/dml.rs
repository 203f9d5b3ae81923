//! DML (Data Manipulation Language) support.
//!
//! The only DML the engine issues itself is the cleanup DELETE that removes
//! rows not matching the extraction filter. Row materialization is done by
//! the query templates.
//!
//! ```ignore
//! use sumaris_extraction::sql::{Delete, Dialect};
//!
//! let delete = Delete::from("EXT_ST_1").alias("T").filter("T.LABEL <> 'X'");
//! assert_eq!(delete.to_sql(Dialect::Postgres), "DELETE FROM EXT_ST_1 T WHERE T.LABEL <> 'X'");
//! ```

use super::dialect::Dialect;
use super::token::{Token, TokenStream};

// ============================================================================
// DELETE
// ============================================================================

/// DELETE statement with a pre-rendered WHERE fragment.
#[derive(Debug, Clone)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct Delete {
    pub table: String,
    pub alias: Option<String>,
    pub filter: Option<String>,
}

impl Delete {
    /// Create a new DELETE statement.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
            filter: None,
        }
    }

    /// Table alias referenced by the WHERE fragment.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Add WHERE clause content (without the WHERE keyword).
    ///
    /// Blank fragments are ignored; several fragments are AND-ed.
    pub fn filter(mut self, where_clause: impl Into<String>) -> Self {
        let where_clause = where_clause.into();
        if where_clause.trim().is_empty() {
            return self;
        }
        self.filter = Some(match self.filter {
            Some(existing) => format!("({}) AND ({})", existing, where_clause),
            None => where_clause,
        });
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens().serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Delete)
            .space()
            .push(Token::From)
            .space()
            .push(Token::Ident(self.table.clone()));

        if let Some(ref alias) = self.alias {
            ts.space().push(Token::Ident(alias.clone()));
        }

        if let Some(ref filter) = self.filter {
            ts.space()
                .push(Token::Where)
                .space()
                .push(Token::Raw(filter.clone()));
        }

        ts
    }
}
