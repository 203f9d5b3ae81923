//! DDL (Data Definition Language) support.
//!
//! The extraction engine never creates tables through a builder (the query
//! templates do that with `CREATE TABLE ... AS SELECT`), but it has to drop
//! and reshape them afterwards:
//!
//! - [`DropTable`] - cleanup of transient `EXT_*` tables
//! - [`AlterTable`] - dropping hidden columns, renaming tables into products
//!
//! # Examples
//!
//! ```ignore
//! use sumaris_extraction::sql::{AlterTable, Dialect, DropTable};
//!
//! let drop = DropTable::new("EXT_ST_1700000000000").if_exists();
//! assert_eq!(drop.to_sql(Dialect::HsqlDb), "DROP TABLE EXT_ST_1700000000000 IF EXISTS");
//!
//! let alter = AlterTable::new("EXT_ST_1700000000000").drop_column("PROGRAM_ID");
//! ```

use super::dialect::{Dialect, SqlDialect};
use super::token::{Token, TokenStream};

// ============================================================================
// DROP TABLE
// ============================================================================

/// DROP TABLE statement.
#[derive(Debug, Clone)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct DropTable {
    pub if_exists: bool,
    pub name: String,
    pub cascade: bool,
}

impl DropTable {
    /// Create a new DROP TABLE statement.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            if_exists: false,
            name: name.into(),
            cascade: false,
        }
    }

    /// Add IF EXISTS clause (ignored on dialects without it).
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// Add CASCADE clause (ignored on dialects without it).
    pub fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        let if_exists = self.if_exists && dialect.supports_if_exists();

        ts.push(Token::Drop).space().push(Token::Table);

        if if_exists && !dialect.if_exists_after_name() {
            ts.space().push(Token::If).space().push(Token::Exists);
        }

        ts.space().push(Token::Ident(self.name.clone()));

        if if_exists && dialect.if_exists_after_name() {
            ts.space().push(Token::If).space().push(Token::Exists);
        }

        if self.cascade && dialect.supports_drop_cascade() {
            ts.space().push(Token::Cascade);
        }

        if dialect.drop_purge() {
            ts.space().push(Token::Purge);
        }

        ts
    }
}

// ============================================================================
// ALTER TABLE
// ============================================================================

/// ALTER TABLE statement.
///
/// Each action renders as its own statement: most databases reject several
/// DROP COLUMN clauses in one ALTER, and SQLite accepts only one action.
#[derive(Debug, Clone)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct AlterTable {
    pub name: String,
    pub actions: Vec<AlterAction>,
}

/// An action within ALTER TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterAction {
    DropColumn(String),
    RenameTo(String),
}

impl AlterTable {
    /// Create a new ALTER TABLE statement.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// Drop a column.
    pub fn drop_column(mut self, name: impl Into<String>) -> Self {
        self.actions.push(AlterAction::DropColumn(name.into()));
        self
    }

    /// Drop several columns.
    pub fn drop_columns(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.actions
            .extend(names.into_iter().map(|n| AlterAction::DropColumn(n.into())));
        self
    }

    /// Rename the table.
    pub fn rename_to(mut self, name: impl Into<String>) -> Self {
        self.actions.push(AlterAction::RenameTo(name.into()));
        self
    }

    /// One SQL statement per action.
    pub fn to_statements(&self, dialect: Dialect) -> Vec<String> {
        self.actions
            .iter()
            .filter(|action| match action {
                AlterAction::DropColumn(_) => dialect.supports_drop_column(),
                AlterAction::RenameTo(_) => true,
            })
            .map(|action| self.action_tokens(action).serialize(dialect))
            .collect()
    }

    fn action_tokens(&self, action: &AlterAction) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Alter)
            .space()
            .push(Token::Table)
            .space()
            .push(Token::Ident(self.name.clone()))
            .space();

        match action {
            AlterAction::DropColumn(column) => {
                ts.push(Token::Drop)
                    .space()
                    .push(Token::Column)
                    .space()
                    .push(Token::Ident(column.clone()));
            }
            AlterAction::RenameTo(to) => {
                ts.push(Token::Rename)
                    .space()
                    .push(Token::To)
                    .space()
                    .push(Token::Ident(to.clone()));
            }
        }

        ts
    }
}
