//! Query builder - construct the SELECT statements used to read extraction
//! tables back with a fluent API.

use super::dialect::{Dialect, SqlDialect};
use super::token::{Token, TokenStream};

// =============================================================================
// Table Reference
// =============================================================================

/// A table reference with optional alias.
///
/// The alias is emitted without `AS` (Oracle rejects it for tables).
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct TableRef {
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Ident(self.table.clone()));
        if let Some(alias) = &self.alias {
            ts.space().push(Token::Ident(alias.clone()));
        }
        ts
    }
}

// =============================================================================
// ORDER BY
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    /// Parse `asc`/`desc` (case-insensitive). Anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Some(SortDir::Asc),
            "desc" => Some(SortDir::Desc),
            _ => None,
        }
    }
}

/// An ORDER BY item on a column.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub column: String,
    pub dir: SortDir,
}

// =============================================================================
// SELECT
// =============================================================================

/// SELECT over a single table with a pre-rendered WHERE fragment.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct Select {
    pub distinct: bool,
    /// Projected columns; empty means `*`.
    pub columns: Vec<String>,
    pub from: TableRef,
    pub filter: Option<String>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Select {
    pub fn from(table: TableRef) -> Self {
        Self {
            distinct: false,
            columns: Vec::new(),
            from: table,
            filter: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// WHERE clause content (without the keyword). Blank fragments are ignored.
    pub fn filter(mut self, where_clause: impl Into<String>) -> Self {
        let where_clause = where_clause.into();
        if !where_clause.trim().is_empty() {
            self.filter = Some(where_clause);
        }
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, dir: SortDir) -> Self {
        self.order_by.push(OrderByExpr {
            column: column.into(),
            dir,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// A `SELECT COUNT(*)` over the same rows, ignoring order and paging.
    ///
    /// A DISTINCT projection is wrapped in a sub-select so the count matches
    /// the number of rows the data query returns.
    pub fn count(&self) -> CountSelect {
        CountSelect {
            inner: Self {
                order_by: Vec::new(),
                limit: None,
                offset: None,
                ..self.clone()
            },
        }
    }

    fn qualified(&self, column: &str) -> TokenStream {
        let mut ts = TokenStream::new();
        if let Some(alias) = &self.from.alias {
            ts.push(Token::Ident(alias.clone())).push(Token::Dot);
        }
        ts.push(Token::Ident(column.to_string()));
        ts
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Select).space();
        if self.distinct {
            ts.push(Token::Distinct).space();
        }

        if self.columns.is_empty() {
            ts.push(Token::Star);
        } else {
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&self.qualified(column));
            }
        }

        ts.space()
            .push(Token::From)
            .space()
            .append(&self.from.to_tokens());

        if let Some(filter) = &self.filter {
            ts.space()
                .push(Token::Where)
                .space()
                .push(Token::Raw(filter.clone()));
        }

        if !self.order_by.is_empty() {
            ts.space().push(Token::OrderBy).space();
            for (i, item) in self.order_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&self.qualified(&item.column)).space().push(match item.dir {
                    SortDir::Asc => Token::Asc,
                    SortDir::Desc => Token::Desc,
                });
            }
        }

        if self.limit.is_some() || self.offset.is_some() {
            let paging = dialect.emit_limit_offset(self.limit, self.offset);
            if !paging.is_empty() {
                ts.space().append(&paging);
            }
        }

        ts
    }
}

/// `SELECT COUNT(*)` built from a [`Select`].
#[derive(Debug, Clone, PartialEq)]
pub struct CountSelect {
    inner: Select,
}

impl CountSelect {
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut star = TokenStream::new();
        star.push(Token::Star);

        let mut ts = TokenStream::new();
        ts.push(Token::Select)
            .space()
            .append(&dialect.function_call("count", star))
            .space()
            .push(Token::From)
            .space();

        if self.inner.distinct {
            ts.lparen()
                .append(&self.inner.to_tokens(dialect))
                .rparen()
                .space()
                .push(Token::Ident("C".into()));
        } else {
            ts.append(&self.inner.from.to_tokens());
            if let Some(filter) = &self.inner.filter {
                ts.space()
                    .push(Token::Where)
                    .space()
                    .push(Token::Raw(filter.clone()));
            }
        }

        ts
    }
}
