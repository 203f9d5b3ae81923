//! Reads extraction tables back as display rows.
//!
//! Columns are exposed in a stable order: known columns first, in their
//! preferred order, then any other column in its natural order. Rows are
//! projected onto that column list, so a short result row is padded with
//! `None` instead of shifting values.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::database::{QueryExecutor, Row};
use crate::extraction::{ExtractionResult, Filter, PredicateError, WhereClause};
use crate::metadata::{ColumnMetadata, SqlType, TableMetadataProvider};
use crate::sql::{Dialect, Select, SortDir, TableRef};

/// Default number of rows in a page.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// A slice of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub offset: u64,
    /// Maximum number of rows; 0 reads every row.
    pub size: u64,
    pub sort_column: Option<String>,
    pub sort_direction: SortDir,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_column: None,
            sort_direction: SortDir::Asc,
        }
    }
}

impl Page {
    pub fn new(offset: u64, size: u64) -> Self {
        Self {
            offset,
            size,
            ..Self::default()
        }
    }

    /// Every row, unsorted.
    pub fn all() -> Self {
        Self::new(0, 0)
    }

    pub fn sort(mut self, column: impl Into<String>, direction: SortDir) -> Self {
        self.sort_column = Some(column.into());
        self.sort_direction = direction;
        self
    }
}

/// How a table is read.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions<'a> {
    /// Criteria applied to the rows, count included.
    pub filter: Option<&'a Filter>,
    /// Sheet the filter criteria are scoped to.
    pub sheet_name: Option<&'a str>,
    /// Columns never exposed.
    pub hidden_columns: BTreeSet<String>,
    /// Types overriding the introspected ones.
    pub column_types: BTreeMap<String, SqlType>,
    pub distinct: bool,
    /// Preferred column order.
    pub preferred_order: &'a [&'a str],
}

/// Columns, total row count and one page of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableRows {
    pub columns: Vec<ColumnMetadata>,
    pub total: i64,
    pub rows: Vec<Vec<Option<String>>>,
}

impl TableRows {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Rank of each column (1-based), in the columns' natural order.
///
/// Preferred columns take ranks by their index in `preferred_order`; the
/// remaining columns follow, after the highest preferred rank.
pub fn column_ranks(columns: &[ColumnMetadata], preferred_order: &[&str]) -> Vec<usize> {
    let preferred_rank = |name: &str| {
        preferred_order
            .iter()
            .position(|p| p.eq_ignore_ascii_case(name))
            .map(|index| index + 1)
    };

    let mut next = columns
        .iter()
        .filter_map(|c| preferred_rank(&c.name))
        .max()
        .unwrap_or(0);

    columns
        .iter()
        .map(|c| {
            preferred_rank(&c.name).unwrap_or_else(|| {
                next += 1;
                next
            })
        })
        .collect()
}

/// Columns sorted by their rank.
pub fn rank_columns(columns: &[ColumnMetadata], preferred_order: &[&str]) -> Vec<ColumnMetadata> {
    let mut ranked: Vec<(usize, &ColumnMetadata)> = column_ranks(columns, preferred_order)
        .into_iter()
        .zip(columns)
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, c)| c.clone()).collect()
}

/// Project a result row onto `width` positions.
pub fn project_row(row: &Row, width: usize) -> Vec<Option<String>> {
    (0..width)
        .map(|index| row.get(index).and_then(|value| value.to_display()))
        .collect()
}

/// Reads arbitrary tables through the executor.
pub struct TableRowsReader<'a> {
    executor: &'a dyn QueryExecutor,
    metadata: &'a dyn TableMetadataProvider,
    dialect: Dialect,
}

impl<'a> TableRowsReader<'a> {
    pub fn new(
        executor: &'a dyn QueryExecutor,
        metadata: &'a dyn TableMetadataProvider,
        dialect: Dialect,
    ) -> Self {
        Self {
            executor,
            metadata,
            dialect,
        }
    }

    pub fn get_table_rows(
        &self,
        table_name: &str,
        options: &ReadOptions<'_>,
        page: &Page,
    ) -> ExtractionResult<TableRows> {
        let table = self
            .metadata
            .get_table(table_name)?
            .with_column_types(&options.column_types);

        let visible: Vec<ColumnMetadata> = table
            .columns
            .iter()
            .filter(|c| {
                !options
                    .hidden_columns
                    .iter()
                    .any(|hidden| hidden.eq_ignore_ascii_case(&c.name))
            })
            .cloned()
            .collect();
        let columns = rank_columns(&visible, options.preferred_order);

        let where_clause = match options.filter {
            Some(filter) => WhereClause::new(self.dialect, &table, filter)
                .sheet(options.sheet_name)
                .alias(Some(&table.alias))
                .build()?,
            None => String::new(),
        };

        let mut select = Select::from(TableRef::new(&table.name).with_alias(&table.alias))
            .distinct(options.distinct)
            .columns(columns.iter().map(|c| c.name.clone()))
            .filter(where_clause);

        let count_sql = select.count().to_sql(self.dialect);
        let total = self.executor.execute_count(&count_sql)?;

        if let Some(sort_column) = &page.sort_column {
            let column = columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(sort_column))
                .ok_or_else(|| PredicateError::UnknownColumn {
                    table: table.name.clone(),
                    column: sort_column.clone(),
                })?;
            select = select.order_by(column.name.clone(), page.sort_direction);
        }
        if page.size > 0 {
            select = select.limit(page.size);
        }
        if page.offset > 0 {
            select = select.offset(page.offset);
        }

        let sql = select.to_sql(self.dialect);
        debug!(table = %table.name, total, sql = %sql, "reading table rows");
        let rows = self
            .executor
            .execute_query(&sql)?
            .iter()
            .map(|row| project_row(row, columns.len()))
            .collect();

        Ok(TableRows {
            columns,
            total,
            rows,
        })
    }
}
