//! WHERE-clause builder.
//!
//! Turns the criteria of a [`Filter`] into a SQL fragment over the columns of
//! one table. Values are formatted by column type: numeric columns take bare
//! literals, date columns take the dialect date literal, everything else is
//! single-quoted as given (callers pre-escape quotes, see [`Filter::escaped`]).
//!
//! In inverse mode every criterion is replaced by its complement and the join
//! by its De Morgan dual, so the clause selects exactly the rows the normal
//! clause rejects. The extraction pipeline deletes those rows after each step.
//!
//! NULLs never match a positive comparison and always match a negative one
//! (`NOT_EQUALS`, `NOT_IN`, `NOT_BETWEEN`), so a row with a NULL lands on
//! exactly one side of the pair.
//!
//! ```ignore
//! let clause = WhereClause::new(Dialect::Postgres, &table, &filter)
//!     .sheet(Some("ST"))
//!     .alias(Some("T"))
//!     .build()?;
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use super::criterion::{ExtractionOperator, Filter, FilterCriterion};
use super::error::{PredicateError, PredicateResult};
use crate::metadata::{ColumnMetadata, TableMetadata};
use crate::sql::{Dialect, SqlDialect};

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Parse a client date value (ISO date or date-time, RFC 3339, `dd/MM/yyyy`).
pub fn parse_date_value(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Builder for the WHERE fragment of one table.
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until build() is called"]
pub struct WhereClause<'a> {
    dialect: Dialect,
    table: &'a TableMetadata,
    filter: &'a Filter,
    sheet_name: Option<&'a str>,
    table_alias: Option<&'a str>,
    skip_invalid: bool,
    inverse: bool,
}

impl<'a> WhereClause<'a> {
    pub fn new(dialect: Dialect, table: &'a TableMetadata, filter: &'a Filter) -> Self {
        Self {
            dialect,
            table,
            filter,
            sheet_name: None,
            table_alias: None,
            skip_invalid: false,
            inverse: false,
        }
    }

    /// Only criteria unscoped or scoped to this sheet are applied.
    pub fn sheet(mut self, sheet_name: Option<&'a str>) -> Self {
        self.sheet_name = sheet_name;
        self
    }

    /// Qualify columns with this alias.
    pub fn alias(mut self, table_alias: Option<&'a str>) -> Self {
        self.table_alias = table_alias;
        self
    }

    /// Drop invalid criteria instead of failing.
    pub fn skip_invalid(mut self, skip_invalid: bool) -> Self {
        self.skip_invalid = skip_invalid;
        self
    }

    /// Build the complementary clause.
    pub fn inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    /// Render the fragment, without the `WHERE` keyword.
    ///
    /// Returns an empty string when no criterion applies.
    pub fn build(&self) -> PredicateResult<String> {
        let logical = if self.inverse {
            self.filter.operator.dual()
        } else {
            self.filter.operator
        };

        let mut parts = Vec::new();
        for criterion in self.filter.criteria_for(self.sheet_name) {
            match self.criterion_sql(criterion, logical.is_negated()) {
                Ok(sql) => parts.push(sql),
                Err(err) if self.skip_invalid => {
                    debug!(
                        table = %self.table.name,
                        column = %criterion.name,
                        error = %err,
                        "skipping invalid criterion"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        if parts.is_empty() {
            return Ok(String::new());
        }

        let joined = parts.join(&format!(" {} ", logical.join_keyword()));
        if logical.is_negated() {
            Ok(format!("NOT ({joined})"))
        } else {
            Ok(joined)
        }
    }

    /// One criterion. Under a `NOT (...)` join, a comparison on a nullable
    /// column is made true or false for NULL, never unknown.
    fn criterion_sql(
        &self,
        criterion: &FilterCriterion,
        negated_join: bool,
    ) -> PredicateResult<String> {
        let column = self
            .table
            .column(&criterion.name)
            .ok_or_else(|| PredicateError::UnknownColumn {
                table: self.table.name.clone(),
                column: criterion.name.clone(),
            })?;

        let column_sql = self.column_sql(column);
        let operator = criterion.effective_operator(self.inverse);

        let sql = match operator {
            ExtractionOperator::Null => format!("{column_sql} IS NULL"),
            ExtractionOperator::NotNull => format!("{column_sql} IS NOT NULL"),
            ExtractionOperator::In | ExtractionOperator::NotIn => {
                if criterion.values.is_empty() {
                    return Err(missing_values(criterion, operator));
                }
                let values = criterion
                    .values
                    .iter()
                    .map(|v| self.format_value(column, v))
                    .collect::<PredicateResult<Vec<_>>>()?;
                format!("{column_sql} {} ({})", operator.symbol(), values.join(", "))
            }
            ExtractionOperator::Between | ExtractionOperator::NotBetween => {
                let lower = criterion
                    .between_value(0)
                    .map_err(|_| missing_values(criterion, operator))?;
                let upper = criterion
                    .between_value(1)
                    .map_err(|_| missing_values(criterion, operator))?;
                format!(
                    "{column_sql} {} {} AND {}",
                    operator.symbol(),
                    self.format_value(column, lower)?,
                    self.format_value(column, upper)?
                )
            }
            _ => {
                let value = criterion
                    .value
                    .as_deref()
                    .or_else(|| criterion.values.first().map(String::as_str))
                    .ok_or_else(|| missing_values(criterion, operator))?;
                let symbol = match operator {
                    ExtractionOperator::NotEquals => "<>",
                    other => other.symbol(),
                };
                format!("{column_sql} {symbol} {}", self.format_value(column, value)?)
            }
        };

        if !column.nullable {
            return Ok(sql);
        }
        match null_matches(operator, self.inverse) {
            Some(true) => Ok(format!("({sql} OR {column_sql} IS NULL)")),
            Some(false) if negated_join => Ok(format!("({sql} AND {column_sql} IS NOT NULL)")),
            _ => Ok(sql),
        }
    }

    fn column_sql(&self, column: &ColumnMetadata) -> String {
        let name = self.dialect.format_identifier(&column.name);
        match self.table_alias {
            Some(alias) => format!("{}.{}", self.dialect.format_identifier(alias), name),
            None => name,
        }
    }

    fn format_value(&self, column: &ColumnMetadata, value: &str) -> PredicateResult<String> {
        let sql_type = column.sql_type();

        if sql_type.is_numeric() {
            let trimmed = value.trim();
            return match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(trimmed.to_string()),
                _ => Err(invalid_value(column, value, "a number")),
            };
        }

        if sql_type.is_date() {
            return parse_date_value(value)
                .map(|dt| self.dialect.format_date_literal(&dt))
                .ok_or_else(|| invalid_value(column, value, "a date"));
        }

        Ok(format!("'{value}'"))
    }
}

/// Whether a NULL column value satisfies `operator`; `None` for the
/// operators that test NULL themselves.
///
/// Negative operators match NULLs. A range comparison does not, unless it is
/// the complement of the criterion (inverse mode): `x < v` must then keep the
/// rows `x >= v` rejected.
fn null_matches(operator: ExtractionOperator, inverse: bool) -> Option<bool> {
    match operator {
        ExtractionOperator::Null | ExtractionOperator::NotNull => None,
        ExtractionOperator::NotEquals
        | ExtractionOperator::NotIn
        | ExtractionOperator::NotBetween => Some(true),
        ExtractionOperator::Less
        | ExtractionOperator::LessOrEquals
        | ExtractionOperator::Greater
        | ExtractionOperator::GreaterOrEquals => Some(inverse),
        ExtractionOperator::Equals | ExtractionOperator::In | ExtractionOperator::Between => {
            Some(false)
        }
    }
}

fn missing_values(criterion: &FilterCriterion, operator: ExtractionOperator) -> PredicateError {
    PredicateError::MissingValuesForOperator {
        column: criterion.name.clone(),
        operator: operator.symbol().to_string(),
    }
}

fn invalid_value(column: &ColumnMetadata, value: &str, expected: &'static str) -> PredicateError {
    PredicateError::InvalidValue {
        column: column.name.clone(),
        value: value.to_string(),
        expected,
    }
}
