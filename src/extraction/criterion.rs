//! Filter criterion model.
//!
//! A [`Filter`] is what a client sends: a flat list of criteria, a logical
//! operator joining them, and optionally the sheet it wants to preview.
//! Criteria may be scoped to a sheet, so one filter can carry conditions for
//! several sheets at once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{PredicateError, PredicateResult};

/// Comparison operator of a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExtractionOperator {
    Equals,
    NotEquals,
    Less,
    LessOrEquals,
    Greater,
    GreaterOrEquals,
    In,
    NotIn,
    Between,
    NotBetween,
    Null,
    NotNull,
}

impl ExtractionOperator {
    pub const ALL: [ExtractionOperator; 12] = [
        ExtractionOperator::Equals,
        ExtractionOperator::NotEquals,
        ExtractionOperator::Less,
        ExtractionOperator::LessOrEquals,
        ExtractionOperator::Greater,
        ExtractionOperator::GreaterOrEquals,
        ExtractionOperator::In,
        ExtractionOperator::NotIn,
        ExtractionOperator::Between,
        ExtractionOperator::NotBetween,
        ExtractionOperator::Null,
        ExtractionOperator::NotNull,
    ];

    /// Client-facing symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            ExtractionOperator::Equals => "=",
            ExtractionOperator::NotEquals => "!=",
            ExtractionOperator::Less => "<",
            ExtractionOperator::LessOrEquals => "<=",
            ExtractionOperator::Greater => ">",
            ExtractionOperator::GreaterOrEquals => ">=",
            ExtractionOperator::In => "IN",
            ExtractionOperator::NotIn => "NOT IN",
            ExtractionOperator::Between => "BETWEEN",
            ExtractionOperator::NotBetween => "NOT BETWEEN",
            ExtractionOperator::Null => "NULL",
            ExtractionOperator::NotNull => "NOT NULL",
        }
    }

    /// Logical complement: a row matches exactly one of `op` and `op.inverse()`
    /// (NULLs aside).
    pub fn inverse(&self) -> Self {
        match self {
            ExtractionOperator::Equals => ExtractionOperator::NotEquals,
            ExtractionOperator::NotEquals => ExtractionOperator::Equals,
            ExtractionOperator::Less => ExtractionOperator::GreaterOrEquals,
            ExtractionOperator::GreaterOrEquals => ExtractionOperator::Less,
            ExtractionOperator::LessOrEquals => ExtractionOperator::Greater,
            ExtractionOperator::Greater => ExtractionOperator::LessOrEquals,
            ExtractionOperator::In => ExtractionOperator::NotIn,
            ExtractionOperator::NotIn => ExtractionOperator::In,
            ExtractionOperator::Between => ExtractionOperator::NotBetween,
            ExtractionOperator::NotBetween => ExtractionOperator::Between,
            ExtractionOperator::Null => ExtractionOperator::NotNull,
            ExtractionOperator::NotNull => ExtractionOperator::Null,
        }
    }

    /// Negative operators select rows that do NOT match a value.
    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            ExtractionOperator::NotEquals
                | ExtractionOperator::NotIn
                | ExtractionOperator::NotBetween
                | ExtractionOperator::NotNull
        )
    }

    /// Operators that read `values` instead of `value`.
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            ExtractionOperator::In
                | ExtractionOperator::NotIn
                | ExtractionOperator::Between
                | ExtractionOperator::NotBetween
        )
    }
}

impl fmt::Display for ExtractionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ExtractionOperator {
    type Err = PredicateError;

    /// Accepts both symbols (`=`, `NOT IN`...) and names (`EQUALS`, `NOT_IN`...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        let op = match normalized.as_str() {
            "=" | "==" | "EQUALS" => ExtractionOperator::Equals,
            "!=" | "<>" | "NOT_EQUALS" => ExtractionOperator::NotEquals,
            "<" | "LESS" => ExtractionOperator::Less,
            "<=" | "LESS_OR_EQUALS" => ExtractionOperator::LessOrEquals,
            ">" | "GREATER" => ExtractionOperator::Greater,
            ">=" | "GREATER_OR_EQUALS" => ExtractionOperator::GreaterOrEquals,
            "IN" => ExtractionOperator::In,
            "NOT IN" | "NOT_IN" => ExtractionOperator::NotIn,
            "BETWEEN" => ExtractionOperator::Between,
            "NOT BETWEEN" | "NOT_BETWEEN" => ExtractionOperator::NotBetween,
            "NULL" | "IS NULL" => ExtractionOperator::Null,
            "NOT NULL" | "NOT_NULL" | "IS NOT NULL" => ExtractionOperator::NotNull,
            _ => return Err(PredicateError::InvalidOperator(s.to_string())),
        };
        Ok(op)
    }
}

impl TryFrom<String> for ExtractionOperator {
    type Error = PredicateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExtractionOperator> for String {
    fn from(op: ExtractionOperator) -> Self {
        op.symbol().to_string()
    }
}

/// Operator joining the criteria of a filter.
///
/// `AndNot` and `OrNot` negate the whole joined clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
    AndNot,
    OrNot,
}

impl LogicalOperator {
    pub const ALL: [LogicalOperator; 4] = [
        LogicalOperator::And,
        LogicalOperator::Or,
        LogicalOperator::AndNot,
        LogicalOperator::OrNot,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
            LogicalOperator::AndNot => "AND_NOT",
            LogicalOperator::OrNot => "OR_NOT",
        }
    }

    /// Negated form of the operator.
    pub fn inverse(&self) -> Self {
        match self {
            LogicalOperator::And => LogicalOperator::AndNot,
            LogicalOperator::AndNot => LogicalOperator::And,
            LogicalOperator::Or => LogicalOperator::OrNot,
            LogicalOperator::OrNot => LogicalOperator::Or,
        }
    }

    /// Join to use once every criterion has been inverted (De Morgan).
    pub fn dual(&self) -> Self {
        match self {
            LogicalOperator::And => LogicalOperator::Or,
            LogicalOperator::Or => LogicalOperator::And,
            LogicalOperator::AndNot => LogicalOperator::OrNot,
            LogicalOperator::OrNot => LogicalOperator::AndNot,
        }
    }

    /// SQL keyword between two criteria.
    pub fn join_keyword(&self) -> &'static str {
        match self {
            LogicalOperator::And | LogicalOperator::AndNot => "AND",
            LogicalOperator::Or | LogicalOperator::OrNot => "OR",
        }
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, LogicalOperator::AndNot | LogicalOperator::OrNot)
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for LogicalOperator {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(' ', "_").as_str() {
            "AND" => Ok(LogicalOperator::And),
            "OR" => Ok(LogicalOperator::Or),
            "AND_NOT" => Ok(LogicalOperator::AndNot),
            "OR_NOT" => Ok(LogicalOperator::OrNot),
            _ => Err(PredicateError::InvalidOperator(s.to_string())),
        }
    }
}

impl TryFrom<String> for LogicalOperator {
    type Error = PredicateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LogicalOperator> for String {
    fn from(op: LogicalOperator) -> Self {
        op.symbol().to_string()
    }
}

/// A single filter condition on a named column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriterion {
    /// Sheet the criterion applies to; `None` applies to every sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    pub name: String,
    pub operator: ExtractionOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl FilterCriterion {
    pub fn new(name: impl Into<String>, operator: ExtractionOperator) -> Self {
        Self {
            sheet_name: None,
            name: name.into(),
            operator,
            value: None,
            values: Vec::new(),
        }
    }

    pub fn sheet(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet_name.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn values(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    /// No value and no values: the criterion tests for NULL.
    pub fn has_no_value(&self) -> bool {
        self.value.is_none() && self.values.is_empty()
    }

    /// Whether the criterion applies to `sheet_name`.
    ///
    /// Unscoped criteria apply everywhere; scoped ones only to their sheet.
    pub fn applies_to(&self, sheet_name: Option<&str>) -> bool {
        match (&self.sheet_name, sheet_name) {
            (None, _) => true,
            (Some(own), Some(applied)) => own.eq_ignore_ascii_case(applied),
            (Some(_), None) => false,
        }
    }

    /// Operator actually applied, after the NULL collapse and an optional
    /// inversion.
    pub fn effective_operator(&self, inverse: bool) -> ExtractionOperator {
        let op = if inverse {
            self.operator.inverse()
        } else {
            self.operator
        };

        if self.has_no_value() {
            if op.is_negative() {
                ExtractionOperator::NotNull
            } else {
                ExtractionOperator::Null
            }
        } else {
            op
        }
    }

    /// Lower (0) or upper (1) bound of a BETWEEN criterion.
    ///
    /// Fails unless exactly two values are set.
    pub fn between_value(&self, index: usize) -> PredicateResult<&str> {
        if self.values.len() != 2 || index > 1 {
            return Err(PredicateError::MissingValuesForOperator {
                column: self.name.clone(),
                operator: self.operator.symbol().to_string(),
            });
        }
        Ok(self.values[index].as_str())
    }

    /// All values of a multi-valued criterion, falling back to `value`.
    pub fn all_values(&self) -> Vec<&str> {
        if self.values.is_empty() {
            self.value.iter().map(String::as_str).collect()
        } else {
            self.values.iter().map(String::as_str).collect()
        }
    }
}

/// Generic extraction filter sent by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filter {
    pub criteria: Vec<FilterCriterion>,
    pub operator: LogicalOperator,
    /// Sheet the caller wants to read (or preview).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    /// Stop the pipeline as soon as `sheet_name` is materialized.
    pub preview: bool,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn criterion(mut self, criterion: FilterCriterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn operator(mut self, operator: LogicalOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn sheet(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet_name.into());
        self
    }

    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Criteria applying to `sheet_name`.
    pub fn criteria_for<'a>(
        &'a self,
        sheet_name: Option<&'a str>,
    ) -> impl Iterator<Item = &'a FilterCriterion> + 'a {
        self.criteria.iter().filter(move |c| c.applies_to(sheet_name))
    }

    /// Copy with every single quote in values doubled.
    ///
    /// The predicate builder quotes text values without escaping them, so
    /// client filters go through this first.
    pub fn escaped(&self) -> Self {
        let escape = |s: &String| s.replace('\'', "''");
        Self {
            criteria: self
                .criteria
                .iter()
                .map(|c| FilterCriterion {
                    value: c.value.as_ref().map(escape),
                    values: c.values.iter().map(escape).collect(),
                    ..c.clone()
                })
                .collect(),
            ..self.clone()
        }
    }
}
