//! Extraction error types.

use std::io;
use thiserror::Error;

use crate::database::PersistenceError;

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Result type for predicate building.
pub type PredicateResult<T> = Result<T, PredicateError>;

/// Result type for extraction runs.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Errors raised by the XML query template engine.
///
/// All of them are authoring or deployment defects.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// No template resource at the resolved path.
    #[error("query template not found: {0}")]
    NotFound(String),

    /// A placeholder is still present in the enabled SQL text.
    #[error("unbound placeholder ${{{name}}} in query template {query}")]
    UnboundPlaceholder {
        /// Template id.
        query: String,
        /// Placeholder name.
        name: String,
    },

    /// The XML is not a valid query template.
    #[error("malformed query template {query}: {message}")]
    Malformed {
        /// Template id.
        query: String,
        /// Parser message.
        message: String,
    },

    /// Failed to read a template file.
    #[error("failed to read query template: {0}")]
    Io(#[from] io::Error),
}

impl TemplateError {
    pub fn malformed(query: impl Into<String>, message: impl ToString) -> Self {
        Self::Malformed {
            query: query.into(),
            message: message.to_string(),
        }
    }
}

/// Errors raised while translating filter criteria into SQL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredicateError {
    /// The criterion names a column the table does not have.
    #[error("unknown column {column} in table {table}")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Requested column.
        column: String,
    },

    /// IN / NOT IN / BETWEEN / NOT BETWEEN without the values they need.
    #[error("missing values for operator {operator} on column {column}")]
    MissingValuesForOperator {
        /// Column name.
        column: String,
        /// Operator symbol.
        operator: String,
    },

    /// Operator symbol not recognised.
    #[error("invalid filter operator: {0}")]
    InvalidOperator(String),

    /// A numeric or date value that does not parse.
    #[error("invalid value '{value}' for column {column}: expected {expected}")]
    InvalidValue {
        /// Column name.
        column: String,
        /// Offending value.
        value: String,
        /// Expected kind of value.
        expected: &'static str,
    },
}

/// Errors raised by an extraction run.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The first pipeline step produced no rows.
    #[error("no data found for extraction {format}")]
    NoData {
        /// Format label.
        format: String,
    },

    /// Format label not registered.
    #[error("unknown extraction format: {0}")]
    UnknownFormat(String),

    /// Sheet not part of the format, or not produced by the run.
    #[error("unknown sheet {sheet} for extraction {format}")]
    UnknownSheet {
        /// Format label.
        format: String,
        /// Requested sheet.
        sheet: String,
    },

    /// Product label that cannot be used in a table name.
    #[error("invalid product label: {0}")]
    InvalidProductLabel(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Predicate(#[from] PredicateError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ExtractionError {
    pub fn no_data(format: impl ToString) -> Self {
        Self::NoData {
            format: format.to_string(),
        }
    }

    /// Whether the run simply found nothing to extract.
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }

    /// Whether the error comes from the database layer.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}
