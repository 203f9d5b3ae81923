//! Metadata types for the table metadata provider.
//!
//! These are Rust-native snapshots of live schema introspection: a column
//! list per table, typed with the JDBC type codes the rest of the platform
//! already speaks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sql::{Delete, Dialect, Select, TableRef};

/// Alias used for every table read or filtered by the engine.
pub const DEFAULT_TABLE_ALIAS: &str = "T";

/// SQL column type, numbered like `java.sql.Types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    Varchar,
    LongVarchar,
    Date,
    Time,
    Timestamp,
    TimestampWithTimezone,
    Boolean,
    Blob,
    Clob,
    Other,
}

impl SqlType {
    /// JDBC type code.
    pub fn code(&self) -> i32 {
        match self {
            SqlType::Bit => -7,
            SqlType::TinyInt => -6,
            SqlType::SmallInt => 5,
            SqlType::Integer => 4,
            SqlType::BigInt => -5,
            SqlType::Float => 6,
            SqlType::Real => 7,
            SqlType::Double => 8,
            SqlType::Numeric => 2,
            SqlType::Decimal => 3,
            SqlType::Char => 1,
            SqlType::Varchar => 12,
            SqlType::LongVarchar => -1,
            SqlType::Date => 91,
            SqlType::Time => 92,
            SqlType::Timestamp => 93,
            SqlType::TimestampWithTimezone => 2014,
            SqlType::Boolean => 16,
            SqlType::Blob => 2004,
            SqlType::Clob => 2005,
            SqlType::Other => 1111,
        }
    }

    /// Resolve a JDBC type code. Unknown codes map to `Other`.
    pub fn from_code(code: i32) -> Self {
        match code {
            -7 => SqlType::Bit,
            -6 => SqlType::TinyInt,
            5 => SqlType::SmallInt,
            4 => SqlType::Integer,
            -5 => SqlType::BigInt,
            6 => SqlType::Float,
            7 => SqlType::Real,
            8 => SqlType::Double,
            2 => SqlType::Numeric,
            3 => SqlType::Decimal,
            1 => SqlType::Char,
            12 => SqlType::Varchar,
            -1 => SqlType::LongVarchar,
            91 => SqlType::Date,
            92 => SqlType::Time,
            93 => SqlType::Timestamp,
            2014 => SqlType::TimestampWithTimezone,
            16 => SqlType::Boolean,
            2004 => SqlType::Blob,
            2005 => SqlType::Clob,
            _ => SqlType::Other,
        }
    }

    /// Resolve a declared type name (`VARCHAR2(40)`, `NUMBER(10)`,
    /// `TIMESTAMP`, SQLite affinities `INT`/`NUM`/`REAL`/`TEXT`...).
    pub fn from_type_name(type_name: &str) -> Self {
        let upper = type_name.trim().to_uppercase();
        let base = upper.split('(').next().unwrap_or("").trim();

        match base {
            "" => SqlType::Other,
            "BIT" => SqlType::Bit,
            "TINYINT" => SqlType::TinyInt,
            "SMALLINT" => SqlType::SmallInt,
            "BIGINT" | "INT8" => SqlType::BigInt,
            "REAL" => SqlType::Real,
            "FLOAT" => SqlType::Float,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => SqlType::Double,
            "NUMBER" | "NUMERIC" | "NUM" => SqlType::Numeric,
            "DECIMAL" => SqlType::Decimal,
            "CHAR" | "CHARACTER" | "NCHAR" => SqlType::Char,
            "DATE" => SqlType::Date,
            "TIME" => SqlType::Time,
            "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => SqlType::TimestampWithTimezone,
            "TIMESTAMP" | "DATETIME" => SqlType::Timestamp,
            "BOOLEAN" | "BOOL" => SqlType::Boolean,
            "BLOB" | "BYTEA" => SqlType::Blob,
            "CLOB" | "NCLOB" => SqlType::Clob,
            "TEXT" | "LONGVARCHAR" => SqlType::LongVarchar,
            other if other.contains("INT") => SqlType::Integer,
            other if other.contains("CHAR") => SqlType::Varchar,
            other if other.starts_with("TIMESTAMP") => SqlType::Timestamp,
            _ => SqlType::Other,
        }
    }

    /// Numeric columns take bare literals.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SqlType::Bit
                | SqlType::TinyInt
                | SqlType::SmallInt
                | SqlType::Integer
                | SqlType::BigInt
                | SqlType::Float
                | SqlType::Real
                | SqlType::Double
                | SqlType::Numeric
                | SqlType::Decimal
        )
    }

    /// Date and timestamp columns take dialect date literals.
    pub fn is_date(&self) -> bool {
        matches!(
            self,
            SqlType::Date | SqlType::Timestamp | SqlType::TimestampWithTimezone
        )
    }

    /// Everything else is compared as quoted text.
    pub fn is_text(&self) -> bool {
        !self.is_numeric() && !self.is_date()
    }
}

/// Metadata of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name as stored by the database.
    pub name: String,
    /// JDBC type code (see [`SqlType::code`]).
    pub sql_type_code: i32,
    /// Database-specific type name.
    pub type_name: String,
    /// Whether NULL values are allowed.
    pub nullable: bool,
    /// Column comment, when the database keeps one.
    pub description: Option<String>,
    /// Default value expression.
    pub default_value: Option<String>,
}

impl ColumnMetadata {
    /// Column typed from its declared type name.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, nullable: bool) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            sql_type_code: SqlType::from_type_name(&type_name).code(),
            type_name,
            nullable,
            description: None,
            default_value: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default_value(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Retype the column; the declared type name is kept.
    pub fn with_sql_type(mut self, sql_type: SqlType) -> Self {
        self.sql_type_code = sql_type.code();
        self
    }

    pub fn sql_type(&self) -> SqlType {
        SqlType::from_code(self.sql_type_code)
    }
}

/// Metadata snapshot of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table name.
    pub name: String,
    /// Alias used when the table is read or filtered.
    pub alias: String,
    /// Columns in their natural (ordinal) order.
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnMetadata>) -> Self {
        Self {
            name: name.into(),
            alias: DEFAULT_TABLE_ALIAS.to_string(),
            columns,
        }
    }

    /// Find a column by name, ignoring case.
    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Override column types by name, ignoring case.
    ///
    /// Computed columns of a `CREATE TABLE AS SELECT` may come back untyped
    /// (SQLite reports `""` for an aggregate), while the query that built the
    /// table knows what they hold.
    pub fn with_column_types(mut self, types: &BTreeMap<String, SqlType>) -> Self {
        if types.is_empty() {
            return self;
        }
        self.columns = self
            .columns
            .into_iter()
            .map(|column| {
                match types
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(&column.name))
                {
                    Some((_, ty)) => column.with_sql_type(*ty),
                    None => column,
                }
            })
            .collect();
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// `SELECT <all columns> FROM <table> <alias>` builder.
    pub fn select_all(&self) -> Select {
        Select::from(TableRef::new(&self.name).with_alias(&self.alias)).columns(self.column_names())
    }

    pub fn select_all_query(&self, dialect: Dialect) -> String {
        self.select_all().to_sql(dialect)
    }

    pub fn count_all_query(&self, dialect: Dialect) -> String {
        self.select_all().count().to_sql(dialect)
    }

    /// DELETE with a WHERE fragment written without table alias.
    pub fn delete_query(&self, dialect: Dialect, where_clause: &str) -> String {
        Delete::from(&self.name).filter(where_clause).to_sql(dialect)
    }
}
