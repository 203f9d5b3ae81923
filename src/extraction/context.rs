//! Per-run extraction ledger.
//!
//! The context only stores names: which physical table backs which sheet,
//! which columns of a table are hidden or typed by their query, which tables
//! were materialized but came out empty. It is owned by the single call that created it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::criterion::Filter;
use super::format::ExtractionFormat;
use crate::metadata::SqlType;

/// A materialized table exposed as a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetTable {
    pub sheet_name: String,
    pub table_name: String,
    pub distinct: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionContext {
    /// Run identifier, embedded in every table name.
    pub id: i64,
    pub format: ExtractionFormat,
    pub table_name_prefix: String,
    /// Filter the run was started with.
    pub filter: Filter,
    /// Tables planned for each sheet, in pipeline order.
    planned: Vec<(String, String)>,
    /// Registered sheets, in registration order.
    sheets: Vec<SheetTable>,
    hidden_column_names: HashMap<String, BTreeSet<String>>,
    column_types: HashMap<String, BTreeMap<String, SqlType>>,
    raw_table_names: BTreeSet<String>,
}

impl ExtractionContext {
    pub fn new(
        id: i64,
        format: ExtractionFormat,
        table_name_prefix: impl Into<String>,
        filter: Filter,
    ) -> Self {
        Self {
            id,
            format,
            table_name_prefix: table_name_prefix.into(),
            filter,
            planned: Vec::new(),
            sheets: Vec::new(),
            hidden_column_names: HashMap::new(),
            column_types: HashMap::new(),
            raw_table_names: BTreeSet::new(),
        }
    }

    /// Record the physical table a sheet will be materialized into.
    pub fn plan_table_name(&mut self, sheet_name: &str, table_name: impl Into<String>) {
        let table_name = table_name.into();
        match self
            .planned
            .iter_mut()
            .find(|(sheet, _)| sheet.eq_ignore_ascii_case(sheet_name))
        {
            Some(entry) => entry.1 = table_name,
            None => self.planned.push((sheet_name.to_string(), table_name)),
        }
    }

    /// Planned table of a sheet, whether or not it exists yet.
    pub fn planned_table_name(&self, sheet_name: &str) -> Option<&str> {
        self.planned
            .iter()
            .find(|(sheet, _)| sheet.eq_ignore_ascii_case(sheet_name))
            .map(|(_, table)| table.as_str())
    }

    pub fn planned_table_names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.planned
            .iter()
            .map(|(sheet, table)| (sheet.as_str(), table.as_str()))
    }

    /// Expose `table_name` as `sheet_name`.
    pub fn add_table_name(
        &mut self,
        table_name: impl Into<String>,
        sheet_name: impl Into<String>,
        hidden_columns: BTreeSet<String>,
        distinct: bool,
    ) {
        let table_name = table_name.into();
        self.raw_table_names.remove(&table_name);
        if !hidden_columns.is_empty() {
            self.hidden_column_names
                .insert(table_name.clone(), hidden_columns);
        }
        self.sheets.retain(|sheet| sheet.table_name != table_name);
        self.sheets.push(SheetTable {
            sheet_name: sheet_name.into(),
            table_name,
            distinct,
        });
    }

    /// Table materialized but empty: cleaned up later, never exposed.
    pub fn add_raw_table_name(&mut self, table_name: impl Into<String>) {
        self.raw_table_names.insert(table_name.into());
    }

    pub fn sheets(&self) -> &[SheetTable] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.sheet_name.as_str()).collect()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.table_name.as_str()).collect()
    }

    pub fn has_sheet(&self, sheet_name: &str) -> bool {
        self.sheet(sheet_name).is_some()
    }

    pub fn sheet(&self, sheet_name: &str) -> Option<&SheetTable> {
        self.sheets
            .iter()
            .find(|s| s.sheet_name.eq_ignore_ascii_case(sheet_name))
    }

    pub fn table_name_by_sheet(&self, sheet_name: &str) -> Option<&str> {
        self.sheet(sheet_name).map(|s| s.table_name.as_str())
    }

    pub fn sheet_name_by_table(&self, table_name: &str) -> Option<&str> {
        self.sheets
            .iter()
            .find(|s| s.table_name.eq_ignore_ascii_case(table_name))
            .map(|s| s.sheet_name.as_str())
    }

    pub fn hidden_column_names(&self, table_name: &str) -> BTreeSet<String> {
        self.hidden_column_names
            .get(table_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Record the column types declared by the query that built `table_name`.
    pub fn set_column_types(
        &mut self,
        table_name: impl Into<String>,
        column_types: BTreeMap<String, SqlType>,
    ) {
        let table_name = table_name.into();
        if column_types.is_empty() {
            self.column_types.remove(&table_name);
        } else {
            self.column_types.insert(table_name, column_types);
        }
    }

    pub fn column_types(&self, table_name: &str) -> BTreeMap<String, SqlType> {
        self.column_types
            .get(table_name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_distinct(&self, table_name: &str) -> bool {
        self.sheets
            .iter()
            .any(|s| s.table_name == table_name && s.distinct)
    }

    pub fn raw_table_names(&self) -> &BTreeSet<String> {
        &self.raw_table_names
    }

    /// Every table this run may have created: registered, raw and planned.
    pub fn all_table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let candidates = self
            .sheets
            .iter()
            .map(|s| s.table_name.as_str())
            .chain(self.raw_table_names.iter().map(String::as_str))
            .chain(self.planned.iter().map(|(_, table)| table.as_str()));
        for name in candidates {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}
