//! Extraction products: run tables kept under a stable name.
//!
//! Saving a run turns every sheet table `EXT_{SHEET}_{runId}` into
//! `P_{LABEL}_{SHEET}`, with its hidden columns physically dropped. Raw
//! tables are dropped. An existing product with the same label is replaced.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use super::context::ExtractionContext;
use super::dao::DaoRuntime;
use super::error::{ExtractionError, ExtractionResult};
use super::format::ExtractionFormat;
use crate::metadata::SqlType;
use crate::sql::{AlterTable, SqlDialect};

static PRODUCT_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid product label regex"));

/// A sheet of a saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTable {
    pub sheet_name: String,
    pub table_name: String,
    pub distinct: bool,
    /// Hidden columns the dialect could not drop.
    pub hidden_columns: BTreeSet<String>,
    /// Column types declared by the query that built the table.
    pub column_types: BTreeMap<String, SqlType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionProduct {
    pub label: String,
    pub format: ExtractionFormat,
    /// Run the tables come from.
    pub run_id: i64,
    pub tables: Vec<ProductTable>,
}

impl ExtractionProduct {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.sheet_name.as_str()).collect()
    }

    pub fn table(&self, sheet_name: &str) -> Option<&ProductTable> {
        self.tables
            .iter()
            .find(|t| t.sheet_name.eq_ignore_ascii_case(sheet_name))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.table_name.as_str()).collect()
    }
}

/// Normalize a product label, checking every table name it yields.
pub fn validate_label(
    runtime: &DaoRuntime,
    format: ExtractionFormat,
    label: &str,
) -> ExtractionResult<String> {
    let label = label.trim().to_uppercase();
    if !PRODUCT_LABEL.is_match(&label) {
        return Err(ExtractionError::InvalidProductLabel(label));
    }

    let max_length = runtime.dialect().max_identifier_length();
    for sheet in format.sheets() {
        let table = runtime.naming().product_table_name(&label, sheet.name);
        if table.len() > max_length {
            return Err(ExtractionError::InvalidProductLabel(format!(
                "{label} (table {table} exceeds {max_length} characters)"
            )));
        }
    }
    Ok(label)
}

/// Turn the tables of a finished run into a product.
///
/// On failure, the run tables and the product tables created so far are
/// dropped.
pub fn save_product(
    runtime: &DaoRuntime,
    context: &ExtractionContext,
    label: &str,
) -> ExtractionResult<ExtractionProduct> {
    let label = match validate_label(runtime, context.format, label) {
        Ok(label) => label,
        Err(err) => {
            runtime.clean(context);
            return Err(err);
        }
    };

    let mut product = ExtractionProduct {
        label,
        format: context.format,
        run_id: context.id,
        tables: Vec::new(),
    };

    match move_tables(runtime, context, &mut product) {
        Ok(()) => {
            for raw in context.raw_table_names() {
                runtime.drop_table(raw);
            }
            info!(
                run_id = context.id,
                label = %product.label,
                tables = ?product.table_names(),
                "extraction product saved"
            );
            Ok(product)
        }
        Err(err) => {
            warn!(run_id = context.id, label = %product.label, error = %err, "failed to save product");
            runtime.clean(context);
            delete_product(runtime, &product);
            Err(err)
        }
    }
}

fn move_tables(
    runtime: &DaoRuntime,
    context: &ExtractionContext,
    product: &mut ExtractionProduct,
) -> ExtractionResult<()> {
    let dialect = runtime.dialect();

    // Every sheet of a previous product with this label, produced or not.
    for sheet in product.format.sheets() {
        runtime.drop_table(&runtime.naming().product_table_name(&product.label, sheet.name));
    }

    for sheet in context.sheets() {
        let target = runtime
            .naming()
            .product_table_name(&product.label, &sheet.sheet_name);

        let hidden = context.hidden_column_names(&sheet.table_name);
        let statements = AlterTable::new(&sheet.table_name)
            .drop_columns(hidden.iter().cloned())
            .rename_to(&target)
            .to_statements(dialect);
        for sql in &statements {
            runtime.executor().execute_update(sql)?;
        }
        runtime.metadata().invalidate(&sheet.table_name);
        runtime.metadata().invalidate(&target);

        product.tables.push(ProductTable {
            sheet_name: sheet.sheet_name.clone(),
            table_name: target,
            distinct: sheet.distinct,
            column_types: context.column_types(&sheet.table_name),
            hidden_columns: if dialect.supports_drop_column() {
                BTreeSet::new()
            } else {
                hidden
            },
        });
    }
    Ok(())
}

/// Drop every table of a product. Best-effort.
pub fn delete_product(runtime: &DaoRuntime, product: &ExtractionProduct) {
    for table in &product.tables {
        runtime.drop_table(&table.table_name);
    }
    info!(label = %product.label, "extraction product deleted");
}
