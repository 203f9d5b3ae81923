//! Physical table naming.
//!
//! Run tables are `{prefix}{SHEET}_{runId}`, product tables are
//! `{productPrefix}{LABEL}_{SHEET}`. Names are pure functions of their
//! inputs so later steps can reference earlier tables before they exist.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static LAST_RUN_ID: AtomicI64 = AtomicI64::new(0);

/// Time-based run id: milliseconds since the epoch, bumped when two runs
/// start within the same millisecond.
pub fn next_run_id() -> i64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default();

    let mut last = LAST_RUN_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_RUN_ID.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// Builds physical table names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNamingStrategy {
    pub table_prefix: String,
    pub product_prefix: String,
}

impl Default for TableNamingStrategy {
    fn default() -> Self {
        Self::new("EXT_", "P_")
    }
}

impl TableNamingStrategy {
    pub fn new(table_prefix: impl Into<String>, product_prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: table_prefix.into().to_uppercase(),
            product_prefix: product_prefix.into().to_uppercase(),
        }
    }

    /// Table of `sheet` for run `run_id`.
    pub fn table_name(&self, sheet: &str, run_id: i64) -> String {
        format!("{}{}_{}", self.table_prefix, sheet.to_uppercase(), run_id)
    }

    /// Table of `sheet` in the product `label`.
    pub fn product_table_name(&self, label: &str, sheet: &str) -> String {
        format!(
            "{}{}_{}",
            self.product_prefix,
            label.to_uppercase(),
            sheet.to_uppercase()
        )
    }

    /// Whether `table` was generated by this strategy for some run.
    pub fn is_run_table(&self, table: &str) -> bool {
        table
            .to_uppercase()
            .strip_prefix(&self.table_prefix)
            .and_then(|rest| rest.rsplit_once('_'))
            .map(|(sheet, id)| !sheet.is_empty() && id.parse::<i64>().is_ok())
            .unwrap_or(false)
    }
}
