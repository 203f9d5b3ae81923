//! Extraction facade.
//!
//! Wires settings, the database collaborators and the DAOs together, and
//! exposes the operations callers actually need: run, read back, preview,
//! clean and keep as a product.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use super::context::ExtractionContext;
use super::criterion::Filter;
use super::dao::{DaoRuntime, ExtractionDao, ProgramDao, StrategyDao, VesselDao};
use super::error::{ExtractionError, ExtractionResult};
use super::format::ExtractionFormat;
use super::naming::TableNamingStrategy;
use super::product::{self, ExtractionProduct};
use super::template::TemplateRepository;
use crate::cache::CachedMetadataProvider;
use crate::config::{Settings, SettingsError};
use crate::database::QueryExecutor;
use crate::metadata::TableMetadataProvider;
use crate::reader::{Page, ReadOptions, TableRows, TableRowsReader};
use crate::sql::Dialect;

pub struct ExtractionService {
    runtime: Arc<DaoRuntime>,
    daos: Vec<Box<dyn ExtractionDao>>,
}

impl ExtractionService {
    /// Build the service from settings.
    ///
    /// The metadata provider is wrapped in a cache when
    /// `metadata.cache_enabled` is set.
    pub fn new(
        settings: &Settings,
        executor: Arc<dyn QueryExecutor>,
        metadata: Arc<dyn TableMetadataProvider>,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        let dialect = settings.database.dialect()?;

        let mut templates = TemplateRepository::builtin(dialect);
        if let Some(dir) = settings.extraction.template_dir()? {
            templates = templates.with_template_dir(dir);
        }

        let metadata: Arc<dyn TableMetadataProvider> = if settings.metadata.cache_enabled {
            Arc::new(CachedMetadataProvider::new(metadata))
        } else {
            metadata
        };

        let naming = TableNamingStrategy::new(
            settings.extraction.table_name_prefix.as_str(),
            settings.extraction.product_table_prefix.as_str(),
        );
        let runtime = DaoRuntime::new(executor, metadata, Arc::new(templates), naming)
            .with_adagio_schema(settings.extraction.adagio_schema().map(str::to_string));

        Ok(Self::from_runtime(runtime))
    }

    pub fn from_runtime(runtime: DaoRuntime) -> Self {
        let runtime = Arc::new(runtime);
        let daos: Vec<Box<dyn ExtractionDao>> = vec![
            Box::new(ProgramDao::new(runtime.clone())),
            Box::new(StrategyDao::new(runtime.clone())),
            Box::new(VesselDao::new(runtime.clone())),
        ];
        Self { runtime, daos }
    }

    pub fn runtime(&self) -> &DaoRuntime {
        &self.runtime
    }

    pub fn dialect(&self) -> Dialect {
        self.runtime.dialect()
    }

    pub fn formats(&self) -> Vec<ExtractionFormat> {
        self.daos.iter().map(|dao| dao.format()).collect()
    }

    fn dao(&self, format: ExtractionFormat) -> ExtractionResult<&dyn ExtractionDao> {
        self.daos
            .iter()
            .find(|dao| dao.format() == format)
            .map(|dao| dao.as_ref())
            .ok_or_else(|| ExtractionError::UnknownFormat(format.to_string()))
    }

    /// Run an extraction. The caller cleans the returned context.
    pub fn execute(
        &self,
        format: ExtractionFormat,
        filter: &Filter,
    ) -> ExtractionResult<ExtractionContext> {
        if let Some(sheet) = filter.sheet_name.as_deref() {
            check_sheet(format, sheet)?;
        }
        self.dao(format)?.execute(&filter.escaped())
    }

    /// Read one sheet of a run.
    pub fn read_sheet(
        &self,
        context: &ExtractionContext,
        sheet_name: &str,
        page: &Page,
    ) -> ExtractionResult<TableRows> {
        let sheet = context
            .sheet(sheet_name)
            .ok_or_else(|| unknown_sheet(context.format, sheet_name))?;
        let filter = scoped_filter(&context.filter, &sheet.sheet_name);

        let options = ReadOptions {
            filter: Some(&filter),
            sheet_name: Some(&sheet.sheet_name),
            hidden_columns: context.hidden_column_names(&sheet.table_name),
            column_types: context.column_types(&sheet.table_name),
            distinct: sheet.distinct,
            preferred_order: preferred_order(context.format, &sheet.sheet_name),
        };
        self.reader().get_table_rows(&sheet.table_name, &options, page)
    }

    /// Run, read one sheet and drop every table, whatever happens.
    ///
    /// The sheet is the filter's `sheet_name`, or the first sheet of the
    /// format. A sheet the run did not produce reads as empty.
    pub fn preview(
        &self,
        format: ExtractionFormat,
        filter: &Filter,
        page: &Page,
    ) -> ExtractionResult<TableRows> {
        let sheet_name = match filter.sheet_name.as_deref() {
            Some(sheet) => check_sheet(format, sheet)?.name,
            None => format.first_sheet().name,
        };
        let filter = filter.clone().sheet(sheet_name).preview(true);

        let context = self.execute(format, &filter)?;
        let rows = if context.has_sheet(sheet_name) {
            self.read_sheet(&context, sheet_name, page)
        } else {
            debug!(run_id = context.id, sheet = sheet_name, "previewed sheet is empty");
            Ok(TableRows::default())
        };
        self.clean(&context);
        rows
    }

    /// Drop every table of a run.
    pub fn clean(&self, context: &ExtractionContext) {
        match self.dao(context.format) {
            Ok(dao) => dao.clean(context),
            Err(_) => self.runtime.clean(context),
        }
    }

    /// Run an extraction and keep its sheets as product `label`.
    pub fn save_product(
        &self,
        format: ExtractionFormat,
        filter: &Filter,
        label: &str,
    ) -> ExtractionResult<ExtractionProduct> {
        product::validate_label(&self.runtime, format, label)?;
        let context = self.execute(format, filter)?;
        product::save_product(&self.runtime, &context, label)
    }

    /// [`save_product`](Self::save_product) on the blocking thread pool.
    pub fn save_product_async(
        self: &Arc<Self>,
        format: ExtractionFormat,
        filter: Filter,
        label: String,
    ) -> JoinHandle<ExtractionResult<ExtractionProduct>> {
        let service = Arc::clone(self);
        tokio::task::spawn_blocking(move || service.save_product(format, &filter, &label))
    }

    pub fn read_product_sheet(
        &self,
        product: &ExtractionProduct,
        sheet_name: &str,
        page: &Page,
    ) -> ExtractionResult<TableRows> {
        let table = product
            .table(sheet_name)
            .ok_or_else(|| unknown_sheet(product.format, sheet_name))?;

        let options = ReadOptions {
            hidden_columns: table.hidden_columns.clone(),
            column_types: table.column_types.clone(),
            distinct: table.distinct,
            preferred_order: preferred_order(product.format, &table.sheet_name),
            ..ReadOptions::default()
        };
        self.reader().get_table_rows(&table.table_name, &options, page)
    }

    pub fn delete_product(&self, product: &ExtractionProduct) {
        product::delete_product(&self.runtime, product);
    }

    fn reader(&self) -> TableRowsReader<'_> {
        TableRowsReader::new(
            self.runtime.executor(),
            self.runtime.metadata(),
            self.runtime.dialect(),
        )
    }
}

fn unknown_sheet(format: ExtractionFormat, sheet: &str) -> ExtractionError {
    ExtractionError::UnknownSheet {
        format: format.to_string(),
        sheet: sheet.to_string(),
    }
}

fn check_sheet(
    format: ExtractionFormat,
    sheet: &str,
) -> ExtractionResult<&'static super::format::SheetSpec> {
    format.sheet(sheet).ok_or_else(|| unknown_sheet(format, sheet))
}

fn preferred_order(format: ExtractionFormat, sheet: &str) -> &'static [&'static str] {
    format.sheet(sheet).map(|s| s.columns).unwrap_or(&[])
}

/// Criteria explicitly scoped to `sheet`.
///
/// Unscoped criteria were already enforced on every sheet by the run, and
/// may name columns this sheet does not have.
fn scoped_filter(filter: &Filter, sheet: &str) -> Filter {
    Filter {
        criteria: filter
            .criteria
            .iter()
            .filter(|c| {
                c.sheet_name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(sheet))
            })
            .cloned()
            .collect(),
        ..filter.clone()
    }
}
