//! Extraction orchestrators.
//!
//! Every format runs the same state machine over its sheets:
//!
//! ```text
//! INIT -> step 1 -> step 2 -> ... -> DONE
//!            \         \
//!             +---------+--> FAILED (drop every table of the run, rethrow)
//! ```
//!
//! A step renders its template, materializes the table, counts it, deletes
//! the rows that do not match the generic filter (inverse WHERE clause) and
//! registers the table as a sheet, or as a raw table when nothing is left.
//! An empty first step is [`ExtractionError::NoData`]; an empty later step
//! only skips the steps that read from it.
//!
//! Success does not clean up: callers read the sheets back and then call
//! [`ExtractionDao::clean`], or keep the tables as a product.

mod program;
mod strategy;
mod vessel;

pub use program::ProgramDao;
pub use strategy::StrategyDao;
pub use vessel::VesselDao;

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::context::ExtractionContext;
use super::criterion::Filter;
use super::error::{ExtractionError, ExtractionResult};
use super::format::{ExtractionFormat, SheetSpec};
use super::naming::{next_run_id, TableNamingStrategy};
use super::predicate::WhereClause;
use super::template::{QueryBuilder, TemplateRepository};
use crate::database::QueryExecutor;
use crate::metadata::TableMetadataProvider;
use crate::sql::{Dialect, DropTable, Select, SqlDialect, TableRef};

/// A per-domain orchestrator.
pub trait ExtractionDao: Send + Sync {
    /// Format this DAO produces.
    fn format(&self) -> ExtractionFormat;

    /// Run the pipeline.
    ///
    /// On error, every table of the run has already been dropped.
    fn execute(&self, filter: &Filter) -> ExtractionResult<ExtractionContext>;

    /// Drop every table of the run. Best-effort: failures are logged.
    fn clean(&self, context: &ExtractionContext);
}

/// Collaborators shared by all DAOs.
pub struct DaoRuntime {
    executor: Arc<dyn QueryExecutor>,
    metadata: Arc<dyn TableMetadataProvider>,
    templates: Arc<TemplateRepository>,
    naming: TableNamingStrategy,
    adagio_schema: Option<String>,
}

impl DaoRuntime {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        metadata: Arc<dyn TableMetadataProvider>,
        templates: Arc<TemplateRepository>,
        naming: TableNamingStrategy,
    ) -> Self {
        Self {
            executor,
            metadata,
            templates,
            naming,
            adagio_schema: None,
        }
    }

    /// Enable the `adagio` template group, with tables of `schema`.
    pub fn with_adagio_schema(mut self, schema: Option<String>) -> Self {
        self.adagio_schema = schema;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.templates.dialect()
    }

    pub fn executor(&self) -> &dyn QueryExecutor {
        self.executor.as_ref()
    }

    pub fn metadata(&self) -> &dyn TableMetadataProvider {
        self.metadata.as_ref()
    }

    pub fn templates(&self) -> &TemplateRepository {
        &self.templates
    }

    pub fn naming(&self) -> &TableNamingStrategy {
        &self.naming
    }

    /// Fresh context with a table planned for every sheet of the format.
    pub fn create_context(&self, format: ExtractionFormat, filter: &Filter) -> ExtractionContext {
        let id = next_run_id();
        let mut context =
            ExtractionContext::new(id, format, self.naming.table_prefix.clone(), filter.clone());
        for sheet in format.sheets() {
            context.plan_table_name(sheet.name, self.naming.table_name(sheet.name, id));
        }
        context
    }

    /// Run every step of `format`; `configure` binds the domain filter.
    pub fn run<F>(
        &self,
        format: ExtractionFormat,
        filter: &Filter,
        configure: F,
    ) -> ExtractionResult<ExtractionContext>
    where
        F: Fn(&mut QueryBuilder),
    {
        let mut context = self.create_context(format, filter);
        info!(run_id = context.id, format = %format, "starting extraction");

        match self.run_steps(&mut context, &configure) {
            Ok(()) => {
                info!(
                    run_id = context.id,
                    sheets = ?context.sheet_names(),
                    "extraction done"
                );
                Ok(context)
            }
            Err(err) => {
                if err.is_no_data() {
                    info!(run_id = context.id, format = %format, "no data to extract");
                } else {
                    warn!(run_id = context.id, error = %err, "extraction failed, dropping run tables");
                }
                self.clean(&context);
                Err(err)
            }
        }
    }

    fn run_steps<F>(&self, context: &mut ExtractionContext, configure: &F) -> ExtractionResult<()>
    where
        F: Fn(&mut QueryBuilder),
    {
        let format = context.format;

        for (index, sheet) in format.sheets().iter().enumerate() {
            if let Some(upstream) = sheet.depends_on {
                if !context.has_sheet(upstream) {
                    debug!(
                        run_id = context.id,
                        sheet = sheet.name,
                        upstream,
                        "skipping step, upstream sheet is empty"
                    );
                    continue;
                }
            }

            let mut query = self.render_step(context, sheet)?;
            configure(&mut query);

            let rows = self.execute_step(context, sheet, &query)?;
            if rows == 0 && index == 0 {
                return Err(ExtractionError::no_data(format));
            }

            if context.filter.preview
                && context
                    .filter
                    .sheet_name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(sheet.name))
                && context.has_sheet(sheet.name)
            {
                debug!(run_id = context.id, sheet = sheet.name, "preview sheet ready");
                return Ok(());
            }
        }

        Ok(())
    }

    /// Template of `sheet`, bound to the tables of the run.
    pub fn render_step(
        &self,
        context: &ExtractionContext,
        sheet: &SheetSpec,
    ) -> ExtractionResult<QueryBuilder> {
        let mut query = self.templates.render(&context.format.template_id(sheet))?;
        self.prepare(&mut query, context, sheet);
        Ok(query)
    }

    /// Groups and bindings every template of the run shares.
    fn prepare(&self, query: &mut QueryBuilder, context: &ExtractionContext, sheet: &SheetSpec) {
        query.set_group(self.dialect().name(), true);

        match self.adagio_schema.as_deref().filter(|s| !s.is_empty()) {
            Some(schema) => {
                query
                    .set_group("adagio", true)
                    .bind("adagioSchemaPrefix", format!("{schema}."));
            }
            None => {
                query.bind("adagioSchemaPrefix", "");
            }
        }

        for other in context.format.sheets() {
            if let Some(table) = context.planned_table_name(other.name) {
                query.bind(other.table_placeholder, table);
            }
        }
        if let Some(table) = context.planned_table_name(sheet.name) {
            query.bind("tableName", table);
        }
    }

    /// Materialize one sheet; returns the rows left after cleanup.
    fn execute_step(
        &self,
        context: &mut ExtractionContext,
        sheet: &SheetSpec,
        query: &QueryBuilder,
    ) -> ExtractionResult<i64> {
        let table_name = context
            .planned_table_name(sheet.name)
            .map(str::to_string)
            .ok_or_else(|| ExtractionError::UnknownSheet {
                format: context.format.to_string(),
                sheet: sheet.name.to_string(),
            })?;

        let sql = query.to_sql()?;
        debug!(run_id = context.id, sheet = sheet.name, sql = %sql, "materializing sheet");
        self.executor.execute_update(&sql)?;
        self.metadata.invalidate(&table_name);
        context.set_column_types(table_name.as_str(), query.column_types());

        let count_sql = Select::from(TableRef::new(&table_name))
            .count()
            .to_sql(self.dialect());
        let mut rows = self.executor.execute_count(&count_sql)?;
        debug!(run_id = context.id, table = %table_name, rows, "sheet materialized");

        if rows > 0 {
            let deleted = self.delete_unmatched_rows(context, &table_name, sheet.name)?;
            rows -= deleted as i64;
        }

        if rows > 0 {
            context.add_table_name(
                table_name.as_str(),
                sheet.name,
                query.hidden_column_names(),
                query.has_distinct_option(),
            );
            info!(run_id = context.id, sheet = sheet.name, table = %table_name, rows, "sheet registered");
        } else {
            debug!(run_id = context.id, sheet = sheet.name, table = %table_name, "sheet is empty");
            context.add_raw_table_name(table_name);
        }

        Ok(rows)
    }

    /// Re-apply the generic filter: delete the rows its inverse selects.
    fn delete_unmatched_rows(
        &self,
        context: &ExtractionContext,
        table_name: &str,
        sheet_name: &str,
    ) -> ExtractionResult<u64> {
        let filter = &context.filter;
        if filter.is_empty() {
            return Ok(0);
        }

        let table = self
            .metadata
            .get_table(table_name)?
            .with_column_types(&context.column_types(table_name));
        let clause = WhereClause::new(self.dialect(), &table, filter)
            .sheet(Some(sheet_name))
            .skip_invalid(true)
            .inverse(true)
            .build()?;
        if clause.is_empty() {
            return Ok(0);
        }

        let sql = table.delete_query(self.dialect(), &clause);
        let deleted = self.executor.execute_update(&sql)?;
        debug!(table = %table_name, deleted, sql = %sql, "deleted rows not matching filter");
        Ok(deleted)
    }

    /// Drop every table the run may have created.
    ///
    /// Only names following the run naming scheme are dropped.
    pub fn clean(&self, context: &ExtractionContext) {
        let tables = context.all_table_names();
        debug!(run_id = context.id, tables = ?tables, "cleaning extraction tables");
        for table in &tables {
            if !self.naming.is_run_table(table) {
                warn!(run_id = context.id, table = %table, "not an extraction table, keeping it");
                continue;
            }
            self.drop_table(table);
        }
    }

    /// Drop a table if it exists; never fails.
    pub fn drop_table(&self, table: &str) -> bool {
        match self.metadata.exists(table) {
            Ok(false) => {
                self.metadata.invalidate(table);
                return false;
            }
            Ok(true) => {}
            Err(err) => warn!(table = %table, error = %err, "cannot check table, dropping anyway"),
        }

        let sql = DropTable::new(table).if_exists().to_sql(self.dialect());
        let dropped = match self.executor.execute_update(&sql) {
            Ok(_) => {
                debug!(table = %table, "dropped table");
                true
            }
            Err(err) => {
                warn!(table = %table, error = %err, "failed to drop table");
                false
            }
        };
        self.metadata.invalidate(table);
        dropped
    }
}
