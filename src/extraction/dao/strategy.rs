use std::sync::Arc;

use super::{DaoRuntime, ExtractionDao};
use crate::extraction::context::ExtractionContext;
use crate::extraction::criterion::Filter;
use crate::extraction::error::ExtractionResult;
use crate::extraction::filter::DomainFilter;
use crate::extraction::format::ExtractionFormat;

/// STRAT format: strategies read straight from the data tables, then SM.
pub struct StrategyDao {
    runtime: Arc<DaoRuntime>,
}

impl StrategyDao {
    pub fn new(runtime: Arc<DaoRuntime>) -> Self {
        Self { runtime }
    }
}

impl ExtractionDao for StrategyDao {
    fn format(&self) -> ExtractionFormat {
        ExtractionFormat::Strat
    }

    fn execute(&self, filter: &Filter) -> ExtractionResult<ExtractionContext> {
        let domain = DomainFilter::translate(self.format(), filter)?;
        self.runtime
            .run(self.format(), filter, |query| domain.apply(query))
    }

    fn clean(&self, context: &ExtractionContext) {
        self.runtime.clean(context);
    }
}
