use std::sync::Arc;

use super::{DaoRuntime, ExtractionDao};
use crate::extraction::context::ExtractionContext;
use crate::extraction::criterion::Filter;
use crate::extraction::error::ExtractionResult;
use crate::extraction::filter::DomainFilter;
use crate::extraction::format::ExtractionFormat;

/// PROGRAM format: PR, then ST from PR, then SM from ST.
pub struct ProgramDao {
    runtime: Arc<DaoRuntime>,
}

impl ProgramDao {
    pub fn new(runtime: Arc<DaoRuntime>) -> Self {
        Self { runtime }
    }
}

impl ExtractionDao for ProgramDao {
    fn format(&self) -> ExtractionFormat {
        ExtractionFormat::Program
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
