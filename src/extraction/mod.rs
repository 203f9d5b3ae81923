//! Dynamic SQL extraction engine.
//!
//! An extraction run materializes one table per sheet of a format, each one
//! built by an XML query template and trimmed by the generic filter:
//!
//! ```text
//! Filter ──► DomainFilter ──► template groups/bindings
//!    │                              │
//!    │                              ▼
//!    │                     CREATE TABLE EXT_PR_<run> AS SELECT ...
//!    │                              │
//!    └──► WhereClause (inverse) ──► DELETE FROM EXT_PR_<run> WHERE ...
//!                                   │
//!                                   ▼
//!                          ExtractionContext (sheets, hidden, raw)
//! ```
//!
//! [`ExtractionService`] is the entry point; the pieces are usable on their
//! own.

pub mod context;
pub mod criterion;
pub mod dao;
mod error;
pub mod filter;
pub mod format;
pub mod naming;
pub mod predicate;
pub mod product;
pub mod service;
pub mod template;

pub use context::{ExtractionContext, SheetTable};
pub use criterion::{ExtractionOperator, Filter, FilterCriterion, LogicalOperator};
pub use dao::{DaoRuntime, ExtractionDao, ProgramDao, StrategyDao, VesselDao};
pub use error::{
    ExtractionError, ExtractionResult, PredicateError, PredicateResult, TemplateError,
    TemplateResult,
};
pub use filter::{DomainFilter, ProgramFilter, VesselFilter};
pub use format::{ExtractionFormat, SheetSpec};
pub use naming::TableNamingStrategy;
pub use predicate::WhereClause;
pub use product::{ExtractionProduct, ProductTable};
pub use service::ExtractionService;
pub use template::{QueryBuilder, QueryTemplate, TemplateRepository};
