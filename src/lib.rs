//! # SUMARiS extraction
//!
//! Dynamic SQL extraction engine: materializes filtered data extractions as
//! transient database tables, reads them back, and keeps them as products.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 ExtractionService (facade)               │
//! │        execute / read_sheet / preview / save_product     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [dao]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Program / Strategy / Vessel DAOs over a DaoRuntime     │
//! │   XML templates ──► CREATE TABLE AS ──► inverse DELETE   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [database, metadata]
//! ┌─────────────────────────────────────────────────────────┐
//! │   QueryExecutor + TableMetadataProvider (SQLite bundled) │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [reader]
//! ┌─────────────────────────────────────────────────────────┐
//! │      TableRows { columns, total, rows } per sheet        │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod database;
pub mod extraction;
pub mod metadata;
pub mod reader;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::database::{QueryExecutor, SqliteDatabase};
    pub use crate::extraction::{
        ExtractionContext, ExtractionError, ExtractionFormat, ExtractionOperator,
        ExtractionProduct, ExtractionResult, ExtractionService, Filter, FilterCriterion,
        LogicalOperator,
    };
    pub use crate::metadata::{ColumnMetadata, TableMetadata, TableMetadataProvider};
    pub use crate::reader::{Page, TableRows};
    pub use crate::sql::{Dialect, SqlDialect};
}

pub use extraction::ExtractionService;
pub use sql::Dialect;
