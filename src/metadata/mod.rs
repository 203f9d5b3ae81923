//! Table metadata module.
//!
//! Provides the column metadata model and the provider abstraction the
//! extraction engine uses to build predicates, read rows back and drop
//! transient tables.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  CachedMetadataProvider (memo)                  │
//! │  - get_table()  -> cached TableMetadata                         │
//! │  - invalidate() -> on DROP / ALTER / RENAME                     │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              TableMetadataProvider (live schema)                │
//! │              e.g. SqliteDatabase (PRAGMA table_info)            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod provider;
mod types;

pub use provider::TableMetadataProvider;
pub use types::{ColumnMetadata, SqlType, TableMetadata, DEFAULT_TABLE_ALIAS};
