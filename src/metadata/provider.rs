//! TableMetadataProvider trait definition.
//!
//! The provider abstracts over the ways of introspecting a live schema.
//! The bundled implementation is [`crate::database::SqliteDatabase`];
//! [`crate::cache::CachedMetadataProvider`] memoizes any provider.

use std::sync::Arc;

use super::types::TableMetadata;
use crate::database::PersistenceResult;

/// Trait for reading table metadata.
///
/// Calls are blocking: the extraction pipeline is synchronous and runs on
/// the caller's thread.
///
/// # Example
///
/// ```ignore
/// use sumaris_extraction::metadata::TableMetadataProvider;
///
/// fn columns(provider: &dyn TableMetadataProvider) -> PersistenceResult<Vec<String>> {
///     let table = provider.get_table("EXT_ST_1700000000000")?;
///     Ok(table.column_names())
/// }
/// ```
pub trait TableMetadataProvider: Send + Sync {
    /// Get complete metadata for a table.
    ///
    /// Returns `PersistenceError::TableNotFound` when the table does not exist.
    fn get_table(&self, name: &str) -> PersistenceResult<TableMetadata>;

    /// Whether the table exists in the working schema.
    fn exists(&self, name: &str) -> PersistenceResult<bool>;

    /// Forget anything remembered about the table (dropped, altered, renamed).
    ///
    /// Providers without a cache have nothing to do.
    fn invalidate(&self, _name: &str) {}
}

impl<T: TableMetadataProvider + ?Sized> TableMetadataProvider for Arc<T> {
    fn get_table(&self, name: &str) -> PersistenceResult<TableMetadata> {
        (**self).get_table(name)
    }

    fn exists(&self, name: &str) -> PersistenceResult<bool> {
        (**self).exists(name)
    }

    fn invalidate(&self, name: &str) {
        (**self).invalidate(name)
    }
}
