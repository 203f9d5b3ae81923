//! Memoizing metadata cache.
//!
//! Wraps any [`TableMetadataProvider`] and remembers table metadata by name,
//! so the predicate builder and the row reader do not introspect the same
//! table twice within a run.
//!
//! # Design
//!
//! - Explicit wrapper, keyed by upper-cased table name
//! - No TTL - entries live until [`TableMetadataProvider::invalidate`] or
//!   [`CachedMetadataProvider::clear`]
//! - The extraction engine invalidates every table it drops, alters or renames

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::trace;

use crate::database::PersistenceResult;
use crate::metadata::{TableMetadata, TableMetadataProvider};

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entry_count: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Memoizing [`TableMetadataProvider`].
pub struct CachedMetadataProvider<P> {
    inner: P,
    entries: DashMap<String, TableMetadata>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<P: TableMetadataProvider> CachedMetadataProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn key(name: &str) -> String {
        name.to_uppercase()
    }
}

impl<P: TableMetadataProvider> TableMetadataProvider for CachedMetadataProvider<P> {
    fn get_table(&self, name: &str) -> PersistenceResult<TableMetadata> {
        let key = Self::key(name);
        if let Some(entry) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(entry.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let table = self.inner.get_table(name)?;
        trace!(table = %name, columns = table.columns.len(), "caching table metadata");
        self.entries.insert(key, table.clone());
        Ok(table)
    }

    fn exists(&self, name: &str) -> PersistenceResult<bool> {
        if self.entries.contains_key(&Self::key(name)) {
            return Ok(true);
        }
        self.inner.exists(name)
    }

    fn invalidate(&self, name: &str) {
        self.entries.remove(&Self::key(name));
        self.inner.invalidate(name);
    }
}
