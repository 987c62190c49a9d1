//! Storage trait and error types
//!
//! The persistent store is a capability the crawl engine calls through: load
//! everything at cycle start, write everything changed in one batch at cycle
//! end. Items are keyed by name and never deleted by this system.

use thiserror::Error;

use crate::catalog::CatalogItem;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of a batch write, for reporting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub inserted: usize,
    pub updated: usize,
}

/// Capability contract for the catalog document store.
pub trait CatalogStore {
    /// Loads every known catalog item.
    fn find_all(&self) -> StorageResult<Vec<CatalogItem>>;

    /// Upserts `items` keyed by name in one batch.
    ///
    /// Inserts rows for unknown names and overwrites price/url/stock fields
    /// for known ones. Partial failure is surfaced as an error; the caller
    /// reports it and relies on the next cycle's snapshot read to self-heal.
    fn bulk_upsert_by_name(&mut self, items: &[CatalogItem]) -> StorageResult<WriteSummary>;
}
