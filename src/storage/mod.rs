//! Persistence layer for observed catalog state

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStorage;
pub use traits::{CatalogStore, StorageError, StorageResult, WriteSummary};
