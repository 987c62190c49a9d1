//! SQLite implementation of the catalog store
//!
//! A nullable REAL price column represents a non-numeric observation: NaN is
//! written as NULL and read back as NaN.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::catalog::CatalogItem;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CatalogStore, StorageResult, WriteSummary};

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`.
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl CatalogStore for SqliteStorage {
    fn find_all(&self) -> StorageResult<Vec<CatalogItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, price, in_stock, url, created_at, updated_at FROM items ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CatalogItem {
                name: row.get(0)?,
                price: row.get::<_, Option<f64>>(1)?.unwrap_or(f64::NAN),
                in_stock: row.get(2)?,
                url: row.get(3)?,
                created_at: parse_timestamp(row.get::<_, String>(4)?, 4)?,
                updated_at: parse_timestamp(row.get::<_, String>(5)?, 5)?,
            })
        })?;

        let mut items = Vec::new();
        for item in rows {
            items.push(item?);
        }
        Ok(items)
    }

    fn bulk_upsert_by_name(&mut self, items: &[CatalogItem]) -> StorageResult<WriteSummary> {
        let tx = self.conn.transaction()?;
        let mut summary = WriteSummary::default();

        for item in items {
            let exists: Option<i64> = tx
                .query_row(
                    "SELECT id FROM items WHERE name = ?1",
                    params![item.name],
                    |row| row.get(0),
                )
                .optional()?;

            let price = if item.price.is_nan() {
                None
            } else {
                Some(item.price)
            };

            tx.execute(
                "INSERT INTO items (name, price, in_stock, url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(name) DO UPDATE SET
                     price = excluded.price,
                     in_stock = excluded.in_stock,
                     url = excluded.url,
                     updated_at = excluded.updated_at",
                params![
                    item.name,
                    price,
                    item.in_stock,
                    item.url,
                    item.created_at.to_rfc3339(),
                    item.updated_at.to_rfc3339(),
                ],
            )?;

            if exists.is_some() {
                summary.updated += 1;
            } else {
                summary.inserted += 1;
            }
        }

        tx.commit()?;
        Ok(summary)
    }
}

fn parse_timestamp(raw: String, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}
