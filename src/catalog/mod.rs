//! Catalog data model
//!
//! Types shared between extraction, diffing, and persistence:
//! - `ListingRecord`: one listing as extracted from a rendered page
//! - `CatalogItem`: one persisted catalog entry, keyed by name
//! - `AlertEvent`: a change worth telling someone about

mod diff;

pub use diff::{CycleOutcome, DiffEngine};

use chrono::{DateTime, Utc};

/// A single listing extracted from a catalog page.
///
/// Produced fresh per element on each parse and never mutated afterwards;
/// the next cycle's extraction supersedes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    /// Trimmed listing name. Natural key across the catalog.
    pub name: String,

    /// Parsed price. NaN when the price text was not numeric.
    pub price: f64,

    /// False iff the listing carried an out-of-stock tag.
    pub in_stock: bool,

    /// Absolute listing URL, or empty when no href was present.
    pub url: String,
}

/// A persisted catalog entry.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    /// Unique key across the whole catalog; the store enforces uniqueness.
    pub name: String,

    /// Last observed price. NaN when the last parse was not numeric.
    pub price: f64,

    /// Last persisted stock flag. Only ever flips false -> true here;
    /// stock-down transitions are not written back.
    pub in_stock: bool,

    /// Canonical listing URL.
    pub url: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogItem {
    /// Builds a new item from a freshly extracted record.
    pub fn from_record(record: &ListingRecord, now: DateTime<Utc>) -> Self {
        Self {
            name: record.name.clone(),
            price: record.price,
            in_stock: record.in_stock,
            url: record.url.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The kind of change that produces a user-facing alert.
///
/// Alerting is restock-only on the stock axis: in-stock -> out-of-stock is
/// silent. Field updates (price, url) never alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// An out-of-stock item came back in stock.
    Restock,

    /// A name never seen before appeared in the catalog.
    NewItem,
}

/// An (item, change kind) pair destined for notification.
///
/// Accumulated per cycle in discovery order; the order only matters for
/// notification sequencing.
#[derive(Debug, Clone)]
pub struct AlertEvent {
    pub item: CatalogItem,
    pub kind: ChangeKind,
}
