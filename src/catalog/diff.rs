//! Diff engine: classifies extracted listings against known state
//!
//! Each observed record is compared against an in-memory snapshot of the
//! persisted catalog, loaded once at cycle start. Classification produces at
//! most one alert per record plus a set of pending persistence writes that
//! are flushed as a single batch at cycle end.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::catalog::{AlertEvent, CatalogItem, ChangeKind, ListingRecord};

/// Everything a cycle accumulated: items to persist and alerts to dispatch.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// Items that need an insert or update, in first-changed order.
    pub changed: Vec<CatalogItem>,

    /// Alerts in discovery order.
    pub alerts: Vec<AlertEvent>,
}

/// Classifies listing records against a snapshot of known catalog state.
///
/// The snapshot is read once at construction and mutated in memory as records
/// are observed; it is never re-read mid-cycle, so every classification
/// reflects state as of cycle start plus earlier observations in the same
/// cycle.
pub struct DiffEngine {
    snapshot: HashMap<String, CatalogItem>,
    changed_order: Vec<String>,
    changed: HashSet<String>,
    alerts: Vec<AlertEvent>,
}

impl DiffEngine {
    /// Builds the engine from the items currently in the store.
    pub fn new(known: Vec<CatalogItem>) -> Self {
        let snapshot = known
            .into_iter()
            .map(|item| (item.name.clone(), item))
            .collect();

        Self {
            snapshot,
            changed_order: Vec::new(),
            changed: HashSet::new(),
            alerts: Vec::new(),
        }
    }

    /// Classifies one extracted record.
    ///
    /// - Unknown name: new item, NewItem alert, pending insert.
    /// - Known and out of stock, record in stock: flip the flag, Restock
    ///   alert, pending update. The reverse transition is silent and not
    ///   written back.
    /// - Price or url differs: overwrite, pending update, no alert.
    /// - Exact match: no-op.
    pub fn observe(&mut self, record: &ListingRecord) {
        let (alert, dirty) = match self.snapshot.entry(record.name.clone()) {
            Entry::Vacant(entry) => {
                let item = CatalogItem::from_record(record, Utc::now());
                tracing::info!("New listing: {}", item.name);
                let alert = AlertEvent {
                    item: item.clone(),
                    kind: ChangeKind::NewItem,
                };
                entry.insert(item);
                (Some(alert), true)
            }
            Entry::Occupied(mut entry) => {
                let item = entry.get_mut();
                let mut alert = None;
                let mut dirty = false;

                if !item.in_stock && record.in_stock {
                    item.in_stock = true;
                    dirty = true;
                    tracing::info!("Restock detected: {}", item.name);
                    alert = Some(AlertEvent {
                        item: item.clone(),
                        kind: ChangeKind::Restock,
                    });
                }

                if !prices_equal(item.price, record.price) {
                    tracing::debug!("Updated price for {}", item.name);
                    item.price = record.price;
                    dirty = true;
                }

                if item.url != record.url {
                    tracing::debug!("Updated url for {}", item.name);
                    item.url = record.url.clone();
                    dirty = true;
                }

                if dirty {
                    item.updated_at = Utc::now();
                }

                (alert, dirty)
            }
        };

        if let Some(alert) = alert {
            self.alerts.push(alert);
        }
        if dirty {
            self.mark_changed(&record.name);
        }
    }

    /// Consumes the engine, yielding the pending writes and alerts.
    pub fn into_outcome(self) -> CycleOutcome {
        let DiffEngine {
            snapshot,
            changed_order,
            changed: _,
            alerts,
        } = self;

        let changed = changed_order
            .iter()
            .filter_map(|name| snapshot.get(name).cloned())
            .collect();

        CycleOutcome { changed, alerts }
    }

    fn mark_changed(&mut self, name: &str) {
        if self.changed.insert(name.to_string()) {
            self.changed_order.push(name.to_string());
        }
    }
}

/// Price equality where NaN == NaN.
///
/// A malformed price parses to NaN and is kept as-is; treating two NaNs as
/// equal keeps repeated polling of a malformed listing from producing a
/// write every cycle.
fn prices_equal(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, price: f64, in_stock: bool, url: &str) -> ListingRecord {
        ListingRecord {
            name: name.to_string(),
            price,
            in_stock,
            url: url.to_string(),
        }
    }

    fn stored(name: &str, price: f64, in_stock: bool, url: &str) -> CatalogItem {
        CatalogItem::from_record(&record(name, price, in_stock, url), Utc::now())
    }

    #[test]
    fn test_new_item_alerts_and_inserts() {
        let mut engine = DiffEngine::new(vec![]);
        engine.observe(&record("Labubu A", 12.99, true, "https://x/a"));

        let outcome = engine.into_outcome();
        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.alerts[0].kind, ChangeKind::NewItem);
        assert_eq!(outcome.alerts[0].item.name, "Labubu A");
        assert_eq!(outcome.changed.len(), 1);
    }

    #[test]
    fn test_restock_alerts_and_flips_flag() {
        let mut engine = DiffEngine::new(vec![stored("Labubu A", 12.99, false, "https://x/a")]);
        engine.observe(&record("Labubu A", 12.99, true, "https://x/a"));

        let outcome = engine.into_outcome();
        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.alerts[0].kind, ChangeKind::Restock);
        assert!(outcome.changed[0].in_stock);
    }

    #[test]
    fn test_stock_down_is_silent_and_unwritten() {
        let mut engine = DiffEngine::new(vec![stored("Labubu A", 12.99, true, "https://x/a")]);
        engine.observe(&record("Labubu A", 12.99, false, "https://x/a"));

        let outcome = engine.into_outcome();
        assert!(outcome.alerts.is_empty());
        assert!(outcome.changed.is_empty());
    }

    #[test]
    fn test_price_change_writes_without_alert() {
        let mut engine = DiffEngine::new(vec![stored("Labubu A", 12.99, true, "https://x/a")]);
        engine.observe(&record("Labubu A", 14.99, true, "https://x/a"));

        let outcome = engine.into_outcome();
        assert!(outcome.alerts.is_empty());
        assert_eq!(outcome.changed.len(), 1);
        assert_eq!(outcome.changed[0].price, 14.99);
    }

    #[test]
    fn test_url_change_writes_without_alert() {
        let mut engine = DiffEngine::new(vec![stored("Labubu A", 12.99, true, "https://x/a")]);
        engine.observe(&record("Labubu A", 12.99, true, "https://x/a-v2"));

        let outcome = engine.into_outcome();
        assert!(outcome.alerts.is_empty());
        assert_eq!(outcome.changed[0].url, "https://x/a-v2");
    }

    #[test]
    fn test_restock_and_price_change_together() {
        let mut engine = DiffEngine::new(vec![stored("Labubu A", 12.99, false, "https://x/a")]);
        engine.observe(&record("Labubu A", 14.99, true, "https://x/a"));

        let outcome = engine.into_outcome();
        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.alerts[0].kind, ChangeKind::Restock);
        assert_eq!(outcome.changed.len(), 1);
        assert_eq!(outcome.changed[0].price, 14.99);
        assert!(outcome.changed[0].in_stock);
    }

    #[test]
    fn test_exact_match_is_noop() {
        let known = stored("Labubu A", 12.99, true, "https://x/a");
        let mut engine = DiffEngine::new(vec![known]);
        engine.observe(&record("Labubu A", 12.99, true, "https://x/a"));

        let outcome = engine.into_outcome();
        assert!(outcome.alerts.is_empty());
        assert!(outcome.changed.is_empty());
    }

    #[test]
    fn test_idempotent_second_pass() {
        // First pass: a new item plus a restock.
        let mut first = DiffEngine::new(vec![stored("Labubu A", 12.99, false, "https://x/a")]);
        first.observe(&record("Labubu A", 12.99, true, "https://x/a"));
        first.observe(&record("Labubu B", 9.99, true, "https://x/b"));
        let outcome = first.into_outcome();
        assert_eq!(outcome.alerts.len(), 2);

        // Second pass over identical extraction output, snapshot reflecting
        // the first pass's writes: zero alerts, zero writes.
        let mut second = DiffEngine::new(outcome.changed);
        second.observe(&record("Labubu A", 12.99, true, "https://x/a"));
        second.observe(&record("Labubu B", 9.99, true, "https://x/b"));
        let outcome = second.into_outcome();
        assert!(outcome.alerts.is_empty());
        assert!(outcome.changed.is_empty());
    }

    #[test]
    fn test_nan_price_is_stable_across_cycles() {
        let mut engine = DiffEngine::new(vec![stored("Labubu A", f64::NAN, true, "https://x/a")]);
        engine.observe(&record("Labubu A", f64::NAN, true, "https://x/a"));

        let outcome = engine.into_outcome();
        assert!(outcome.changed.is_empty());
    }

    #[test]
    fn test_nan_to_numeric_price_is_a_visible_diff() {
        let mut engine = DiffEngine::new(vec![stored("Labubu A", f64::NAN, true, "https://x/a")]);
        engine.observe(&record("Labubu A", 12.99, true, "https://x/a"));

        let outcome = engine.into_outcome();
        assert_eq!(outcome.changed.len(), 1);
        assert_eq!(outcome.changed[0].price, 12.99);
    }

    #[test]
    fn test_alert_order_follows_discovery_order() {
        let mut engine = DiffEngine::new(vec![stored("Labubu A", 12.99, false, "https://x/a")]);
        engine.observe(&record("Labubu B", 9.99, true, "https://x/b"));
        engine.observe(&record("Labubu A", 12.99, true, "https://x/a"));

        let outcome = engine.into_outcome();
        assert_eq!(outcome.alerts.len(), 2);
        assert_eq!(outcome.alerts[0].kind, ChangeKind::NewItem);
        assert_eq!(outcome.alerts[1].kind, ChangeKind::Restock);
    }

    #[test]
    fn test_same_name_seen_twice_produces_one_write() {
        // The same name can appear on two pages; the pending write set is
        // keyed by name so the batch carries it once, with the final state.
        let mut engine = DiffEngine::new(vec![stored("Labubu A", 12.99, true, "https://x/a")]);
        engine.observe(&record("Labubu A", 13.99, true, "https://x/a"));
        engine.observe(&record("Labubu A", 14.99, true, "https://x/a"));

        let outcome = engine.into_outcome();
        assert_eq!(outcome.changed.len(), 1);
        assert_eq!(outcome.changed[0].price, 14.99);
    }
}
