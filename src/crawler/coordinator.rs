//! Crawl coordinator: drives one full cycle over the paginated catalog
//!
//! A cycle walks Init -> Crawling -> Flushing -> Done:
//! - Init: fresh cycle state (frontier, fetch flags, page counter), snapshot
//!   of known items loaded once from the store
//! - Crawling: drain the frontier, fetch + extract + diff per URL with a
//!   single bounded retry
//! - Flushing: one batched upsert of everything that changed
//! - Done: hand the ordered alert list back to the caller

use url::Url;

use crate::catalog::{AlertEvent, CycleOutcome, DiffEngine};
use crate::config::{Config, FetchConfig, SelectorConfig};
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::render::RenderPage;
use crate::storage::CatalogStore;
use crate::WatchError;

/// Owns the per-cycle crawl machinery and the catalog store.
pub struct Coordinator<S: CatalogStore> {
    fetch: FetchConfig,
    selectors: SelectorConfig,
    base_url: Url,
    extractor: Extractor,
    store: S,
}

impl<S: CatalogStore> Coordinator<S> {
    pub fn new(config: &Config, store: S) -> Result<Self, WatchError> {
        let base_url = Url::parse(&config.catalog.base_url)?;
        let extractor = Extractor::new(base_url.clone(), &config.selectors)?;

        Ok(Self {
            fetch: config.fetch.clone(),
            selectors: config.selectors.clone(),
            base_url,
            extractor,
            store,
        })
    }

    /// Runs one crawl cycle and returns the accumulated alerts in discovery
    /// order.
    ///
    /// All cycle state (frontier, interstitial flag, page counter, pending
    /// writes) is created here and dropped here; nothing leaks into the next
    /// cycle. Side effect: changed items are persisted in one batch before
    /// returning.
    pub async fn run_cycle<P: RenderPage>(
        &mut self,
        page: &mut P,
    ) -> Result<Vec<AlertEvent>, WatchError> {
        tracing::info!("Crawl cycle starting at {}", self.base_url);

        let known = self.store.find_all()?;
        tracing::debug!("Loaded {} known items", known.len());
        let mut diff = DiffEngine::new(known);

        let outcome = {
            let mut fetcher = PageFetcher::new(page, &self.fetch, &self.selectors);
            let mut frontier = Frontier::new();
            frontier.add(self.base_url.as_str());
            let mut page_counter: u32 = 1;

            while let Some(url) = frontier.next() {
                let first = self
                    .visit(&url, &mut fetcher, &mut diff, &mut frontier, &mut page_counter)
                    .await;

                if let Err(e) = first {
                    tracing::warn!("Failed first attempt for {}: {}", url, e);
                    tokio::time::sleep(self.fetch.retry_cooldown()).await;

                    if let Err(e) = self
                        .visit(&url, &mut fetcher, &mut diff, &mut frontier, &mut page_counter)
                        .await
                    {
                        tracing::error!("Failed retry for {}: {}; abandoning page", url, e);
                    }
                }
            }

            diff.into_outcome()
        };

        let CycleOutcome { changed, alerts } = outcome;

        if !changed.is_empty() {
            match self.store.bulk_upsert_by_name(&changed) {
                Ok(summary) => tracing::info!(
                    "Persisted {} changed items ({} inserted, {} updated)",
                    changed.len(),
                    summary.inserted,
                    summary.updated
                ),
                Err(e) => tracing::error!("Batch persistence failed: {}", e),
            }
        }

        tracing::info!("Crawl cycle complete: {} alerts", alerts.len());
        Ok(alerts)
    }

    /// One visit: fetch, extract, diff, and queue the next page if
    /// pagination continues.
    async fn visit<P: RenderPage>(
        &self,
        url: &str,
        fetcher: &mut PageFetcher<'_, P>,
        diff: &mut DiffEngine,
        frontier: &mut Frontier,
        page_counter: &mut u32,
    ) -> Result<(), WatchError> {
        tracing::info!("Visiting {}", url);

        let html = fetcher.fetch(url).await?;
        let extracted = self.extractor.extract(&html);
        tracing::debug!("Extracted {} listings from {}", extracted.records.len(), url);

        for record in &extracted.records {
            diff.observe(record);
        }

        if extracted.has_next_page {
            *page_counter += 1;
            frontier.add(self.extractor.next_page_url(*page_counter));
        }

        Ok(())
    }
}
