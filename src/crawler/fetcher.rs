//! Page fetch policy
//!
//! Wraps a `RenderPage` with the resilience rules the crawl relies on:
//! - bounded navigation with a fixed cooldown + degraded continuation on
//!   failure, so a single flaky page load doesn't kill the cycle
//! - a once-per-cycle attempt to dismiss a consent/interstitial overlay
//! - a bounded wait for the listing container, fatal for the page when it
//!   never renders (nothing can be extracted without it)

use thiserror::Error;

use crate::config::{FetchConfig, SelectorConfig};
use crate::crawler::render::RenderPage;

/// Errors that end a page visit
#[derive(Debug, Error)]
pub enum FetchError {
    /// The listing container never rendered within the bounded wait.
    #[error("item container '{selector}' never rendered for {url}")]
    ContainerMissing { url: String, selector: String },

    /// The render backend failed in a way navigation cooldown can't absorb.
    #[error("render failure for {url}: {message}")]
    Render { url: String, message: String },
}

/// Resilient fetch over a render backend.
///
/// Created fresh at the start of each crawl cycle; the overlay flag is
/// cycle-scoped state and must not leak across cycles.
pub struct PageFetcher<'a, P: RenderPage> {
    page: &'a mut P,
    fetch: &'a FetchConfig,
    selectors: &'a SelectorConfig,
    overlay_handled: bool,
}

impl<'a, P: RenderPage> PageFetcher<'a, P> {
    pub fn new(page: &'a mut P, fetch: &'a FetchConfig, selectors: &'a SelectorConfig) -> Self {
        Self {
            page,
            fetch,
            selectors,
            overlay_handled: false,
        }
    }

    /// Fetches fully rendered content for `url`.
    ///
    /// Navigation failure is not a hard error: after a fixed cooldown the
    /// fetch continues with whatever the page holds. Only a missing listing
    /// container is fatal for the page, surfaced for the per-URL retry
    /// policy to handle.
    pub async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        if let Err(e) = self.page.goto(url, self.fetch.nav_timeout()).await {
            tracing::warn!(
                "Error loading {}: {}; waiting {:?} before continuing",
                url,
                e,
                self.fetch.nav_failure_cooldown()
            );
            tokio::time::sleep(self.fetch.nav_failure_cooldown()).await;
        }

        if !self.overlay_handled {
            self.dismiss_overlay().await;
            self.overlay_handled = true;
        }

        let present = self
            .page
            .wait_for(&self.selectors.item, self.fetch.container_timeout())
            .await
            .map_err(|e| FetchError::Render {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !present {
            return Err(FetchError::ContainerMissing {
                url: url.to_string(),
                selector: self.selectors.item.clone(),
            });
        }

        self.page.content().await.map_err(|e| FetchError::Render {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// One attempt per cycle: wait briefly for the overlay; dismiss it if
    /// present, proceed silently if not. Failures here are never fatal.
    async fn dismiss_overlay(&mut self) {
        let Some(selector) = self.selectors.overlay.as_deref() else {
            return;
        };

        match self.page.wait_for(selector, self.fetch.overlay_timeout()).await {
            Ok(true) => match self.page.click(selector).await {
                Ok(()) => tracing::info!("Dismissed interstitial overlay"),
                Err(e) => tracing::debug!("Overlay dismissal failed: {}", e),
            },
            Ok(false) => tracing::debug!("No interstitial overlay present"),
            Err(e) => tracing::debug!("Overlay check failed: {}", e),
        }
    }
}
