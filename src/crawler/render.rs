//! Render capability: primitive page operations the fetch policy drives
//!
//! The crawl engine treats "fetch rendered page content" as an external
//! capability. `RenderPage` is that seam: navigation, selector waits, a
//! click, and a content read. `HttpRenderer` is the default implementation,
//! a plain HTTP GET through a shared reqwest client; anything that actually
//! executes scripts plugs in behind the same trait.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;

/// Errors surfaced by a render backend
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("page interaction failed: {0}")]
    Interaction(String),
}

/// A page handle capable of loading URLs and answering selector queries.
///
/// One handle is reused for every page of a crawl cycle; calls are strictly
/// sequential.
#[async_trait]
pub trait RenderPage: Send {
    /// Navigates to `url`, waiting up to `timeout` for the page to settle.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError>;

    /// Waits up to `timeout` for `selector` to appear on the current page.
    ///
    /// Returns `Ok(false)` when the element did not appear in time.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, RenderError>;

    /// Clicks the first element matching `selector`, if the backend can.
    async fn click(&mut self, selector: &str) -> Result<(), RenderError>;

    /// Returns the current rendered markup.
    async fn content(&mut self) -> Result<String, RenderError>;
}

/// Builds the shared HTTP client used for rendering and webhooks.
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Default render backend: one HTTP GET per navigation.
///
/// Static markup either contains an element or never will, so `wait_for`
/// answers immediately and `click` is a no-op (there is no overlay state to
/// interact with).
pub struct HttpRenderer {
    client: Client,
    body: Option<String>,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client, body: None }
    }

    fn selector_matches(&self, selector: &str) -> Result<bool, RenderError> {
        let parsed = Selector::parse(selector)
            .map_err(|e| RenderError::Interaction(format!("bad selector '{}': {}", selector, e)))?;

        Ok(self
            .body
            .as_deref()
            .map(|body| Html::parse_document(body).select(&parsed).next().is_some())
            .unwrap_or(false))
    }
}

#[async_trait]
impl RenderPage for HttpRenderer {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Navigation(format!("HTTP {} for {}", status, url)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        self.body = Some(body);
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Result<bool, RenderError> {
        self.selector_matches(selector)
    }

    async fn click(&mut self, _selector: &str) -> Result<(), RenderError> {
        // Static markup carries no interactive state.
        Ok(())
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.body
            .clone()
            .ok_or_else(|| RenderError::Interaction("no page loaded".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn renderer() -> HttpRenderer {
        HttpRenderer::new(build_http_client("shelfwatch-test/0.1").unwrap())
    }

    #[tokio::test]
    async fn test_goto_loads_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<div class=\"card\">hi</div>"))
            .mount(&server)
            .await;

        let mut page = renderer();
        page.goto(&server.uri(), Duration::from_secs(5)).await.unwrap();

        assert!(page.wait_for("div.card", Duration::from_secs(1)).await.unwrap());
        assert!(!page.wait_for("div.missing", Duration::from_secs(1)).await.unwrap());
        assert!(page.content().await.unwrap().contains("hi"));
    }

    #[tokio::test]
    async fn test_goto_http_error_is_navigation_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut page = renderer();
        let err = page.goto(&server.uri(), Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, RenderError::Navigation(_)));
    }

    #[tokio::test]
    async fn test_content_before_goto_is_an_error() {
        let mut page = renderer();
        assert!(page.content().await.is_err());
    }
}
