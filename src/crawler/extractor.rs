//! Listing extraction from rendered catalog markup
//!
//! Turns a rendered page into zero or more `ListingRecord`s plus a
//! pagination signal. Selectors are configuration, parsed once at
//! construction; per-page work is pure string-in, records-out.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use crate::catalog::ListingRecord;
use crate::config::SelectorConfig;

/// Errors raised while preparing or running extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid CSS selector '{selector}': {message}")]
    SelectorParse { selector: String, message: String },
}

/// One parsed page: its records and whether pagination continues.
#[derive(Debug)]
pub struct ExtractedPage {
    pub records: Vec<ListingRecord>,
    pub has_next_page: bool,
}

/// Parses rendered catalog pages into listing records.
pub struct Extractor {
    base_url: Url,
    item: Selector,
    name: Selector,
    price: Selector,
    stock_tag: Selector,
    link: Selector,
    next_page: Selector,
    out_of_stock_text: String,
}

impl Extractor {
    pub fn new(base_url: Url, selectors: &SelectorConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            base_url,
            item: parse_selector(&selectors.item)?,
            name: parse_selector(&selectors.name)?,
            price: parse_selector(&selectors.price)?,
            stock_tag: parse_selector(&selectors.stock_tag)?,
            link: parse_selector(&selectors.link)?,
            next_page: parse_selector(&selectors.next_page)?,
            out_of_stock_text: selectors.out_of_stock_text.clone(),
        })
    }

    /// Extracts all listing records from `html` and detects whether an
    /// enabled next-page control exists.
    pub fn extract(&self, html: &str) -> ExtractedPage {
        let document = Html::parse_document(html);

        let mut records = Vec::new();
        for element in document.select(&self.item) {
            let name = self.element_text(&element, &self.name);
            if name.is_empty() {
                // Name is the natural key; an unnamed element can't be
                // classified against the catalog.
                tracing::warn!("Skipping listing element with empty name");
                continue;
            }

            let price = parse_price(&self.element_text(&element, &self.price));

            let in_stock = !element
                .select(&self.stock_tag)
                .any(|tag| collect_text(&tag).contains(&self.out_of_stock_text));

            let url = element
                .select(&self.link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| self.base_url.join(href).ok())
                .map(|resolved| resolved.to_string())
                .unwrap_or_default();

            records.push(ListingRecord {
                name,
                price,
                in_stock,
                url,
            });
        }

        ExtractedPage {
            records,
            has_next_page: self.has_next_page(&document),
        }
    }

    /// Builds the URL for page `page` of the catalog.
    pub fn next_page_url(&self, page: u32) -> String {
        format!("{}?page={}", self.base_url, page)
    }

    /// Pagination continues iff the next-page control exists and is not
    /// disabled.
    fn has_next_page(&self, document: &Html) -> bool {
        document
            .select(&self.next_page)
            .next()
            .map(|control| {
                !control
                    .value()
                    .attr("class")
                    .unwrap_or("")
                    .contains("disabled")
            })
            .unwrap_or(false)
    }

    fn element_text(&self, element: &ElementRef<'_>, selector: &Selector) -> String {
        element
            .select(selector)
            .next()
            .map(|el| collect_text(&el))
            .unwrap_or_default()
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::SelectorParse {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn collect_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Strips price text down to digits and dots, then parses it as a decimal.
///
/// Malformed text yields NaN, propagated as-is rather than sanitized; a
/// malformed value becomes a visible diff on the next successful parse.
fn parse_price(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    cleaned.parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;

    fn extractor() -> Extractor {
        let selectors = SelectorConfig {
            item: "div.card".to_string(),
            name: "h2.title".to_string(),
            price: "div.price".to_string(),
            stock_tag: "div.tag".to_string(),
            link: "a".to_string(),
            next_page: "li[title='Next Page']".to_string(),
            overlay: None,
            out_of_stock_text: "OUT OF STOCK".to_string(),
        };
        Extractor::new(Url::parse("https://shop.example.com/collection").unwrap(), &selectors)
            .unwrap()
    }

    fn card(name: &str, price: &str, tag: &str, href: &str) -> String {
        format!(
            r#"<div class="card"><a href="{href}"><h2 class="title">{name}</h2><div class="price">{price}</div><div class="tag">{tag}</div></a></div>"#
        )
    }

    #[test]
    fn test_extracts_basic_record() {
        let html = card(" Labubu A ", "$12.99", "", "/items/a");
        let page = extractor().extract(&html);

        assert_eq!(page.records.len(), 1);
        let record = &page.records[0];
        assert_eq!(record.name, "Labubu A");
        assert_eq!(record.price, 12.99);
        assert!(record.in_stock);
        assert_eq!(record.url, "https://shop.example.com/items/a");
    }

    #[test]
    fn test_out_of_stock_tag_clears_flag() {
        let html = card("Labubu A", "$12.99", "OUT OF STOCK", "/items/a");
        let page = extractor().extract(&html);

        assert!(!page.records[0].in_stock);
    }

    #[test]
    fn test_other_tag_text_keeps_in_stock() {
        let html = card("Labubu A", "$12.99", "NEW", "/items/a");
        let page = extractor().extract(&html);

        assert!(page.records[0].in_stock);
    }

    #[test]
    fn test_missing_href_yields_empty_url() {
        let html = r#"<div class="card"><h2 class="title">Labubu A</h2><div class="price">$1</div></div>"#;
        let page = extractor().extract(html);

        assert_eq!(page.records[0].url, "");
    }

    #[test]
    fn test_absolute_href_kept_as_is() {
        let html = card("Labubu A", "$1", "", "https://cdn.example.net/a");
        let page = extractor().extract(&html);

        assert_eq!(page.records[0].url, "https://cdn.example.net/a");
    }

    #[test]
    fn test_empty_name_element_skipped() {
        let html = format!(
            "{}{}",
            card("", "$1", "", "/a"),
            card("Labubu B", "$2", "", "/b")
        );
        let page = extractor().extract(&html);

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].name, "Labubu B");
    }

    #[test]
    fn test_malformed_price_is_nan() {
        let html = card("Labubu A", "sold out", "", "/a");
        let page = extractor().extract(&html);

        assert!(page.records[0].price.is_nan());
    }

    #[test]
    fn test_price_with_currency_and_thousands() {
        assert_eq!(parse_price("US$ 1,299.00"), 1299.00);
        assert_eq!(parse_price("$12.99"), 12.99);
        assert!(parse_price("").is_nan());
        assert!(parse_price("N/A").is_nan());
    }

    #[test]
    fn test_next_page_control_enabled() {
        let html = format!("{}<li title=\"Next Page\"></li>", card("A", "$1", "", "/a"));
        let page = extractor().extract(&html);

        assert!(page.has_next_page);
    }

    #[test]
    fn test_next_page_control_disabled() {
        let html = format!(
            "{}<li title=\"Next Page\" class=\"pagination-disabled\"></li>",
            card("A", "$1", "", "/a")
        );
        let page = extractor().extract(&html);

        assert!(!page.has_next_page);
    }

    #[test]
    fn test_no_next_page_control_means_last_page() {
        let html = card("A", "$1", "", "/a");
        let page = extractor().extract(&html);

        assert!(!page.has_next_page);
    }

    #[test]
    fn test_next_page_url() {
        assert_eq!(
            extractor().next_page_url(2),
            "https://shop.example.com/collection?page=2"
        );
    }

    #[test]
    fn test_multiple_cards() {
        let html = format!(
            "{}{}{}",
            card("A", "$1", "", "/a"),
            card("B", "$2", "OUT OF STOCK", "/b"),
            card("C", "$3.50", "", "/c")
        );
        let page = extractor().extract(&html);

        assert_eq!(page.records.len(), 3);
        assert!(!page.records[1].in_stock);
        assert_eq!(page.records[2].price, 3.50);
    }
}
