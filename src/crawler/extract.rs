//! HTML link extraction
//!
//! The engine only needs the raw `href` values of a page, in document order.
//! Resolution and classification happen later in [`crate::url`].

use scraper::{Html, Selector};

/// Pulls raw hrefs out of a page body
pub trait LinkExtractor: Send + Sync {
    /// Returns every followable href in document order
    fn extract_hrefs(&self, html: &str) -> Vec<String>;
}

/// Default [`LinkExtractor`] backed by `scraper`
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Empty hrefs
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_hrefs(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter(|element| element.value().attr("download").is_none())
            .filter_map(|element| element.value().attr("href"))
            .map(str::trim)
            .filter(|href| is_followable(href))
            .map(String::from)
            .collect()
    }
}

/// Returns false for empty hrefs and non-navigational schemes
fn is_followable(href: &str) -> bool {
    if href.is_empty() {
        return false;
    }

    let lower = href.to_ascii_lowercase();
    !["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}
