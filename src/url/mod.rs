//! Link normalization module
//!
//! This module turns raw href values into absolute, canonical URLs and
//! classifies them as crawlable or not.

mod domain;
mod normalize;

pub use domain::{extract_hostname, parse_page_url};
pub use normalize::{normalize_link, resolve_standard, LinkResolution};

use url::Url;

/// Classification of a normalized link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkClass {
    /// A page worth queueing; the URL serialization is the dedup key
    Crawlable(Url),
    /// Fragment variant of an already reachable page
    Fragment,
    /// Sitemap or feed rather than a page
    Xml,
    /// Not a parseable absolute URL
    Malformed,
}

impl LinkClass {
    /// Returns true if the link may enter admission and dedup checks
    pub fn is_crawlable(&self) -> bool {
        matches!(self, Self::Crawlable(_))
    }
}

/// Classifies a normalized URL
///
/// A non-empty fragment makes the link a [`LinkClass::Fragment`]; a path ending
/// in `.xml` makes it a [`LinkClass::Xml`].
///
/// # Examples
///
/// ```
/// use handmade_crawler::url::{classify_link, LinkClass};
///
/// assert_eq!(classify_link("https://a.test/#top"), LinkClass::Fragment);
/// assert_eq!(classify_link("https://a.test/sitemap.xml"), LinkClass::Xml);
/// assert!(classify_link("https://a.test/x").is_crawlable());
/// ```
pub fn classify_link(url_str: &str) -> LinkClass {
    let url = match Url::parse(url_str) {
        Ok(url) if url.host_str().is_some() => url,
        _ => return LinkClass::Malformed,
    };

    if url.fragment().is_some_and(|fragment| !fragment.is_empty()) {
        return LinkClass::Fragment;
    }

    if url.path().ends_with(".xml") {
        return LinkClass::Xml;
    }

    LinkClass::Crawlable(url)
}

/// Resolves hrefs found on a page using the configured strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkNormalizer {
    resolution: LinkResolution,
}

impl LinkNormalizer {
    /// Creates a normalizer for the given resolution strategy
    pub fn new(resolution: LinkResolution) -> Self {
        Self { resolution }
    }

    /// Resolves `raw_href` found on `page_url` (whose hostname is `hostname`)
    ///
    /// # Returns
    ///
    /// The absolute URL string, or `None` if standard resolution failed
    pub fn resolve(&self, raw_href: &str, page_url: &Url, hostname: &str) -> Option<String> {
        match self.resolution {
            LinkResolution::RootRelative => Some(normalize_link(raw_href, hostname)),
            LinkResolution::Standard => resolve_standard(raw_href, page_url),
        }
    }

    /// Resolves and classifies `raw_href` in one step
    pub fn normalize(&self, raw_href: &str, page_url: &Url, hostname: &str) -> LinkClass {
        self.resolve(raw_href, page_url, hostname)
            .map(|absolute| classify_link(&absolute))
            .unwrap_or(LinkClass::Malformed)
    }
}
