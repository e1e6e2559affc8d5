use serde::Deserialize;
use url::Url;

/// How relative hrefs are turned into absolute URLs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkResolution {
    /// Resolve everything against the root of the page's hostname
    ///
    /// `page.html` found on `https://a.test/docs/` becomes
    /// `https://a.test/page.html`, not `https://a.test/docs/page.html`.
    #[default]
    RootRelative,

    /// RFC 3986 reference resolution against the full page URL
    Standard,
}

/// Normalizes a raw href against a base hostname
///
/// # Rules
///
/// 1. An href starting with `https://` is used verbatim
/// 2. An href starting with `/` becomes `https://{base_hostname}{href}`
/// 3. Anything else becomes `https://{base_hostname}/{href}`
///
/// # Examples
///
/// ```
/// use handmade_crawler::url::normalize_link;
///
/// assert_eq!(normalize_link("/x", "a.test"), "https://a.test/x");
/// assert_eq!(normalize_link("x/y", "a.test"), "https://a.test/x/y");
/// assert_eq!(normalize_link("https://b.test/y", "a.test"), "https://b.test/y");
/// ```
pub fn normalize_link(raw_href: &str, base_hostname: &str) -> String {
    if raw_href.starts_with("https://") {
        raw_href.to_string()
    } else if raw_href.starts_with('/') {
        format!("https://{}{}", base_hostname, raw_href)
    } else {
        format!("https://{}/{}", base_hostname, raw_href)
    }
}

/// Resolves a raw href against the page it was found on
///
/// Returns `None` when the reference cannot be resolved.
pub fn resolve_standard(raw_href: &str, page_url: &Url) -> Option<String> {
    page_url.join(raw_href.trim()).ok().map(String::from)
}
