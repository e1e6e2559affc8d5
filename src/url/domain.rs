use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the lowercase hostname from a URL
///
/// The port is not part of the hostname.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use handmade_crawler::url::extract_hostname;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_hostname(&url), Some("example.com".to_string()));
/// ```
pub fn extract_hostname(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses a frontier URL and extracts its hostname
///
/// # Returns
///
/// * `Ok((Url, String))` - The parsed URL and its hostname
/// * `Err(UrlError)` - The string is not an absolute URL with a host
pub fn parse_page_url(url_str: &str) -> UrlResult<(Url, String)> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;
    let hostname =
        extract_hostname(&url).ok_or_else(|| UrlError::MissingHost(url_str.to_string()))?;
    Ok((url, hostname))
}
