/// Checks if a hostname matches an admission pattern
///
/// Two pattern forms are supported:
/// 1. Exact: `a.test` matches only `a.test`
/// 2. Wildcard: `*.a.test` matches `a.test` itself and any subdomain of it,
///    however deep
///
/// Both sides are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use handmade_crawler::admission::matches_host_pattern;
///
/// assert!(matches_host_pattern("a.test", "a.test"));
/// assert!(!matches_host_pattern("a.test", "blog.a.test"));
/// assert!(matches_host_pattern("*.a.test", "a.test"));
/// assert!(matches_host_pattern("*.a.test", "api.v2.a.test"));
/// assert!(!matches_host_pattern("*.a.test", "nota.test"));
/// ```
pub fn matches_host_pattern(pattern: &str, hostname: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            hostname == base
                || hostname
                    .strip_suffix(base)
                    .is_some_and(|head| head.ends_with('.'))
        }
        None => hostname == pattern,
    }
}
