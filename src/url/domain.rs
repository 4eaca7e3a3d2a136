use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_indexer::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when `candidate` is served by the same origin as `root`
///
/// Scheme, host, and port must all match; a crawl never leaves its site.
pub fn is_same_site(root: &Url, candidate: &Url) -> bool {
    root.scheme() == candidate.scheme()
        && extract_domain(root) == extract_domain(candidate)
        && root.port_or_known_default() == candidate.port_or_known_default()
}

/// Path of `url` relative to the site root, including any query string
///
/// This is the form stored on page records: `/`, `/docs/intro`, `/search?q=x`.
pub fn site_relative_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
