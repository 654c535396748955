use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use estate_sweep::url::extract_host;
///
/// let url = Url::parse("https://Homes.Example.com/ad/1").unwrap();
/// assert_eq!(extract_host(&url), Some("homes.example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs point at the same host
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (extract_host(a), extract_host(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
