use crate::UrlError;
use url::Url;

/// Query parameters that only track where a click came from
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "xtor", "from_search"];

/// Normalizes an ad link so the same ad reached twice yields the same string
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Require a host (the parser lowercases it)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters (`utm_*` and [`TRACKING_PARAMS`])
/// 6. Sort the remaining query parameters by key
/// 7. Remove an empty query string
///
/// The path is left as the site wrote it; listing sites often route on a
/// trailing slash.
///
/// # Examples
///
/// ```
/// use estate_sweep::url::normalize_url;
///
/// let url = normalize_url("https://Homes.Example.com/ad/42?utm_source=feed#photos").unwrap();
/// assert_eq!(url.as_str(), "https://homes.example.com/ad/42");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
