use crate::UrlError;
use url::Url;

/// Tracking query parameters dropped during normalization (plus any `utm_*`)
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL into the canonical form used as a frontier key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or relative
/// 2. Accept only `http` and `https`
/// 3. Require a host (the `url` crate lowercases it and collapses dot segments)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters and sort the rest
/// 6. Remove an empty query string
///
/// Scheme, port, `www.` and trailing slashes are left alone: they can address
/// different resources on real servers.
///
/// # Examples
///
/// ```
/// use feedscout::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.com/a/../feed.xml?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/feed.xml");
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
        return Err(UrlError::MissingDomain);
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
