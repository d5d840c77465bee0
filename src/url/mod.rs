//! URL handling module for FeedScout
//!
//! Every URL offered to a frontier passes through [`normalize_url`] first, so the
//! canonical string doubles as the dedup key for the visited sets.

mod normalize;

pub use normalize::normalize_url;

use url::Url;

/// Returns the origin of `url` as a base for resolving root-relative references
///
/// The base is `scheme://host[:port]/`; `None` when the URL has no host
/// (e.g. `mailto:` or `data:` URLs).
pub fn origin_base(url: &Url) -> Option<Url> {
    let host = url.host_str()?;
    let base = match url.port() {
        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
        None => format!("{}://{}/", url.scheme(), host),
    };
    Url::parse(&base).ok()
}
