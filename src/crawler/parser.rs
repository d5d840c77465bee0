//! HTML parser for extracting links and feed references
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from `<a>` tags and canonical links)
//! - Feed references (from `<link type="application/rss+xml">` and Atom equivalents)

use crate::crawler::fetcher::PageResult;
use crate::url::origin_base;
use scraper::{Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// MIME type fragments that mark a `<link>` element as a feed reference
const FEED_TYPE_MARKERS: &[&str] = &["rss+xml", "atom+xml"];

/// Errors produced while extracting links from a page
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("cannot resolve links against base URL {0}")]
    BadBaseUrl(String),
}

/// A feed URL discovered in a page's markup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedReference {
    /// Absolute URL of the feed
    pub url: Url,

    /// MIME type declared by the `<link>` element
    pub mime_type: String,
}

/// Links and feed references extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// Absolute hyperlink targets
    pub links: HashSet<Url>,

    /// Feed references from `<link>` elements
    pub feeds: HashSet<FeedReference>,
}

/// Extracts links and feeds from a fetched page
///
/// Returns `None` when the page had no text body, so callers can tell
/// "nothing to parse" apart from "parsed, found nothing".
pub fn extract_from_page(page: &PageResult) -> Option<PageLinks> {
    page.body
        .as_deref()
        .map(|html| extract_links_and_feeds(&page.url, html))
}

/// Parses HTML content and extracts hyperlinks and feed references
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only anchors
///
/// Feed references come from every `<link>` whose `type` contains `rss+xml`
/// or `atom+xml`. A relative feed `href` is resolved against the page origin.
/// When the page URL cannot act as a base the feed candidates are dropped
/// and hyperlink extraction still runs.
///
/// # Example
///
/// ```
/// use feedscout::crawler::extract_links_and_feeds;
/// use url::Url;
///
/// let html = r#"<link rel="alternate" type="application/rss+xml" href="/feed.xml">"#;
/// let page = Url::parse("https://example.com/blog").unwrap();
/// let found = extract_links_and_feeds(&page, html);
/// let feed = found.feeds.iter().next().unwrap();
/// assert_eq!(feed.url.as_str(), "https://example.com/feed.xml");
/// ```
pub fn extract_links_and_feeds(page_url: &Url, html: &str) -> PageLinks {
    let document = Html::parse_document(html);

    let links = extract_links(&document, page_url);
    let feeds = match extract_feed_references(&document, page_url) {
        Ok(feeds) => feeds,
        Err(e) => {
            tracing::warn!("Dropping feed references on {}: {}", page_url, e);
            HashSet::new()
        }
    };

    PageLinks { links, feeds }
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> HashSet<Url> {
    let mut links = HashSet::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.insert(absolute_url);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.insert(absolute_url);
            }
        }
    }

    links
}

/// Extracts feed references from `<link type=... href=...>` elements
fn extract_feed_references(
    document: &Html,
    page_url: &Url,
) -> Result<HashSet<FeedReference>, ExtractionError> {
    let mut feeds = HashSet::new();

    let Ok(selector) = Selector::parse("link[type][href]") else {
        return Ok(feeds);
    };

    let candidates: Vec<(&str, &str)> = document
        .select(&selector)
        .filter_map(|element| {
            let mime_type = element.value().attr("type")?;
            let href = element.value().attr("href")?;
            is_feed_type(mime_type).then_some((mime_type, href))
        })
        .collect();

    if candidates.is_empty() {
        return Ok(feeds);
    }

    let base = origin_base(page_url)
        .ok_or_else(|| ExtractionError::BadBaseUrl(page_url.to_string()))?;

    for (mime_type, href) in candidates {
        match resolve_feed_href(href.trim(), &base) {
            Some(url) => {
                feeds.insert(FeedReference {
                    url,
                    mime_type: mime_type.trim().to_string(),
                });
            }
            None => tracing::debug!("Dropping unresolvable feed href '{}' on {}", href, page_url),
        }
    }

    Ok(feeds)
}

fn is_feed_type(mime_type: &str) -> bool {
    let mime_type = mime_type.to_ascii_lowercase();
    FEED_TYPE_MARKERS
        .iter()
        .any(|marker| mime_type.contains(marker))
}

/// Uses an absolute href as-is, otherwise joins it onto the page origin
fn resolve_feed_href(href: &str, origin: &Url) -> Option<Url> {
    if href.is_empty() {
        return None;
    }

    match Url::parse(href) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => origin.join(href).ok(),
        Err(_) => None,
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    matches!(absolute_url.scheme(), "http" | "https").then_some(absolute_url)
}
