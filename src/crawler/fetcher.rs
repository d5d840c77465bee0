//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with a proper user agent string
//! - HEAD requests to sniff Content-Type before downloading anything
//! - Following `Location` on redirects, and on HEAD responses without Content-Type
//! - GET requests for text-like resources
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::header::{HeaderName, CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Content-Type substrings that mark a resource as text-like
const TEXT_MARKERS: &[&str] = &["text", "xml", "rss"];

/// Errors produced while fetching a URL
///
/// None of these are fatal to a crawl: the worker logs the error and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no Content-Type or Location header for {url}")]
    NoContentType { url: String },

    #[error("request timeout for {url}")]
    Timeout { url: String },

    #[error("network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} is not text-like ({content_type})")]
    NonTextContent { url: String, content_type: String },

    #[error("too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("invalid Location header '{location}' from {url}")]
    InvalidLocation { url: String, location: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
}

impl FetchError {
    /// Returns true for failures that may go away on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Network { .. })
    }

    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

/// Result of a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    /// Final URL after following redirects on HEAD and GET
    pub url: Url,

    /// Content-Type declared by the HEAD response
    pub content_type: String,

    /// Decoded body; `None` when the resource is not text-like
    pub body: Option<String>,
}

impl PageResult {
    /// Returns the body, or `NonTextContent` when the resource was not text-like
    pub fn into_text(self) -> Result<String, FetchError> {
        match self.body {
            Some(body) => Ok(body),
            None => Err(FetchError::NonTextContent {
                url: self.url.to_string(),
                content_type: self.content_type,
            }),
        }
    }
}

/// Returns true if a Content-Type value names a text-like resource
pub fn is_text_like(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    TEXT_MARKERS
        .iter()
        .any(|marker| content_type.contains(marker))
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are never followed by the client: the fetcher follows `Location`
/// itself so it can keep sniffing Content-Type along the way.
///
/// # Example
///
/// ```no_run
/// use feedscout::config::{CrawlerConfig, UserAgentConfig};
/// use feedscout::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "FeedScout".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(crawler.fetch_timeout_secs);

    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Content-type-aware fetcher shared by all workers
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_redirects: u32,
}

impl Fetcher {
    /// Creates a fetcher around an existing (pooled) client
    pub fn new(client: Client, max_redirects: u32) -> Self {
        Self {
            client,
            max_redirects,
        }
    }

    /// Fetches a URL, downloading the body only when it is text-like
    ///
    /// # Request Flow
    ///
    /// 1. HEAD the URL and read Content-Type
    ///    - Redirect status with a Location → resolve it and HEAD again
    ///    - No Content-Type but a Location → resolve it and HEAD again
    ///    - Neither → `NoContentType`
    /// 2. Content-Type without "text", "xml" or "rss" → `PageResult` with no body
    /// 3. GET the URL, following any further redirects, and decode the body as text
    ///
    /// `PageResult::url` is the URL the body finally came from.
    pub async fn fetch(&self, url: &Url) -> Result<PageResult, FetchError> {
        let (url, content_type) = self.sniff_content_type(url).await?;

        if !is_text_like(&content_type) {
            tracing::debug!("Skipping non-text resource {} ({})", url, content_type);
            return Ok(PageResult {
                url,
                content_type,
                body: None,
            });
        }

        let (url, body) = self.get_text(&url).await?;
        Ok(PageResult {
            url,
            content_type,
            body: Some(body),
        })
    }

    /// Sends HEAD requests until a non-redirect response declares a Content-Type
    ///
    /// Returns the URL that finally carried the Content-Type along with its value.
    async fn sniff_content_type(&self, url: &Url) -> Result<(Url, String), FetchError> {
        let mut current = url.clone();

        for _ in 0..=self.max_redirects {
            tracing::trace!("HEAD {}", current);
            let response = self
                .client
                .head(current.clone())
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(&current, e))?;

            let location = header_value(&response, LOCATION);

            // A 3xx Content-Type describes the redirect notice, not the target
            if response.status().is_redirection() {
                if let Some(location) = location {
                    current = follow(&current, location)?;
                    continue;
                }
            }

            if let Some(content_type) = header_value(&response, CONTENT_TYPE) {
                return Ok((current, content_type.to_string()));
            }

            let location = location.ok_or_else(|| FetchError::NoContentType {
                url: current.to_string(),
            })?;
            current = follow(&current, location)?;
        }

        Err(FetchError::RedirectLimit {
            url: url.to_string(),
        })
    }

    /// GETs a text resource, following redirects the server issues on GET only
    async fn get_text(&self, url: &Url) -> Result<(Url, String), FetchError> {
        let mut current = url.clone();

        for _ in 0..=self.max_redirects {
            tracing::trace!("GET {}", current);
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(&current, e))?;

            let status = response.status();
            if status.is_redirection() {
                if let Some(location) = header_value(&response, LOCATION) {
                    current = follow(&current, location)?;
                    continue;
                }
            }

            if !status.is_success() {
                return Err(FetchError::HttpStatus {
                    url: current.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response
                .text()
                .await
                .map_err(|e| FetchError::from_reqwest(&current, e))?;
            return Ok((current, body));
        }

        Err(FetchError::RedirectLimit {
            url: url.to_string(),
        })
    }
}

fn header_value(response: &Response, name: HeaderName) -> Option<&str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Resolves a Location header against the URL that returned it
fn follow(current: &Url, location: &str) -> Result<Url, FetchError> {
    let next = current
        .join(location)
        .map_err(|_| FetchError::InvalidLocation {
            url: current.to_string(),
            location: location.to_string(),
        })?;
    tracing::debug!("Following Location from {} to {}", current, next);
    Ok(next)
}
