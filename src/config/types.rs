use serde::Deserialize;

/// Main configuration structure for FeedScout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Start URLs for the crawl
    pub seeds: Vec<String>,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of concurrent page workers
    #[serde(rename = "page-workers")]
    pub page_workers: u32,

    /// Number of concurrent feed workers
    #[serde(rename = "feed-workers")]
    pub feed_workers: u32,

    /// Total timeout for a single HTTP request (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Maximum number of Location hops followed while sniffing Content-Type
    #[serde(rename = "max-redirects")]
    pub max_redirects: u32,

    /// Extra attempts a page worker makes after a timeout or network error
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay between retry attempts (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Upper bound on pages dispatched during one run
    #[serde(rename = "max-pages")]
    pub max_pages: Option<usize>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_workers: 10,
            feed_workers: 1,
            fetch_timeout_secs: 10,
            max_redirects: 10,
            max_retries: 0,
            retry_delay_ms: 1000,
            max_pages: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON Lines file receiving normalized feeds (`-` for stdout)
    #[serde(rename = "feeds-path")]
    pub feeds_path: String,
}
