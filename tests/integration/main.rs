//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! fetch path and the full crawl cycle end-to-end.

mod crawl_tests;
mod fetch_tests;

use feedscout::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use feedscout::crawler::{build_http_client, Fetcher};

/// Creates a test configuration crawling the given seeds
pub fn create_test_config(seeds: Vec<String>) -> Config {
    Config {
        seeds,
        crawler: CrawlerConfig {
            page_workers: 4,
            feed_workers: 2,
            fetch_timeout_secs: 5,
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            feeds_path: "-".to_string(),
        },
    }
}

/// Creates a fetcher with the given per-request timeout and redirect cap
pub fn create_fetcher(timeout_secs: u64, max_redirects: u32) -> Fetcher {
    let config = create_test_config(vec![]);
    let crawler = CrawlerConfig {
        fetch_timeout_secs: timeout_secs,
        max_redirects,
        ..config.crawler
    };
    let client = build_http_client(&config.user_agent, &crawler).expect("Failed to build client");
    Fetcher::new(client, max_redirects)
}
