//! Crawler module for page fetching and feed discovery
//!
//! This module contains the core crawling logic, including:
//! - Content-type-aware HTTP fetching
//! - HTML parsing for links and feed references
//! - Deduplicating frontiers shared by the workers
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{Coordinator, ShutdownHandle};
pub use fetcher::{build_http_client, is_text_like, FetchError, Fetcher, PageResult};
pub use frontier::{Frontier, Lease};
pub use parser::{
    extract_from_page, extract_links_and_feeds, ExtractionError, FeedReference, PageLinks,
};

pub use crate::output::CrawlReport;

use crate::config::Config;
use crate::output::FeedSink;
use crate::ScoutError;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and build the HTTP client
/// 2. Seed the page frontier
/// 3. Fetch pages and follow their links
/// 4. Fetch, normalize and emit every discovered feed
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `sink` - Destination for normalized feeds
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed
/// * `Err(ScoutError)` - Crawl could not start, or the sink failed to flush
pub async fn crawl(config: Config, sink: Arc<dyn FeedSink>) -> Result<CrawlReport, ScoutError> {
    Coordinator::new(config, sink)?.run().await
}
