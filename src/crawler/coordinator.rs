//! Crawler coordinator - main crawl orchestration logic
//!
//! This module runs the two worker pools of a crawl:
//! - page workers take URLs from the page frontier, fetch them, and push the
//!   links and feed references they find into the page and feed frontiers
//! - feed workers take feed URLs, fetch and normalize them, and hand the
//!   result to the configured [`FeedSink`]
//!
//! The crawl finishes when the page frontier drains; the feed frontier is
//! then sealed and drained in turn.

use crate::config::{validate, Config, CrawlerConfig};
use crate::crawler::fetcher::{build_http_client, FetchError, Fetcher, PageResult};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::extract_from_page;
use crate::feed::normalize;
use crate::output::{CrawlReport, CrawlStats, FeedSink};
use crate::url::normalize_url;
use crate::ScoutError;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;
use url::Url;

/// Progress is logged each time this many pages have been visited
const PROGRESS_INTERVAL: usize = 10;

/// Main crawler coordinator structure
pub struct Coordinator {
    seeds: Vec<Url>,
    page_workers: u32,
    feed_workers: u32,
    context: Arc<WorkerContext>,
}

/// Stops a running crawl from another task
///
/// Both frontiers stop handing out work; in-flight pages and feeds finish
/// and `Coordinator::run` returns a report for what was done.
#[derive(Clone)]
pub struct ShutdownHandle {
    pages: Arc<Frontier>,
    feeds: Arc<Frontier>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        tracing::info!("Shutdown requested, finishing in-flight work");
        self.pages.shutdown();
        self.feeds.shutdown();
    }
}

/// State shared by every worker task
struct WorkerContext {
    fetcher: Fetcher,
    pages: Arc<Frontier>,
    feeds: Arc<Frontier>,
    sink: Arc<dyn FeedSink>,
    stats: CrawlStats,
    retry: RetryPolicy,
}

/// Worker-level retry for transient fetch failures
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl From<&CrawlerConfig> for RetryPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `sink` - Destination for every normalized feed
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ScoutError)` - Invalid configuration or HTTP client setup failed
    pub fn new(config: Config, sink: Arc<dyn FeedSink>) -> Result<Self, ScoutError> {
        validate(&config)?;

        let seeds = config
            .seeds
            .iter()
            .map(|seed| normalize_url(seed))
            .collect::<Result<Vec<_>, _>>()?;

        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let fetcher = Fetcher::new(client, config.crawler.max_redirects);

        let context = WorkerContext {
            fetcher,
            pages: Arc::new(Frontier::with_limit("page", config.crawler.max_pages)),
            feeds: Arc::new(Frontier::new("feed")),
            sink,
            stats: CrawlStats::new(),
            retry: RetryPolicy::from(&config.crawler),
        };

        Ok(Self {
            seeds,
            page_workers: config.crawler.page_workers,
            feed_workers: config.crawler.feed_workers,
            context: Arc::new(context),
        })
    }

    /// Returns a handle that can stop this crawl
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            pages: Arc::clone(&self.context.pages),
            feeds: Arc::clone(&self.context.feeds),
        }
    }

    /// Runs the crawl to completion
    ///
    /// Seeds the page frontier, starts both worker pools, and waits for the
    /// page frontier to drain. The feed frontier is then sealed, feed workers
    /// finish what is left, and the sink is flushed.
    ///
    /// The page frontier is shut down when `run` returns, so a coordinator
    /// crawls only once.
    pub async fn run(&self) -> Result<CrawlReport, ScoutError> {
        let started_at = Utc::now();
        let started = Instant::now();
        let context = &self.context;

        let seeded = self
            .seeds
            .iter()
            .filter(|seed| context.pages.offer((*seed).clone()))
            .count();
        context.pages.seal();
        tracing::info!(
            "Starting crawl with {} seeds, {} page workers, {} feed workers",
            seeded,
            self.page_workers,
            self.feed_workers
        );

        let mut page_workers = JoinSet::new();
        for id in 0..self.page_workers {
            let context = Arc::clone(context);
            page_workers.spawn(
                page_worker(context, started).instrument(tracing::info_span!("page_worker", id)),
            );
        }

        let mut feed_workers = JoinSet::new();
        for id in 0..self.feed_workers {
            let context = Arc::clone(context);
            feed_workers.spawn(
                feed_worker(context).instrument(tracing::info_span!("feed_worker", id)),
            );
        }

        // Page workers only finish before the drain if one of them panicked
        tokio::select! {
            _ = context.pages.wait_drained() => {}
            Some(Err(e)) = page_workers.join_next() => {
                self.shutdown_handle().shutdown();
                return Err(e.into());
            }
        }

        context.pages.shutdown();
        self.join(&mut page_workers).await?;
        tracing::info!(
            "Page crawl complete: {} pages visited, {} feeds queued",
            context.pages.visited_count(),
            context.feeds.visited_count() + context.feeds.pending_count()
        );

        context.feeds.seal();
        self.join(&mut feed_workers).await?;

        context.sink.flush()?;

        let report = context.stats.report(started_at, Utc::now());
        tracing::info!(
            "Crawl completed: {} pages, {} feeds normalized in {}s",
            report.pages_visited,
            report.feeds_normalized,
            report.duration().num_seconds()
        );

        Ok(report)
    }

    async fn join(&self, workers: &mut JoinSet<()>) -> Result<(), JoinError> {
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                self.shutdown_handle().shutdown();
                return Err(e);
            }
        }
        Ok(())
    }
}

async fn page_worker(context: Arc<WorkerContext>, started: Instant) {
    while let Some(lease) = context.pages.take().await {
        context.process_page(lease.url()).await;

        let visited = context.stats.page_visited();
        if visited % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} pages visited, {} in frontier, {:.2} pages/sec",
                visited,
                context.pages.pending_count(),
                page_rate(visited, started.elapsed())
            );
        }
    }
    tracing::debug!("Page worker finished");
}

/// Pages per second over `elapsed`, measured from the start of `run`
fn page_rate(visited: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        visited as f64 / secs
    } else {
        0.0
    }
}

async fn feed_worker(context: Arc<WorkerContext>) {
    while let Some(lease) = context.feeds.take().await {
        context.process_feed(lease.url()).await;
    }
    tracing::debug!("Feed worker finished");
}

impl WorkerContext {
    /// Fetches one page and queues what it links to
    ///
    /// Everything discovered is offered before the caller drops the lease,
    /// so the page frontier never looks drained while links are in transit.
    async fn process_page(&self, url: &Url) {
        tracing::debug!("Processing page {}", url);

        let page = match self.fetch_with_retry(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Skipping page: {}", e);
                self.stats.page_failed();
                return;
            }
        };

        let Some(found) = extract_from_page(&page) else {
            tracing::debug!("No text body at {} ({})", page.url, page.content_type);
            self.stats.page_skipped();
            return;
        };

        let queued_links = found
            .links
            .into_iter()
            .filter_map(|link| canonical(&link))
            .filter(|link| self.pages.offer(link.clone()))
            .count();
        self.stats.links_discovered(queued_links);

        for feed in found.feeds {
            let Some(feed_url) = canonical(&feed.url) else {
                continue;
            };
            if self.feeds.offer(feed_url.clone()) {
                tracing::info!(
                    "Discovered feed {} ({}) on {}",
                    feed_url,
                    feed.mime_type,
                    url
                );
                self.stats.feed_discovered();
            }
        }

        tracing::debug!("Queued {} new links from {}", queued_links, url);
    }

    /// Fetches, normalizes and emits one feed
    async fn process_feed(&self, url: &Url) {
        tracing::debug!("Processing feed {}", url);

        let text = match self.fetcher.fetch(url).await.and_then(PageResult::into_text) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping feed: {}", e);
                self.stats.feed_failed();
                return;
            }
        };

        let feed = match normalize(&text) {
            Ok(feed) => feed,
            Err(e) => {
                tracing::warn!("Dropping feed {}: {}", url, e);
                self.stats.feed_failed();
                return;
            }
        };

        // Sinks do blocking I/O, so keep it off the runtime threads
        let sink = Arc::clone(&self.sink);
        let source = url.clone();
        let emitted =
            tokio::task::spawn_blocking(move || sink.emit(&source, &feed).map(|()| feed)).await;

        match emitted {
            Ok(Ok(feed)) => {
                tracing::info!(
                    "Normalized feed '{}' ({} items) from {}",
                    feed.title,
                    feed.items.len(),
                    url
                );
                self.stats.feed_normalized();
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to emit feed {}: {}", url, e);
                self.stats.feed_failed();
            }
            Err(e) => {
                tracing::error!("Sink task for feed {} failed: {}", url, e);
                self.stats.feed_failed();
            }
        }
    }

    async fn fetch_with_retry(&self, url: &Url) -> Result<PageResult, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetcher.fetch(url).await {
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        "Retrying {} ({}/{}) after: {}",
                        url,
                        attempt,
                        self.retry.max_retries,
                        e
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                result => return result,
            }
        }
    }
}

/// Canonical form used as the frontier key; unusable URLs are dropped
fn canonical(url: &Url) -> Option<Url> {
    match normalize_url(url.as_str()) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Dropping link {}: {}", url, e);
            None
        }
    }
}
