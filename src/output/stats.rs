//! Crawl statistics
//!
//! Workers bump lock-free counters while the crawl runs; the coordinator
//! turns them into a [`CrawlReport`] once everything has settled.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Live counters shared by all workers
#[derive(Debug, Default)]
pub struct CrawlStats {
    pages_visited: AtomicUsize,
    pages_skipped: AtomicUsize,
    page_failures: AtomicUsize,
    links_discovered: AtomicUsize,
    feeds_discovered: AtomicUsize,
    feeds_normalized: AtomicUsize,
    feed_failures: AtomicUsize,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a dispatched page and returns the running total
    pub fn page_visited(&self) -> usize {
        self.pages_visited.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Counts a page that had no text body
    pub fn page_skipped(&self) {
        self.pages_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn page_failed(&self) {
        self.page_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts newly queued links
    pub fn links_discovered(&self, count: usize) {
        self.links_discovered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn feed_discovered(&self) {
        self.feeds_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn feed_normalized(&self) {
        self.feeds_normalized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn feed_failed(&self) {
        self.feed_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Freezes the counters into a report
    pub fn report(&self, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> CrawlReport {
        CrawlReport {
            started_at,
            finished_at,
            pages_visited: self.pages_visited.load(Ordering::Relaxed),
            pages_skipped: self.pages_skipped.load(Ordering::Relaxed),
            page_failures: self.page_failures.load(Ordering::Relaxed),
            links_discovered: self.links_discovered.load(Ordering::Relaxed),
            feeds_discovered: self.feeds_discovered.load(Ordering::Relaxed),
            feeds_normalized: self.feeds_normalized.load(Ordering::Relaxed),
            feed_failures: self.feed_failures.load(Ordering::Relaxed),
        }
    }
}

/// Summary of a finished crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Pages handed to a page worker
    pub pages_visited: usize,

    /// Visited pages that were not text-like
    pub pages_skipped: usize,

    /// Pages whose fetch failed (after retries)
    pub page_failures: usize,

    /// Links newly queued in the page frontier
    pub links_discovered: usize,

    /// Feed URLs newly queued in the feed frontier
    pub feeds_discovered: usize,

    /// Feeds normalized and handed to the sink
    pub feeds_normalized: usize,

    /// Feeds that could not be fetched, parsed or emitted
    pub feed_failures: usize,
}

impl CrawlReport {
    /// Wall-clock duration of the crawl
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Prints a crawl report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    let seconds = report.duration().num_milliseconds() as f64 / 1000.0;
    println!("Started:  {}", report.started_at.to_rfc3339());
    println!("Finished: {}", report.finished_at.to_rfc3339());
    println!("Duration: {:.1}s", seconds);
    println!();

    println!("Pages:");
    println!("  Visited: {}", report.pages_visited);
    println!("  Not text: {}", report.pages_skipped);
    println!("  Failed: {}", report.page_failures);
    println!("  Links queued: {}", report.links_discovered);
    println!();

    println!("Feeds:");
    println!("  Discovered: {}", report.feeds_discovered);
    println!("  Normalized: {}", report.feeds_normalized);
    println!("  Failed: {}", report.feed_failures);
    println!();

    let rate = if seconds > 0.0 {
        report.pages_visited as f64 / seconds
    } else {
        0.0
    };
    println!("Throughput: {:.2} pages/sec", rate);
}
