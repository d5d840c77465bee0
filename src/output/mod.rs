//! Output module for emitting normalized feeds and crawl reports
//!
//! This module handles:
//! - The [`FeedSink`] trait that receives every normalized feed
//! - JSON Lines and in-memory sink implementations
//! - Crawl statistics and the final report

mod jsonl;
pub mod stats;
mod traits;

pub use jsonl::{JsonLinesSink, MemorySink};
pub use stats::{print_report, CrawlReport, CrawlStats};
pub use traits::{FeedSink, OutputError, OutputResult};
