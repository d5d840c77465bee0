//! Output sink trait and errors
//!
//! A sink receives every feed the crawl manages to normalize. The crawl core
//! does not care where feeds end up; implementations decide.

use crate::feed::JsonFeed;
use thiserror::Error;
use url::Url;

/// Errors that can occur while emitting feeds
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize feed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for normalized feeds
///
/// Implementations must be thread-safe: every feed worker holds the same sink.
/// `emit` is called from the blocking thread pool and may block on I/O.
pub trait FeedSink: Send + Sync {
    /// Records one normalized feed
    ///
    /// # Arguments
    ///
    /// * `source` - The URL the feed was fetched from
    /// * `feed` - The normalized feed
    fn emit(&self, source: &Url, feed: &JsonFeed) -> OutputResult<()>;

    /// Flushes buffered output; called once when the crawl finishes
    fn flush(&self) -> OutputResult<()> {
        Ok(())
    }
}
