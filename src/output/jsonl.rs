//! JSON Lines and in-memory feed sinks

use crate::feed::JsonFeed;
use crate::output::traits::{FeedSink, OutputResult};
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use url::Url;

#[derive(Serialize)]
struct FeedRecord<'a> {
    source: &'a str,
    feed: &'a JsonFeed,
}

/// Writes one `{"source": ..., "feed": ...}` JSON object per line
pub struct JsonLinesSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesSink {
    /// Wraps any writer
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Creates (or truncates) a file at `path`
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }

    /// Writes to standard output through a buffer; lines land on `flush`
    /// or whenever the buffer fills
    pub fn stdout() -> Self {
        Self::new(BufWriter::new(std::io::stdout()))
    }

    /// Opens the configured destination: `-` means stdout, anything else a file
    pub fn open(destination: &str) -> OutputResult<Self> {
        if destination == "-" {
            Ok(Self::stdout())
        } else {
            Self::create(Path::new(destination))
        }
    }
}

impl FeedSink for JsonLinesSink {
    fn emit(&self, source: &Url, feed: &JsonFeed) -> OutputResult<()> {
        let mut line = serde_json::to_vec(&FeedRecord {
            source: source.as_str(),
            feed,
        })?;
        line.push(b'\n');

        self.writer.lock().write_all(&line)?;
        Ok(())
    }

    fn flush(&self) -> OutputResult<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

/// Keeps every emitted feed in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    feeds: Mutex<Vec<(Url, JsonFeed)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the feeds emitted so far, in emission order
    pub fn feeds(&self) -> Vec<(Url, JsonFeed)> {
        self.feeds.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.feeds.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.lock().is_empty()
    }
}

impl FeedSink for MemorySink {
    fn emit(&self, source: &Url, feed: &JsonFeed) -> OutputResult<()> {
        self.feeds.lock().push((source.clone(), feed.clone()));
        Ok(())
    }
}
