//! Feed normalization
//!
//! Converts RSS 2.0 and Atom 1.0 documents into [`JsonFeed`] values.
//!
//! # Example
//!
//! ```
//! use feedscout::feed::normalize;
//!
//! let rss = r#"<rss version="2.0"><channel>
//!     <title>T</title><link>http://x/</link><description>D</description>
//!     <item><guid>1</guid><link>http://x/1</link><title>I</title><description>C</description></item>
//! </channel></rss>"#;
//!
//! let feed = normalize(rss).unwrap();
//! assert_eq!(feed.title, "T");
//! assert_eq!(feed.items[0].id, "1");
//! ```

mod normalize;
mod types;
pub mod xml;

pub use normalize::{normalize, FeedFormat};
pub use types::{Attachment, Author, FeedItem, JsonFeed, JSON_FEED_VERSION};

use thiserror::Error;

/// Errors that abort normalization of one feed document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed feed document: {0}")]
    Malformed(String),

    #[error("unknown feed format with root element {0}")]
    UnknownFormat(String),

    #[error("<{element}> is missing required field '{field}'")]
    MissingRequiredField {
        element: String,
        field: &'static str,
    },
}
