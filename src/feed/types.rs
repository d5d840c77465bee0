use serde::{Deserialize, Serialize};

/// Version URL written into every produced feed
pub const JSON_FEED_VERSION: &str = "https://jsonfeed.org/version/1";

/// A feed in JSON Feed 1.0 form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonFeed {
    pub version: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    pub items: Vec<FeedItem>,
}

impl JsonFeed {
    /// Creates an empty feed with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            version: JSON_FEED_VERSION.to_string(),
            title: title.into(),
            home_page_url: None,
            description: None,
            author: None,
            items: Vec::new(),
        }
    }
}

/// Feed author; JSON Feed 1.0 models authors as objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
}

/// One entry of a feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub content_html: String,
    /// Publication date exactly as the source feed wrote it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// A media file attached to an item (RSS `<enclosure>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_in_bytes: Option<u64>,
}
