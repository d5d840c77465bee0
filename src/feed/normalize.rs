//! RSS/Atom to JSON Feed conversion
//!
//! Every item field is read through an ordered chain of accessors; the first
//! one that yields a value wins. A required field whose chain comes up empty
//! aborts the whole feed.

use crate::feed::types::{Attachment, Author, FeedItem, JsonFeed};
use crate::feed::xml::{parse_document, Element, ElementName};
use crate::feed::ParseError;

const CHANNEL: ElementName = ElementName::plain("channel");
const ITEM: ElementName = ElementName::plain("item");
const TITLE: ElementName = ElementName::plain("title");
const LINK: ElementName = ElementName::plain("link");
const DESCRIPTION: ElementName = ElementName::plain("description");
const GUID: ElementName = ElementName::plain("guid");
const PUB_DATE: ElementName = ElementName::plain("pubDate");
const UPDATED: ElementName = ElementName::plain("updated");
const ENCLOSURE: ElementName = ElementName::plain("enclosure");
const ITUNES_AUTHOR: ElementName = ElementName::itunes("author");

const ATOM_ENTRY: ElementName = ElementName::atom("entry");
const ATOM_TITLE: ElementName = ElementName::atom("title");
const ATOM_LINK: ElementName = ElementName::atom("link");
const ATOM_ID: ElementName = ElementName::atom("id");
const ATOM_CONTENT: ElementName = ElementName::atom("content");
const ATOM_PUBLISHED: ElementName = ElementName::atom("published");
const ATOM_UPDATED: ElementName = ElementName::atom("updated");

/// Reads one candidate value for a field
type Accessor = fn(&Element) -> Option<String>;

const ID_CHAIN: &[Accessor] = &[guid, atom_id];
const URL_CHAIN: &[Accessor] = &[rss_link, atom_link];
const TITLE_CHAIN: &[Accessor] = &[rss_title, atom_title];
const CONTENT_CHAIN: &[Accessor] = &[description, atom_content];
const DATE_CHAIN: &[Accessor] = &[pub_date, atom_published, updated, atom_updated];

/// Syndication format of a parsed document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Atom,
}

impl FeedFormat {
    /// Picks the format from the root element
    ///
    /// An unnamespaced `<rss>` root is RSS; any root whose qualified name
    /// contains "feed" is Atom.
    pub fn detect(root: &Element) -> Result<Self, ParseError> {
        let name = root.clark_name();
        if name == "rss" {
            Ok(Self::Rss)
        } else if name.contains("feed") {
            Ok(Self::Atom)
        } else {
            Err(ParseError::UnknownFormat(name.into_owned()))
        }
    }
}

/// Parses RSS or Atom text into a JSON Feed
///
/// # Errors
///
/// * `Malformed` - the text is not well-formed XML
/// * `UnknownFormat` - the root element is neither `<rss>` nor an Atom `<feed>`
/// * `MissingRequiredField` - a channel or item lacks a required field
pub fn normalize(feed_text: &str) -> Result<JsonFeed, ParseError> {
    let root = parse_document(feed_text)?;

    let feed = match FeedFormat::detect(&root)? {
        FeedFormat::Rss => parse_rss(&root)?,
        FeedFormat::Atom => parse_atom(&root)?,
    };

    tracing::debug!("Normalized feed '{}' with {} items", feed.title, feed.items.len());
    Ok(feed)
}

fn parse_rss(root: &Element) -> Result<JsonFeed, ParseError> {
    let channel = root.child(CHANNEL).ok_or_else(|| missing(root, "channel"))?;

    let mut feed = JsonFeed::new(channel_field(channel, TITLE, "title")?);
    feed.home_page_url = Some(channel_field(channel, LINK, "link")?);
    feed.description = Some(channel_field(channel, DESCRIPTION, "description")?);
    feed.author = channel
        .child_text(ITUNES_AUTHOR)
        .filter(|name| !name.is_empty())
        .map(|name| Author { name });

    feed.items = channel
        .children_named(ITEM)
        .map(parse_item)
        .collect::<Result<Vec<_>, ParseError>>()?;

    Ok(feed)
}

fn parse_atom(root: &Element) -> Result<JsonFeed, ParseError> {
    let title = root
        .child(ATOM_TITLE)
        .map(|title| title.text().trim().to_string())
        .ok_or_else(|| missing(root, "title"))?;

    let mut feed = JsonFeed::new(title);
    feed.items = root
        .children_named(ATOM_ENTRY)
        .map(parse_item)
        .collect::<Result<Vec<_>, ParseError>>()?;

    Ok(feed)
}

/// Channel metadata must be present, but may be empty
fn channel_field(
    channel: &Element,
    name: ElementName,
    field: &'static str,
) -> Result<String, ParseError> {
    channel
        .child(name)
        .map(|element| element.text().trim().to_string())
        .ok_or_else(|| missing(channel, field))
}

/// Shared parser for RSS `<item>` and Atom `<entry>`
fn parse_item(item: &Element) -> Result<FeedItem, ParseError> {
    let id = required(item, "id", ID_CHAIN)?;
    let url = required(item, "url", URL_CHAIN)?;
    let title = required(item, "title", TITLE_CHAIN)?;
    let content_html = required(item, "content_html", CONTENT_CHAIN)?;

    let date_published = first_present(item, DATE_CHAIN);
    if date_published.is_none() {
        tracing::debug!("Item {} has no published date", id);
    }

    let attachments = parse_enclosure(item)?.into_iter().collect();

    Ok(FeedItem {
        id,
        url,
        title,
        content_html,
        date_published,
        attachments,
    })
}

fn first_present(element: &Element, chain: &[Accessor]) -> Option<String> {
    chain.iter().find_map(|accessor| accessor(element))
}

fn required(
    element: &Element,
    field: &'static str,
    chain: &[Accessor],
) -> Result<String, ParseError> {
    first_present(element, chain).ok_or_else(|| missing(element, field))
}

fn missing(element: &Element, field: &'static str) -> ParseError {
    ParseError::MissingRequiredField {
        element: element.local_name().to_string(),
        field,
    }
}

fn guid(item: &Element) -> Option<String> {
    item.child_text(GUID)
}

fn atom_id(item: &Element) -> Option<String> {
    item.child_text(ATOM_ID)
}

fn rss_link(item: &Element) -> Option<String> {
    item.child_text(LINK)
}

/// Atom links carry the URL in `href`; the alternate (or rel-less) link is the item URL
fn atom_link(item: &Element) -> Option<String> {
    item.children_named(ATOM_LINK)
        .find(|link| matches!(link.attr("rel"), None | Some("alternate")))
        .and_then(|link| link.attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

fn rss_title(item: &Element) -> Option<String> {
    item.child_text(TITLE)
}

fn atom_title(item: &Element) -> Option<String> {
    item.child_text(ATOM_TITLE)
}

fn description(item: &Element) -> Option<String> {
    item.child_text(DESCRIPTION)
}

fn atom_content(item: &Element) -> Option<String> {
    item.child_text(ATOM_CONTENT)
}

fn pub_date(item: &Element) -> Option<String> {
    item.child_text(PUB_DATE)
}

fn atom_published(item: &Element) -> Option<String> {
    item.child_text(ATOM_PUBLISHED)
}

fn updated(item: &Element) -> Option<String> {
    item.child_text(UPDATED)
}

fn atom_updated(item: &Element) -> Option<String> {
    item.child_text(ATOM_UPDATED)
}

/// Builds the single attachment of an item, if it has an enclosure
///
/// RSS uses `<enclosure url type length>`; Atom uses
/// `<link rel="enclosure" href type length>`.
fn parse_enclosure(item: &Element) -> Result<Option<Attachment>, ParseError> {
    let (enclosure, url_attr) = match item.child(ENCLOSURE) {
        Some(enclosure) => (enclosure, "url"),
        None => match item
            .children_named(ATOM_LINK)
            .find(|link| link.attr("rel") == Some("enclosure"))
        {
            Some(link) => (link, "href"),
            None => return Ok(None),
        },
    };

    let url = enclosure
        .attr(url_attr)
        .ok_or_else(|| missing(enclosure, "url"))?;
    let mime_type = enclosure
        .attr("type")
        .ok_or_else(|| missing(enclosure, "type"))?;
    let size_in_bytes = enclosure
        .attr("length")
        .and_then(|length| length.trim().parse::<u64>().ok());

    Ok(Some(Attachment {
        url: url.trim().to_string(),
        mime_type: mime_type.trim().to_string(),
        size_in_bytes,
    }))
}
