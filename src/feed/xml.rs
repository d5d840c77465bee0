//! Minimal namespace-aware element tree
//!
//! Feeds are small, so the whole document is read into a tree of [`Element`]s
//! with namespaces already resolved. Lookups then match on
//! `(namespace, local name)` pairs instead of prefixes, which is what makes
//! `<atom:link>`, `<link xmlns="http://www.w3.org/2005/Atom">` and
//! `<a:link>` the same element.
//!
//! DTD processing is never performed: a DOCTYPE declaring entities is
//! rejected, and any entity reference other than the five predefined ones
//! fails to unescape.

use crate::feed::ParseError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::borrow::Cow;

/// Atom 1.0 namespace
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// iTunes podcast namespace
pub const ITUNES_NS: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";

/// A namespace-qualified element name used for lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementName {
    pub namespace: Option<&'static str>,
    pub local: &'static str,
}

impl ElementName {
    /// An element in no namespace (plain RSS 2.0 elements)
    pub const fn plain(local: &'static str) -> Self {
        Self {
            namespace: None,
            local,
        }
    }

    /// An element in the Atom namespace
    pub const fn atom(local: &'static str) -> Self {
        Self {
            namespace: Some(ATOM_NS),
            local,
        }
    }

    /// An element in the iTunes namespace
    pub const fn itunes(local: &'static str) -> Self {
        Self {
            namespace: Some(ITUNES_NS),
            local,
        }
    }
}

/// An XML element with resolved namespace, attributes, text and children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    namespace: Option<String>,
    local_name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// Local (unprefixed) element name
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Resolved namespace URI, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Name in Clark notation: `{namespace}local`, or just `local`
    pub fn clark_name(&self) -> Cow<'_, str> {
        match &self.namespace {
            Some(ns) => Cow::Owned(format!("{{{}}}{}", ns, self.local_name)),
            None => Cow::Borrowed(&self.local_name),
        }
    }

    /// Character data directly inside this element (text and CDATA, unescaped)
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Value of an attribute, looked up by its name as written
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns true if this element has the given qualified name
    pub fn is(&self, name: ElementName) -> bool {
        self.local_name == name.local && self.namespace.as_deref() == name.namespace
    }

    /// First direct child with the given name
    pub fn child(&self, name: ElementName) -> Option<&Element> {
        self.children.iter().find(|child| child.is(name))
    }

    /// All direct children with the given name, in document order
    pub fn children_named(&self, name: ElementName) -> impl Iterator<Item = &Element> {
        self.children.iter().filter(move |child| child.is(name))
    }

    /// Trimmed text of the first matching child
    ///
    /// A present but empty child yields `Some("")`.
    pub fn child_text(&self, name: ElementName) -> Option<String> {
        self.child(name).map(|child| child.text.trim().to_string())
    }

    fn from_start(namespace: &ResolveResult, start: &BytesStart) -> Result<Self, ParseError> {
        let local_name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let namespace = match namespace {
            ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(prefix) => {
                return Err(ParseError::Malformed(format!(
                    "unbound namespace prefix '{}' on <{}>",
                    String::from_utf8_lossy(prefix),
                    local_name
                )))
            }
        };

        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| ParseError::Malformed(e.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| ParseError::Malformed(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            namespace,
            local_name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }
}

/// Parses a complete XML document and returns its root element
pub fn parse_document(input: &str) -> Result<Element, ParseError> {
    let mut reader = NsReader::from_str(input);
    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event() {
            Ok((namespace, Event::Start(start))) => {
                open.push(Element::from_start(&namespace, &start)?);
            }
            Ok((namespace, Event::Empty(start))) => {
                let element = Element::from_start(&namespace, &start)?;
                attach(&mut open, &mut root, element)?;
            }
            Ok((_, Event::End(_))) => {
                let element = open
                    .pop()
                    .ok_or_else(|| ParseError::Malformed("unexpected closing tag".to_string()))?;
                attach(&mut open, &mut root, element)?;
            }
            Ok((_, Event::Text(text))) => {
                let text = text
                    .unescape()
                    .map_err(|e| ParseError::Malformed(e.to_string()))?;
                push_text(&mut open, &text)?;
            }
            Ok((_, Event::CData(cdata))) => {
                let bytes = cdata.into_inner();
                push_text(&mut open, &String::from_utf8_lossy(&bytes))?;
            }
            Ok((_, Event::DocType(doctype))) => {
                if String::from_utf8_lossy(&doctype).contains("<!ENTITY") {
                    return Err(ParseError::Malformed(
                        "entity declarations are not allowed".to_string(),
                    ));
                }
            }
            Ok((_, Event::Eof)) => break,
            // Declarations, comments and processing instructions carry no feed data
            Ok(_) => {}
            Err(e) => return Err(ParseError::Malformed(e.to_string())),
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(ParseError::Malformed(format!(
            "unclosed element <{}>",
            unclosed.local_name
        )));
    }

    root.ok_or_else(|| ParseError::Malformed("document has no root element".to_string()))
}

fn attach(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ParseError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(ParseError::Malformed(
                "multiple root elements".to_string(),
            ))
        }
    }
    Ok(())
}

fn push_text(open: &mut [Element], text: &str) -> Result<(), ParseError> {
    match open.last_mut() {
        Some(parent) => parent.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => {
            return Err(ParseError::Malformed(
                "text outside the root element".to_string(),
            ))
        }
    }
    Ok(())
}
