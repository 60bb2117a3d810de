//! Minimal element tree over quick-xml events.
//!
//! E-utilities detail records are irregular: optional elements, inline markup
//! inside titles and abstracts, and the same element name appearing at several
//! depths. A small owned tree with document-order lookups keeps the per-record
//! extraction rules simple to state and to test.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Error raised when a document cannot be turned into a tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed XML at byte {position}: {message}")]
pub struct XmlError {
    pub position: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its attributes and children in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Parse a complete document and return its root element
    pub fn parse(xml: &str) -> Result<Element, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().check_end_names = true;

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let position = reader.buffer_position() as u64;
            let event = reader.read_event().map_err(|e| XmlError {
                position,
                message: e.to_string(),
            })?;

            match event {
                Event::Start(start) => stack.push(Element::open(&start)),
                Event::Empty(start) => {
                    attach(&mut stack, &mut root, Element::open(&start));
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| XmlError {
                        position,
                        message: "unexpected closing tag".to_string(),
                    })?;
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let value = match text.unescape() {
                            Ok(value) => value.into_owned(),
                            Err(_) => String::from_utf8_lossy(&text).into_owned(),
                        };
                        parent.children.push(Node::Text(value));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let value = String::from_utf8_lossy(&data).into_owned();
                        parent.children.push(Node::Text(value));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(XmlError {
                position: reader.buffer_position() as u64,
                message: format!("unclosed element <{}>", open.name),
            });
        }

        root.ok_or_else(|| XmlError {
            position: 0,
            message: "document has no root element".to_string(),
        })
    }

    fn open(start: &BytesStart<'_>) -> Element {
        let attributes = start
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = match attr.unescape_value() {
                    Ok(value) => value.into_owned(),
                    Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
                };
                (key, value)
            })
            .collect();

        Element {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct child elements
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// All direct children with the given name
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// First descendant (excluding `self`) with the given name, in document order
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants (excluding `self`) with the given name, in document order
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in self.elements() {
            if child.name == name {
                found.push(child);
            }
            child.collect_named(name, found);
        }
    }

    /// All text content including inline markup, trimmed
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.push_text(&mut text);
        text.trim().to_string()
    }

    /// Text content, or `None` when it is empty after trimming
    pub fn non_empty_text(&self) -> Option<String> {
        Some(self.text()).filter(|t| !t.is_empty())
    }

    fn push_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.push_text(out),
            }
        }
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
