// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Minimal in-memory XML tree over `quick-xml`'s event stream.
//!
//! Both XML-shaped codecs (SVG parse and the draw.io importer) walk parsed
//! documents structurally: ancestor transform chains, scoped child lookups,
//! text content. A tiny owned tree is a better fit for that than re-driving
//! the event reader per query. Namespace prefixes are dropped; the formats we
//! read never rely on prefix distinctions.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct XmlElement {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// All element descendants in document order, excluding `self`.
    pub(crate) fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        collect_descendants(self, &mut out);
        out
    }

    /// First descendant with the given (local) name, depth-first.
    pub(crate) fn first_descendant(&self, name: &str) -> Option<&XmlElement> {
        for child in self.child_elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.first_descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text of this element and all descendants.
    pub(crate) fn text_content(&self) -> String {
        let mut out = String::new();
        append_text(self, &mut out);
        out
    }
}

fn collect_descendants<'a>(element: &'a XmlElement, out: &mut Vec<&'a XmlElement>) {
    for child in element.child_elements() {
        out.push(child);
        collect_descendants(child, out);
    }
}

fn append_text(element: &XmlElement, out: &mut String) {
    for node in &element.children {
        match node {
            XmlNode::Text(text) => out.push_str(text),
            XmlNode::Element(child) => append_text(child, out),
        }
    }
}

/// Parses a document and returns its root element, or `None` when the text
/// is not well-formed XML. Malformed input degrades to "no document"; it is
/// never an error the caller has to unwind from.
pub(crate) fn parse_document(text: &str) -> Option<XmlElement> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<XmlElement> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(element_from_start(&start)?);
            }
            Ok(Event::Empty(start)) => {
                let element = element_from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(element)),
                    None => return Some(element),
                }
            }
            Ok(Event::End(_)) => {
                let element = stack.pop()?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(element)),
                    None => return Some(element),
                }
            }
            Ok(Event::Text(text)) => {
                let Ok(text) = text.unescape() else {
                    return None;
                };
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(text.into_owned()));
                }
            }
            Ok(Event::CData(cdata)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Ok(Event::Eof) => return None,
            Ok(_) => {}
            Err(_) => return None,
        }
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Option<XmlElement> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let Ok(attr) = attr else {
            return None;
        };
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let Ok(value) = attr.unescape_value() else {
            return None;
        };
        attrs.push((key, value.into_owned()));
    }
    Some(XmlElement {
        name,
        attrs,
        children: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::parse_document;

    #[test]
    fn parses_nested_elements_attributes_and_text() {
        let root = parse_document(r#"<a x="1"><b y="2">hi</b><c/> tail</a>"#).expect("root");
        assert_eq!(root.name(), "a");
        assert_eq!(root.attr("x"), Some("1"));

        let children: Vec<_> = root.child_elements().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name(), "b");
        assert_eq!(children[0].attr("y"), Some("2"));
        assert_eq!(children[0].text_content(), "hi");
        assert_eq!(children[1].name(), "c");
    }

    #[test]
    fn unescapes_entities_in_text_and_attributes() {
        let root = parse_document(r#"<a v="&lt;b&gt;">x &amp; y</a>"#).expect("root");
        assert_eq!(root.attr("v"), Some("<b>"));
        assert_eq!(root.text_content(), "x & y");
    }

    #[test]
    fn first_descendant_searches_depth_first() {
        let root = parse_document("<a><b><c id=\"deep\"/></b><c id=\"shallow\"/></a>").expect("root");
        assert_eq!(root.first_descendant("c").and_then(|c| c.attr("id")), Some("deep"));
    }

    #[test]
    fn drops_namespace_prefixes() {
        let root = parse_document(r#"<svg:g xmlns:svg="s"><svg:rect/></svg:g>"#).expect("root");
        assert_eq!(root.name(), "g");
        assert!(root.first_descendant("rect").is_some());
    }

    #[test]
    fn malformed_input_yields_none() {
        assert!(parse_document("<a><b></a>").is_none());
        assert!(parse_document("not xml at all").is_none());
        assert!(parse_document("").is_none());
    }
}
