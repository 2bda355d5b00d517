//! Namespace-aware XML access for CDA documents.
//!
//! A document is parsed once into an arena of nodes stored in document
//! order; [`Element`] handles borrow from the arena. Lookups go through a
//! small path language (see [`path`]) bound to the fixed `v3`/`xsi`
//! prefix table, and an absent node is always a normal `None`/empty result.

mod path;

use std::collections::HashMap;

use quick_xml::NsReader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};

use crate::error::{IngestError, Result};

pub use path::PathExpr;

/// HL7 version 3 namespace, bound to the `v3` prefix.
pub const HL7_V3_NS: &str = "urn:hl7-org:v3";

/// XML Schema instance namespace, bound to the `xsi` prefix.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Prefix table used by every path expression.
pub const NAMESPACES: [(&str, &str); 2] = [("v3", HL7_V3_NS), ("xsi", XSI_NS)];

/// Resolves a path prefix against [`NAMESPACES`].
pub fn namespace_for_prefix(prefix: &str) -> Option<&'static str> {
    NAMESPACES
        .iter()
        .find(|(bound, _)| *bound == prefix)
        .map(|(_, uri)| *uri)
}

#[derive(Debug, Clone)]
struct Attribute {
    namespace: Option<String>,
    name: String,
    value: String,
}

#[derive(Debug, Clone)]
enum Content {
    Element(usize),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    namespace: Option<String>,
    name: String,
    attributes: Vec<Attribute>,
    content: Vec<Content>,
    parent: Option<usize>,
    /// One past the last descendant index.
    end: usize,
}

/// A parsed XML document.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    file_name: String,
    nodes: Vec<Node>,
    ids: HashMap<String, usize>,
}

impl XmlDocument {
    /// Parses a document, failing with [`IngestError::MalformedXml`] naming
    /// `file_name` when the text is not well-formed.
    pub fn parse(file_name: &str, text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let malformed = |message: String| IngestError::MalformedXml {
            file: file_name.to_string(),
            message,
        };

        let mut reader = NsReader::from_str(text);
        let mut builder = TreeBuilder::default();

        loop {
            let (resolved, event) = reader
                .read_resolved_event()
                .map_err(|e| malformed(e.to_string()))?;
            let namespace = namespace_uri(resolved);

            match event {
                Event::Start(start) => {
                    let namespace = namespace.map_err(malformed)?;
                    let element = read_element(&reader, &start, namespace).map_err(malformed)?;
                    builder.open(element).map_err(malformed)?;
                }
                Event::Empty(start) => {
                    let namespace = namespace.map_err(malformed)?;
                    let element = read_element(&reader, &start, namespace).map_err(malformed)?;
                    builder.open(element).map_err(malformed)?;
                    builder.close().map_err(malformed)?;
                }
                Event::End(_) => builder.close().map_err(malformed)?,
                Event::Text(text) => {
                    let decoded = text.decode().map_err(|e| malformed(e.to_string()))?;
                    builder.text(&decoded).map_err(malformed)?;
                }
                Event::CData(data) => {
                    let decoded = data.decode().map_err(|e| malformed(e.to_string()))?;
                    builder.text(&decoded).map_err(malformed)?;
                }
                Event::GeneralRef(reference) => {
                    let resolved = match reference
                        .resolve_char_ref()
                        .map_err(|e| malformed(e.to_string()))?
                    {
                        Some(ch) => ch.to_string(),
                        None => {
                            let name = reference.decode().map_err(|e| malformed(e.to_string()))?;
                            resolve_predefined_entity(&name)
                                .ok_or_else(|| malformed(format!("unknown entity '&{name};'")))?
                                .to_string()
                        }
                    };
                    builder.text(&resolved).map_err(malformed)?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        let (nodes, ids) = builder.finish().map_err(malformed)?;
        Ok(Self {
            file_name: file_name.to_string(),
            nodes,
            ids,
        })
    }

    /// Name of the file this document was parsed from.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn root(&self) -> Element<'_> {
        Element { doc: self, index: 0 }
    }

    /// Evaluates a path expression against the root element.
    pub fn select(&self, expr: &str) -> Result<Vec<Element<'_>>> {
        self.root().select(expr)
    }

    pub fn select_first(&self, expr: &str) -> Result<Option<Element<'_>>> {
        self.root().select_first(expr)
    }

    /// Looks up the element carrying `ID="id"`.
    pub fn element_by_id(&self, id: &str) -> Option<Element<'_>> {
        self.ids
            .get(id)
            .map(|&index| Element { doc: self, index })
    }

    /// Resolves a `#ID` narrative reference to the referenced element's
    /// whitespace-collapsed text. Blank results are `None`.
    pub fn resolve_reference(&self, reference: &str) -> Option<String> {
        let id = reference.trim().trim_start_matches('#');
        if id.is_empty() {
            return None;
        }
        let text = self.element_by_id(id)?.collapsed_text();
        (!text.is_empty()).then_some(text)
    }

    fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }
}

/// A borrowed element of an [`XmlDocument`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'d> {
    doc: &'d XmlDocument,
    index: usize,
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.index == other.index
    }
}

impl Eq for Element<'_> {}

impl<'d> Element<'d> {
    fn node(&self) -> &'d Node {
        self.doc.node(self.index)
    }

    fn at(&self, index: usize) -> Element<'d> {
        Element {
            doc: self.doc,
            index,
        }
    }

    pub fn document(&self) -> &'d XmlDocument {
        self.doc
    }

    pub fn local_name(&self) -> &'d str {
        &self.node().name
    }

    pub fn namespace(&self) -> Option<&'d str> {
        self.node().namespace.as_deref()
    }

    /// Attribute value, trimmed; blank values count as absent.
    ///
    /// `name` may carry one of the fixed prefixes (`xsi:type`); a bare name
    /// matches only attributes without a namespace.
    pub fn attr(&self, name: &str) -> Option<&'d str> {
        match name.split_once(':') {
            Some((prefix, local)) => self.attr_ns(namespace_for_prefix(prefix)?, local),
            None => self.find_attr(None, name),
        }
    }

    /// Attribute value in an explicit namespace.
    pub fn attr_ns(&self, namespace: &str, name: &str) -> Option<&'d str> {
        self.find_attr(Some(namespace), name)
    }

    fn find_attr(&self, namespace: Option<&str>, name: &str) -> Option<&'d str> {
        self.node()
            .attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == namespace)
            .map(|a| a.value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn parent(&self) -> Option<Element<'d>> {
        self.node().parent.map(|index| self.at(index))
    }

    pub fn children(self) -> impl Iterator<Item = Element<'d>> {
        self.node().content.iter().filter_map(move |content| match content {
            Content::Element(index) => Some(self.at(*index)),
            Content::Text(_) => None,
        })
    }

    /// All descendant elements in document order.
    pub fn descendants(self) -> impl Iterator<Item = Element<'d>> {
        (self.index + 1..self.node().end).map(move |index| self.at(index))
    }

    /// Whether `other` lies strictly inside this element's subtree.
    pub fn contains(&self, other: Element<'_>) -> bool {
        std::ptr::eq(self.doc, other.doc)
            && other.index > self.index
            && other.index < self.node().end
    }

    /// Text fragments of this element and its descendants, in order.
    pub fn text_fragments(&self) -> Vec<&'d str> {
        let mut fragments = Vec::new();
        self.collect_text(&mut fragments);
        fragments
    }

    fn collect_text(&self, out: &mut Vec<&'d str>) {
        for content in &self.node().content {
            match content {
                Content::Text(text) => out.push(text),
                Content::Element(index) => self.at(*index).collect_text(out),
            }
        }
    }

    /// Concatenated descendant text, untouched.
    pub fn text(&self) -> String {
        self.text_fragments().concat()
    }

    /// Concatenated descendant text with whitespace runs collapsed to one
    /// space and the ends trimmed.
    pub fn collapsed_text(&self) -> String {
        collapse_whitespace(&self.text())
    }

    /// Evaluates a path expression with this element as context.
    pub fn select(&self, expr: &str) -> Result<Vec<Element<'d>>> {
        Ok(PathExpr::parse(expr)?.evaluate(*self))
    }

    pub fn select_first(&self, expr: &str) -> Result<Option<Element<'d>>> {
        Ok(self.select(expr)?.into_iter().next())
    }

    /// Attribute of the first element matching `expr`.
    pub fn select_attr(&self, expr: &str, name: &str) -> Result<Option<&'d str>> {
        Ok(self.select_first(expr)?.and_then(|element| element.attr(name)))
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }
}

/// Collapses whitespace runs to single spaces and trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn namespace_uri(resolved: ResolveResult<'_>) -> std::result::Result<Option<String>, String> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(String::from_utf8_lossy(uri).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        )),
    }
}

struct OpenElement {
    namespace: Option<String>,
    name: String,
    attributes: Vec<Attribute>,
}

fn read_element(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    namespace: Option<String>,
) -> std::result::Result<OpenElement, String> {
    let name = utf8(start.local_name().as_ref())?;
    let mut attributes = Vec::new();

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attribute.key);
        let namespace = namespace_uri(resolved)?;
        let value = attribute
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| e.to_string())?;
        attributes.push(Attribute {
            namespace,
            name: utf8(local.as_ref())?,
            value: value.into_owned(),
        });
    }

    Ok(OpenElement {
        namespace,
        name,
        attributes,
    })
}

fn utf8(bytes: &[u8]) -> std::result::Result<String, String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| e.to_string())
}

#[derive(Default)]
struct TreeBuilder {
    nodes: Vec<Node>,
    stack: Vec<usize>,
    ids: HashMap<String, usize>,
}

impl TreeBuilder {
    fn open(&mut self, element: OpenElement) -> std::result::Result<(), String> {
        let parent = self.stack.last().copied();
        if parent.is_none() && !self.nodes.is_empty() {
            return Err(format!(
                "multiple root elements: <{}> follows the closed root",
                element.name
            ));
        }

        let index = self.nodes.len();
        for attribute in &element.attributes {
            if attribute.namespace.is_none() && attribute.name == "ID" {
                self.ids
                    .entry(attribute.value.trim().to_string())
                    .or_insert(index);
            }
        }
        if let Some(parent) = parent {
            self.nodes[parent].content.push(Content::Element(index));
        }
        self.nodes.push(Node {
            namespace: element.namespace,
            name: element.name,
            attributes: element.attributes,
            content: Vec::new(),
            parent,
            end: index + 1,
        });
        self.stack.push(index);
        Ok(())
    }

    fn close(&mut self) -> std::result::Result<(), String> {
        let index = self
            .stack
            .pop()
            .ok_or_else(|| "closing tag without a matching opening tag".to_string())?;
        self.nodes[index].end = self.nodes.len();
        Ok(())
    }

    fn text(&mut self, text: &str) -> std::result::Result<(), String> {
        let Some(&current) = self.stack.last() else {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err("text content outside the root element".to_string());
        };
        let content = &mut self.nodes[current].content;
        if let Some(Content::Text(previous)) = content.last_mut() {
            previous.push_str(text);
        } else {
            content.push(Content::Text(text.to_string()));
        }
        Ok(())
    }

    fn finish(self) -> std::result::Result<(Vec<Node>, HashMap<String, usize>), String> {
        if let Some(&open) = self.stack.last() {
            return Err(format!(
                "unexpected end of document: <{}> is not closed",
                self.nodes[open].name
            ));
        }
        if self.nodes.is_empty() {
            return Err("document has no root element".to_string());
        }
        Ok((self.nodes, self.ids))
    }
}
