//! Minimal tree-structured XML document built on `quick-xml`.
//!
//! Season catalogues and the local anime registry are small XML files that are
//! read and written as whole documents. The reader streams `quick-xml` events
//! into an owned element tree; the writer replays the tree through a
//! `quick_xml::Writer` with tab indentation.
//!
//! Typed read/write accessors live in [`access`].

pub mod access;

pub use access::{
    attr_or_create, child_or_create, dump, read_int, read_str, save_document, write_child_nodes,
    write_int, write_str,
};

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading or writing XML documents.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed XML: {0}")]
    Parse(String),

    #[error("Failed to write XML: {0}")]
    Write(String),
}

/// Kind of character data appended by the write helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlNodeType {
    #[default]
    Text,
    CData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

/// An element with its attributes and ordered child nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub(crate) name: String,
    pub(crate) attributes: Vec<XmlAttribute>,
    pub(crate) children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Value of the named attribute, or an empty string when absent.
    #[must_use]
    pub fn attribute_value(&self, name: &str) -> &str {
        self.attribute(name).map_or("", |a| a.value.as_str())
    }

    pub fn append_attribute(&mut self, name: impl Into<String>) -> &mut XmlAttribute {
        let index = self.attributes.len();
        self.attributes.push(XmlAttribute {
            name: name.into(),
            value: String::new(),
        });
        &mut self.attributes[index]
    }

    pub(crate) fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    #[must_use]
    pub fn nodes(&self) -> &[XmlNode] {
        &self.children
    }

    /// First child element with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.elements().find(|e| e.name == name)
    }

    pub(crate) fn child_index(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if e.name == name))
    }

    pub(crate) fn element_at_mut(&mut self, index: usize) -> Option<&mut Self> {
        match self.children.get_mut(index) {
            Some(XmlNode::Element(element)) => Some(element),
            _ => None,
        }
    }

    /// All child elements with the given name, in document order.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// All child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn append_child(&mut self, name: impl Into<String>) -> &mut Self {
        let index = self.children.len();
        self.children.push(XmlNode::Element(Self::new(name)));
        match &mut self.children[index] {
            XmlNode::Element(element) => element,
            _ => unreachable!("an element was pushed at this index"),
        }
    }

    pub fn append_node(&mut self, node: XmlNode) {
        self.children.push(node);
    }

    /// Value of the first text or CDATA child.
    #[must_use]
    pub fn text(&self) -> &str {
        self.children
            .iter()
            .find_map(|node| match node {
                XmlNode::Text(value) | XmlNode::CData(value) => Some(value.as_str()),
                XmlNode::Element(_) => None,
            })
            .unwrap_or("")
    }

    /// Text of the named child element, or an empty string when absent.
    #[must_use]
    pub fn child_value(&self, name: &str) -> &str {
        self.child(name).map_or("", Self::text)
    }

    /// Replaces the first character data child, or appends a text node.
    pub fn set_text(&mut self, value: impl Into<String>) {
        let value = value.into();
        let existing = self.children.iter_mut().find_map(|node| match node {
            XmlNode::Text(text) | XmlNode::CData(text) => Some(text),
            XmlNode::Element(_) => None,
        });

        match existing {
            Some(text) => *text = value,
            None => self.children.push(XmlNode::Text(value)),
        }
    }

    fn push_text(&mut self, value: &str) {
        if let Some(XmlNode::Text(existing)) = self.children.last_mut() {
            existing.push_str(value);
        } else {
            self.children.push(XmlNode::Text(value.to_owned()));
        }
    }

    fn drop_whitespace_text(&mut self) {
        self.children
            .retain(|node| !matches!(node, XmlNode::Text(text) if text.trim().is_empty()));
    }
}

/// A parsed or constructed document. The root is a nameless element whose
/// children are the top-level nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.root.child(name)
    }

    pub fn append_child(&mut self, name: impl Into<String>) -> &mut XmlElement {
        self.root.append_child(name)
    }

    pub fn load_file(path: &Path) -> Result<Self, XmlError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses a document from text. A leading byte-order mark is ignored and
    /// whitespace-only text between elements is dropped.
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        let mut reader = Reader::from_str(input);
        let mut stack = vec![XmlElement::default()];

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => stack.push(element_from_start(&start)?),
                Ok(Event::Empty(start)) => {
                    let element = element_from_start(&start)?;
                    current(&mut stack)?.append_node(XmlNode::Element(element));
                }
                Ok(Event::End(_)) => {
                    if stack.len() < 2 {
                        return Err(XmlError::Parse(format!(
                            "unexpected closing tag at position {}",
                            reader.buffer_position()
                        )));
                    }
                    let Some(mut element) = stack.pop() else {
                        break;
                    };
                    element.drop_whitespace_text();
                    current(&mut stack)?.append_node(XmlNode::Element(element));
                }
                Ok(Event::Text(text)) => {
                    let raw = String::from_utf8_lossy(&text);
                    let value = quick_xml::escape::unescape(&raw)
                        .map_err(|e| XmlError::Parse(e.to_string()))?;
                    current(&mut stack)?.push_text(&value);
                }
                Ok(Event::CData(cdata)) => {
                    let value = String::from_utf8_lossy(&cdata).into_owned();
                    current(&mut stack)?.append_node(XmlNode::CData(value));
                }
                Ok(Event::GeneralRef(reference)) => {
                    let name = String::from_utf8_lossy(&reference);
                    let value = resolve_reference(&name).ok_or_else(|| {
                        XmlError::Parse(format!("unknown entity reference: &{name};"))
                    })?;
                    current(&mut stack)?.push_text(&value);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(XmlError::Parse(format!(
                        "{e} at position {}",
                        reader.error_position()
                    )));
                }
            }
        }

        if stack.len() != 1 {
            return Err(XmlError::Parse("unclosed element at end of input".into()));
        }

        let mut root = stack.pop().unwrap_or_default();
        root.drop_whitespace_text();
        Ok(Self { root })
    }

    /// Writes the document with an XML declaration and tab indentation.
    pub fn write_to<W: Write>(&self, inner: W) -> Result<(), XmlError> {
        let mut writer = Writer::new_with_indent(inner, b'\t', 1);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| XmlError::Write(e.to_string()))?;

        for node in &self.root.children {
            write_node(&mut writer, node)?;
        }

        writer
            .into_inner()
            .write_all(b"\n")
            .map_err(XmlError::from)
    }
}

fn current(stack: &mut [XmlElement]) -> Result<&mut XmlElement, XmlError> {
    stack
        .last_mut()
        .ok_or_else(|| XmlError::Parse("element stack underflow".into()))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| XmlError::Parse(e.to_string()))?;
        let raw = String::from_utf8_lossy(&attribute.value);
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|e| XmlError::Parse(e.to_string()))?
            .into_owned();

        element.attributes.push(XmlAttribute {
            name: String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
            value,
        });
    }

    Ok(element)
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(code) = name.strip_prefix('#') {
        let code = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    quick_xml::escape::resolve_predefined_entity(name).map(str::to_owned)
}

pub(crate) fn write_node<W: Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<(), XmlError> {
    let result = match node {
        XmlNode::Element(element) => return write_element(writer, element),
        XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text))),
        XmlNode::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str()))),
    };
    result.map_err(|e| XmlError::Write(e.to_string()))
}

pub(crate) fn write_element<W: Write>(
    writer: &mut Writer<W>,
    element: &XmlElement,
) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for attribute in &element.attributes {
        start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| XmlError::Write(e.to_string()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| XmlError::Write(e.to_string()))?;

    for node in &element.children {
        write_node(writer, node)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| XmlError::Write(e.to_string()))
}
