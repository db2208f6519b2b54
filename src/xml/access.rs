//! Typed accessors over [`XmlElement`] used by the season and registry files.

use super::{XmlAttribute, XmlDocument, XmlElement, XmlError, XmlNode, XmlNodeType, write_element};
use quick_xml::Writer;
use std::path::Path;
use tracing::debug;

const BYTE_ORDER_MARK: &[u8] = "\u{feff}".as_bytes();

/// Returns the named attribute, appending an empty one if it does not exist.
pub fn attr_or_create<'a>(node: &'a mut XmlElement, name: &str) -> &'a mut XmlAttribute {
    match node.attribute_index(name) {
        Some(index) => &mut node.attributes[index],
        None => node.append_attribute(name),
    }
}

/// Returns the first child element with this name, appending one if needed.
pub fn child_or_create<'a>(node: &'a mut XmlElement, name: &str) -> &'a mut XmlElement {
    match node.child_index(name) {
        Some(index) => match node.element_at_mut(index) {
            Some(element) => element,
            None => unreachable!("child_index only returns element positions"),
        },
        None => node.append_child(name),
    }
}

/// Serializes a subtree to text.
#[must_use]
pub fn dump(node: &XmlElement) -> String {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    if let Err(e) = write_element(&mut writer, node) {
        debug!(error = %e, element = node.name(), "Failed to dump XML element");
    }
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

/// Reads a child's text as an integer; missing or non-numeric text reads as 0.
#[must_use]
pub fn read_int(node: &XmlElement, name: &str) -> i32 {
    node.child_value(name).trim().parse().unwrap_or(0)
}

#[must_use]
pub fn read_str(node: &XmlElement, name: &str) -> String {
    node.child_value(name).to_owned()
}

pub fn write_int(node: &mut XmlElement, name: &str, value: i32) {
    node.append_child(name).set_text(value.to_string());
}

/// Appends `<name>` holding `value` as either a text or a CDATA node.
pub fn write_str(node: &mut XmlElement, name: &str, value: &str, node_type: XmlNodeType) {
    node.append_child(name).append_node(character_data(value, node_type));
}

/// Appends one `<name>` child per value.
pub fn write_child_nodes(
    parent: &mut XmlElement,
    values: &[String],
    name: &str,
    node_type: XmlNodeType,
) {
    for value in values {
        parent
            .append_child(name)
            .append_node(character_data(value, node_type));
    }
}

/// Saves a document with a byte-order mark and tab indentation, creating the
/// parent folder first.
pub fn save_document(document: &XmlDocument, path: &Path) -> Result<(), XmlError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut buffer = BYTE_ORDER_MARK.to_vec();
    document.write_to(&mut buffer)?;
    std::fs::write(path, buffer)?;

    debug!(path = %path.display(), "Saved XML document");
    Ok(())
}

fn character_data(value: &str, node_type: XmlNodeType) -> XmlNode {
    match node_type {
        // A CDATA section cannot contain its own terminator.
        XmlNodeType::CData if !value.contains("]]>") => XmlNode::CData(value.to_owned()),
        _ => XmlNode::Text(value.to_owned()),
    }
}
