//! Table-driven mapping between entity fields and Atom entry elements.
//!
//! Each entity describes its wire format as a slice of [`Binding`]s. Decoding
//! walks the direct children of the entry root and feeds every matching
//! binding; encoding rewrites matching children of a template in place and
//! never adds elements the template lacks.

use xmltree::{Element, EmitterConfig, Namespace, XMLNode};

use crate::error::CalendarError;

pub(crate) const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub(crate) const GCAL_NS: &str = "http://schemas.google.com/gCal/2005";
pub(crate) const GD_NS: &str = "http://schemas.google.com/g/2005";
pub(crate) const APP_NS: &str = "http://www.w3.org/2007/app";
pub(crate) const GEORSS_NS: &str = "http://www.georss.org/georss";
pub(crate) const GML_NS: &str = "http://www.opengis.net/gml";

/// Declarations an entry needs to parse once lifted out of its feed.
const ENTRY_NAMESPACES: [(&str, &str); 6] = [
    ("gCal", GCAL_NS),
    ("gd", GD_NS),
    ("app", APP_NS),
    ("", ATOM_NS),
    ("georss", GEORSS_NS),
    ("gml", GML_NS),
];

/// Where a field's value lives on its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Element text content.
    Text,
    /// The named attribute.
    Attr(&'static str),
    /// `href` of a `link` whose `rel` equals the given value.
    Link(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Binding<F> {
    pub element: &'static str,
    pub slot: Slot,
    pub field: F,
    pub writable: bool,
}

impl<F> Binding<F> {
    pub(crate) const fn rw(element: &'static str, slot: Slot, field: F) -> Self {
        Self {
            element,
            slot,
            field,
            writable: true,
        }
    }

    pub(crate) const fn ro(element: &'static str, slot: Slot, field: F) -> Self {
        Self {
            element,
            slot,
            field,
            writable: false,
        }
    }
}

/// String view of an entity's bound fields.
pub(crate) trait FieldMap {
    type Field: Copy;

    fn get(&self, field: Self::Field) -> Option<String>;
    fn set(&mut self, field: Self::Field, value: Option<String>);
}

/// Boolean attributes are true only for the literal `"true"`.
pub(crate) fn parse_flag(value: Option<&str>) -> bool {
    value == Some("true")
}

pub(crate) fn child_elements(parent: &Element) -> impl Iterator<Item = &Element> {
    parent.children.iter().filter_map(|node| match node {
        XMLNode::Element(element) => Some(element),
        _ => None,
    })
}

pub(crate) fn parse(xml: &str) -> Result<Element, CalendarError> {
    Ok(Element::parse(xml.as_bytes())?)
}

pub(crate) fn decode<M: FieldMap>(root: &Element, bindings: &[Binding<M::Field>], target: &mut M) {
    for child in child_elements(root) {
        for binding in bindings.iter().filter(|b| b.element == child.name) {
            match binding.slot {
                Slot::Text => {
                    target.set(binding.field, child.get_text().map(|t| t.into_owned()));
                }
                Slot::Attr(attr) => {
                    target.set(binding.field, child.attributes.get(attr).cloned());
                }
                Slot::Link(rel) => {
                    if child.attributes.get("rel").map(String::as_str) == Some(rel) {
                        target.set(binding.field, child.attributes.get("href").cloned());
                    }
                }
            }
        }
    }
}

pub(crate) fn encode<M: FieldMap>(root: &mut Element, bindings: &[Binding<M::Field>], source: &M) {
    for node in root.children.iter_mut() {
        let XMLNode::Element(child) = node else {
            continue;
        };
        let name = child.name.clone();

        for binding in bindings.iter().filter(|b| b.writable && b.element == name) {
            let value = source.get(binding.field);
            match binding.slot {
                Slot::Text => {
                    child
                        .children
                        .retain(|n| !matches!(n, XMLNode::Text(_) | XMLNode::CData(_)));
                    if let Some(text) = value {
                        child.children.push(XMLNode::Text(text));
                    }
                }
                Slot::Attr(attr) => match value {
                    Some(value) => {
                        child.attributes.insert(attr.to_string(), value);
                    }
                    None => {
                        child.attributes.remove(attr);
                    }
                },
                Slot::Link(_) => {}
            }
        }
    }
}

/// The `entry` children of a feed document, detached from the feed.
pub(crate) fn feed_entries(body: &str) -> Result<Vec<Element>, CalendarError> {
    let feed = parse(body)?;
    Ok(feed
        .children
        .into_iter()
        .filter_map(|node| match node {
            XMLNode::Element(element) if element.name == "entry" => Some(element),
            _ => None,
        })
        .collect())
}

/// Declare the service namespaces on `entry` so its serialized form parses
/// on its own. Existing declarations win.
pub(crate) fn declare_entry_namespaces(entry: &mut Element) {
    let namespaces = entry.namespaces.get_or_insert_with(Namespace::empty);
    for (prefix, uri) in ENTRY_NAMESPACES {
        namespaces.put(prefix, uri);
    }
}

/// Serialize a whole document, XML declaration included.
pub(crate) fn write_document(root: &Element) -> Result<String, CalendarError> {
    let mut buf = Vec::new();
    root.write(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Serialize an element without the XML declaration.
pub(crate) fn write_fragment(element: &Element) -> Result<String, CalendarError> {
    let mut buf = Vec::new();
    let config = EmitterConfig::new().write_document_declaration(false);
    element.write_with_config(&mut buf, config)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
