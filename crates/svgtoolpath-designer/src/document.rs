//! Styled element tree.
//!
//! The XML document is read once with `roxmltree` and copied into an owned
//! tree of [`StyledElement`]s so it can be rewritten (`<use>` expansion)
//! before styles are resolved. Every element carries a [`NodeId`] that stays
//! stable for the lifetime of the tree and keys the resolved style map.

use std::collections::HashMap;
use std::fmt;
use svgtoolpath_core::error::DocumentError;
use tracing::debug;

/// Namespace of SVG elements.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
/// Namespace of `xlink:` attributes.
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Identity of an element within one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out fresh node identities.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: usize,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// An element of the drawing with its attributes and owned children.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledElement {
    pub id: NodeId,
    /// Local tag name, lowercased
    pub tag: String,
    /// `false` for elements from foreign namespaces (editor metadata and the like)
    pub in_svg_namespace: bool,
    pub attributes: HashMap<String, String>,
    pub children: Vec<StyledElement>,
    /// Character data before the first child
    pub text: Option<String>,
    /// Character data between the end of this element and the next sibling
    pub tail: Option<String>,
}

impl StyledElement {
    pub fn new(id: NodeId, tag: impl Into<String>) -> Self {
        Self {
            id,
            tag: tag.into().to_ascii_lowercase(),
            in_svg_namespace: true,
            attributes: HashMap::new(),
            children: Vec::new(),
            text: None,
            tail: None,
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: StyledElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attribute value, or `default` when it is missing.
    pub fn attr_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.attr(name).unwrap_or(default)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn is(&self, tag: &str) -> bool {
        self.in_svg_namespace && self.tag == tag
    }

    /// All character data in this element and its descendants, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
            if let Some(tail) = &child.tail {
                out.push_str(tail);
            }
        }
    }

    /// Deep copy in which every element gets a fresh identity.
    pub fn copy_with_fresh_ids(&self, ids: &mut IdAllocator) -> StyledElement {
        StyledElement {
            id: ids.allocate(),
            tag: self.tag.clone(),
            in_svg_namespace: self.in_svg_namespace,
            attributes: self.attributes.clone(),
            children: self
                .children
                .iter()
                .map(|child| child.copy_with_fresh_ids(ids))
                .collect(),
            text: self.text.clone(),
            tail: self.tail.clone(),
        }
    }

    /// Number of elements in this subtree, including this one.
    pub fn element_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(StyledElement::element_count)
            .sum::<usize>()
    }

    /// Visits this element and all descendants depth-first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a StyledElement)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// A parsed drawing: the root `<svg>` element plus its id allocator.
#[derive(Debug)]
pub struct Document {
    pub root: StyledElement,
    pub ids: IdAllocator,
}

impl Document {
    /// Parses SVG source text.
    ///
    /// Fails only if the XML is not well-formed or the root is not `<svg>`.
    pub fn parse(source: &str) -> Result<Self, DocumentError> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let xml = roxmltree::Document::parse_with_options(source, options).map_err(|e| {
            let pos = e.pos();
            DocumentError::MalformedXml {
                position: format!("{}:{}", pos.row, pos.col),
                reason: e.to_string(),
            }
        })?;

        let root_node = xml.root_element();
        let root_tag = root_node.tag_name().name();
        if !root_tag.eq_ignore_ascii_case("svg") {
            return Err(DocumentError::NotSvg {
                tag: root_tag.to_string(),
            });
        }

        let mut ids = IdAllocator::new();
        let root = convert_node(root_node, &mut ids);
        debug!(elements = root.element_count(), "Parsed SVG document");
        Ok(Self { root, ids })
    }

    /// Wraps an already built tree. Identities above the tree's maximum are
    /// handed out for future copies.
    pub fn from_root(root: StyledElement) -> Self {
        let mut max = root.id.0;
        root.walk(&mut |element| max = max.max(element.id.0));
        Self {
            root,
            ids: IdAllocator { next: max + 1 },
        }
    }
}

fn convert_node(node: roxmltree::Node<'_, '_>, ids: &mut IdAllocator) -> StyledElement {
    let tag_name = node.tag_name();
    let mut element = StyledElement::new(ids.allocate(), tag_name.name());
    element.in_svg_namespace = matches!(tag_name.namespace(), None | Some(SVG_NAMESPACE));

    for attribute in node.attributes() {
        let key = match attribute.namespace() {
            None => attribute.name().to_string(),
            Some(XLINK_NAMESPACE) => format!("xlink:{}", attribute.name()),
            Some(XML_NAMESPACE) => format!("xml:{}", attribute.name()),
            Some(_) => continue,
        };
        element.attributes.insert(key, attribute.value().to_string());
    }

    for child in node.children() {
        if child.is_element() {
            element.children.push(convert_node(child, ids));
        } else if let Some(t) = child.text().filter(|_| child.is_text()) {
            let slot = match element.children.last_mut() {
                Some(previous) => &mut previous.tail,
                None => &mut element.text,
            };
            slot.get_or_insert_with(String::new).push_str(t);
        }
    }

    element
}
