// ABOUTME: Owned HTML node tree shared by the content normalizer and the block converter.
// ABOUTME: Converts scraper subtrees into plain data and serializes them back to HTML.

//! Owned node tree.
//!
//! `scraper::Html` is immutable and not `Send`, so the content fragment is
//! copied out of the parsed document into plain `Node` values. Every
//! normalization step takes a `Vec<Node>` and returns a new one.

use std::collections::HashSet;

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html};

/// A node in an owned HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// An element with lowercase name, attributes in source order, and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// Block-level tag names. Anything else is treated as inline content.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "dd",
    "details",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "html",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "summary",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "ul",
];

/// Returns true for block-level tag names.
pub fn is_block(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

/// Returns true for `h1`..`h6`.
pub fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children,
        }
    }

    /// Returns the value of an attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, replacing an existing value.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Clones the element's name and attributes with new children.
    pub fn shallow_clone(&self, children: Vec<Node>) -> Self {
        Self {
            name: self.name.clone(),
            attrs: self.attrs.clone(),
            children,
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn is_block(&self) -> bool {
        is_block(&self.name)
    }
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(s.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns true if this is an element with the given tag name.
    pub fn is_element(&self, name: &str) -> bool {
        matches!(self, Node::Element(el) if el.name == name)
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Node::Element(el) if el.is_block())
    }

    /// Returns true for text nodes made only of whitespace (or empty).
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(t) if t.chars().all(char::is_whitespace))
    }

    /// Concatenated text content (comments excluded).
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Element(el) => el.text(),
            Node::Comment(_) => String::new(),
        }
    }
}

/// Concatenated text content of a node list.
pub fn text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Comment(_) => {}
        }
    }
}

/// Returns true if the node list has any non-whitespace text.
pub fn has_visible_text(nodes: &[Node]) -> bool {
    nodes.iter().any(|n| match n {
        Node::Text(t) => t.chars().any(|c| !c.is_whitespace()),
        Node::Element(el) => has_visible_text(&el.children),
        Node::Comment(_) => false,
    })
}

/// Returns true if any descendant (or the list itself) contains the named element.
pub fn contains_element(nodes: &[Node], name: &str) -> bool {
    nodes.iter().any(|n| match n {
        Node::Element(el) => el.name == name || contains_element(&el.children, name),
        _ => false,
    })
}

/// Parses an HTML fragment into owned nodes.
///
/// The parser never fails; malformed markup is recovered the way browsers
/// recover it.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();
    let skip = HashSet::new();
    root.children()
        .filter_map(|child| convert_node(child, &skip))
        .collect()
}

/// Copies the children of `element` into owned nodes, omitting any subtree
/// whose id is in `skip`.
pub fn from_element(element: ElementRef<'_>, skip: &HashSet<NodeId>) -> Vec<Node> {
    element
        .children()
        .filter_map(|child| convert_node(child, skip))
        .collect()
}

fn convert_node(node: NodeRef<'_, scraper::Node>, skip: &HashSet<NodeId>) -> Option<Node> {
    if skip.contains(&node.id()) {
        return None;
    }
    match node.value() {
        scraper::Node::Text(text) => Some(Node::Text((&**text).to_string())),
        scraper::Node::Comment(comment) => Some(Node::Comment((&**comment).to_string())),
        scraper::Node::Element(el) => {
            let attrs = el
                .attrs()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect();
            let children = node
                .children()
                .filter_map(|child| convert_node(child, skip))
                .collect();
            Some(Node::Element(Element {
                name: el.name().to_ascii_lowercase(),
                attrs,
                children,
            }))
        }
        _ => None,
    }
}

/// Serializes nodes back to HTML.
///
/// Attribute values are double-quoted and escaped, text is escaped, and
/// void elements are written self-closing (`<img ... />`).
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

/// Serializes a single element including its own tags.
pub fn outer_html(el: &Element) -> String {
    let mut out = String::new();
    write_element(el, &mut out);
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => out.push_str(&escape_text(t)),
        Node::Comment(c) => {
            out.push_str("<!--");
            out.push_str(c);
            out.push_str("-->");
        }
        Node::Element(el) => write_element(el, out),
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for (k, v) in &el.attrs {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        out.push_str(&escape_attr(v));
        out.push('"');
    }
    if is_void_element(&el.name) {
        out.push_str(" />");
        return;
    }
    out.push('>');
    for child in &el.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

/// Escape attribute value
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape text content
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Check if tag is void element
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
