// ABOUTME: Paragraph-break recovery and line-break elimination for content fragments.
// ABOUTME: Turns double <br> runs and empty decorative spans into real paragraph boundaries.

//! Many editors encode paragraphs as visual line breaks (`<br><br>`) or as
//! pairs of whitespace-only `<span>`s instead of `<p>` elements. Recovery
//! runs bottom-up: each child list has its break runs replaced by a
//! boundary marker, and the parent decides what a boundary means for it.

use super::tree::{has_visible_text, is_block, is_heading, Element, Node};

/// Marker element name for a recovered paragraph boundary. The HTML parser
/// never produces a tag name starting with `#`.
const PARA_BREAK: &str = "#paragraph-break";

/// Inline containers that get split around a boundary.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "big", "cite", "del", "em", "font", "i", "ins", "label", "mark", "q", "s",
    "small", "span", "strike", "strong", "sub", "sup", "u",
];

/// Inline containers whose whitespace-only instances act as line breaks.
const DECORATIVE_TAGS: &[&str] = &["span", "font"];

fn marker() -> Node {
    Node::Element(Element::new(PARA_BREAK))
}

fn is_marker(node: &Node) -> bool {
    node.is_element(PARA_BREAK)
}

/// How a container reacts to a boundary among its children.
enum Container {
    Paragraph,
    Inline,
    Atomic,
    Flow,
}

fn container_kind(name: &str) -> Container {
    if name == "p" {
        Container::Paragraph
    } else if INLINE_TAGS.contains(&name) {
        Container::Inline
    } else if name == "li" || name == "pre" || is_heading(name) || name == "dt" || name == "dd" {
        Container::Atomic
    } else {
        Container::Flow
    }
}

/// Step 2 of normalization.
pub fn recover_paragraph_breaks(nodes: Vec<Node>) -> Vec<Node> {
    let children = process_children(nodes);
    if children.iter().any(is_marker) {
        wrap_flow(children)
    } else {
        children
    }
}

fn process_children(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(el) if el.name != PARA_BREAK => out.extend(process_element(el)),
            other => out.push(other),
        }
    }
    mark_boundaries(out)
}

fn process_element(mut el: Element) -> Vec<Node> {
    let children = process_children(std::mem::take(&mut el.children));
    if !children.iter().any(is_marker) {
        return vec![Node::Element(el.shallow_clone(children))];
    }

    match container_kind(&el.name) {
        Container::Paragraph => split_at_markers(children)
            .into_iter()
            .filter(|seg| has_visible_text(seg) || seg.iter().any(|n| n.is_element("img")))
            .map(|seg| Node::Element(el.shallow_clone(seg)))
            .collect(),
        Container::Inline => {
            let mut out = Vec::new();
            for (i, seg) in split_at_markers(children).into_iter().enumerate() {
                if i > 0 {
                    out.push(marker());
                }
                if !seg.is_empty() {
                    out.push(Node::Element(el.shallow_clone(seg)));
                }
            }
            out
        }
        Container::Atomic => {
            let children = children
                .into_iter()
                .map(|n| {
                    if is_marker(&n) {
                        Node::Element(Element::new("br"))
                    } else {
                        n
                    }
                })
                .collect();
            vec![Node::Element(el.shallow_clone(children))]
        }
        Container::Flow => vec![Node::Element(el.shallow_clone(wrap_flow(children)))],
    }
}

fn split_at_markers(nodes: Vec<Node>) -> Vec<Vec<Node>> {
    let mut segments = vec![Vec::new()];
    for node in nodes {
        if is_marker(&node) {
            segments.push(Vec::new());
        } else if let Some(last) = segments.last_mut() {
            last.push(node);
        }
    }
    segments
}

/// Wraps the inline runs of each segment in `<p>`; block children stay put.
fn wrap_flow(children: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    for segment in split_at_markers(children) {
        let mut run: Vec<Node> = Vec::new();
        for node in segment {
            if node.is_block() {
                flush_run(&mut run, &mut out);
                out.push(node);
            } else {
                run.push(node);
            }
        }
        flush_run(&mut run, &mut out);
    }
    out
}

fn flush_run(run: &mut Vec<Node>, out: &mut Vec<Node>) {
    let nodes = std::mem::take(run);
    if has_visible_text(&nodes) || nodes.iter().any(|n| n.is_element("img")) {
        out.push(Node::Element(Element::with_children("p", nodes)));
    } else {
        out.extend(nodes.into_iter().filter(|n| !n.is_blank_text()));
    }
}

/// Is this node one link of a break run?
fn is_break_like(node: &Node) -> bool {
    match node {
        Node::Element(el) if el.name == "br" || el.name == PARA_BREAK => true,
        Node::Element(el) if DECORATIVE_TAGS.contains(&el.name.as_str()) => {
            !has_visible_text(&el.children)
                && !el
                    .children
                    .iter()
                    .any(|c| matches!(c, Node::Element(e) if e.name == "img" || is_block(&e.name)))
        }
        _ => false,
    }
}

/// Replaces each run of two or more break-like nodes (whitespace text
/// allowed between them) with a single boundary marker.
fn mark_boundaries(nodes: Vec<Node>) -> Vec<Node> {
    if !nodes.iter().any(is_break_like) {
        return nodes;
    }

    let mut out = Vec::with_capacity(nodes.len());
    let mut i = 0;
    while i < nodes.len() {
        if !is_break_like(&nodes[i]) {
            out.push(nodes[i].clone());
            i += 1;
            continue;
        }

        // Extend the run over break-like nodes and the whitespace between them.
        let mut end = i;
        let mut count = 0;
        let mut has_marker = false;
        let mut j = i;
        while j < nodes.len() {
            if is_break_like(&nodes[j]) {
                count += 1;
                has_marker |= is_marker(&nodes[j]);
                end = j;
            } else if !nodes[j].is_blank_text() {
                break;
            }
            j += 1;
        }

        if count >= 2 || has_marker {
            out.push(marker());
        } else {
            out.extend(nodes[i..=end].iter().cloned());
        }
        i = end + 1;
    }
    out
}

/// Step 5 of normalization: every remaining `<br>` becomes a single space,
/// or a newline inside `<pre>`.
pub fn eliminate_line_breaks(nodes: Vec<Node>) -> Vec<Node> {
    replace_breaks(nodes, false)
}

fn replace_breaks(nodes: Vec<Node>, in_pre: bool) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Element(el) if el.name == "br" => {
                Node::Text(if in_pre { "\n" } else { " " }.to_string())
            }
            Node::Element(mut el) => {
                let pre = in_pre || el.name == "pre";
                el.children = replace_breaks(el.children, pre);
                Node::Element(el)
            }
            other => other,
        })
        .collect()
}
