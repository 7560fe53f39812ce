// ABOUTME: Final whitespace pass of normalization: collapse, trim, and drop empty elements.
// ABOUTME: Works bottom-up so emptiness is judged after children have been cleaned.

use super::tree::{contains_element, has_visible_text, is_heading, text_content, Element, Node};

const INLINE_FORMATTING: &[&str] = &["a", "code", "em", "strong", "u"];

/// Step 8 of normalization.
pub fn normalize_whitespace(nodes: Vec<Node>) -> Vec<Node> {
    let nodes = drop_empty(nodes);
    let nodes = collapse(nodes, false);
    let nodes = drop_blank_around_blocks(nodes, true);
    trim_edges(nodes)
}

fn is_trimmed(name: &str) -> bool {
    name == "p" || name == "li" || is_heading(name)
}

/// Paragraphs and headings with at most one visible character and no image.
fn is_stray(el: &Element) -> bool {
    (el.name == "p" || is_heading(&el.name))
        && el.text().trim().chars().count() <= 1
        && !contains_element(&el.children, "img")
}

fn drop_empty(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        let mut el = match node {
            Node::Element(el) => el,
            Node::Comment(_) => continue,
            text => {
                out.push(text);
                continue;
            }
        };
        if el.name != "pre" {
            el.children = drop_empty(std::mem::take(&mut el.children));
        }

        if INLINE_FORMATTING.contains(&el.name.as_str())
            && !has_visible_text(&el.children)
            && !contains_element(&el.children, "img")
        {
            out.extend(el.children);
        } else if is_stray(&el) {
            continue;
        } else if (el.name == "ul" || el.name == "ol") && !contains_element(&el.children, "li") {
            continue;
        } else if (el.name == "blockquote" || el.name == "pre")
            && !has_visible_text(&el.children)
            && !contains_element(&el.children, "img")
        {
            continue;
        } else {
            out.push(Node::Element(el));
        }
    }
    out
}

fn collapse_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Merges adjacent text nodes and collapses whitespace runs outside `pre`.
fn collapse(nodes: Vec<Node>, in_pre: bool) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(t) => {
                if let Some(Node::Text(prev)) = out.last_mut() {
                    prev.push_str(&t);
                } else {
                    out.push(Node::Text(t));
                }
            }
            Node::Element(mut el) => {
                let pre = in_pre || el.name == "pre";
                el.children = collapse(std::mem::take(&mut el.children), pre);
                out.push(Node::Element(el));
            }
            Node::Comment(_) => {}
        }
    }
    if !in_pre {
        for node in out.iter_mut() {
            if let Node::Text(t) = node {
                *t = collapse_spaces(t);
            }
        }
    }
    out.retain(|n| !matches!(n, Node::Text(t) if t.is_empty()));
    out
}

/// Removes whitespace-only text next to block elements, and at the edges of
/// block containers.
fn drop_blank_around_blocks(nodes: Vec<Node>, block_container: bool) -> Vec<Node> {
    let len = nodes.len();
    let keep: Vec<bool> = (0..len)
        .map(|i| {
            if !nodes[i].is_blank_text() {
                return true;
            }
            let at_edge = i == 0 || i + 1 == len;
            let prev_block = i > 0 && nodes[i - 1].is_block();
            let next_block = i + 1 < len && nodes[i + 1].is_block();
            !(prev_block || next_block || (block_container && at_edge))
        })
        .collect();

    nodes
        .into_iter()
        .zip(keep)
        .filter_map(|(node, keep)| keep.then_some(node))
        .map(|node| match node {
            Node::Element(mut el) if el.name != "pre" => {
                let container = matches!(el.name.as_str(), "blockquote" | "ul" | "ol" | "li");
                el.children = drop_blank_around_blocks(std::mem::take(&mut el.children), container);
                Node::Element(el)
            }
            other => other,
        })
        .collect()
}

fn trim_edges(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Element(mut el) => {
                if el.name == "pre" {
                    strip_leading_newlines(&mut el);
                    return Node::Element(el);
                }
                el.children = trim_edges(std::mem::take(&mut el.children));
                if is_trimmed(&el.name) {
                    trim_start(&mut el.children);
                    trim_end(&mut el.children);
                }
                Node::Element(el)
            }
            other => other,
        })
        .collect()
}

fn trim_start(children: &mut Vec<Node>) {
    while let Some(first) = children.first_mut() {
        match first {
            Node::Text(t) => {
                let trimmed = t.trim_start();
                if trimmed.is_empty() {
                    children.remove(0);
                    continue;
                }
                *t = trimmed.to_string();
                return;
            }
            Node::Element(el) if INLINE_FORMATTING.contains(&el.name.as_str()) => {
                trim_start(&mut el.children);
                return;
            }
            _ => return,
        }
    }
}

fn trim_end(children: &mut Vec<Node>) {
    while let Some(last) = children.last_mut() {
        match last {
            Node::Text(t) => {
                let trimmed = t.trim_end();
                if trimmed.is_empty() {
                    children.pop();
                    continue;
                }
                *t = trimmed.to_string();
                return;
            }
            Node::Element(el) if INLINE_FORMATTING.contains(&el.name.as_str()) => {
                trim_end(&mut el.children);
                return;
            }
            _ => return,
        }
    }
}

/// The HTML parser drops one newline directly after `<pre>`, so any leading
/// newlines would not survive a reparse.
fn strip_leading_newlines(el: &mut Element) {
    if let Some(Node::Text(t)) = el.children.first_mut() {
        let stripped = t.trim_start_matches(['\n', '\r']);
        if stripped.len() != t.len() {
            *t = stripped.to_string();
        }
    }
    if matches!(el.children.first(), Some(Node::Text(t)) if t.is_empty()) {
        el.children.remove(0);
    }
}

/// Visible text of a fragment with whitespace collapsed.
pub fn normalized_text(nodes: &[Node]) -> String {
    text_content(nodes)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
