// ABOUTME: Structural repair of allow-listed fragments: hoists headings and images out of paragraphs.
// ABOUTME: Splits paragraphs around nested blocks and moves stray list children after the list.

use super::tree::{has_visible_text, is_heading, Element, Node};

const INLINE_FORMATTING: &[&str] = &["a", "code", "em", "strong", "u"];

/// What a node becomes when it sits inside a paragraph-like element.
enum Piece {
    Inline(Node),
    Block(Node),
    Hoist(Node),
}

fn is_paragraph_like(name: &str) -> bool {
    name == "p" || is_heading(name)
}

/// Step 7 of normalization.
pub fn repair_structure(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(el) => out.extend(repair_element(el)),
            other => out.push(other),
        }
    }
    out
}

fn repair_element(mut el: Element) -> Vec<Node> {
    match el.name.as_str() {
        name if is_paragraph_like(name) => repair_paragraph(el),
        "ul" | "ol" => repair_list(el),
        name if INLINE_FORMATTING.contains(&name) => lift_inline(el)
            .into_iter()
            .map(|piece| match piece {
                Piece::Inline(n) | Piece::Block(n) | Piece::Hoist(n) => n,
            })
            .collect(),
        "pre" | "img" => vec![Node::Element(el)],
        _ => {
            el.children = repair_structure(std::mem::take(&mut el.children));
            vec![Node::Element(el)]
        }
    }
}

/// Keeps `li` children in place; everything else except whitespace moves
/// after the list.
fn repair_list(mut el: Element) -> Vec<Node> {
    let mut items = Vec::new();
    let mut stray = Vec::new();
    for child in std::mem::take(&mut el.children) {
        match child {
            Node::Element(mut li) if li.name == "li" => {
                li.children = repair_structure(std::mem::take(&mut li.children));
                items.push(Node::Element(li));
            }
            ref blank if blank.is_blank_text() => {}
            Node::Comment(_) => {}
            other => stray.push(other),
        }
    }
    el.children = items;

    let mut out = vec![Node::Element(el)];
    out.extend(repair_structure(stray));
    out
}

fn pieces_of(node: Node) -> Vec<Piece> {
    let el = match node {
        Node::Element(el) => el,
        other => return vec![Piece::Inline(other)],
    };

    if el.name == "img" {
        return vec![Piece::Hoist(Node::Element(el))];
    }
    if is_heading(&el.name) {
        return repair_paragraph(el).into_iter().map(Piece::Hoist).collect();
    }
    if INLINE_FORMATTING.contains(&el.name.as_str()) {
        return lift_inline(el);
    }

    repair_element(el)
        .into_iter()
        .map(|n| {
            if n.is_block() {
                Piece::Block(n)
            } else {
                Piece::Inline(n)
            }
        })
        .collect()
}

/// Splits an inline element around any block or hoisted descendant,
/// cloning the element around each inline run.
fn lift_inline(el: Element) -> Vec<Piece> {
    let pieces: Vec<Piece> = el.children.iter().cloned().flat_map(pieces_of).collect();
    if pieces.iter().all(|p| matches!(p, Piece::Inline(_))) {
        let children = pieces
            .into_iter()
            .filter_map(|p| match p {
                Piece::Inline(n) => Some(n),
                _ => None,
            })
            .collect();
        return vec![Piece::Inline(Node::Element(el.shallow_clone(children)))];
    }

    let mut out = Vec::new();
    let mut run = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Inline(n) => run.push(n),
            other => {
                if !run.is_empty() {
                    out.push(Piece::Inline(Node::Element(
                        el.shallow_clone(std::mem::take(&mut run)),
                    )));
                }
                out.push(other);
            }
        }
    }
    if !run.is_empty() {
        out.push(Piece::Inline(Node::Element(el.shallow_clone(run))));
    }
    out
}

fn repair_paragraph(el: Element) -> Vec<Node> {
    let pieces: Vec<Piece> = el.children.iter().cloned().flat_map(pieces_of).collect();
    if pieces.iter().all(|p| matches!(p, Piece::Inline(_))) {
        let children = pieces
            .into_iter()
            .filter_map(|p| match p {
                Piece::Inline(n) => Some(n),
                _ => None,
            })
            .collect();
        return vec![Node::Element(el.shallow_clone(children))];
    }

    let mut out = Vec::new();
    let mut segment = Vec::new();
    let mut hoisted = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Inline(n) => segment.push(n),
            Piece::Hoist(n) => hoisted.push(n),
            Piece::Block(n) => {
                flush_segment(&el, &mut segment, &mut hoisted, &mut out);
                out.push(n);
            }
        }
    }
    flush_segment(&el, &mut segment, &mut hoisted, &mut out);
    out
}

/// Emits pending hoisted nodes, then the segment wrapped in a clone of the
/// paragraph if it has any text.
fn flush_segment(
    el: &Element,
    segment: &mut Vec<Node>,
    hoisted: &mut Vec<Node>,
    out: &mut Vec<Node>,
) {
    out.append(hoisted);
    let nodes = std::mem::take(segment);
    if has_visible_text(&nodes) {
        out.push(Node::Element(el.shallow_clone(nodes)));
    }
}
