// ABOUTME: Block converter turning a normalized fragment into typed WordPress content blocks.
// ABOUTME: Renders each block with the block editor's comment delimiters.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::dom::cleaners::CTA_CLASS;
use crate::dom::tree::{
    contains_element, escape_attr, escape_text, has_visible_text, is_block, is_heading,
    outer_html, text_content, to_html, Element, Node,
};

/// A typed unit of post content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Paragraph { html: String },
    Heading { level: u8, html: String },
    List { ordered: bool, html: String },
    Quote { html: String },
    Code { text: String },
    Preformatted { html: String },
    Image { src: String, alt: String },
    RawHtml { html: String },
}

impl ContentBlock {
    /// Block editor markup for this block.
    pub fn to_markup(&self) -> String {
        match self {
            ContentBlock::Paragraph { html } => {
                format!("<!-- wp:paragraph -->\n<p>{}</p>\n<!-- /wp:paragraph -->", html)
            }
            ContentBlock::Heading { level, html } => format!(
                "<!-- wp:heading {} -->\n<h{level} class=\"wp-block-heading\">{}</h{level}>\n<!-- /wp:heading -->",
                json!({ "level": level }),
                html,
                level = level
            ),
            ContentBlock::List { ordered: false, html } => {
                format!("<!-- wp:list -->\n<ul>{}</ul>\n<!-- /wp:list -->", html)
            }
            ContentBlock::List { ordered: true, html } => format!(
                "<!-- wp:list {} -->\n<ol>{}</ol>\n<!-- /wp:list -->",
                json!({ "ordered": true }),
                html
            ),
            ContentBlock::Quote { html } => format!(
                "<!-- wp:quote -->\n<blockquote class=\"wp-block-quote\">{}</blockquote>\n<!-- /wp:quote -->",
                html
            ),
            ContentBlock::Code { text } => format!(
                "<!-- wp:code -->\n<pre class=\"wp-block-code\"><code>{}</code></pre>\n<!-- /wp:code -->",
                escape_text(text)
            ),
            ContentBlock::Preformatted { html } => format!(
                "<!-- wp:preformatted -->\n<pre class=\"wp-block-preformatted\">{}</pre>\n<!-- /wp:preformatted -->",
                html
            ),
            ContentBlock::Image { src, alt } => format!(
                "<!-- wp:image -->\n<figure class=\"wp-block-image\"><img src=\"{}\" alt=\"{}\"/></figure>\n<!-- /wp:image -->",
                escape_attr(src),
                escape_attr(alt)
            ),
            ContentBlock::RawHtml { html } => {
                format!("<!-- wp:html -->\n{}\n<!-- /wp:html -->", html)
            }
        }
    }
}

/// Joins rendered blocks with a blank line.
pub fn render_blocks(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(ContentBlock::to_markup)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn is_cta(el: &Element) -> bool {
    el.name == "a" && el.attr("class") == Some(CTA_CLASS)
}

fn button_block(el: &Element) -> ContentBlock {
    ContentBlock::RawHtml {
        html: format!(
            "<div class=\"wp-block-button\"><a class=\"{}\" href=\"{}\">{}</a></div>",
            CTA_CLASS,
            escape_attr(el.attr("href").unwrap_or("")),
            to_html(&el.children).trim()
        ),
    }
}

fn heading_level(name: &str) -> u8 {
    match name {
        "h3" => 3,
        "h4" => 4,
        "h5" => 5,
        "h6" => 6,
        _ => 2,
    }
}

/// Accumulated inline content waiting to become a paragraph.
#[derive(Default)]
struct Pending(Vec<Node>);

impl Pending {
    fn flush(&mut self, blocks: &mut Vec<ContentBlock>) {
        let nodes = std::mem::take(&mut self.0);
        if has_visible_text(&nodes) || contains_element(&nodes, "img") {
            blocks.push(ContentBlock::Paragraph {
                html: to_html(&nodes).trim().to_string(),
            });
        }
    }
}

/// Converts the top-level nodes of a normalized fragment into blocks.
pub fn convert(nodes: &[Node]) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut pending = Pending::default();

    for node in nodes {
        let el = match node {
            Node::Element(el) => el,
            Node::Text(_) => {
                pending.0.push(node.clone());
                continue;
            }
            Node::Comment(_) => continue,
        };

        match el.name.as_str() {
            "br" => {}
            "p" => {
                pending.flush(&mut blocks);
                paragraph_blocks(el, &mut blocks);
            }
            name if is_heading(name) => {
                pending.flush(&mut blocks);
                blocks.push(ContentBlock::Heading {
                    level: heading_level(name),
                    html: to_html(&el.children),
                });
            }
            "ul" | "ol" => {
                pending.flush(&mut blocks);
                blocks.push(ContentBlock::List {
                    ordered: el.name == "ol",
                    html: to_html(&el.children),
                });
            }
            "blockquote" => {
                pending.flush(&mut blocks);
                blocks.push(ContentBlock::Quote {
                    html: to_html(&el.children),
                });
            }
            "pre" => {
                pending.flush(&mut blocks);
                if contains_element(&el.children, "code") {
                    blocks.push(ContentBlock::Code {
                        text: text_content(&el.children),
                    });
                } else {
                    blocks.push(ContentBlock::Preformatted {
                        html: to_html(&el.children),
                    });
                }
            }
            "img" => {
                pending.flush(&mut blocks);
                blocks.push(ContentBlock::Image {
                    src: el.attr("src").unwrap_or("").to_string(),
                    alt: el.attr("alt").unwrap_or("").to_string(),
                });
            }
            _ if is_cta(el) => {
                pending.flush(&mut blocks);
                blocks.push(button_block(el));
            }
            name if is_block(name) => {
                pending.flush(&mut blocks);
                blocks.push(ContentBlock::Paragraph {
                    html: outer_html(el),
                });
            }
            _ => pending.0.push(node.clone()),
        }
    }
    pending.flush(&mut blocks);
    blocks
}

/// A paragraph becomes one block, or several when call-to-action links
/// sit inside it.
fn paragraph_blocks(p: &Element, blocks: &mut Vec<ContentBlock>) {
    let mut pending = Pending::default();
    for child in &p.children {
        match child {
            Node::Element(el) if is_cta(el) => {
                pending.flush(blocks);
                blocks.push(button_block(el));
            }
            other => pending.0.push(other.clone()),
        }
    }
    pending.flush(blocks);
}
