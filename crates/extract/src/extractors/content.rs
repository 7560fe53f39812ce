// ABOUTME: Main-content location plus link and image collection over the owned content fragment.
// ABOUTME: Applies the content rule's clean selectors before copying the element out of the page.

//! Content location and fragment inspection.
//!
//! Key behaviors:
//! - Candidates are tried in order; within a candidate, matches are tried in
//!   document order. The first element whose text (after removing the
//!   `clean` selectors) is longer than `min_chars` wins.
//! - Links are collected from the normalized fragment, resolved against the
//!   page URL and restricted to http(s).
//! - Image sources can be rewritten or dropped through a callback.

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{ElementRef, Html};
use url::Url;

use crate::dom::tree::{from_element, text_content, Element, Node};
use crate::dom::whitespace::normalized_text;
use crate::extractors::compiled::get_or_compile;
use crate::extractors::rules::ContentRule;
use crate::post::{ImageRef, Link};

/// The element chosen as post body, copied out of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedContent {
    /// Candidate selector that matched.
    pub selector: String,
    pub nodes: Vec<Node>,
}

/// Finds the main content element using the rule's ordered candidates.
pub fn locate_content(doc: &Html, rule: &ContentRule) -> Option<LocatedContent> {
    for spec in &rule.field.selectors {
        let css = spec.css();
        let Some(selector) = get_or_compile(css) else {
            continue;
        };
        for element in doc.select(&selector) {
            let nodes = from_element(element, &clean_ids(element, &rule.clean));
            if normalized_text(&nodes).chars().count() > rule.min_chars {
                return Some(LocatedContent {
                    selector: css.to_string(),
                    nodes,
                });
            }
        }
    }
    None
}

/// Ids of the subtrees under `element` matched by any clean selector.
fn clean_ids(element: ElementRef<'_>, clean: &[String]) -> HashSet<NodeId> {
    clean
        .iter()
        .filter_map(|css| get_or_compile(css))
        .flat_map(|selector| {
            element
                .select(&selector)
                .map(|el| el.id())
                .collect::<Vec<_>>()
        })
        .filter(|id| *id != element.id())
        .collect()
}

/// Resolves `href` against `base`, keeping only http(s) results.
pub fn absolutize(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("data:") {
        return None;
    }
    let url = base.join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn same_page(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a.as_str().trim_end_matches('/') == b.as_str().trim_end_matches('/')
}

/// Collects the links of a fragment in document order.
///
/// Links without text, with a non-http(s) target, or pointing at the page
/// itself are skipped.
pub fn collect_links(nodes: &[Node], base: &Url) -> Vec<Link> {
    let mut links = Vec::new();
    walk_elements(nodes, &mut |el| {
        if el.name != "a" {
            return;
        }
        let Some(url) = el.attr("href").and_then(|h| absolutize(base, h)) else {
            return;
        };
        let text = normalized_text(&el.children);
        if text.is_empty() || same_page(&url, base) {
            return;
        }
        links.push(Link {
            text,
            url: url.to_string(),
        });
    });
    links
}

/// Collects the images of a fragment in document order.
pub fn collect_images(nodes: &[Node]) -> Vec<ImageRef> {
    let mut images = Vec::new();
    walk_elements(nodes, &mut |el| {
        if el.name != "img" {
            return;
        }
        let Some(src) = el.attr("src").filter(|s| !s.is_empty()) else {
            return;
        };
        images.push(ImageRef {
            src: src.to_string(),
            alt: el.attr("alt").unwrap_or("").to_string(),
            width: el.attr("width").map(str::to_string),
            height: el.attr("height").map(str::to_string),
            source_url: None,
        });
    });
    images
}

/// Rewrites every image `src` with `f`; images for which `f` returns
/// `None` are removed.
pub fn map_image_sources<F>(nodes: Vec<Node>, f: &mut F) -> Vec<Node>
where
    F: FnMut(&str) -> Option<String>,
{
    nodes
        .into_iter()
        .filter_map(|node| match node {
            Node::Element(mut el) if el.name == "img" => {
                let src = el.attr("src").unwrap_or("").to_string();
                let new_src = f(&src)?;
                el.set_attr("src", new_src);
                Some(Node::Element(el))
            }
            Node::Element(mut el) => {
                el.children = map_image_sources(std::mem::take(&mut el.children), f);
                Some(Node::Element(el))
            }
            other => Some(other),
        })
        .collect()
}

fn walk_elements<F>(nodes: &[Node], f: &mut F)
where
    F: FnMut(&Element),
{
    for node in nodes {
        if let Node::Element(el) = node {
            f(el);
            walk_elements(&el.children, f);
        }
    }
}

/// Character count of a fragment's visible text.
pub fn content_length(nodes: &[Node]) -> usize {
    text_content(nodes).trim().chars().count()
}
