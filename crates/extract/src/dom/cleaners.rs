// ABOUTME: Structural pruning, call-to-action tagging and tag/attribute allow-listing.
// ABOUTME: Each pass takes an owned node list and returns a cleaned one.

use once_cell::sync::Lazy;
use regex::Regex;

use super::tree::{has_visible_text, Element, Node};

/// Class applied to links that should be emitted as button blocks.
pub const CTA_CLASS: &str = "wp-block-button__link wp-element-button";

// Tags removed with their whole subtree
const STRIP_TAGS: &[&str] = &[
    "button", "canvas", "embed", "form", "head", "iframe", "input", "link", "meta", "nav",
    "noscript", "object", "script", "select", "style", "svg", "template", "textarea", "title",
];

// Elements kept by the allow-list (after renaming)
const ALLOWED_TAGS: &[&str] = &[
    "a", "blockquote", "code", "em", "h2", "h3", "h4", "h5", "h6", "li", "ol", "p", "pre",
    "strong", "u", "ul",
];

const LINK_ATTRS: &[&str] = &["href"];
const IMAGE_ATTRS: &[&str] = &["src", "alt", "title", "width", "height", "class"];
const LAZY_SRC_ATTRS: &[&str] = &["data-src", "data-lazy-src", "data-original", "data-pin-media"];

// One class, id or data-hook token of page furniture: a furniture name,
// optionally followed by a widget suffix ("share-buttons", "related-posts").
static BOILERPLATE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(breadcrumbs?|share|sharing|sharedaddy|addtoany|social|post-meta|entry-meta|post-footer|entry-footer|posted-in|cat-links|tags?-links|related|jp-relatedposts|author-box|author-bio|post-navigation|nav-links|comments-area|comment-respond|newsletter|subscribe|post-title|entry-title|blog-post-title|post-date|entry-date|time-ago|user-name|byline)([-_](posts?|articles?|buttons?|links?|icons?|bar|box|wrap|wrapper|container|widget|section|area|block|list|form|share|sharing|media|nav|signup))?$").unwrap()
});

// Wrappers that commonly carry the post body and must never be pruned by class
static CONTENT_WHITELIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(entry-content|post-content|post-body|post-description|article-body|blog-content|rich-?text|w-richtext|sqs-block-content)").unwrap()
});

// "Posted in ..." style footers
static FOOTER_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(posted in\b|filed under\b|tagged(\s+with\b|\s*:)|tags\s*:|categories\s*:)").unwrap()
});

// Elements whose whole text may be a taxonomy footer
const FOOTER_TAGS: &[&str] = &["p", "div"];

static CTA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|[\s_-])(btn|button|cta|call-to-action)([\s_-]|$)").unwrap());

/// Short texts are the only ones treated as footers.
const FOOTER_MAX_CHARS: usize = 200;

/// Check if element carries a boilerplate signature
fn is_boilerplate(el: &Element) -> bool {
    if STRIP_TAGS.contains(&el.name.as_str()) {
        return true;
    }

    let signature = format!(
        "{} {} {}",
        el.attr("class").unwrap_or(""),
        el.attr("id").unwrap_or(""),
        el.attr("data-hook").unwrap_or("")
    );
    if !CONTENT_WHITELIST_RE.is_match(&signature)
        && signature
            .split_whitespace()
            .any(|token| BOILERPLATE_TOKEN_RE.is_match(token))
    {
        return true;
    }

    if FOOTER_TAGS.contains(&el.name.as_str()) {
        let text = el.text();
        let trimmed = text.trim();
        if !trimmed.is_empty()
            && trimmed.chars().count() <= FOOTER_MAX_CHARS
            && FOOTER_TEXT_RE.is_match(trimmed)
        {
            return true;
        }
    }

    false
}

/// Step 3 of normalization: removes comments, non-content tags and
/// boilerplate blocks.
pub fn prune_boilerplate(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .filter_map(|node| match node {
            Node::Comment(_) => None,
            Node::Element(el) if is_boilerplate(&el) => None,
            Node::Element(mut el) => {
                el.children = prune_boilerplate(el.children);
                Some(Node::Element(el))
            }
            text => Some(text),
        })
        .collect()
}

/// Returns true if the link is styled as a call-to-action button.
pub fn is_cta_link(el: &Element) -> bool {
    if el.name != "a" {
        return false;
    }
    el.attr("class").map_or(false, |c| CTA_RE.is_match(c))
        || el
            .attr("role")
            .map_or(false, |r| r.eq_ignore_ascii_case("button"))
}

/// Step 4 of normalization: marks call-to-action links with [`CTA_CLASS`].
pub fn tag_cta_links(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Element(mut el) => {
                if is_cta_link(&el) {
                    el.set_attr("class", CTA_CLASS);
                }
                el.children = tag_cta_links(el.children);
                Node::Element(el)
            }
            other => other,
        })
        .collect()
}

fn canonical_name(name: &str) -> &str {
    match name {
        "b" => "strong",
        "i" => "em",
        "h1" => "h2",
        other => other,
    }
}

fn usable_href(href: &str) -> bool {
    let href = href.trim();
    !href.is_empty() && href != "#" && !href.to_ascii_lowercase().starts_with("javascript:")
}

fn image_src(el: &Element) -> Option<String> {
    let src = el.attr("src").map(str::trim).unwrap_or("");
    if !src.is_empty() && !src.starts_with("data:") {
        return Some(src.to_string());
    }
    LAZY_SRC_ATTRS
        .iter()
        .filter_map(|a| el.attr(a))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| (!src.is_empty()).then(|| src.to_string()))
}

fn filtered_attrs(el: &Element, allowed: &[&str]) -> Vec<(String, String)> {
    allowed
        .iter()
        .filter_map(|name| el.attr(name).map(|v| (name.to_string(), v.to_string())))
        .collect()
}

/// Step 6 of normalization: keeps the allowed semantic tags, renames
/// `b`/`i`/`h1`, drops attributes outside the per-tag allow-list and
/// unwraps everything else.
pub fn allow_list(nodes: Vec<Node>, include_images: bool) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        filter_node(node, "", include_images, &mut out);
    }
    out
}

fn filter_node(node: Node, parent: &str, include_images: bool, out: &mut Vec<Node>) {
    let el = match node {
        Node::Element(el) => el,
        Node::Text(t) => {
            out.push(Node::Text(t));
            return;
        }
        Node::Comment(_) => return,
    };

    let name = canonical_name(&el.name).to_string();

    if name == "img" {
        if include_images {
            if let Some(src) = image_src(&el) {
                let mut img = Element::new("img");
                img.attrs = filtered_attrs(&el, IMAGE_ATTRS);
                img.set_attr("src", src);
                out.push(Node::Element(img));
            }
        }
        return;
    }

    let keep = match name.as_str() {
        "a" => el.attr("href").map_or(false, usable_href),
        "li" => parent == "ul" || parent == "ol",
        other => ALLOWED_TAGS.contains(&other),
    };

    if !keep {
        if has_visible_text(&el.children) {
            out.push(Node::text(" "));
        }
        for child in el.children {
            filter_node(child, parent, include_images, out);
        }
        return;
    }

    let mut kept = Element::new(name.clone());
    if name == "a" {
        kept.attrs = filtered_attrs(&el, LINK_ATTRS);
        if el.attr("class") == Some(CTA_CLASS) {
            kept.set_attr("class", CTA_CLASS);
        }
    }
    for child in el.children {
        filter_node(child, &name, include_images, &mut kept.children);
    }
    out.push(Node::Element(kept));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::tree::{parse_fragment, to_html};
    use pretty_assertions::assert_eq;

    fn prune(html: &str) -> String {
        to_html(&prune_boilerplate(parse_fragment(html)))
    }

    fn allow(html: &str) -> String {
        to_html(&allow_list(parse_fragment(html), true))
    }

    #[test]
    fn comments_and_scripts_are_removed() {
        assert_eq!(
            prune("<!-- x --><script>alert(1)</script><p>Keep</p><style>p{}</style>"),
            "<p>Keep</p>"
        );
    }

    #[test]
    fn share_widgets_and_breadcrumbs_are_removed() {
        assert_eq!(
            prune(r#"<div class="breadcrumbs">Home</div><p>Body</p><div class="sharedaddy">Share</div>"#),
            "<p>Body</p>"
        );
    }

    #[test]
    fn content_wrapper_is_never_pruned_by_class() {
        assert_eq!(
            prune(r#"<div class="entry-content share-enabled"><p>Body</p></div>"#),
            r#"<div class="entry-content share-enabled"><p>Body</p></div>"#
        );
    }

    #[test]
    fn posted_in_footer_is_removed() {
        assert_eq!(
            prune("<p>Body</p><p>Posted in News, Updates</p>"),
            "<p>Body</p>"
        );
    }

    #[test]
    fn content_wrappers_sharing_a_furniture_word_are_kept() {
        for html in [
            r#"<div class="related-products"><p>Our related text is the body</p></div>"#,
            r#"<div class="unrelated"><p>Body</p></div>"#,
            r#"<div class="shared-story"><p>Body</p></div>"#,
        ] {
            assert_eq!(prune(html), html);
        }
        assert_eq!(
            prune(r#"<p>Body</p><div class="related-posts"><a href="/x">Other</a></div><ul class="social-icons"><li>f</li></ul>"#),
            "<p>Body</p>"
        );
    }

    #[test]
    fn footer_rule_needs_footer_wording() {
        let prose = "<p>Tagged vehicles need care. This is real content.</p>";
        assert_eq!(prune(prose), prose);
        assert_eq!(prune("<p>Body</p><p>Tagged: winter, tires</p>"), "<p>Body</p>");
        assert_eq!(prune("<p>Body</p><div>Tagged with safety</div>"), "<p>Body</p>");
        assert_eq!(
            prune("<h3>Posted in the spring</h3>"),
            "<h3>Posted in the spring</h3>"
        );
    }

    #[test]
    fn cta_links_are_tagged() {
        let nodes = tag_cta_links(parse_fragment(
            r#"<a class="btn btn-primary" href="/buy">Buy</a><a class="inline" href="/x">x</a>"#,
        ));
        assert_eq!(
            to_html(&nodes),
            r#"<a class="wp-block-button__link wp-element-button" href="/buy">Buy</a><a class="inline" href="/x">x</a>"#
        );
    }

    #[test]
    fn tags_are_renamed_and_attributes_dropped() {
        assert_eq!(
            allow(r#"<h1 class="t">Title</h1><p style="x">A <b>bold</b> <i>move</i></p>"#),
            "<h2>Title</h2><p>A <strong>bold</strong> <em>move</em></p>"
        );
    }

    #[test]
    fn unwrapped_elements_get_a_leading_space() {
        assert_eq!(
            allow("<p>Hello<span>world</span></p>"),
            "<p>Hello world</p>"
        );
    }

    #[test]
    fn links_keep_href_only_unless_cta() {
        assert_eq!(
            allow(r#"<a href="/x" class="fancy" target="_blank">x</a><a href="/b" class="wp-block-button__link wp-element-button">b</a>"#),
            r#"<a href="/x">x</a><a href="/b" class="wp-block-button__link wp-element-button">b</a>"#
        );
    }

    #[test]
    fn empty_links_are_unwrapped() {
        assert_eq!(allow(r##"<p><a href="#">Top</a></p>"##), "<p> Top</p>");
    }

    #[test]
    fn lazy_image_source_is_used() {
        assert_eq!(
            allow(r#"<img src="data:image/gif;base64,R0l" data-src="/real.jpg" alt="Car" loading="lazy">"#),
            r#"<img src="/real.jpg" alt="Car" />"#
        );
    }

    #[test]
    fn images_dropped_when_excluded() {
        let nodes = allow_list(parse_fragment(r#"<p>x<img src="/a.jpg"></p>"#), false);
        assert_eq!(to_html(&nodes), "<p>x</p>");
    }

    #[test]
    fn orphan_list_items_are_unwrapped() {
        // one space for the unwrapped div, one for the unwrapped li
        assert_eq!(allow("<div><li>one</li></div>"), "  one");
    }
}
