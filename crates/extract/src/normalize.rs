// ABOUTME: Content normalizer composing the ordered DOM passes into one pure function.
// ABOUTME: Exposes the node-level and string-level entry points used by the pipeline.

//! Content normalization.
//!
//! Steps run in a fixed order, each over an owned node list:
//!
//! 1. encoding repair
//! 2. paragraph-break recovery
//! 3. structural pruning
//! 4. call-to-action tagging
//! 5. line-break elimination
//! 6. tag and attribute allow-listing
//! 7. structural repair
//! 8. whitespace normalization
//!
//! The result is stable: normalizing already normalized markup returns it
//! unchanged.

use crate::dom::{brs, cleaners, encoding, repair, tree, whitespace, Node};

/// Options for [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Keep `<img>` elements in the output.
    pub include_images: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            include_images: true,
        }
    }
}

/// Runs every normalization step over a fragment.
pub fn normalize(nodes: Vec<Node>, opts: NormalizeOptions) -> Vec<Node> {
    let nodes = encoding::repair_encoding(nodes);
    let nodes = brs::recover_paragraph_breaks(nodes);
    let nodes = cleaners::prune_boilerplate(nodes);
    let nodes = cleaners::tag_cta_links(nodes);
    let nodes = brs::eliminate_line_breaks(nodes);
    let nodes = cleaners::allow_list(nodes, opts.include_images);
    let nodes = repair::repair_structure(nodes);
    whitespace::normalize_whitespace(nodes)
}

/// Parses, normalizes and re-serializes an HTML fragment.
pub fn normalize_html(html: &str, opts: NormalizeOptions) -> String {
    tree::to_html(&normalize(tree::parse_fragment(html), opts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn norm(html: &str) -> String {
        normalize_html(html, NormalizeOptions::default())
    }

    #[test]
    fn heading_is_demoted_and_bold_renamed() {
        assert_eq!(
            norm("<h1>Old</h1><p>Hello <b>world</b></p>"),
            "<h2>Old</h2><p>Hello <strong>world</strong></p>"
        );
    }

    #[test]
    fn div_soup_becomes_paragraphs() {
        assert_eq!(
            norm(r#"<div class="x"><span style="a">First part<br><br>Second part</span></div>"#),
            "<p>First part</p><p>Second part</p>"
        );
    }

    #[test]
    fn boilerplate_and_scripts_vanish() {
        assert_eq!(
            norm(r#"<p>Body text.</p><div class="share-buttons"><a href="/x">Share</a></div><script>x()</script>"#),
            "<p>Body text.</p>"
        );
    }

    #[test]
    fn typographic_quotes_are_ascii() {
        assert_eq!(
            norm("<p>\u{201c}Fast\u{201d} \u{2014} really\u{2026}</p>"),
            "<p>\"Fast\" - really...</p>"
        );
    }

    #[test]
    fn cta_link_survives_with_marker() {
        assert_eq!(
            norm(r#"<p>Ready? <a class="btn" href="/shop" target="_blank">Shop now</a></p>"#),
            r#"<p>Ready? <a href="/shop" class="wp-block-button__link wp-element-button">Shop now</a></p>"#
        );
    }

    #[test]
    fn malformed_list_is_repaired() {
        assert_eq!(
            norm("<ul><p>note</p><li>item</li></ul>"),
            "<ul><li>item</li></ul><p>note</p>"
        );
    }

    #[test]
    fn body_wrappers_and_tagged_prose_survive() {
        let related = norm(r#"<div class="related-products"><p>Our related text is the body</p></div>"#);
        assert!(related.contains("Our related text is the body"), "{related}");
        assert_eq!(
            norm("<p>Tagged vehicles need care. This is real content.</p>"),
            "<p>Tagged vehicles need care. This is real content.</p>"
        );
    }

    #[test]
    fn emptied_quote_leaves_no_block() {
        assert_eq!(
            norm("<blockquote><p>x</p></blockquote><p>after text</p>"),
            "<p>after text</p>"
        );
    }

    #[test]
    fn images_can_be_excluded() {
        let out = normalize_html(
            r#"<p>Text <img src="/a.jpg" alt="A"></p>"#,
            NormalizeOptions {
                include_images: false,
            },
        );
        assert_eq!(out, "<p>Text</p>");
    }

    #[test]
    fn normalization_is_idempotent() {
        let corpus = [
            "<h1>Old</h1><p>Hello <b>world</b></p>",
            "<div>Alpha<br><br>Beta<p>Gamma</p></div>",
            "<p>a<img src=\"/i.png\">b<ul><li>x</li></ul>c</p>",
            "<ul><p>note</p><li>item</li>stray</ul>",
            "<pre>\n\ncode  here\n</pre><p> <em> </em> </p>",
            "<blockquote>\n<p>quoted</p>\n text </blockquote>",
            "<p><strong>Bold<br><br>split</strong> tail</p>",
            "<li>orphan</li><span>  spaced   out  </span>",
            r#"<p>Go <a href="/x" class="button">Buy</a> now</p>"#,
            "<p>x</p><p>.</p><h3>  Sub  heading </h3>",
        ];
        for html in corpus {
            let once = norm(html);
            let twice = norm(&once);
            assert_eq!(twice, once, "input: {}", html);
        }
    }
}
