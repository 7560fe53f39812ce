// ABOUTME: Encoding repair for extracted text: typographic punctuation to ASCII and mojibake fixes.
// ABOUTME: Applied to text nodes and to alt/title attributes of the content fragment.

use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;

use super::tree::Node;

/// Replacement table. Mojibake sequences (UTF-8 decoded as Windows-1252)
/// come first so the leftmost-longest matcher prefers them over their parts.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("\u{e2}\u{20ac}\u{2122}", "'"),
    ("\u{e2}\u{20ac}\u{2dc}", "'"),
    ("\u{e2}\u{20ac}\u{153}", "\""),
    ("\u{e2}\u{20ac}\u{9d}", "\""),
    ("\u{e2}\u{20ac}\u{201c}", "-"),
    ("\u{e2}\u{20ac}\u{201d}", "-"),
    ("\u{e2}\u{20ac}\u{a6}", "..."),
    ("\u{c2}\u{a0}", " "),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{201a}", "'"),
    ("\u{201b}", "'"),
    ("\u{2032}", "'"),
    ("\u{201c}", "\""),
    ("\u{201d}", "\""),
    ("\u{201e}", "\""),
    ("\u{2033}", "\""),
    ("\u{2012}", "-"),
    ("\u{2013}", "-"),
    ("\u{2014}", "-"),
    ("\u{2015}", "-"),
    ("\u{2212}", "-"),
    ("\u{2026}", "..."),
    ("\u{a0}", " "),
    ("\u{2007}", " "),
    ("\u{2009}", " "),
    ("\u{202f}", " "),
    ("\u{200b}", ""),
    ("\u{200c}", ""),
    ("\u{200d}", ""),
    ("\u{2060}", ""),
    ("\u{feff}", ""),
    ("\u{ad}", ""),
];

static REPAIR_MATCHER: Lazy<Option<AhoCorasick>> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(REPLACEMENTS.iter().map(|(from, _)| *from))
        .ok()
});

/// Repairs a single string.
pub fn repair_text(s: &str) -> String {
    match REPAIR_MATCHER.as_ref() {
        Some(ac) => {
            let to: Vec<&str> = REPLACEMENTS.iter().map(|(_, to)| *to).collect();
            ac.replace_all(s, &to)
        }
        None => s.to_string(),
    }
}

/// Step 1 of normalization: repairs every text node and the `alt`/`title`
/// attributes.
pub fn repair_encoding(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Text(t) => Node::Text(repair_text(&t)),
            Node::Element(mut el) => {
                for (k, v) in el.attrs.iter_mut() {
                    if k == "alt" || k == "title" {
                        *v = repair_text(v);
                    }
                }
                el.children = repair_encoding(el.children);
                Node::Element(el)
            }
            other => other,
        })
        .collect()
}
