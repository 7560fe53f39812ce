// ABOUTME: Selector resolver: applies a field's ordered candidates to a parsed page.
// ABOUTME: Scalar fields take the first non-empty match, set fields the filtered union of all matches.

//! Selector-based field resolution.
//!
//! Key behaviors:
//! - Candidates are tried in order; for scalar fields the first candidate
//!   yielding a non-empty value wins.
//! - Text extraction normalizes whitespace and repairs typographic
//!   characters; `meta[...]` selectors read `content`.
//! - Set fields collect every match of every candidate, deduplicate
//!   case-insensitively keeping the first spelling, drop stop-listed and
//!   overlong entries.

use std::collections::HashSet;

use scraper::{ElementRef, Html};

use crate::dom::encoding::repair_text;
use crate::extractors::compiled::get_or_compile;
use crate::extractors::rules::{Field, FieldRule, Resolution, SelectorSpec, SelectorTable};
use crate::extractors::stoplist::StopList;

/// Normalizes whitespace in a string by collapsing runs of whitespace into single spaces.
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A resolved field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Scalar(String),
    List(Vec<String>),
}

impl Resolved {
    pub fn into_scalar(self) -> Option<String> {
        match self {
            Resolved::Scalar(s) => Some(s),
            Resolved::List(v) => v.into_iter().next(),
        }
    }

    pub fn into_list(self) -> Vec<String> {
        match self {
            Resolved::Scalar(s) => vec![s],
            Resolved::List(v) => v,
        }
    }
}

/// Resolves a field against a document using the table's rule for it.
///
/// Returns `None` when no candidate yields a value.
pub fn resolve(
    doc: &Html,
    table: &SelectorTable,
    field: Field,
    stop_list: &StopList,
) -> Option<Resolved> {
    let rule = table.rule(field);
    match rule.resolution {
        Resolution::First => resolve_scalar(doc, rule).map(Resolved::Scalar),
        Resolution::Union => {
            let values = resolve_set(doc, rule, stop_list);
            if values.is_empty() {
                None
            } else {
                Some(Resolved::List(values))
            }
        }
    }
}

/// First non-empty value across the rule's candidates.
pub fn resolve_scalar(doc: &Html, rule: &FieldRule) -> Option<String> {
    rule.selectors
        .iter()
        .find_map(|spec| values_for_spec(doc, spec).into_iter().next())
}

/// Union of all candidates' values, filtered and deduplicated.
pub fn resolve_set(doc: &Html, rule: &FieldRule, stop_list: &StopList) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for spec in &rule.selectors {
        for value in values_for_spec(doc, spec) {
            if let Some(max) = rule.max_words {
                if value.split_whitespace().count() > max {
                    continue;
                }
            }
            if stop_list.rejects(&value) {
                continue;
            }
            if seen.insert(value.to_lowercase()) {
                out.push(value);
            }
        }
    }
    out
}

/// Non-empty values produced by one candidate, in document order.
fn values_for_spec(doc: &Html, spec: &SelectorSpec) -> Vec<String> {
    let Some(selector) = get_or_compile(spec.css()) else {
        return vec![];
    };
    doc.select(&selector)
        .filter_map(|el| value_of(el, spec.attr()))
        .collect()
}

fn value_of(el: ElementRef<'_>, attr: Option<&str>) -> Option<String> {
    let raw = match attr {
        Some(name) => el.value().attr(name)?.to_string(),
        None => el.text().collect::<Vec<_>>().join(" "),
    };
    let value = normalize_whitespace(&repair_text(&raw));
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::loader::load_builtin_table;
    use pretty_assertions::assert_eq;

    const WIX_PAGE: &str = r#"
        <html>
        <head>
            <title>Site | Post</title>
            <meta property="og:title" content="OG Title">
            <meta name="keywords" content="cars, trucks, deals">
        </head>
        <body>
            <h1>Generic heading</h1>
            <h1 data-hook="post-title">  Winter   Driving Tips </h1>
            <span data-hook="user-name">Jane Writer</span>
            <span data-hook="time-ago" title="Jan 5, 2024">3 days ago</span>
            <ul aria-label="Post categories">
                <li><a href="/c/safety">Safety</a></li>
                <li><a href="/c/all">All Posts</a></li>
                <li><a href="/new-inventory">New Inventory</a></li>
                <li><a href="/dealer-news">Dealer News</a></li>
            </ul>
            <nav aria-label="Tags"><ul>
                <li><a>Winter</a></li>
                <li><a>winter</a></li>
                <li><a>This tag is far too long to be real</a></li>
            </ul></nav>
            <div class="tags"><a>Tires</a></div>
        </body>
        </html>
    "#;

    fn resolve_doc(field: Field) -> Option<Resolved> {
        let doc = Html::parse_document(WIX_PAGE);
        resolve(&doc, &load_builtin_table(), field, &StopList::default())
    }

    #[test]
    fn platform_title_wins_over_bare_h1() {
        assert_eq!(
            resolve_doc(Field::Title),
            Some(Resolved::Scalar("Winter Driving Tips".into()))
        );
    }

    #[test]
    fn author_and_date_attribute() {
        assert_eq!(
            resolve_doc(Field::Author).and_then(Resolved::into_scalar),
            Some("Jane Writer".into())
        );
        assert_eq!(
            resolve_doc(Field::Date).and_then(Resolved::into_scalar),
            Some("Jan 5, 2024".into())
        );
    }

    #[test]
    fn categories_drop_stop_terms() {
        assert_eq!(
            resolve_doc(Field::Categories),
            Some(Resolved::List(vec!["Safety".into()]))
        );
    }

    #[test]
    fn tags_union_dedupes_and_caps_words() {
        assert_eq!(
            resolve_doc(Field::Tags),
            Some(Resolved::List(vec!["Winter".into(), "Tires".into()]))
        );
    }

    #[test]
    fn keywords_meta_is_never_a_tag_source() {
        let tags = resolve_doc(Field::Tags).map(Resolved::into_list).unwrap_or_default();
        assert!(!tags.iter().any(|t| t == "cars"));
    }

    #[test]
    fn meta_selector_reads_content() {
        let doc = Html::parse_document(r#"<head><meta name="author" content="Meta Author"></head>"#);
        let rule = FieldRule {
            selectors: vec![SelectorSpec::Css("meta[name=author]".into())],
            ..Default::default()
        };
        assert_eq!(resolve_scalar(&doc, &rule), Some("Meta Author".into()));
    }

    #[test]
    fn missing_field_is_none() {
        let doc = Html::parse_document("<p>nothing here</p>");
        let rule = FieldRule {
            selectors: vec![SelectorSpec::Css(".author".into())],
            ..Default::default()
        };
        assert_eq!(resolve_scalar(&doc, &rule), None);
    }

    #[test]
    fn invalid_selector_is_skipped() {
        let doc = Html::parse_document("<h1>Title</h1>");
        let rule = FieldRule {
            selectors: vec![
                SelectorSpec::Css("[[[bad".into()),
                SelectorSpec::Css("h1".into()),
            ],
            ..Default::default()
        };
        assert_eq!(resolve_scalar(&doc, &rule), Some("Title".into()));
    }
}
