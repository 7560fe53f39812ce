// ABOUTME: Declarative selector rules for post fields: ordered candidates and resolution policy.
// ABOUTME: Deserialized from JSON into a SelectorTable that drives the selector resolver.

//! Selector rule definitions.
//!
//! Every semantic field of a post has an ordered list of candidate
//! selectors. Scalar fields take the first non-empty match, set fields take
//! the union over all candidates. The whole table is plain data so it can
//! be replaced at runtime with a user-supplied JSON file.

use serde::{Deserialize, Serialize};

/// Specifies how to select content from the DOM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorSpec {
    /// A CSS selector whose text is used, e.g. `"h1.entry-title"`.
    /// `meta[...]` selectors yield their `content` attribute.
    Css(String),
    /// A CSS selector with attribute extraction, e.g. `["time", "datetime"]`
    CssAttr(Vec<String>),
}

impl SelectorSpec {
    /// The CSS part of the selector.
    pub fn css(&self) -> &str {
        match self {
            SelectorSpec::Css(css) => css,
            SelectorSpec::CssAttr(parts) => parts.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// The attribute to read, if any.
    pub fn attr(&self) -> Option<&str> {
        match self {
            SelectorSpec::Css(css) if css.trim_start().starts_with("meta") => Some("content"),
            SelectorSpec::Css(_) => None,
            SelectorSpec::CssAttr(parts) => parts.get(1).map(String::as_str),
        }
    }
}

/// How the candidates of a field combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// First non-empty match across the ordered candidates.
    #[default]
    First,
    /// Every match of every candidate, deduplicated in first-seen order.
    Union,
}

/// Candidates for a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(default)]
    pub selectors: Vec<SelectorSpec>,
    #[serde(default)]
    pub resolution: Resolution,
    /// Entries with more words than this are rejected (set fields).
    #[serde(default)]
    pub max_words: Option<usize>,
}

fn default_min_chars() -> usize {
    100
}

/// Candidates for the main content element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRule {
    #[serde(flatten)]
    pub field: FieldRule,
    /// Selectors removed from the chosen element before normalization
    #[serde(default)]
    pub clean: Vec<String>,
    /// The matched element needs strictly more text than this.
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
}

impl Default for ContentRule {
    fn default() -> Self {
        Self {
            field: FieldRule::default(),
            clean: Vec::new(),
            min_chars: default_min_chars(),
        }
    }
}

/// The full set of rules used to resolve a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorTable {
    #[serde(default)]
    pub title: FieldRule,
    #[serde(default)]
    pub author: FieldRule,
    #[serde(default)]
    pub date: FieldRule,
    #[serde(default)]
    pub categories: FieldRule,
    #[serde(default)]
    pub tags: FieldRule,
    #[serde(default)]
    pub content: ContentRule,
}

/// Semantic fields resolved from a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Author,
    Date,
    Categories,
    Tags,
    Content,
}

impl SelectorTable {
    /// Parses a table from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The rule for a field.
    pub fn rule(&self, field: Field) -> &FieldRule {
        match field {
            Field::Title => &self.title,
            Field::Author => &self.author,
            Field::Date => &self.date,
            Field::Categories => &self.categories,
            Field::Tags => &self.tags,
            Field::Content => &self.content.field,
        }
    }

    /// Every CSS selector in the table, for cache warm-up.
    pub fn all_selectors(&self) -> Vec<&str> {
        [
            &self.title,
            &self.author,
            &self.date,
            &self.categories,
            &self.tags,
            &self.content.field,
        ]
        .iter()
        .flat_map(|rule| rule.selectors.iter().map(SelectorSpec::css))
        .chain(self.content.clean.iter().map(String::as_str))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_spec_forms_deserialize() {
        let specs: Vec<SelectorSpec> =
            serde_json::from_str(r#"["h1", ["time", "datetime"], "meta[name=author]"]"#).unwrap();
        assert_eq!(specs[0].css(), "h1");
        assert_eq!(specs[0].attr(), None);
        assert_eq!(specs[1].css(), "time");
        assert_eq!(specs[1].attr(), Some("datetime"));
        assert_eq!(specs[2].attr(), Some("content"));
    }

    #[test]
    fn content_rule_defaults() {
        let table = SelectorTable::from_json(
            r#"{"title": {"selectors": ["h1"]}, "content": {"selectors": ["article"]}}"#,
        )
        .unwrap();
        assert_eq!(table.content.min_chars, 100);
        assert!(table.content.clean.is_empty());
        assert_eq!(table.title.resolution, Resolution::First);
        assert!(table.tags.selectors.is_empty());
    }

    #[test]
    fn union_resolution_parses() {
        let rule: FieldRule =
            serde_json::from_str(r#"{"selectors": [".tags a"], "resolution": "union", "max_words": 5}"#)
                .unwrap();
        assert_eq!(rule.resolution, Resolution::Union);
        assert_eq!(rule.max_words, Some(5));
    }
}
