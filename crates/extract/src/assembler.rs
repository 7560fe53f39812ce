// ABOUTME: Post assembler combining resolved fields, converted blocks and duplicate status.
// ABOUTME: Applies the sentinel values for missing title, author and date.

use chrono::Local;

use crate::blocks::ContentBlock;
use crate::duplicate::DuplicateDetector;
use crate::platform::Platform;
use crate::post::{ImageRef, Link, PostRecord, PostStatus};

pub const UNTITLED: &str = "Untitled Post";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Everything extracted from a page before the duplicate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub links: Vec<Link>,
    pub images: Vec<ImageRef>,
    pub blocks: Vec<ContentBlock>,
    /// Rendered block markup.
    pub content: String,
    pub content_length: usize,
    pub platform: Platform,
    pub fingerprint: String,
}

fn or_sentinel(value: Option<String>, sentinel: impl FnOnce() -> String) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(sentinel)
}

/// Builds the final record; the detector decides between success and
/// duplicate.
pub fn assemble(draft: Draft, detector: &DuplicateDetector) -> PostRecord {
    let status = if detector.check_fingerprint(&draft.fingerprint) {
        PostStatus::Duplicate
    } else {
        PostStatus::Success
    };

    PostRecord {
        url: draft.url,
        title: or_sentinel(draft.title, || UNTITLED.to_string()),
        author: or_sentinel(draft.author, || UNKNOWN_AUTHOR.to_string()),
        date: or_sentinel(draft.date, || Local::now().format("%Y-%m-%d").to_string()),
        categories: draft.categories,
        tags: draft.tags,
        links: draft.links,
        images: draft.images,
        blocks: draft.blocks,
        content: draft.content,
        content_length: draft.content_length,
        platform: draft.platform,
        status,
        fingerprint: draft.fingerprint,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicate::fingerprint;

    fn draft(content: &str) -> Draft {
        Draft {
            url: "https://example.com/a".into(),
            title: None,
            author: Some("  ".into()),
            date: None,
            categories: vec![],
            tags: vec![],
            links: vec![],
            images: vec![],
            blocks: vec![],
            content: content.into(),
            content_length: content.len(),
            platform: Platform::Generic,
            fingerprint: fingerprint(content),
        }
    }

    #[test]
    fn missing_fields_use_sentinels() {
        let detector = DuplicateDetector::default();
        let record = assemble(draft("x"), &detector);
        assert_eq!(record.title, UNTITLED);
        assert_eq!(record.author, UNKNOWN_AUTHOR);
        assert_eq!(record.date, Local::now().format("%Y-%m-%d").to_string());
        assert_eq!(record.status, PostStatus::Success);
    }

    #[test]
    fn repeated_content_is_duplicate() {
        let detector = DuplicateDetector::default();
        assert_eq!(assemble(draft("same"), &detector).status, PostStatus::Success);
        assert_eq!(assemble(draft("same"), &detector).status, PostStatus::Duplicate);
    }
}
