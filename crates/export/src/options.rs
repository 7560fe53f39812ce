// ABOUTME: Export options shared by every feed writer.
// ABOUTME: Also decides which post records belong in an export.

use blogport_extract::{DuplicatePolicy, PostRecord, PostStatus};

/// Settings for the exported feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// WXR channel title.
    pub site_title: String,
    /// Base site URL; taken from the first post when unset.
    pub site_url: Option<String>,
    pub language: String,
    /// Make links to a post's own host root-relative.
    pub relative_links: bool,
    pub duplicate_policy: DuplicatePolicy,
    /// Ordered find/replace pairs applied to the finished XML.
    pub replacements: Vec<(String, String)>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            site_title: "Imported Blog".to_string(),
            site_url: None,
            language: "en-US".to_string(),
            relative_links: false,
            duplicate_policy: DuplicatePolicy::Skip,
            replacements: Vec::new(),
        }
    }
}

/// Records that go into the feeds: successes, plus duplicates under
/// [`DuplicatePolicy::Include`].
pub fn exportable(posts: &[PostRecord], policy: DuplicatePolicy) -> Vec<&PostRecord> {
    posts
        .iter()
        .filter(|p| match p.status {
            PostStatus::Success => true,
            PostStatus::Duplicate => policy == DuplicatePolicy::Include,
            PostStatus::Failed => false,
        })
        .collect()
}
