// ABOUTME: JSON export of extracted posts with an export date and post count.
// ABOUTME: Serialized through serde with stable field order.

use std::path::Path;

use blogport_extract::{Link, Platform, PostRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::options::{exportable, ExportOptions};

/// One post in the JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonPost {
    pub url: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub platform: Platform,
    pub content: String,
    pub content_length: usize,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub links: Vec<Link>,
}

impl From<&PostRecord> for JsonPost {
    fn from(post: &PostRecord) -> Self {
        Self {
            url: post.url.clone(),
            title: post.title.clone(),
            author: post.author.clone(),
            date: post.date.clone(),
            platform: post.platform,
            content: post.content.clone(),
            content_length: post.content_length,
            categories: post.categories.clone(),
            tags: post.tags.clone(),
            links: post.links.clone(),
        }
    }
}

/// Top-level JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonExport {
    pub export_date: String,
    pub total_posts: usize,
    pub posts: Vec<JsonPost>,
}

pub fn to_json(posts: &[PostRecord], opts: &ExportOptions) -> Result<String, ExportError> {
    to_json_at(posts, opts, Utc::now())
}

pub fn to_json_at(
    posts: &[PostRecord],
    opts: &ExportOptions,
    now: DateTime<Utc>,
) -> Result<String, ExportError> {
    let posts: Vec<JsonPost> = exportable(posts, opts.duplicate_policy)
        .into_iter()
        .map(JsonPost::from)
        .collect();
    let doc = JsonExport {
        export_date: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        total_posts: posts.len(),
        posts,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn write_json(
    path: impl AsRef<Path>,
    posts: &[PostRecord],
    opts: &ExportOptions,
) -> Result<(), ExportError> {
    std::fs::write(path, to_json(posts, opts)?)?;
    Ok(())
}
