// ABOUTME: PostRecord and its parts: the immutable result of extracting one URL.
// ABOUTME: Includes status, link and image types plus the failed-record constructor.

use serde::{Deserialize, Serialize};

use crate::blocks::ContentBlock;
use crate::error::ExtractError;
use crate::platform::Platform;

/// Outcome of processing one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Success,
    Duplicate,
    Failed,
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PostStatus::Success => "success",
            PostStatus::Duplicate => "duplicate",
            PostStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// A hyperlink found in the post content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

/// An image found in the post content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    /// Remote URL the image was downloaded from when `src` is a local file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl ImageRef {
    /// The remote URL of the image: `source_url` for downloaded images,
    /// otherwise `src`.
    pub fn remote_url(&self) -> &str {
        self.source_url.as_deref().unwrap_or(&self.src)
    }
}

/// The extracted post. Built once per URL and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub url: String,
    pub title: String,
    pub author: String,
    /// Raw date string as found on the page (parsed only at export time).
    pub date: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub links: Vec<Link>,
    pub images: Vec<ImageRef>,
    pub blocks: Vec<ContentBlock>,
    /// Rendered block markup.
    pub content: String,
    pub content_length: usize,
    pub platform: Platform,
    pub status: PostStatus,
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PostRecord {
    /// A failed record for `url`.
    pub fn failed(url: impl Into<String>, err: &ExtractError) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            author: String::new(),
            date: String::new(),
            categories: Vec::new(),
            tags: Vec::new(),
            links: Vec::new(),
            images: Vec::new(),
            blocks: Vec::new(),
            content: String::new(),
            content_length: 0,
            platform: Platform::Generic,
            status: PostStatus::Failed,
            fingerprint: String::new(),
            error: Some(err.reason()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PostStatus::Success
    }

    pub fn is_duplicate(&self) -> bool {
        self.status == PostStatus::Duplicate
    }

    pub fn is_failed(&self) -> bool {
        self.status == PostStatus::Failed
    }
}
