// ABOUTME: RunReport and RunSummary: the records and statistics produced by one extraction run.
// ABOUTME: The summary counts outcomes and lists every failed URL with its reason.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::duplicate::DuplicatePolicy;
use crate::post::{PostRecord, PostStatus};

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, crate::error::ExtractError>;

/// A URL that produced no post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub url: String,
    pub reason: String,
}

/// Counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub images_downloaded: usize,
    pub failures: Vec<Failure>,
}

impl RunSummary {
    /// Tallies the outcome of every record.
    pub fn from_posts(posts: &[PostRecord], images_downloaded: usize) -> Self {
        let mut summary = Self {
            total: posts.len(),
            images_downloaded,
            ..Self::default()
        };
        for post in posts {
            match post.status {
                PostStatus::Success => summary.success += 1,
                PostStatus::Duplicate => summary.duplicates += 1,
                PostStatus::Failed => {
                    summary.failed += 1;
                    summary.failures.push(Failure {
                        url: post.url.clone(),
                        reason: post.error.clone().unwrap_or_default(),
                    });
                }
            }
        }
        summary
    }

    /// Share of URLs that produced a new post, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.success as f64 * 100.0 / self.total as f64
    }

    /// True when every URL produced a new post.
    pub fn all_succeeded(&self) -> bool {
        self.success == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total URLs: {}", self.total)?;
        writeln!(f, "Successful: {}", self.success)?;
        writeln!(f, "Duplicates: {}", self.duplicates)?;
        writeln!(f, "Failed: {}", self.failed)?;
        writeln!(f, "Images downloaded: {}", self.images_downloaded)?;
        write!(f, "Success rate: {:.1}%", self.success_rate())?;
        if !self.failures.is_empty() {
            write!(f, "\nFailures:")?;
            for failure in &self.failures {
                write!(f, "\n  - {}: {}", failure.url, failure.reason)?;
            }
        }
        Ok(())
    }
}

/// Every record of a run, in input order, with its summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub posts: Vec<PostRecord>,
    pub summary: RunSummary,
}

impl RunReport {
    /// Records that belong in the exported feeds under `policy`.
    pub fn exportable(&self, policy: DuplicatePolicy) -> impl Iterator<Item = &PostRecord> {
        self.posts.iter().filter(move |p| match p.status {
            PostStatus::Success => true,
            PostStatus::Duplicate => policy == DuplicatePolicy::Include,
            PostStatus::Failed => false,
        })
    }
}
