// ABOUTME: Hyperlink exports: the plain-text link dump and the internal/external link analysis.
// ABOUTME: Hosts are counted per run so migrations can see which domains posts point at.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use blogport_extract::{DuplicatePolicy, Link, PostRecord};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ExportError;
use crate::options::exportable;
use crate::urls::is_internal;

const RULE_WIDTH: usize = 80;

/// Plain-text list of every link, grouped by post. Posts without links are
/// left out.
pub fn link_dump(posts: &[PostRecord], policy: DuplicatePolicy) -> String {
    let mut out = String::from(
        "# Extracted Hyperlinks from Blog Posts\n# Format: [Post Title] Link Text -> URL\n\n",
    );
    for post in exportable(posts, policy) {
        if post.links.is_empty() {
            continue;
        }
        out.push_str(&format!("## {}\nSource: {}\n\n", post.title, post.url));
        for link in &post.links {
            out.push_str(&format!("{} -> {}\n", link.text, link.url));
        }
        out.push('\n');
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push_str("\n\n");
    }
    out
}

pub fn write_link_dump(
    path: impl AsRef<Path>,
    posts: &[PostRecord],
    policy: DuplicatePolicy,
) -> Result<(), ExportError> {
    std::fs::write(path, link_dump(posts, policy))?;
    Ok(())
}

/// Links of one post split by destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostLinks {
    pub url: String,
    pub title: String,
    pub internal: Vec<Link>,
    pub external: Vec<Link>,
}

/// Number of links pointing at one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCount {
    pub host: String,
    pub count: usize,
}

/// Link statistics for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAnalysis {
    pub posts: Vec<PostLinks>,
    pub total: usize,
    pub internal: usize,
    pub external: usize,
    /// Most linked hosts first; ties by name.
    pub hosts: Vec<HostCount>,
}

/// Splits every post's links into same-host and other-host ones.
pub fn analyze_links(posts: &[PostRecord], policy: DuplicatePolicy) -> LinkAnalysis {
    let mut analysis = LinkAnalysis::default();
    let mut hosts: HashMap<String, usize> = HashMap::new();

    for post in exportable(posts, policy) {
        let (internal, external): (Vec<Link>, Vec<Link>) = post
            .links
            .iter()
            .cloned()
            .partition(|l| is_internal(&l.url, &post.url));

        for link in &post.links {
            if let Some(host) = Url::parse(&link.url).ok().and_then(|u| u.host_str().map(str::to_string)) {
                *hosts.entry(host).or_default() += 1;
            }
        }

        analysis.total += post.links.len();
        analysis.internal += internal.len();
        analysis.external += external.len();
        analysis.posts.push(PostLinks {
            url: post.url.clone(),
            title: post.title.clone(),
            internal,
            external,
        });
    }

    let mut hosts: Vec<HostCount> = hosts
        .into_iter()
        .map(|(host, count)| HostCount { host, count })
        .collect();
    hosts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.host.cmp(&b.host)));
    analysis.hosts = hosts;
    analysis
}

impl fmt::Display for LinkAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} links ({} internal, {} external)",
            self.total, self.internal, self.external
        )?;
        for host in &self.hosts {
            write!(f, "\n  {}: {}", host.host, host.count)?;
        }
        Ok(())
    }
}
