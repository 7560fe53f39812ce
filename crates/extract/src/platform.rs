// ABOUTME: Content-management platform detection from page markers and the URL host.
// ABOUTME: The detected platform is a diagnostic tag carried on each post record.

use std::collections::HashSet;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

/// Platform a page was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Wix,
    WordPress,
    Webflow,
    DealerOn,
    DealerInspire,
    Squarespace,
    Blogger,
    Medium,
    #[default]
    Generic,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Wix => "wix",
            Platform::WordPress => "wordpress",
            Platform::Webflow => "webflow",
            Platform::DealerOn => "dealeron",
            Platform::DealerInspire => "dealerinspire",
            Platform::Squarespace => "squarespace",
            Platform::Blogger => "blogger",
            Platform::Medium => "medium",
            Platform::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dealer platforms run on WordPress, so they are checked first.
const PRIORITY: &[Platform] = &[
    Platform::DealerOn,
    Platform::DealerInspire,
    Platform::Wix,
    Platform::Squarespace,
    Platform::Webflow,
    Platform::Blogger,
    Platform::Medium,
    Platform::WordPress,
];

const MARKERS: &[(&str, Platform)] = &[
    ("dealeron", Platform::DealerOn),
    ("dealerinspire", Platform::DealerInspire),
    ("dealer inspire", Platform::DealerInspire),
    ("static.wixstatic.com", Platform::Wix),
    ("wix-image", Platform::Wix),
    ("data-hook=\"post-title\"", Platform::Wix),
    ("static1.squarespace.com", Platform::Squarespace),
    ("squarespace-cdn", Platform::Squarespace),
    ("data-wf-page", Platform::Webflow),
    ("webflow.com", Platform::Webflow),
    ("w-richtext", Platform::Webflow),
    ("blogger.com", Platform::Blogger),
    ("blogspot.com", Platform::Blogger),
    ("cdn-client.medium.com", Platform::Medium),
    ("miro.medium.com", Platform::Medium),
    ("wp-content", Platform::WordPress),
    ("wp-includes", Platform::WordPress),
    ("content=\"wordpress", Platform::WordPress),
];

const HOST_SUFFIXES: &[(&str, Platform)] = &[
    ("wixsite.com", Platform::Wix),
    ("squarespace.com", Platform::Squarespace),
    ("webflow.io", Platform::Webflow),
    ("blogspot.com", Platform::Blogger),
    ("medium.com", Platform::Medium),
    ("wordpress.com", Platform::WordPress),
];

static MARKER_MATCHER: Lazy<Option<AhoCorasick>> = Lazy::new(|| {
    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::Standard)
        .build(MARKERS.iter().map(|(m, _)| *m))
        .ok()
});

/// Detects the platform of a page from its source and URL.
pub fn detect_platform(html: &str, url: &str) -> Platform {
    let mut found: HashSet<Platform> = HashSet::new();

    if let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
        for (suffix, platform) in HOST_SUFFIXES {
            if host == *suffix || host.ends_with(&format!(".{}", suffix)) {
                found.insert(*platform);
            }
        }
    }

    if let Some(ac) = MARKER_MATCHER.as_ref() {
        for m in ac.find_overlapping_iter(html) {
            found.insert(MARKERS[m.pattern().as_usize()].1);
        }
    }

    PRIORITY
        .iter()
        .copied()
        .find(|p| found.contains(p))
        .unwrap_or(Platform::Generic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wordpress_from_asset_paths() {
        let html = r#"<link rel="stylesheet" href="/wp-content/themes/x/style.css">"#;
        assert_eq!(detect_platform(html, "https://example.com/post"), Platform::WordPress);
    }

    #[test]
    fn dealer_platform_beats_wordpress() {
        let html = r#"<script src="/wp-content/plugins/dealerinspire/x.js"></script>"#;
        assert_eq!(
            detect_platform(html, "https://dealer.example.com/blog/x"),
            Platform::DealerInspire
        );
    }

    #[test]
    fn wix_from_host_and_markers() {
        assert_eq!(
            detect_platform("<p>hi</p>", "https://someone.wixsite.com/blog/post/x"),
            Platform::Wix
        );
        assert_eq!(
            detect_platform(r#"<img src="https://static.wixstatic.com/media/a.jpg">"#, "https://x.com"),
            Platform::Wix
        );
    }

    #[test]
    fn unknown_is_generic() {
        assert_eq!(detect_platform("<p>plain</p>", "https://example.org/a"), Platform::Generic);
        assert_eq!(Platform::Generic.to_string(), "generic");
    }
}
