// ABOUTME: Stop-list filter for category and tag candidates.
// ABOUTME: Rejects entries containing any stop term as a whole word, case-insensitively.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// Terms that mark navigation or widget text rather than a real taxonomy entry.
pub const DEFAULT_STOP_TERMS: &[&str] = &[
    "uncategorized",
    "all posts",
    "blog",
    "home",
    "read more",
    "share",
    "facebook",
    "twitter",
    "pinterest",
    "linkedin",
    "instagram",
    "email",
    "print",
    "comments",
    "previous post",
    "next post",
    "contact us",
    "about us",
    "directions",
    "sitemap",
    "privacy policy",
    // dealer site navigation
    "inventory",
    "dealer",
    "dealership",
    "new vehicles",
    "used vehicles",
    "pre-owned",
    "certified pre-owned",
    "specials",
    "schedule service",
    "value your trade",
    "test drive",
    "shop now",
];

/// A compiled set of stop terms.
#[derive(Debug, Clone)]
pub struct StopList {
    terms: Vec<String>,
    matcher: Option<AhoCorasick>,
}

impl Default for StopList {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_TERMS.iter().copied())
    }
}

impl StopList {
    /// Builds a stop-list from terms; blank terms are ignored.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let matcher = if terms.is_empty() {
            None
        } else {
            AhoCorasickBuilder::new()
                .ascii_case_insensitive(true)
                .match_kind(MatchKind::Standard)
                .build(&terms)
                .ok()
        };
        Self { terms, matcher }
    }

    /// One term per line; blank lines and `#` comments are skipped.
    pub fn from_lines(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        )
    }

    /// An empty stop-list that rejects nothing.
    pub fn empty() -> Self {
        Self::new(std::iter::empty::<&str>())
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Returns true if any term occurs in `entry` as a whole word.
    pub fn rejects(&self, entry: &str) -> bool {
        let Some(ac) = &self.matcher else {
            return false;
        };
        let bytes = entry.as_bytes();
        ac.find_overlapping_iter(entry).any(|m| {
            let before_ok = m.start() == 0 || !is_word_byte(bytes[m.start() - 1]);
            let after_ok = m.end() == bytes.len() || !is_word_byte(bytes[m.end()]);
            before_ok && after_ok
        })
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_word_match_rejects() {
        let stop = StopList::default();
        assert!(stop.rejects("Uncategorized"));
        assert!(stop.rejects("Our Blog"));
        assert!(stop.rejects("READ MORE"));
    }

    #[test]
    fn dealer_navigation_is_rejected() {
        let stop = StopList::default();
        assert!(stop.rejects("New Inventory"));
        assert!(stop.rejects("Dealer News"));
        assert!(stop.rejects("Used Vehicles"));
        assert!(stop.rejects("Service Specials"));
        assert!(stop.rejects("Contact Us"));
        assert!(stop.rejects("Home"));
        assert!(!stop.rejects("Winter Driving"));
        assert!(!stop.rejects("Brake Service"));
    }

    #[test]
    fn partial_word_does_not_reject() {
        let stop = StopList::default();
        assert!(!stop.rejects("Blogging Tips"));
        assert!(!stop.rejects("Homeowners"));
        assert!(!stop.rejects("Car Maintenance"));
    }

    #[test]
    fn overlapping_terms_still_checked() {
        let stop = StopList::new(["home", "homepage"]);
        assert!(stop.rejects("homepage"));
        assert!(!stop.rejects("homeward"));
    }

    #[test]
    fn from_lines_skips_comments() {
        let stop = StopList::from_lines("# generic\nsale\n\n  deals  \n");
        assert_eq!(stop.terms(), &["sale".to_string(), "deals".to_string()]);
        assert!(stop.rejects("Holiday Deals"));
        assert!(!stop.rejects("Uncategorized"));
    }

    #[test]
    fn empty_list_rejects_nothing() {
        assert!(!StopList::empty().rejects("anything"));
    }
}
