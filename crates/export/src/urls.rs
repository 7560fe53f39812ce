// ABOUTME: URL helpers for exports: base domains, slugs and href rewriting inside post markup.
// ABOUTME: Relative links are made absolute; same-host links can be made root-relative.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

static HREF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href="([^"]*)""#).unwrap());

static SLUG_STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Extracts the base domain (scheme + host + optional port) from a URL.
pub fn base_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Some(format!("{}://{}", parsed.scheme(), host)),
    }
}

/// Lowercase ASCII slug: runs of other characters become a single `-`.
pub fn slugify(text: &str) -> String {
    SLUG_STRIP_RE
        .replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Slug from the last non-empty path segment of a post URL.
pub fn slug_from_url(url: &str) -> String {
    let segment = Url::parse(url).ok().and_then(|u| {
        u.path_segments()?
            .filter(|s| !s.is_empty())
            .last()
            .map(str::to_string)
    });
    let segment = segment.unwrap_or_default();
    let segment = segment
        .strip_suffix(".html")
        .or_else(|| segment.strip_suffix(".htm"))
        .unwrap_or(segment.as_str());
    slugify(segment)
}

fn unescape_attr(value: &str) -> String {
    value.replace("&quot;", "\"").replace("&amp;", "&")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Rewrites every `href` in `html` with `f`.
fn rewrite_hrefs<F>(html: &str, f: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    HREF_RE
        .replace_all(html, |caps: &Captures<'_>| {
            let href = unescape_attr(&caps[1]);
            match f(&href) {
                Some(new) => format!("href=\"{}\"", escape_attr(&new)),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Resolves relative `href`s against the post URL.
pub fn absolutize_links(html: &str, post_url: &str) -> String {
    let Ok(base) = Url::parse(post_url) else {
        return html.to_string();
    };
    rewrite_hrefs(html, |href| {
        if href.is_empty() || href.starts_with('#') || Url::parse(href).is_ok() {
            return None;
        }
        base.join(href).ok().map(String::from)
    })
}

/// Turns absolute links to `post_url`'s host into root-relative paths.
pub fn relativize_links(html: &str, post_url: &str) -> String {
    let Some(host) = Url::parse(post_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
    else {
        return html.to_string();
    };
    rewrite_hrefs(html, |href| {
        let url = Url::parse(href).ok()?;
        if url.host_str() != Some(host.as_str()) {
            return None;
        }
        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        if let Some(fragment) = url.fragment() {
            path.push('#');
            path.push_str(fragment);
        }
        Some(path)
    })
}

/// Whether `link` points at the same host as `post_url`.
pub fn is_internal(link: &str, post_url: &str) -> bool {
    let host = |u: &str| Url::parse(u).ok().and_then(|u| u.host_str().map(str::to_string));
    match (host(link), host(post_url)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
