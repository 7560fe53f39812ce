// ABOUTME: WordPress eXtended RSS (WXR 1.2) writer for extracted posts and their image attachments.
// ABOUTME: Free text is written as CDATA, split so that a literal "]]>" can never end a section early.

use std::borrow::Cow;
use std::path::Path;

use blogport_extract::PostRecord;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::ExportError;
use crate::options::{exportable, ExportOptions};
use crate::time_parse::{format_rfc2822, format_wp_date, post_date_or};
use crate::urls::{absolutize_links, base_domain, relativize_links, slug_from_url, slugify};

pub const WXR_VERSION: &str = "1.2";

const NAMESPACES: &[(&str, &str)] = &[
    ("xmlns:excerpt", "http://wordpress.org/export/1.2/excerpt/"),
    ("xmlns:content", "http://purl.org/rss/1.0/modules/content/"),
    ("xmlns:wfw", "http://wellformedweb.org/CommentAPI/"),
    ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
    ("xmlns:wp", "http://wordpress.org/export/1.2/"),
];

/// Upper bound of derived post and attachment ids.
const MAX_ID: u64 = 9_999_999;

/// Stable id in `1..=9_999_999` from the first 8 bytes of SHA-256(`key`).
///
/// Distinct keys can map to the same id; collisions are not detected.
pub fn derive_id(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    1 + u64::from_be_bytes(head) % MAX_ID
}

/// Id of the attachment for image `src` inside the post at `parent_url`.
pub fn attachment_id(parent_url: &str, src: &str) -> u64 {
    derive_id(&format!("{}#{}", parent_url, src))
}

/// Removes characters XML 1.0 cannot carry.
fn xml_safe(text: &str) -> Cow<'_, str> {
    let invalid = |c: char| (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r');
    if text.chars().any(invalid) {
        Cow::Owned(text.chars().filter(|c| !invalid(*c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}

struct WxrWriter {
    w: Writer<Vec<u8>>,
}

impl WxrWriter {
    fn new() -> Self {
        Self {
            w: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn emit(&mut self, event: Event<'_>) -> Result<(), ExportError> {
        self.w.write_event(event).map_err(ExportError::xml)
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
        let mut el = BytesStart::new(name);
        for attr in attrs {
            el.push_attribute(*attr);
        }
        self.emit(Event::Start(el))
    }

    fn end(&mut self, name: &str) -> Result<(), ExportError> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    /// `<name>escaped text</name>`
    fn text(&mut self, name: &str, text: &str) -> Result<(), ExportError> {
        self.start(name, &[])?;
        self.emit(Event::Text(BytesText::new(&xml_safe(text))))?;
        self.end(name)
    }

    /// `<name attrs><![CDATA[text]]></name>`
    fn cdata_with(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<(), ExportError> {
        self.start(name, attrs)?;
        self.cdata(text)?;
        self.end(name)
    }

    fn cdata_text(&mut self, name: &str, text: &str) -> Result<(), ExportError> {
        self.cdata_with(name, &[], text)
    }

    /// Writes `text` as one or more adjacent CDATA sections: every `]]>`
    /// is cut after `]]`, so the `>` opens the next section.
    fn cdata(&mut self, text: &str) -> Result<(), ExportError> {
        let text = xml_safe(text);
        let mut rest: &str = &text;
        while let Some(idx) = rest.find("]]>") {
            let (head, tail) = rest.split_at(idx + 2);
            self.emit(Event::CData(BytesCData::new(head)))?;
            rest = tail;
        }
        self.emit(Event::CData(BytesCData::new(rest)))
    }

    fn finish(self) -> Result<String, ExportError> {
        String::from_utf8(self.w.into_inner()).map_err(ExportError::xml)
    }
}

/// Distinct authors in order of first appearance.
fn authors<'a>(posts: &[&'a PostRecord]) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for post in posts {
        if !seen.contains(&post.author.as_str()) {
            seen.push(post.author.as_str());
        }
    }
    seen
}

fn author_login(name: &str) -> String {
    let login = slugify(name);
    if login.is_empty() {
        "author".to_string()
    } else {
        login
    }
}

/// Post markup as it goes into `content:encoded`.
fn export_content(post: &PostRecord, opts: &ExportOptions) -> String {
    let content = absolutize_links(&post.content, &post.url);
    if opts.relative_links {
        relativize_links(&content, &post.url)
    } else {
        content
    }
}

fn attachment_title(src: &str, alt: &str) -> String {
    if !alt.trim().is_empty() {
        return alt.trim().to_string();
    }
    Url::parse(src)
        .ok()
        .and_then(|u| {
            u.path_segments()?
                .filter(|s| !s.is_empty())
                .last()
                .map(str::to_string)
        })
        .unwrap_or_else(|| src.to_string())
}

fn write_channel_header(
    x: &mut WxrWriter,
    posts: &[&PostRecord],
    opts: &ExportOptions,
    now: &DateTime<Utc>,
) -> Result<(), ExportError> {
    let site_url = opts
        .site_url
        .clone()
        .or_else(|| posts.first().and_then(|p| base_domain(&p.url)))
        .unwrap_or_default();

    x.text("title", &opts.site_title)?;
    x.text("link", &site_url)?;
    x.text("description", "Imported blog posts")?;
    x.text("pubDate", &format_rfc2822(now))?;
    x.text("language", &opts.language)?;
    x.text("wp:wxr_version", WXR_VERSION)?;
    x.text("wp:base_site_url", &site_url)?;
    x.text("wp:base_blog_url", &site_url)?;

    for (i, name) in authors(posts).into_iter().enumerate() {
        x.start("wp:author", &[])?;
        x.text("wp:author_id", &(i + 1).to_string())?;
        x.cdata_text("wp:author_login", &author_login(name))?;
        x.cdata_text("wp:author_email", "")?;
        x.cdata_text("wp:author_display_name", name)?;
        x.cdata_text("wp:author_first_name", "")?;
        x.cdata_text("wp:author_last_name", "")?;
        x.end("wp:author")?;
    }

    x.text("generator", concat!("blogport/", env!("CARGO_PKG_VERSION")))
}

fn write_post_item(
    x: &mut WxrWriter,
    post: &PostRecord,
    opts: &ExportOptions,
    now: &DateTime<Utc>,
) -> Result<u64, ExportError> {
    let id = derive_id(&post.url);
    let date = post_date_or(&post.date, *now);
    let wp_date = format_wp_date(&date);

    x.start("item", &[])?;
    x.cdata_text("title", &post.title)?;
    x.text("link", &post.url)?;
    x.text("pubDate", &format_rfc2822(&date))?;
    x.cdata_text("dc:creator", &author_login(&post.author))?;
    x.start("guid", &[("isPermaLink", "false")])?;
    x.emit(Event::Text(BytesText::new(&post.url)))?;
    x.end("guid")?;
    x.text("description", "")?;
    x.cdata_text("content:encoded", &export_content(post, opts))?;
    x.cdata_text("excerpt:encoded", "")?;
    x.text("wp:post_id", &id.to_string())?;
    x.cdata_text("wp:post_date", &wp_date)?;
    x.cdata_text("wp:post_date_gmt", &wp_date)?;
    x.cdata_text("wp:comment_status", "closed")?;
    x.cdata_text("wp:ping_status", "closed")?;
    x.cdata_text("wp:post_name", &slug_from_url(&post.url))?;
    x.cdata_text("wp:status", "publish")?;
    x.text("wp:post_parent", "0")?;
    x.text("wp:menu_order", "0")?;
    x.cdata_text("wp:post_type", "post")?;
    x.cdata_text("wp:post_password", "")?;
    x.text("wp:is_sticky", "0")?;
    for category in &post.categories {
        let nicename = slugify(category);
        x.cdata_with(
            "category",
            &[("domain", "category"), ("nicename", nicename.as_str())],
            category,
        )?;
    }
    for tag in &post.tags {
        let nicename = slugify(tag);
        x.cdata_with(
            "category",
            &[("domain", "post_tag"), ("nicename", nicename.as_str())],
            tag,
        )?;
    }
    x.end("item")?;
    Ok(id)
}

/// One attachment item per image, pointing at its remote URL. Downloaded
/// images use the URL they came from; images with no http(s) URL at all
/// have nothing to import.
fn write_attachments(
    x: &mut WxrWriter,
    post: &PostRecord,
    parent_id: u64,
    now: &DateTime<Utc>,
) -> Result<(), ExportError> {
    let date = format_wp_date(&post_date_or(&post.date, *now));
    for image in &post.images {
        let src = image.remote_url();
        let is_remote = Url::parse(src)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !is_remote {
            continue;
        }
        let title = attachment_title(src, &image.alt);

        x.start("item", &[])?;
        x.cdata_text("title", &title)?;
        x.text("link", src)?;
        x.cdata_text("dc:creator", &author_login(&post.author))?;
        x.start("guid", &[("isPermaLink", "false")])?;
        x.emit(Event::Text(BytesText::new(src)))?;
        x.end("guid")?;
        x.text("description", "")?;
        x.cdata_text("content:encoded", "")?;
        x.cdata_text("excerpt:encoded", &image.alt)?;
        x.text("wp:post_id", &attachment_id(&post.url, src).to_string())?;
        x.cdata_text("wp:post_date", &date)?;
        x.cdata_text("wp:post_date_gmt", &date)?;
        x.cdata_text("wp:comment_status", "closed")?;
        x.cdata_text("wp:ping_status", "closed")?;
        x.cdata_text("wp:post_name", &slugify(&title))?;
        x.cdata_text("wp:status", "inherit")?;
        x.text("wp:post_parent", &parent_id.to_string())?;
        x.text("wp:menu_order", "0")?;
        x.cdata_text("wp:post_type", "attachment")?;
        x.cdata_text("wp:post_password", "")?;
        x.text("wp:is_sticky", "0")?;
        x.cdata_text("wp:attachment_url", src)?;
        x.end("item")?;
    }
    Ok(())
}

/// Serializes posts to WXR, dating unparseable posts with the current time.
pub fn to_wxr(posts: &[PostRecord], opts: &ExportOptions) -> Result<String, ExportError> {
    to_wxr_at(posts, opts, Utc::now())
}

/// Serializes posts to WXR with a fixed export time.
pub fn to_wxr_at(
    posts: &[PostRecord],
    opts: &ExportOptions,
    now: DateTime<Utc>,
) -> Result<String, ExportError> {
    let posts = exportable(posts, opts.duplicate_policy);
    let mut x = WxrWriter::new();

    x.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut rss: Vec<(&str, &str)> = vec![("version", "2.0")];
    rss.extend_from_slice(NAMESPACES);
    x.start("rss", &rss)?;
    x.start("channel", &[])?;

    write_channel_header(&mut x, &posts, opts, &now)?;
    for post in &posts {
        let id = write_post_item(&mut x, post, opts, &now)?;
        write_attachments(&mut x, post, id, &now)?;
    }

    x.end("channel")?;
    x.end("rss")?;

    let mut xml = x.finish()?;
    for (find, replace) in &opts.replacements {
        if !find.is_empty() {
            xml = xml.replace(find.as_str(), replace);
        }
    }
    Ok(xml)
}

/// Writes the WXR export to `path`.
pub fn write_wxr(
    path: impl AsRef<Path>,
    posts: &[PostRecord],
    opts: &ExportOptions,
) -> Result<(), ExportError> {
    std::fs::write(path, to_wxr(posts, opts)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_stay_in_range_and_are_stable() {
        for url in ["https://a.com/1", "https://a.com/2", "", "https://b.org/x?y=z"] {
            let id = derive_id(url);
            assert!((1..=MAX_ID).contains(&id), "{} out of range", id);
            assert_eq!(id, derive_id(url));
        }
        assert_ne!(derive_id("https://a.com/1"), derive_id("https://a.com/2"));
    }

    #[test]
    fn attachment_id_depends_on_parent_and_src() {
        assert_eq!(
            attachment_id("https://a.com/p", "https://a.com/i.jpg"),
            derive_id("https://a.com/p#https://a.com/i.jpg")
        );
    }

    #[test]
    fn cdata_splits_terminator() {
        let mut x = WxrWriter {
            w: Writer::new(Vec::new()),
        };
        x.cdata("before]]>after").unwrap();
        assert_eq!(
            x.finish().unwrap(),
            "<![CDATA[before]]]]><![CDATA[>after]]>"
        );
    }

    #[test]
    fn control_characters_are_dropped() {
        assert_eq!(xml_safe("a\u{1}b\tc"), "ab\tc");
        assert!(matches!(xml_safe("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn attachment_title_falls_back_to_file_name() {
        assert_eq!(attachment_title("https://a.com/img/car.jpg", ""), "car.jpg");
        assert_eq!(attachment_title("https://a.com/img/car.jpg", " Red car "), "Red car");
    }
}
