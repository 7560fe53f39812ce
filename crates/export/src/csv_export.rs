// ABOUTME: CSV export of extracted posts, one row per post.
// ABOUTME: List fields are joined with "; " and links are written as "text -> url".

use std::path::Path;

use blogport_extract::PostRecord;

use crate::error::ExportError;
use crate::options::{exportable, ExportOptions};

pub const CSV_HEADER: [&str; 10] = [
    "url",
    "title",
    "author",
    "date",
    "platform",
    "content",
    "content_length",
    "categories",
    "tags",
    "links",
];

const LIST_SEPARATOR: &str = "; ";

fn row(post: &PostRecord) -> [String; 10] {
    let links: Vec<String> = post
        .links
        .iter()
        .map(|l| format!("{} -> {}", l.text, l.url))
        .collect();
    [
        post.url.clone(),
        post.title.clone(),
        post.author.clone(),
        post.date.clone(),
        post.platform.to_string(),
        post.content.clone(),
        post.content_length.to_string(),
        post.categories.join(LIST_SEPARATOR),
        post.tags.join(LIST_SEPARATOR),
        links.join(LIST_SEPARATOR),
    ]
}

pub fn to_csv(posts: &[PostRecord], opts: &ExportOptions) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;
    for post in exportable(posts, opts.duplicate_policy) {
        wtr.write_record(row(post))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Io(std::io::Error::other(e)))
}

pub fn write_csv(
    path: impl AsRef<Path>,
    posts: &[PostRecord],
    opts: &ExportOptions,
) -> Result<(), ExportError> {
    std::fs::write(path, to_csv(posts, opts)?)?;
    Ok(())
}
