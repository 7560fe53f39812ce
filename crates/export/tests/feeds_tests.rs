// ABOUTME: Integration tests for the JSON, CSV and link exports.
// ABOUTME: Re-reads JSON with serde_json and CSV with the csv reader.

use blogport_export::{
    analyze_links, link_dump, to_csv, to_json_at, ExportOptions, JsonExport, CSV_HEADER,
};
use blogport_extract::{DuplicatePolicy, Link, Platform, PostRecord, PostStatus};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

fn link(text: &str, url: &str) -> Link {
    Link {
        text: text.to_string(),
        url: url.to_string(),
    }
}

fn post(url: &str, title: &str, links: Vec<Link>) -> PostRecord {
    PostRecord {
        url: url.to_string(),
        title: title.to_string(),
        author: "Dana Reyes".to_string(),
        date: "January 15, 2024".to_string(),
        categories: vec!["Tires".to_string(), "Safety".to_string()],
        tags: vec!["winter".to_string()],
        links,
        images: vec![],
        blocks: vec![],
        content: "<!-- wp:paragraph -->\n<p>One, two \"three\"</p>\n<!-- /wp:paragraph -->"
            .to_string(),
        content_length: 17,
        platform: Platform::WordPress,
        status: PostStatus::Success,
        fingerprint: String::new(),
        error: None,
    }
}

fn sample() -> Vec<PostRecord> {
    let mut failed = post("https://shop.example.com/blog/broken", "", vec![]);
    failed.status = PostStatus::Failed;
    vec![
        post(
            "https://shop.example.com/blog/tires",
            "Winter Tires",
            vec![
                link("tire center", "https://shop.example.com/service/tires/"),
                link("NHTSA", "https://www.nhtsa.gov/winter"),
            ],
        ),
        post("https://shop.example.com/blog/quiet", "Quiet Post", vec![]),
        failed,
    ]
}

#[test]
fn json_export_lists_exported_posts() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
    let json = to_json_at(&sample(), &ExportOptions::default(), now).unwrap();
    let doc: JsonExport = serde_json::from_str(&json).unwrap();

    assert_eq!(doc.export_date, "2024-05-10T12:00:00Z");
    assert_eq!(doc.total_posts, 2);
    assert_eq!(doc.posts[0].title, "Winter Tires");
    assert_eq!(doc.posts[0].platform, Platform::WordPress);
    assert_eq!(doc.posts[0].links.len(), 2);
    assert!(json.contains("\"platform\": \"wordpress\""));
}

#[test]
fn csv_export_joins_lists() {
    let csv_text = to_csv(&sample(), &ExportOptions::default()).unwrap();
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    assert_eq!(header, CSV_HEADER.to_vec());

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    let first = &rows[0];
    assert_eq!(&first[0], "https://shop.example.com/blog/tires");
    assert_eq!(&first[4], "wordpress");
    assert_eq!(
        &first[5],
        "<!-- wp:paragraph -->\n<p>One, two \"three\"</p>\n<!-- /wp:paragraph -->"
    );
    assert_eq!(&first[7], "Tires; Safety");
    assert_eq!(
        &first[9],
        "tire center -> https://shop.example.com/service/tires/; NHTSA -> https://www.nhtsa.gov/winter"
    );
}

#[test]
fn link_dump_matches_text_layout() {
    let dump = link_dump(&sample(), DuplicatePolicy::Skip);
    let expected = format!(
        "# Extracted Hyperlinks from Blog Posts\n\
         # Format: [Post Title] Link Text -> URL\n\n\
         ## Winter Tires\n\
         Source: https://shop.example.com/blog/tires\n\n\
         tire center -> https://shop.example.com/service/tires/\n\
         NHTSA -> https://www.nhtsa.gov/winter\n\
         \n{}\n\n",
        "=".repeat(80)
    );
    assert_eq!(dump, expected);
}

#[test]
fn link_analysis_splits_internal_and_external() {
    let analysis = analyze_links(&sample(), DuplicatePolicy::Skip);
    assert_eq!(analysis.total, 2);
    assert_eq!(analysis.internal, 1);
    assert_eq!(analysis.external, 1);
    assert_eq!(analysis.posts.len(), 2);
    assert_eq!(analysis.posts[0].internal[0].text, "tire center");
    assert_eq!(analysis.posts[0].external[0].text, "NHTSA");

    let hosts: Vec<(&str, usize)> = analysis
        .hosts
        .iter()
        .map(|h| (h.host.as_str(), h.count))
        .collect();
    assert_eq!(hosts, vec![("shop.example.com", 1), ("www.nhtsa.gov", 1)]);
    assert!(analysis.to_string().starts_with("2 links (1 internal, 1 external)"));
}
