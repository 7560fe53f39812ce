// ABOUTME: End-to-end tests for the extractor over HTML fixtures, static fetchers and a mock server.
// ABOUTME: Covers field resolution, block output, duplicate runs, ordering and image download.

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use blogport_extract::{
    ContentBlock, ExtractError, Extractor, Fetcher, Platform, PostStatus, StopList,
};
use futures::future::BoxFuture;
use httpmock::prelude::*;
use pretty_assertions::assert_eq;

const WP_URL: &str = "https://lakeside.example.com/blog/winter-tire-guide/";
const WIX_URL: &str = "https://detail.example.com/post/spring-detailing-checklist";

/// Load an HTML snapshot from the fixtures directory.
fn load_html_fixture(name: &str) -> String {
    let path = format!(
        "{}/tests/fixtures/html/{}.html",
        env!("CARGO_MANIFEST_DIR"),
        name
    );
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read HTML fixture: {}", path))
}

/// Serves pages from memory and counts requests.
struct StaticPages {
    pages: HashMap<String, String>,
    hits: AtomicUsize,
}

impl StaticPages {
    fn new(pages: Vec<(String, String)>) -> Arc<Self> {
        Arc::new(Self {
            pages: pages.into_iter().collect(),
            hits: AtomicUsize::new(0),
        })
    }
}

impl Fetcher for StaticPages {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ExtractError>> {
        Box::pin(async move {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.pages.get(url).cloned().ok_or_else(|| {
                ExtractError::fetch(url, "Fetch", Some(anyhow::anyhow!("HTTP status 404")))
            })
        })
    }
}

fn article(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body><article>\
         <h1 class=\"entry-title\">{title}</h1>\
         <div class=\"entry-content\"><p>{body}</p></div></article></body></html>"
    )
}

fn long_body(topic: &str) -> String {
    format!(
        "This post covers {topic} in detail. Every driver benefits from a little \
         preparation, and our technicians are happy to walk you through each step."
    )
}

#[tokio::test]
async fn wordpress_fixture_resolves_every_field() {
    let extractor = Extractor::builder().build();
    let post = extractor
        .extract_html(WP_URL, &load_html_fixture("wordpress_post"))
        .await
        .expect("post extracted");

    assert_eq!(post.status, PostStatus::Success);
    assert_eq!(post.title, "Winter Tire Guide");
    assert_eq!(post.author, "Dana Reyes");
    assert_eq!(post.date, "2024-01-15T09:30:00+00:00");
    assert_eq!(post.categories, vec!["Tires".to_string()]);
    assert_eq!(post.tags, vec!["winter".to_string(), "safety".to_string()]);
    assert_eq!(post.platform, Platform::WordPress);
}

#[tokio::test]
async fn wordpress_fixture_converts_to_blocks() {
    let extractor = Extractor::builder().build();
    let post = extractor
        .extract_html(WP_URL, &load_html_fixture("wordpress_post"))
        .await
        .expect("post extracted");

    assert!(matches!(
        post.blocks.first(),
        Some(ContentBlock::Heading { level: 2, html }) if html == "Why winter tires matter"
    ));
    assert!(post.content.contains("<strong>Winter tires</strong>"));
    assert!(post
        .blocks
        .iter()
        .any(|b| matches!(b, ContentBlock::List { ordered: false, .. })));
    assert!(post.blocks.iter().any(|b| matches!(
        b,
        ContentBlock::Image { src, alt }
            if src == "https://lakeside.example.com/wp-content/uploads/2024/01/tires.jpg"
                && alt == "Winter tires on a sedan"
    )));
    assert!(post.content.contains("<div class=\"wp-block-button\">"));
    assert!(!post.content.contains("Share on Facebook"));
    assert!(!post.content.contains("Posted in"));
}

#[tokio::test]
async fn wordpress_fixture_collects_absolute_links() {
    let extractor = Extractor::builder().build();
    let post = extractor
        .extract_html(WP_URL, &load_html_fixture("wordpress_post"))
        .await
        .expect("post extracted");

    let urls: Vec<&str> = post.links.iter().map(|l| l.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://lakeside.example.com/service/tires/",
            "https://www.nhtsa.gov/winter-driving-tips",
            "https://lakeside.example.com/schedule-service/",
        ]
    );
    assert_eq!(post.links[0].text, "tire center");
}

#[tokio::test]
async fn injected_stop_list_replaces_defaults() {
    let extractor = Extractor::builder()
        .stop_list(StopList::new(["tires"]))
        .build();
    let post = extractor
        .extract_html(WP_URL, &load_html_fixture("wordpress_post"))
        .await
        .expect("post extracted");
    assert_eq!(post.categories, vec!["Uncategorized".to_string()]);
}

#[tokio::test]
async fn wix_fixture_uses_platform_selectors() {
    let extractor = Extractor::builder().build();
    let post = extractor
        .extract_html(WIX_URL, &load_html_fixture("wix_post"))
        .await
        .expect("post extracted");

    assert_eq!(post.platform, Platform::Wix);
    assert_eq!(post.title, "Spring Detailing Checklist");
    assert_eq!(post.author, "Morgan Lee");
    assert_eq!(post.date, "Mar 3, 2024");
    assert_eq!(post.categories, vec!["Detailing".to_string()]);
    assert_eq!(post.tags, vec!["spring".to_string(), "paint care".to_string()]);
    assert_eq!(
        post.images[0].src,
        "https://static.wixstatic.com/media/abc_123~mv2.jpg"
    );
    let paragraphs = post
        .blocks
        .iter()
        .filter(|b| matches!(b, ContentBlock::Paragraph { .. }))
        .count();
    assert_eq!(paragraphs, 3);
}

#[tokio::test]
async fn images_can_be_left_out() {
    let extractor = Extractor::builder().include_images(false).build();
    let post = extractor
        .extract_html(WIX_URL, &load_html_fixture("wix_post"))
        .await
        .expect("post extracted");
    assert!(post.images.is_empty());
    assert!(!post.content.contains("<img"));
}

#[tokio::test]
async fn duplicate_run_flags_second_page() {
    let body = long_body("tire rotation");
    let fetcher = StaticPages::new(vec![
        ("https://a.example.com/first".into(), article("First", &body)),
        ("https://a.example.com/copy".into(), article("Copy", &body)),
    ]);
    let extractor = Extractor::builder()
        .delay(Duration::ZERO)
        .fetcher(fetcher.clone())
        .build();

    let urls = vec![
        "https://a.example.com/first".to_string(),
        "https://a.example.com/copy".to_string(),
    ];
    let report = extractor.run(&urls).await;

    assert_eq!(report.posts[0].status, PostStatus::Success);
    assert_eq!(report.posts[1].status, PostStatus::Duplicate);
    assert_eq!(report.summary.success, 1);
    assert_eq!(report.summary.duplicates, 1);
    assert!(!report.summary.all_succeeded());
    assert_eq!(fetcher.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn page_without_content_fails_with_reason() {
    let fetcher = StaticPages::new(vec![(
        "https://a.example.com/empty".into(),
        "<html><body><nav>Home</nav><p>Short.</p></body></html>".into(),
    )]);
    let extractor = Extractor::builder().fetcher(fetcher).build();

    let report = extractor
        .run(&["https://a.example.com/empty".to_string()])
        .await;
    assert_eq!(report.posts[0].status, PostStatus::Failed);
    assert_eq!(report.summary.failed, 1);
    assert!(report.summary.failures[0].reason.contains("no content found"));
}

#[tokio::test]
async fn concurrent_run_keeps_input_order() {
    let topics = ["brakes", "batteries", "wipers", "coolant", "filters"];
    let mut pages: Vec<(String, String)> = topics
        .iter()
        .map(|t| {
            (
                format!("https://a.example.com/{}", t),
                article(t, &long_body(t)),
            )
        })
        .collect();
    pages.push((
        "https://a.example.com/brakes-again".into(),
        article("brakes", &long_body("brakes")),
    ));
    let extractor = Extractor::builder()
        .concurrency(3)
        .fetcher(StaticPages::new(pages))
        .build();

    let mut urls: Vec<String> = topics
        .iter()
        .map(|t| format!("https://a.example.com/{}", t))
        .collect();
    urls.insert(1, "https://a.example.com/brakes-again".into());

    let completed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completed);
    let report = extractor
        .run_with(&urls, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    let got: Vec<&str> = report.posts.iter().map(|p| p.url.as_str()).collect();
    let want: Vec<&str> = urls.iter().map(String::as_str).collect();
    assert_eq!(got, want);
    assert_eq!(report.posts[0].status, PostStatus::Success);
    assert_eq!(report.posts[1].status, PostStatus::Duplicate);
    assert_eq!(report.summary.success, 5);
    assert_eq!(completed.load(Ordering::SeqCst), urls.len());
}

#[tokio::test]
async fn fetches_over_http_and_downloads_images() {
    let server = MockServer::start();
    let html = format!(
        "<html><body><div class=\"post-content\"><p>{}</p>\
         <p><img src=\"/img/photo.jpg\" alt=\"Shop front\"></p></div></body></html>",
        long_body("our new service bay")
    );
    let page = server.mock(|when, then| {
        when.method(GET).path("/blog/new-bay");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(html);
    });
    let image = server.mock(|when, then| {
        when.method(GET).path("/img/photo.jpg");
        then.status(200)
            .header("content-type", "image/jpeg")
            .body("jpegbytes");
    });

    let dir = tempfile::tempdir().unwrap();
    let extractor = Extractor::builder()
        .retries(0)
        .image_dir(dir.path().join("images"))
        .build();
    let report = extractor.run(&[server.url("/blog/new-bay")]).await;

    page.assert();
    image.assert();
    let post = &report.posts[0];
    assert_eq!(post.status, PostStatus::Success);
    assert_eq!(report.summary.images_downloaded, 1);

    let local = &post.images[0].src;
    assert!(local.starts_with(dir.path().join("images").to_str().unwrap()));
    assert_eq!(fs::read(local).unwrap(), b"jpegbytes");
    assert!(post.content.contains(local.as_str()));
    assert_eq!(
        post.images[0].source_url.as_deref(),
        Some(server.url("/img/photo.jpg").as_str())
    );
}

#[tokio::test]
async fn relative_image_dir_still_yields_absolute_sources() {
    let server = MockServer::start();
    let html = format!(
        "<html><body><div class=\"post-content\"><p>{}</p>\
         <p><img src=\"/img/lift.jpg\" alt=\"Lift\"></p></div></body></html>",
        long_body("the new vehicle lift")
    );
    server.mock(|when, then| {
        when.method(GET).path("/blog/lift");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(html);
    });
    server.mock(|when, then| {
        when.method(GET).path("/img/lift.jpg");
        then.status(200)
            .header("content-type", "image/jpeg")
            .body("liftbytes");
    });

    // Created under the working directory and named relative to it.
    let dir = tempfile::tempdir_in(".").unwrap();
    let relative = std::path::PathBuf::from(dir.path().file_name().unwrap()).join("images");
    assert!(relative.is_relative());

    let extractor = Extractor::builder()
        .retries(0)
        .image_dir(&relative)
        .build();
    let report = extractor.run(&[server.url("/blog/lift")]).await;
    let post = &report.posts[0];
    assert_eq!(post.status, PostStatus::Success);

    let image = &post.images[0];
    assert!(std::path::Path::new(&image.src).is_absolute(), "{}", image.src);
    assert_eq!(fs::read(&image.src).unwrap(), b"liftbytes");
    assert!(post.content.contains(&format!("src=\"{}\"", image.src)));
    assert_eq!(image.remote_url(), server.url("/img/lift.jpg"));
}

#[tokio::test]
async fn http_errors_become_failed_records() {
    let server = MockServer::start();
    let missing = server.mock(|when, then| {
        when.method(GET).path("/gone");
        then.status(404);
    });

    let extractor = Extractor::builder().retries(2).build();
    let report = extractor.run(&[server.url("/gone")]).await;

    missing.assert_hits(1);
    assert_eq!(report.posts[0].status, PostStatus::Failed);
    assert!(report.summary.failures[0].reason.contains("404"));
}
