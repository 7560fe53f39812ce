// ABOUTME: Extractor: fetches pages, resolves fields, normalizes and converts content into posts.
// ABOUTME: Runs URL batches sequentially or bounded-concurrently and merges results in input order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use scraper::Html;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use crate::assembler::{assemble, Draft};
use crate::blocks::{convert, render_blocks};
use crate::dom::Node;
use crate::duplicate::{fingerprint, DuplicateDetector, DuplicatePolicy};
use crate::error::ExtractError;
use crate::extractors::content::{
    absolutize, collect_images, collect_links, content_length, locate_content, map_image_sources,
};
use crate::extractors::compiled::precompile_selectors;
use crate::extractors::loader::load_builtin_table;
use crate::extractors::rules::{Field, SelectorTable};
use crate::extractors::select::resolve;
use crate::normalize::{normalize, NormalizeOptions};
use crate::options::{ExtractorBuilder, Options};
use crate::platform::{detect_platform, Platform};
use crate::post::PostRecord;
use crate::resource::images::{HttpImageStore, ImageStore, RemoteImages};
use crate::resource::{build_http_client, Fetcher, HttpFetcher};
use crate::result::{RunReport, RunSummary};

/// Everything taken from the parsed document, before any await point.
struct Prepared {
    base: Url,
    platform: Platform,
    title: Option<String>,
    author: Option<String>,
    date: Option<String>,
    categories: Vec<String>,
    tags: Vec<String>,
    nodes: Vec<Node>,
}

struct Inner {
    opts: Options,
    table: SelectorTable,
    fetcher: Arc<dyn Fetcher>,
    images: Arc<dyn ImageStore>,
    detector: DuplicateDetector,
}

/// Turns blog post URLs into post records.
///
/// Cloning is cheap; clones share the collaborators and the duplicate set.
#[derive(Clone)]
pub struct Extractor {
    inner: Arc<Inner>,
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("opts", &self.inner.opts)
            .field("detector", &self.inner.detector)
            .finish()
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Extractor {
    /// Create a new ExtractorBuilder for configuring the extractor.
    pub fn builder() -> ExtractorBuilder {
        ExtractorBuilder::new()
    }

    /// Create a new Extractor with the given options and default collaborators.
    pub fn new(opts: Options) -> Self {
        ExtractorBuilder::with_options(opts).build()
    }

    pub(crate) fn from_builder(builder: ExtractorBuilder) -> Self {
        let ExtractorBuilder {
            opts,
            fetcher,
            images,
            fingerprints,
        } = builder;

        let client = opts
            .http_client
            .clone()
            .unwrap_or_else(|| build_http_client(opts.timeout, &opts.user_agent));

        let fetcher = fetcher.unwrap_or_else(|| {
            let mut http = HttpFetcher::new(client.clone(), opts.retry_policy());
            for (key, value) in &opts.headers {
                http = http.with_header(key.clone(), value.clone());
            }
            Arc::new(http) as Arc<dyn Fetcher>
        });

        let images: Arc<dyn ImageStore> = match (images, &opts.image_dir) {
            (Some(store), _) => store,
            (None, Some(dir)) if opts.include_images => {
                Arc::new(HttpImageStore::new(client, dir.clone()))
            }
            (None, _) => Arc::new(RemoteImages),
        };

        let table = match opts.selectors.clone() {
            Some(table) => {
                precompile_selectors(table.all_selectors());
                table
            }
            None => load_builtin_table(),
        };

        let detector = fingerprints
            .map(DuplicateDetector::new)
            .unwrap_or_default();

        Self {
            inner: Arc::new(Inner {
                opts,
                table,
                fetcher,
                images,
                detector,
            }),
        }
    }

    pub fn options(&self) -> &Options {
        &self.inner.opts
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.inner.opts.duplicate_policy
    }

    /// Images saved locally by this extractor so far.
    pub fn images_downloaded(&self) -> usize {
        self.inner.images.downloaded()
    }

    /// Fetches and extracts one page without the duplicate check.
    pub async fn draft(&self, url: &str) -> Result<Draft, ExtractError> {
        debug!(url, "fetching page");
        let html = self.inner.fetcher.fetch(url).await?;
        self.draft_html(url, &html).await
    }

    /// Extracts already fetched HTML without the duplicate check.
    pub async fn draft_html(&self, url: &str, html: &str) -> Result<Draft, ExtractError> {
        let prepared = self.prepare(url, html)?;
        let (nodes, remote_of) = self.localize_images(prepared.nodes).await;

        let links = collect_links(&nodes, &prepared.base);
        let images: Vec<_> = collect_images(&nodes)
            .into_iter()
            .map(|mut image| {
                image.source_url = remote_of.get(&image.src).cloned();
                image
            })
            .collect();
        let blocks = convert(&nodes);
        if blocks.is_empty() {
            return Err(ExtractError::no_content(
                url,
                "Convert",
                Some(anyhow::anyhow!("content was empty after cleanup")),
            ));
        }
        let content = render_blocks(&blocks);
        debug!(
            url,
            blocks = blocks.len(),
            links = links.len(),
            images = images.len(),
            "converted content"
        );

        Ok(Draft {
            url: url.to_string(),
            title: prepared.title,
            author: prepared.author,
            date: prepared.date,
            categories: prepared.categories,
            tags: prepared.tags,
            links,
            images,
            content_length: content_length(&nodes),
            fingerprint: fingerprint(&content),
            blocks,
            content,
            platform: prepared.platform,
        })
    }

    /// Fetches and extracts one page, checking it against the posts seen
    /// since the last run started.
    pub async fn extract(&self, url: &str) -> Result<PostRecord, ExtractError> {
        let draft = self.draft(url).await?;
        Ok(assemble(draft, &self.inner.detector))
    }

    /// Same as [`extract`](Self::extract) for already fetched HTML.
    pub async fn extract_html(&self, url: &str, html: &str) -> Result<PostRecord, ExtractError> {
        let draft = self.draft_html(url, html).await?;
        Ok(assemble(draft, &self.inner.detector))
    }

    /// Processes a batch of URLs.
    pub async fn run(&self, urls: &[String]) -> RunReport {
        self.run_with(urls, |_| {}).await
    }

    /// Processes a batch of URLs, calling `on_complete` as each page finishes.
    ///
    /// Records come back in input order whatever the concurrency, and the
    /// first occurrence of repeated content is the one kept as success.
    pub async fn run_with<F>(&self, urls: &[String], on_complete: F) -> RunReport
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let images_before = self.inner.images.downloaded();
        let on_complete = Arc::new(on_complete);
        let limit = self.inner.opts.concurrency.max(1);
        info!(urls = urls.len(), concurrency = limit, "starting run");

        let results = if limit == 1 {
            self.drafts_sequential(urls, on_complete).await
        } else {
            self.drafts_concurrent(urls, limit, on_complete).await
        };

        self.inner.detector.reset();
        let posts: Vec<PostRecord> = urls
            .iter()
            .zip(results)
            .map(|(url, result)| match result {
                Ok(draft) => {
                    let record = assemble(draft, &self.inner.detector);
                    info!(url = %url, status = %record.status, title = %record.title, "post processed");
                    record
                }
                Err(err) => {
                    warn!(url = %url, error = %err, "post failed");
                    PostRecord::failed(url.as_str(), &err)
                }
            })
            .collect();

        let downloaded = self.inner.images.downloaded().saturating_sub(images_before);
        let summary = RunSummary::from_posts(&posts, downloaded);
        info!(
            total = summary.total,
            success = summary.success,
            duplicates = summary.duplicates,
            failed = summary.failed,
            "run finished"
        );
        RunReport { posts, summary }
    }

    async fn drafts_sequential<F>(
        &self,
        urls: &[String],
        on_complete: Arc<F>,
    ) -> Vec<Result<Draft, ExtractError>>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let mut results = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            if i > 0 && !self.inner.opts.delay.is_zero() {
                tokio::time::sleep(self.inner.opts.delay).await;
            }
            results.push(self.draft(url).await);
            on_complete(url);
        }
        results
    }

    async fn drafts_concurrent<F>(
        &self,
        urls: &[String],
        limit: usize,
        on_complete: Arc<F>,
    ) -> Vec<Result<Draft, ExtractError>>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(limit));
        let handles: Vec<_> = urls
            .iter()
            .map(|url| {
                let this = self.clone();
                let semaphore = Arc::clone(&semaphore);
                let on_complete = Arc::clone(&on_complete);
                let url = url.clone();
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let result = this.draft(&url).await;
                    on_complete(&url);
                    result
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (url, handle) in urls.iter().zip(handles) {
            results.push(handle.await.unwrap_or_else(|e| {
                Err(ExtractError::fetch(
                    url.as_str(),
                    "Run",
                    Some(anyhow::anyhow!("task failed: {}", e)),
                ))
            }));
        }
        results
    }

    /// Parses the page and produces the normalized content fragment.
    ///
    /// Kept synchronous: the parsed document is not `Send` and must be
    /// dropped before the first await.
    fn prepare(&self, url: &str, html: &str) -> Result<Prepared, ExtractError> {
        let base = Url::parse(url).map_err(|e| {
            ExtractError::invalid_url(url, "Extract", Some(anyhow::anyhow!("invalid URL: {}", e)))
        })?;
        let table = &self.inner.table;
        let stop_list = &self.inner.opts.stop_list;

        let doc = Html::parse_document(html);
        let platform = detect_platform(html, url);
        debug!(url, %platform, "detected platform");

        let scalar = |field| resolve(&doc, table, field, stop_list).and_then(|r| r.into_scalar());
        let list = |field| {
            resolve(&doc, table, field, stop_list)
                .map(|r| r.into_list())
                .unwrap_or_default()
        };
        let title = scalar(Field::Title);
        let author = scalar(Field::Author);
        let date = scalar(Field::Date);
        let categories = list(Field::Categories);
        let tags = list(Field::Tags);
        debug!(
            url,
            title = title.as_deref().unwrap_or(""),
            categories = categories.len(),
            tags = tags.len(),
            "resolved fields"
        );

        let located = locate_content(&doc, &table.content)
            .ok_or_else(|| ExtractError::no_content(url, "Locate", None))?;
        debug!(url, selector = %located.selector, "located content");

        let nodes = normalize(
            located.nodes,
            NormalizeOptions {
                include_images: self.inner.opts.include_images,
            },
        );
        let images = &self.inner.images;
        let nodes = map_image_sources(nodes, &mut |src| {
            absolutize(&base, src).map(|abs| images.resolve(abs.as_str()))
        });

        Ok(Prepared {
            base,
            platform,
            title,
            author,
            date,
            categories,
            tags,
            nodes,
        })
    }

    /// Downloads content images and points their `src` at the local copies.
    ///
    /// Also returns the remote URL of every localized image, keyed by its
    /// local path.
    async fn localize_images(&self, nodes: Vec<Node>) -> (Vec<Node>, HashMap<String, String>) {
        let mut local: HashMap<String, String> = HashMap::new();
        for image in collect_images(&nodes) {
            if local.contains_key(&image.src) {
                continue;
            }
            if let Some(path) = self.inner.images.download(&image.src).await {
                local.insert(image.src, path.to_string_lossy().into_owned());
            }
        }
        if local.is_empty() {
            return (nodes, HashMap::new());
        }
        let nodes = map_image_sources(nodes, &mut |src| {
            Some(local.get(src).cloned().unwrap_or_else(|| src.to_string()))
        });
        let remote_of = local.into_iter().map(|(remote, path)| (path, remote)).collect();
        (nodes, remote_of)
    }
}
