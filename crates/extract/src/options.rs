// ABOUTME: Configuration options for the blog extractor and the fluent ExtractorBuilder.
// ABOUTME: The builder also accepts injected fetch, image and fingerprint collaborators.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::duplicate::{DuplicatePolicy, FingerprintStore};
use crate::extractors::rules::SelectorTable;
use crate::extractors::stoplist::StopList;
use crate::pipeline::Extractor;
use crate::resource::images::ImageStore;
use crate::resource::{Fetcher, RetryPolicy, DEFAULT_USER_AGENT};

/// Configuration options for an extraction run.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    /// Retries after the first attempt of a page fetch.
    pub retries: u32,
    pub backoff: Duration,
    /// Pause between requests when running sequentially.
    pub delay: Duration,
    /// Maximum pages in flight; 1 means sequential.
    pub concurrency: usize,
    pub include_images: bool,
    /// Directory for downloaded images; `None` keeps remote URLs.
    pub image_dir: Option<PathBuf>,
    pub duplicate_policy: DuplicatePolicy,
    /// Replaces the built-in selector table.
    pub selectors: Option<SelectorTable>,
    pub stop_list: StopList,
    pub http_client: Option<reqwest::Client>,
    pub headers: HashMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retries: retry.retries,
            backoff: retry.backoff,
            delay: Duration::from_secs(2),
            concurrency: 1,
            include_images: true,
            image_dir: None,
            duplicate_policy: DuplicatePolicy::Skip,
            selectors: None,
            stop_list: StopList::default(),
            http_client: None,
            headers: HashMap::new(),
        }
    }
}

impl Options {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            backoff: self.backoff,
        }
    }
}

/// Builder for constructing Extractor instances with custom configuration.
#[derive(Default)]
pub struct ExtractorBuilder {
    pub(crate) opts: Options,
    pub(crate) fetcher: Option<Arc<dyn Fetcher>>,
    pub(crate) images: Option<Arc<dyn ImageStore>>,
    pub(crate) fingerprints: Option<Box<dyn FingerprintStore>>,
}

impl ExtractorBuilder {
    /// Create a new ExtractorBuilder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of options.
    pub fn with_options(opts: Options) -> Self {
        Self {
            opts,
            ..Self::default()
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.opts.retries = retries;
        self
    }

    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.opts.backoff = backoff;
        self
    }

    /// Pause between sequential requests.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.opts.delay = delay;
        self
    }

    /// Number of pages processed at once; values below 1 are treated as 1.
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.opts.concurrency = limit.max(1);
        self
    }

    /// Keep or drop images in the post content.
    pub fn include_images(mut self, include: bool) -> Self {
        self.opts.include_images = include;
        self
    }

    /// Download content images into `dir`.
    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.opts.image_dir = Some(dir.into());
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.opts.duplicate_policy = policy;
        self
    }

    /// Replace the built-in selector table.
    pub fn selectors(mut self, table: SelectorTable) -> Self {
        self.opts.selectors = Some(table);
        self
    }

    pub fn stop_list(mut self, stop_list: StopList) -> Self {
        self.opts.stop_list = stop_list;
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Add a custom header to all page requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Fetch pages with a custom collaborator instead of HTTP.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Resolve and download images with a custom collaborator.
    pub fn image_store(mut self, images: Arc<dyn ImageStore>) -> Self {
        self.images = Some(images);
        self
    }

    /// Keep run fingerprints in a custom store.
    pub fn fingerprint_store(mut self, store: Box<dyn FingerprintStore>) -> Self {
        self.fingerprints = Some(store);
        self
    }

    /// Build the Extractor with the configured options.
    pub fn build(self) -> Extractor {
        Extractor::from_builder(self)
    }
}
