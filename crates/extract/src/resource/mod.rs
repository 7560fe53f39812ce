// ABOUTME: Page fetching collaborator: the Fetcher trait and its reqwest-backed implementation.
// ABOUTME: Handles retries with exponential backoff, content-length limits and charset decoding.

pub mod images;

use std::collections::HashMap;
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::ExtractError;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// A browser user agent; many blog hosts reject unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetches the HTML of a page.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ExtractError>>;
}

/// How failed requests are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Base delay; attempt `n` waits `backoff * 2^n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff * 2u32.saturating_pow(attempt)
    }
}

/// Headers sent with every page request.
pub fn browser_headers() -> HashMap<String, String> {
    [
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Cache-Control", "no-cache"),
        ("Upgrade-Insecure-Requests", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Builds the shared HTTP client.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized.
pub fn build_http_client(timeout: Duration, user_agent: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .expect("failed to build HTTP client")
}

/// Whether a failed attempt may be retried.
enum Attempt {
    Retry(ExtractError),
    Fatal(ExtractError),
}

/// Fetcher backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    headers: HashMap<String, String>,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, retry: RetryPolicy) -> Self {
        Self {
            client,
            headers: browser_headers(),
            retry,
        }
    }

    /// Adds or replaces a request header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Fetches a page, retrying network errors, timeouts, 429 and 5xx.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ExtractError> {
        validate_url(url)?;

        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(Attempt::Fatal(err)) => return Err(err),
                Err(Attempt::Retry(err)) => {
                    if attempt >= self.retry.retries {
                        return Err(err);
                    }
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, Attempt> {
        let mut request = self.client.get(url);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Attempt::Retry(ExtractError::timeout(url, "Fetch", Some(e.into())))
            } else {
                Attempt::Retry(ExtractError::fetch(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("request failed: {}", e)),
                ))
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(Attempt::Retry(ExtractError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
            )));
        }
        if status.as_u16() != 200 {
            return Err(Attempt::Fatal(ExtractError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
            )));
        }

        if let Some(len) = response.content_length() {
            if len as usize > MAX_CONTENT_LENGTH {
                return Err(Attempt::Fatal(ExtractError::fetch(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("content too large")),
                )));
            }
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                Attempt::Retry(ExtractError::timeout(url, "Fetch", Some(e.into())))
            } else {
                Attempt::Retry(ExtractError::fetch(
                    url,
                    "Fetch",
                    Some(anyhow::anyhow!("failed to read body: {}", e)),
                ))
            }
        })?;

        if body.len() > MAX_CONTENT_LENGTH {
            return Err(Attempt::Fatal(ExtractError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            )));
        }

        debug!(url, bytes = body.len(), "fetched page");
        Ok(decode_body(&body, content_type.as_deref()))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, ExtractError>> {
        Box::pin(self.fetch_page(url))
    }
}

/// Accepts only absolute http(s) URLs.
pub fn validate_url(url: &str) -> Result<url::Url, ExtractError> {
    if url.is_empty() {
        return Err(ExtractError::invalid_url(url, "Fetch", None));
    }
    let parsed = url::Url::parse(url).map_err(|e| {
        ExtractError::invalid_url(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(ExtractError::invalid_url(
            url,
            "Fetch",
            Some(anyhow::anyhow!("scheme must be http or https")),
        )),
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}
