// ABOUTME: Image collaborator: canonical image URLs and optional local download.
// ABOUTME: RemoteImages keeps URLs as-is; HttpImageStore downloads into a directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use futures::future::BoxFuture;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use url::Url;

use super::MAX_CONTENT_LENGTH;

/// Query parameters that only select a rendition of the same image.
const SIZING_PARAMS: &[&str] = &[
    "w", "h", "width", "height", "resize", "fit", "crop", "quality", "q", "format", "auto",
];

/// Resolves and optionally downloads content images.
pub trait ImageStore: Send + Sync {
    /// Canonical URL for an absolute image URL.
    fn resolve(&self, url: &str) -> String {
        canonical_image_url(url)
    }

    /// Downloads the image, returning its local path. `None` keeps the
    /// remote URL.
    fn download<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Option<PathBuf>>;

    /// Number of distinct images downloaded so far.
    fn downloaded(&self) -> usize {
        0
    }
}

/// Strips rendition details from an image URL.
///
/// Wix media URLs carry a `/v1/fill/...` transform suffix after the media
/// file; sizing query parameters are dropped for every host.
pub fn canonical_image_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    if parsed
        .host_str()
        .map_or(false, |h| h.ends_with("wixstatic.com"))
    {
        if let Some(idx) = parsed.path().find("/v1/") {
            let path = parsed.path()[..idx].to_string();
            parsed.set_path(&path);
        }
    }

    if parsed.query().is_some() {
        let kept: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(k, _)| !SIZING_PARAMS.contains(&k.to_ascii_lowercase().as_str()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if kept.is_empty() {
            parsed.set_query(None);
        } else {
            parsed.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    parsed.to_string()
}

/// Keeps every image remote.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoteImages;

impl ImageStore for RemoteImages {
    fn download<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Option<PathBuf>> {
        Box::pin(async { None })
    }
}

/// Downloads images into a directory, once per URL.
#[derive(Debug)]
pub struct HttpImageStore {
    client: reqwest::Client,
    dir: PathBuf,
    cache: Mutex<HashMap<String, Option<PathBuf>>>,
    count: AtomicUsize,
}

impl HttpImageStore {
    /// A relative `dir` is resolved against the current directory, so
    /// rewritten image sources are always absolute paths.
    pub fn new(client: reqwest::Client, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let dir = std::path::absolute(&dir).unwrap_or(dir);
        Self {
            client,
            dir,
            cache: Mutex::new(HashMap::new()),
            count: AtomicUsize::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn cached(&self, url: &str) -> Option<Option<PathBuf>> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
    }

    /// Returns false if another task stored a result for `url` first.
    fn remember(&self, url: &str, path: Option<PathBuf>) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string(), path)
            .is_none()
    }

    async fn fetch_to_disk(&self, url: &str) -> anyhow::Result<PathBuf> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_lowercase);
        let bytes = response.bytes().await?;
        if bytes.len() > MAX_CONTENT_LENGTH {
            anyhow::bail!("image too large");
        }

        let path = self
            .dir
            .join(local_file_name(url, content_type.as_deref()));
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, &bytes).await?;
        Ok(path)
    }
}

impl ImageStore for HttpImageStore {
    fn download<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Option<PathBuf>> {
        Box::pin(async move {
            if let Some(hit) = self.cached(url) {
                return hit;
            }
            let result = match self.fetch_to_disk(url).await {
                Ok(path) => {
                    debug!(url, path = %path.display(), "downloaded image");
                    Some(path)
                }
                Err(err) => {
                    warn!(url, error = %err, "image download failed, keeping remote URL");
                    None
                }
            };
            if self.remember(url, result.clone()) && result.is_some() {
                self.count.fetch_add(1, Ordering::Relaxed);
            }
            result
        })
    }

    fn downloaded(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

fn extension_for(url: &str, content_type: Option<&str>) -> &'static str {
    const KNOWN: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "avif"];
    let from_path = Url::parse(url).ok().and_then(|u| {
        let path = u.path().to_ascii_lowercase();
        path.rsplit_once('.')
            .map(|(_, ext)| ext.to_string())
            .and_then(|ext| KNOWN.iter().find(|k| **k == ext).copied())
    });
    if let Some(ext) = from_path {
        return ext;
    }
    match content_type.unwrap_or("") {
        ct if ct.contains("png") => "png",
        ct if ct.contains("gif") => "gif",
        ct if ct.contains("webp") => "webp",
        ct if ct.contains("svg") => "svg",
        _ => "jpg",
    }
}

/// First 16 hex chars of the URL's SHA-256 plus an extension.
pub fn local_file_name(url: &str, content_type: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}.{}", &digest[..16], extension_for(url, content_type))
}
