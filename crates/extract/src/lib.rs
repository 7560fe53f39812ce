// ABOUTME: Main library entry point for the blogport extraction engine.
// ABOUTME: Re-exports the public API: Extractor, ExtractorBuilder, PostRecord, RunReport, ExtractError, Options.

//! blogport-extract - turns blog post pages into clean, block-structured posts.
//!
//! This crate fetches blog pages, resolves their metadata through an ordered
//! selector table, normalizes the main content and converts it into
//! WordPress block markup, flagging repeated content within a run.
//!
//! # Example
//!
//! ```no_run
//! use blogport_extract::Extractor;
//!
//! #[tokio::main]
//! async fn main() {
//!     let extractor = Extractor::builder().concurrency(4).build();
//!     let urls = vec!["https://example.com/blog/first-post".to_string()];
//!     let report = extractor.run(&urls).await;
//!     println!("{}", report.summary);
//! }
//! ```

pub mod assembler;
pub mod blocks;
pub mod dom;
pub mod duplicate;
pub mod error;
pub mod extractors;
pub mod normalize;
pub mod options;
pub mod pipeline;
pub mod platform;
pub mod post;
pub mod resource;
pub mod result;

pub use crate::assembler::{assemble, Draft, UNKNOWN_AUTHOR, UNTITLED};
pub use crate::blocks::{convert, render_blocks, ContentBlock};
pub use crate::duplicate::{
    fingerprint, DuplicateDetector, DuplicatePolicy, FingerprintStore, MemoryStore,
};
pub use crate::error::{ErrorCode, ExtractError};
pub use crate::extractors::loader::load_builtin_table;
pub use crate::extractors::rules::{
    ContentRule, Field, FieldRule, Resolution, SelectorSpec, SelectorTable,
};
pub use crate::extractors::stoplist::{StopList, DEFAULT_STOP_TERMS};
pub use crate::normalize::{normalize, normalize_html, NormalizeOptions};
pub use crate::options::{ExtractorBuilder, Options};
pub use crate::pipeline::Extractor;
pub use crate::platform::{detect_platform, Platform};
pub use crate::post::{ImageRef, Link, PostRecord, PostStatus};
pub use crate::resource::images::{canonical_image_url, HttpImageStore, ImageStore, RemoteImages};
pub use crate::resource::{Fetcher, HttpFetcher, RetryPolicy};
pub use crate::result::{Failure, Result, RunReport, RunSummary};
