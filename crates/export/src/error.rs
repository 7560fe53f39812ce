// ABOUTME: Error types for feed export operations.
// ABOUTME: Provides the ExportError enum with Io, Xml, Json and Csv variants.

use std::fmt;
use thiserror::Error;

/// Errors that can occur while writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writing the output failed.
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),

    /// The XML writer rejected an event.
    #[error("failed to write XML: {0}")]
    Xml(String),

    /// JSON serialization failed.
    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization failed.
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl ExportError {
    /// Creates an Xml error from an underlying writer error.
    pub fn xml(err: impl fmt::Display) -> Self {
        ExportError::Xml(err.to_string())
    }
}
