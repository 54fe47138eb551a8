use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by mask synthesis and inpainting orchestration.
///
/// Every variant is fatal to the request; no partial artifact is returned.
#[derive(Error, Debug)]
pub enum InpaintError {
    #[error("cannot read video metadata from {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },
    #[error("failed to encode mask video {path}: {reason}")]
    Encoding { path: PathBuf, reason: String },
    #[error("inpainting failed: {0}")]
    Collaborator(#[source] Box<dyn std::error::Error>),
    #[error("failed to prepare mask location {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request cancelled")]
    Cancelled,
}
