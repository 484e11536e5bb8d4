//! Error types for the catalog export library.
//!
//! This module defines all error types that can occur while resolving,
//! opening and extracting linked catalog sources.

use std::path::PathBuf;

/// Result type alias for catalog export operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during catalog export.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source file could not be found, even via the fallback search
    #[error("Source file not found: {0}")]
    SourceNotFound(String),

    /// Source file is locked or already open in another session
    #[error("Source file is locked or in use: {}", path.display())]
    SourceLocked {
        /// Path that failed to open
        path: PathBuf,
    },

    /// Source document failed to open for a reason other than a lock
    #[error("Failed to open {}: {reason}", path.display())]
    OpenFailed {
        /// Path that failed to open
        path: PathBuf,
        /// Reason for the open failure
        reason: String,
    },

    /// Content extraction from an opened document failed
    #[error("Extraction failed for {document}: {reason}")]
    Extraction {
        /// Name of the source document
        document: String,
        /// Reason for the extraction failure
        reason: String,
    },

    /// Target page is outside the opened document
    #[error("Invalid target page {page} in document {document}")]
    InvalidTargetPage {
        /// 1-based page number that was requested
        page: u32,
        /// Name of the document
        document: String,
    },

    /// Link manifest could not be read or parsed
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error indicates a locked/in-use source file.
    ///
    /// The batch coordinator uses this to decide whether a temporary
    /// working copy is worth attempting.
    pub fn is_locked(&self) -> bool {
        matches!(self, Error::SourceLocked { .. })
    }
}
