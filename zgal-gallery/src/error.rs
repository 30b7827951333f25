//! Error types for zgal-gallery
//!
//! Every failure is local to the smallest affected unit: one record, one
//! page, one collection, one mount point. None of them ends the session.

use thiserror::Error;

/// Gallery error type
#[derive(Debug, Error)]
pub enum GalleryError {
    /// Request could not complete; ends pagination of that collection
    #[error("Network failure for collection {collection}: {message}")]
    NetworkFailure { collection: String, message: String },

    /// Remote answered with a non-success status; handled like a network failure
    #[error("Collection {collection} returned HTTP {status}")]
    HttpStatus { collection: String, status: u16 },

    /// Response body was not the expected page shape
    #[error("Unexpected response for collection {collection}: {message}")]
    InvalidResponse { collection: String, message: String },

    /// One record lacked a field the gallery cannot do without; the record is skipped
    #[error("Malformed record at position {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// Total count could not be read; progress falls back to indeterminate
    #[error("Record count unavailable: {0}")]
    CountUnavailable(String),

    /// Expected mount point is absent from the host page
    #[error("Render target missing: {0}")]
    RenderTargetMissing(String),

    /// zgal-common error
    #[error("Common error: {0}")]
    Common(#[from] zgal_common::Error),
}

impl GalleryError {
    /// True for errors that end one collection's pagination
    pub fn ends_collection(&self) -> bool {
        matches!(
            self,
            GalleryError::NetworkFailure { .. }
                | GalleryError::HttpStatus { .. }
                | GalleryError::InvalidResponse { .. }
        )
    }
}

/// Result type for gallery operations
pub type GalleryResult<T> = Result<T, GalleryError>;
