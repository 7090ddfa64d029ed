//! Error types for the edgequake-imgops library.
//!
//! A single error type, [`ImgOpsError`], covers every way a transformation
//! request can fail. The pipeline is all-or-nothing: any error aborts the
//! request, no partial image is ever returned, and nothing is retried.
//!
//! Errors are plain values. The boundary layer (the `imgops` binary, or an
//! HTTP handler embedding this crate) maps each kind to a status/message pair
//! with [`ImgOpsError::status_code`] and [`ImgOpsError::public_message`].

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-imgops library.
#[derive(Debug, Error)]
pub enum ImgOpsError {
    // ── Acquisition errors ────────────────────────────────────────────────
    /// The remote server answered with a non-success status.
    #[error("Server returned error {status}.")]
    UpstreamFetch { url: String, status: u16 },

    /// The remote fetch failed before any HTTP status was received.
    #[error("Failed to fetch '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// The remote fetch exceeded the configured timeout.
    #[error("Fetching '{url}' timed out after {secs}s")]
    FetchTimeout { url: String, secs: u64 },

    /// Raw or estimated payload size exceeds the configured ceiling.
    #[error("Content is too large.")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// The inline payload is not valid base64.
    #[error("Inline payload is not valid base64: {detail}")]
    InvalidBase64 { detail: String },

    /// A local input file does not exist or cannot be read.
    #[error("Image file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── Codec errors ──────────────────────────────────────────────────────
    /// The bytes are not a recognisable or parseable image container.
    #[error("Cannot decode image: {detail}")]
    Decode { detail: String },

    /// The requested output container is not known to the encoder.
    #[error("Unsupported image format '{format}'")]
    UnsupportedFormat { format: String },

    /// The pixel data cannot be represented in the requested container.
    #[error("Cannot encode image as {format}: {detail}")]
    Encode { format: String, detail: String },

    // ── Request errors ────────────────────────────────────────────────────
    /// Zero or negative width/height on a crop or resize.
    #[error("Invalid dimensions {width}x{height}: width and height must be positive")]
    InvalidDimensions { width: i64, height: i64 },

    /// Resample code outside the supported enumeration.
    #[error("Invalid resample filter {code}: expected 0–5")]
    InvalidResample { code: i64 },

    /// The output pixel grid would exceed the configured pixel budget.
    #[error("Output {width}x{height} exceeds the limit of {max_pixels} pixels")]
    DimensionsTooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output image file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ImgOpsError {
    /// HTTP-equivalent status for this error.
    ///
    /// Upstream statuses are mirrored verbatim; everything else maps to a
    /// fixed code per kind.
    pub fn status_code(&self) -> u16 {
        match self {
            ImgOpsError::UpstreamFetch { status, .. } => *status,
            ImgOpsError::PayloadTooLarge { .. } => 413,
            ImgOpsError::FetchFailed { .. } => 502,
            ImgOpsError::FetchTimeout { .. } => 504,
            ImgOpsError::InvalidBase64 { .. }
            | ImgOpsError::Decode { .. }
            | ImgOpsError::UnsupportedFormat { .. }
            | ImgOpsError::InvalidDimensions { .. }
            | ImgOpsError::InvalidResample { .. } => 400,
            ImgOpsError::FileNotFound { .. } => 404,
            ImgOpsError::Encode { .. } | ImgOpsError::DimensionsTooLarge { .. } => 422,
            ImgOpsError::OutputWriteFailed { .. }
            | ImgOpsError::InvalidConfig(_)
            | ImgOpsError::Internal(_) => 500,
        }
    }

    /// Message safe to return to a remote caller.
    ///
    /// Internal failures are not described in detail.
    pub fn public_message(&self) -> String {
        match self {
            ImgOpsError::OutputWriteFailed { .. } | ImgOpsError::Internal(_) => {
                "Internal server error.".to_string()
            }
            other => other.to_string(),
        }
    }
}
