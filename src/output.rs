//! Result types returned by the pipeline.

use serde::{Deserialize, Serialize};

/// The transformed image and how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformOutput {
    /// Encoded image bytes in `format`.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Canonical container name, e.g. "JPEG".
    pub format: String,
    /// MIME type matching `format`, for binary response bodies.
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub stats: TransformStats,
}

/// Sizes and per-stage timings for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformStats {
    /// "crop", "resize" or "convert".
    pub operation: String,
    /// Container the input was decoded from.
    pub source_format: String,
    pub source_width: u32,
    pub source_height: u32,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub acquire_duration_ms: u64,
    pub decode_duration_ms: u64,
    pub transform_duration_ms: u64,
    pub encode_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// How the encoded bytes are handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    /// Raw bytes for a binary body. (default)
    #[default]
    Raw,
    /// Base64 text wrapped in `{ "image": "..." }`.
    Base64,
}

/// Single-field structured response for base64 presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base64ImageResponse {
    pub image: String,
}

/// Output in the shape the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentedOutput {
    Raw { bytes: Vec<u8>, mime_type: String },
    Base64(Base64ImageResponse),
}
