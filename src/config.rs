//! Configuration types for image transformation.
//!
//! All service-wide knobs live in [`TransformConfig`], built via its
//! [`TransformConfigBuilder`]. The config is immutable once built and shared
//! by every request an [`crate::service::ImagePipeline`] handles; nothing in
//! it is per-request state.

use crate::error::ImgOpsError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum payload size accepted from any source: 20 MiB.
pub const MAX_PAYLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Output container used when a request does not name one.
pub const DEFAULT_FORMAT: &str = "JPEG";

/// Configuration for an image pipeline.
///
/// Built via [`TransformConfig::builder()`] or using
/// [`TransformConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_imgops::TransformConfig;
///
/// let config = TransformConfig::builder()
///     .jpeg_quality(90)
///     .fetch_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct TransformConfig {
    /// Ceiling for raw and estimated payload sizes in bytes. Default: 20 MiB.
    ///
    /// Applied to fetched bodies, local files, and to the size estimated from
    /// an inline base64 payload before it is decoded.
    pub max_payload_bytes: u64,

    /// Timeout for remote fetches in seconds. Default: none.
    pub fetch_timeout_secs: Option<u64>,

    /// Quality used when encoding JPEG output (1–100). Default: 75.
    pub jpeg_quality: u8,

    /// Largest pixel grid a crop or resize may produce. Default: 100 megapixels.
    ///
    /// Crop accepts rectangles outside the source bounds, so the requested
    /// size alone decides the allocation.
    pub max_output_pixels: u64,

    /// Output container for requests that don't name one. Default: "JPEG".
    pub default_format: String,

    /// Resample filter for resize requests that don't name one. Default: Lanczos.
    pub default_resample: ResampleFilter,

    /// Optional per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: MAX_PAYLOAD_BYTES,
            fetch_timeout_secs: None,
            jpeg_quality: 75,
            max_output_pixels: 100_000_000,
            default_format: DEFAULT_FORMAT.to_string(),
            default_resample: ResampleFilter::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for TransformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformConfig")
            .field("max_payload_bytes", &self.max_payload_bytes)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("max_output_pixels", &self.max_output_pixels)
            .field("default_format", &self.default_format)
            .field("default_resample", &self.default_resample)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl TransformConfig {
    /// Create a new builder for `TransformConfig`.
    pub fn builder() -> TransformConfigBuilder {
        TransformConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`TransformConfig`].
pub struct TransformConfigBuilder {
    config: TransformConfig,
}

impl TransformConfigBuilder {
    pub fn max_payload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_payload_bytes = bytes;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = Some(secs);
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn max_output_pixels(mut self, pixels: u64) -> Self {
        self.config.max_output_pixels = pixels;
        self
    }

    pub fn default_format(mut self, format: impl Into<String>) -> Self {
        self.config.default_format = format.into();
        self
    }

    pub fn default_resample(mut self, filter: ResampleFilter) -> Self {
        self.config.default_resample = filter;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TransformConfig, ImgOpsError> {
        let c = &self.config;
        if c.max_payload_bytes == 0 {
            return Err(ImgOpsError::InvalidConfig(
                "max_payload_bytes must be ≥ 1".into(),
            ));
        }
        if c.max_output_pixels == 0 {
            return Err(ImgOpsError::InvalidConfig(
                "max_output_pixels must be ≥ 1".into(),
            ));
        }
        if c.fetch_timeout_secs == Some(0) {
            return Err(ImgOpsError::InvalidConfig(
                "fetch timeout must be ≥ 1 second".into(),
            ));
        }
        if c.default_format.trim().is_empty() {
            return Err(ImgOpsError::InvalidConfig(
                "default format must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Interpolation kernel used by resize.
///
/// The numeric codes are the ones callers send on the wire:
///
/// | Code | Filter |
/// |------|--------|
/// | 0 | Nearest |
/// | 1 | Lanczos (default) |
/// | 2 | Bilinear |
/// | 3 | Bicubic |
/// | 4 | Box |
/// | 5 | Hamming |
///
/// Serialised as the bare integer code; unknown codes fail to deserialise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ResampleFilter {
    Nearest,
    #[default]
    Lanczos,
    Bilinear,
    Bicubic,
    Box,
    Hamming,
}

impl ResampleFilter {
    /// Map a wire code to a filter.
    pub fn from_code(code: i64) -> Result<Self, ImgOpsError> {
        match code {
            0 => Ok(ResampleFilter::Nearest),
            1 => Ok(ResampleFilter::Lanczos),
            2 => Ok(ResampleFilter::Bilinear),
            3 => Ok(ResampleFilter::Bicubic),
            4 => Ok(ResampleFilter::Box),
            5 => Ok(ResampleFilter::Hamming),
            _ => Err(ImgOpsError::InvalidResample { code }),
        }
    }

    /// The wire code for this filter.
    pub fn code(self) -> i64 {
        match self {
            ResampleFilter::Nearest => 0,
            ResampleFilter::Lanczos => 1,
            ResampleFilter::Bilinear => 2,
            ResampleFilter::Bicubic => 3,
            ResampleFilter::Box => 4,
            ResampleFilter::Hamming => 5,
        }
    }
}

impl TryFrom<i64> for ResampleFilter {
    type Error = ImgOpsError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<ResampleFilter> for i64 {
    fn from(filter: ResampleFilter) -> Self {
        filter.code()
    }
}
