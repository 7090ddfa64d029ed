//! Request entry points.
//!
//! [`ImagePipeline`] is created once at startup and shared by every request.
//! It holds only the immutable config and the fetcher, so concurrent
//! requests never see each other's buffers.
//!
//! Per request the flow is: validate → acquire (async, the only suspension
//! point) → decode → transform → encode. The last three run in a single
//! `spawn_blocking` closure that owns the acquired buffer; the buffer and
//! every intermediate pixel grid are dropped when that closure returns, on
//! every success and error path.

use crate::config::TransformConfig;
use crate::error::ImgOpsError;
use crate::output::{Presentation, PresentedOutput, TransformOutput, TransformStats};
use crate::pipeline::input::{self, Fetch, HttpFetcher, RawImageBuffer};
use crate::pipeline::{codec, encode, transform};
use crate::progress::{ProgressCallback, Stage};
use crate::request::{ImageSource, TransformRequest};
use image::ImageFormat;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Stateless image transformation pipeline.
///
/// # Example
/// ```rust,no_run
/// use edgequake_imgops::{ImagePipeline, ImageSource, TransformConfig, TransformRequest};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = ImagePipeline::new(TransformConfig::default())?;
/// let output = pipeline
///     .run(
///         ImageSource::remote("https://example.com/cat.jpg"),
///         &TransformRequest::resize(320, 240).with_format("PNG"),
///     )
///     .await?;
/// println!("{}x{} {} bytes", output.width, output.height, output.bytes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ImagePipeline<F = HttpFetcher> {
    config: TransformConfig,
    fetcher: F,
}

impl ImagePipeline<HttpFetcher> {
    /// Create a pipeline that fetches remote images over HTTP.
    pub fn new(config: TransformConfig) -> Result<Self, ImgOpsError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self { config, fetcher })
    }
}

impl<F: Fetch> ImagePipeline<F> {
    /// Create a pipeline with a custom fetcher.
    pub fn with_fetcher(config: TransformConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Run one request to completion.
    ///
    /// # Errors
    /// Any failure aborts the request; no partial output is returned.
    pub async fn run(
        &self,
        source: ImageSource,
        request: &TransformRequest,
    ) -> Result<TransformOutput, ImgOpsError> {
        let total_start = Instant::now();
        let op_name = request.operation.name();
        info!("Starting {}: {}", op_name, source.describe());

        // Cheap checks first: nothing is fetched for a request that can't succeed.
        request.validate()?;
        let format_name = request
            .output_format
            .as_deref()
            .unwrap_or(&self.config.default_format);
        let format = codec::parse_format(format_name)?;

        // ── Step 1: Acquire ──────────────────────────────────────────────
        let cb = self.config.progress_callback.clone();
        let acquire_start = Instant::now();
        stage_start(&cb, Stage::Acquire);
        let raw = input::acquire(source, &self.fetcher, self.config.max_payload_bytes)
            .await
            .map_err(|e| stage_error(&cb, Stage::Acquire, e))?;
        let acquire_duration_ms = elapsed_ms(acquire_start);
        stage_complete(&cb, Stage::Acquire, acquire_duration_ms);

        // ── Steps 2–4: Decode, transform, encode (CPU-bound) ─────────────
        let config = self.config.clone();
        let request = request.clone();
        let mut output = tokio::task::spawn_blocking(move || {
            process_blocking(raw, &request, format, &config)
        })
        .await
        .map_err(|e| ImgOpsError::Internal(format!("Transform task panicked: {e}")))??;

        output.stats.acquire_duration_ms = acquire_duration_ms;
        output.stats.total_duration_ms = elapsed_ms(total_start);

        info!(
            "{} complete: {}x{} {} → {}x{} {} ({} bytes) in {}ms",
            op_name,
            output.stats.source_width,
            output.stats.source_height,
            output.stats.source_format,
            output.width,
            output.height,
            output.format,
            output.stats.output_bytes,
            output.stats.total_duration_ms
        );
        Ok(output)
    }

    /// Run one request and present the result as raw bytes or base64.
    pub async fn run_presented(
        &self,
        source: ImageSource,
        request: &TransformRequest,
        mode: Presentation,
    ) -> Result<PresentedOutput, ImgOpsError> {
        let output = self.run(source, request).await?;
        Ok(encode::present(output, mode))
    }

    /// Run one request and write the encoded image to `output_path`.
    ///
    /// Uses atomic write (temp file in the target directory + rename) to
    /// prevent partial files.
    pub async fn run_to_file(
        &self,
        source: ImageSource,
        request: &TransformRequest,
        output_path: impl AsRef<Path>,
    ) -> Result<TransformStats, ImgOpsError> {
        let output = self.run(source, request).await?;
        let path = output_path.as_ref();
        let write_err = |source: std::io::Error| ImgOpsError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        tokio::fs::create_dir_all(&parent).await.map_err(write_err)?;

        // The temp file is unique per call and deleted on drop, so a failed
        // write or rename never leaves it behind.
        let bytes = output.bytes;
        let target = path.to_path_buf();
        let written = bytes.len();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
            tmp.write_all(&bytes)?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| ImgOpsError::Internal(format!("File write task panicked: {e}")))?
        .map_err(write_err)?;

        debug!("Wrote {} bytes to {}", written, path.display());
        Ok(output.stats)
    }
}

/// Decode → transform → encode. Owns `raw`; everything is released on return.
fn process_blocking(
    raw: RawImageBuffer,
    request: &TransformRequest,
    format: ImageFormat,
    config: &TransformConfig,
) -> Result<TransformOutput, ImgOpsError> {
    let cb = &config.progress_callback;
    let input_bytes = raw.len() as u64;

    let start = Instant::now();
    stage_start(cb, Stage::Decode);
    let decoded = codec::decode(raw).map_err(|e| stage_error(cb, Stage::Decode, e))?;
    let decode_duration_ms = elapsed_ms(start);
    stage_complete(cb, Stage::Decode, decode_duration_ms);

    let source_format = codec::format_name(decoded.source_format).to_string();
    let (source_width, source_height) = (decoded.width(), decoded.height());

    let start = Instant::now();
    stage_start(cb, Stage::Transform);
    let image = transform::apply(
        decoded.image,
        &request.operation,
        config.default_resample,
        config.max_output_pixels,
    )
    .map_err(|e| stage_error(cb, Stage::Transform, e))?;
    let transform_duration_ms = elapsed_ms(start);
    stage_complete(cb, Stage::Transform, transform_duration_ms);

    let start = Instant::now();
    stage_start(cb, Stage::Encode);
    let bytes = codec::encode(&image, format, config.jpeg_quality)
        .map_err(|e| stage_error(cb, Stage::Encode, e))?;
    let encode_duration_ms = elapsed_ms(start);
    stage_complete(cb, Stage::Encode, encode_duration_ms);

    Ok(TransformOutput {
        format: codec::format_name(format).to_string(),
        mime_type: format.to_mime_type().to_string(),
        width: image.width(),
        height: image.height(),
        stats: TransformStats {
            operation: request.operation.name().to_string(),
            source_format,
            source_width,
            source_height,
            input_bytes,
            output_bytes: bytes.len() as u64,
            decode_duration_ms,
            transform_duration_ms,
            encode_duration_ms,
            ..TransformStats::default()
        },
        bytes,
    })
}

// ── Convenience entry points ─────────────────────────────────────────────

/// Transform an image with a one-off HTTP pipeline.
///
/// Build an [`ImagePipeline`] once and reuse it when handling many requests.
pub async fn transform(
    source: ImageSource,
    request: &TransformRequest,
    config: &TransformConfig,
) -> Result<TransformOutput, ImgOpsError> {
    ImagePipeline::new(config.clone())?.run(source, request).await
}

/// Transform an image and write the result to a file.
pub async fn transform_to_file(
    source: ImageSource,
    request: &TransformRequest,
    output_path: impl AsRef<Path>,
    config: &TransformConfig,
) -> Result<TransformStats, ImgOpsError> {
    ImagePipeline::new(config.clone())?
        .run_to_file(source, request, output_path)
        .await
}

/// Synchronous wrapper around [`transform`].
///
/// Creates a temporary tokio runtime internally.
pub fn transform_sync(
    source: ImageSource,
    request: &TransformRequest,
    config: &TransformConfig,
) -> Result<TransformOutput, ImgOpsError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ImgOpsError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(transform(source, request, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn stage_start(cb: &Option<ProgressCallback>, stage: Stage) {
    debug!("Stage {} started", stage);
    if let Some(cb) = cb {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(cb: &Option<ProgressCallback>, stage: Stage, elapsed_ms: u64) {
    debug!("Stage {} finished in {}ms", stage, elapsed_ms);
    if let Some(cb) = cb {
        cb.on_stage_complete(stage, elapsed_ms);
    }
}

fn stage_error(cb: &Option<ProgressCallback>, stage: Stage, err: ImgOpsError) -> ImgOpsError {
    debug!("Stage {} failed: {}", stage, err);
    if let Some(cb) = cb {
        cb.on_stage_error(stage, &err.to_string());
    }
    err
}
