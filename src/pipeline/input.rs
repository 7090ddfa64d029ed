//! Input acquisition: normalise a remote URL, inline base64 payload or local
//! file into a single owned byte buffer.
//!
//! Every source passes the size guard before its bytes reach the codec:
//!
//! * remote: the declared `Content-Length` (when present) and then the
//!   running body length while it streams in,
//! * inline: the estimate computed from the base64 text, before decoding,
//! * file: the file length from metadata, before reading.
//!
//! A non-success HTTP status is surfaced as
//! [`ImgOpsError::UpstreamFetch`] carrying the upstream code. There is a
//! single fetch attempt and no retry.

use crate::config::TransformConfig;
use crate::error::ImgOpsError;
use crate::pipeline::guard;
use crate::request::ImageSource;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::{Bytes, BytesMut};
use std::borrow::Cow;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Acquired, not yet decoded image bytes plus an optional format hint.
///
/// Owned exclusively by one request and consumed once by the decoder.
#[derive(Debug)]
pub struct RawImageBuffer {
    bytes: Bytes,
    format_hint: Option<String>,
}

impl RawImageBuffer {
    pub fn new(bytes: impl Into<Bytes>, format_hint: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            format_hint,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Declared container name, e.g. "PNG" from a `Content-Type` header.
    pub fn format_hint(&self) -> Option<&str> {
        self.format_hint.as_deref()
    }
}

/// Status and body returned by a [`Fetch`] implementation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// Empty when `status` is not a success.
    pub body: Bytes,
}

impl FetchResponse {
    /// Only `200 OK` carries an image; any other status, 2xx included, is
    /// mirrored back as an upstream error.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// "Fetch bytes from a URL" capability used by the remote source.
///
/// [`HttpFetcher`] is the production implementation; tests substitute
/// scripted fetchers.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse, ImgOpsError>> + Send;
}

/// [`Fetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: Option<u64>,
    max_body_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &TransformConfig) -> Result<Self, ImgOpsError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.fetch_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ImgOpsError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_secs: config.fetch_timeout_secs,
            max_body_bytes: config.max_payload_bytes,
        })
    }

    fn map_transport_error(&self, url: &str, e: reqwest::Error) -> ImgOpsError {
        if e.is_timeout() {
            ImgOpsError::FetchTimeout {
                url: url.to_string(),
                secs: self.timeout_secs.unwrap_or_default(),
            }
        } else {
            ImgOpsError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, ImgOpsError> {
        info!("Fetching image from: {}", url);

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if response.status() != reqwest::StatusCode::OK {
            debug!("Upstream answered {} for {}", status, url);
            return Ok(FetchResponse {
                status,
                content_type,
                body: Bytes::new(),
            });
        }

        // Refuse to buffer a body the server already declared too large.
        if let Some(declared) = response.content_length() {
            guard::check_raw_size(declared, self.max_body_bytes)?;
        }

        // Bodies without a declared length are read chunk by chunk and
        // abandoned as soon as they pass the ceiling.
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.map_transport_error(url, e))?
        {
            guard::check_raw_size((body.len() + chunk.len()) as u64, self.max_body_bytes)?;
            body.extend_from_slice(&chunk);
        }
        let body = body.freeze();

        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Acquire the bytes for `source`, enforcing `limit` before any decode.
pub async fn acquire<F: Fetch>(
    source: ImageSource,
    fetcher: &F,
    limit: u64,
) -> Result<RawImageBuffer, ImgOpsError> {
    match source {
        ImageSource::Remote { url } => acquire_remote(&url, fetcher, limit).await,
        ImageSource::Inline { base64_image } => acquire_inline(&base64_image, limit),
        ImageSource::File { path } => acquire_file(&path, limit).await,
    }
}

async fn acquire_remote<F: Fetch>(
    url: &str,
    fetcher: &F,
    limit: u64,
) -> Result<RawImageBuffer, ImgOpsError> {
    let response = fetcher.fetch(url).await?;

    if !response.is_success() {
        return Err(ImgOpsError::UpstreamFetch {
            url: url.to_string(),
            status: response.status,
        });
    }

    guard::check_raw_size(response.body.len() as u64, limit)?;

    let hint = response.content_type.as_deref().and_then(hint_from_mime);
    debug!(
        "Fetched {} bytes from {} (hint: {:?})",
        response.body.len(),
        url,
        hint
    );
    Ok(RawImageBuffer::new(response.body, hint))
}

fn acquire_inline(payload: &str, limit: u64) -> Result<RawImageBuffer, ImgOpsError> {
    let (hint, encoded) = split_data_url(payload);

    // Estimate first: oversized text is rejected without being decoded.
    guard::check_encoded_size(encoded, limit)?;

    let encoded: Cow<'_, str> = if encoded.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect())
    } else {
        Cow::Borrowed(encoded)
    };

    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| ImgOpsError::InvalidBase64 {
            detail: e.to_string(),
        })?;

    debug!("Decoded inline payload → {} bytes", bytes.len());
    Ok(RawImageBuffer::new(bytes, hint))
}

async fn acquire_file(path: &Path, limit: u64) -> Result<RawImageBuffer, ImgOpsError> {
    let not_found = |e: std::io::Error| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ImgOpsError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ImgOpsError::Internal(format!("Failed to read '{}': {e}", path.display()))
        }
    };

    let meta = tokio::fs::metadata(path).await.map_err(not_found)?;
    guard::check_raw_size(meta.len(), limit)?;

    let bytes = tokio::fs::read(path).await.map_err(not_found)?;
    // The file may have grown between stat and read.
    guard::check_raw_size(bytes.len() as u64, limit)?;

    let hint = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_uppercase());
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(RawImageBuffer::new(bytes, hint))
}

/// Split an optional `data:image/<kind>;base64,` prefix from the payload.
fn split_data_url(payload: &str) -> (Option<String>, &str) {
    let trimmed = payload.trim();
    if let Some(rest) = trimmed.strip_prefix("data:") {
        if let Some((header, data)) = rest.split_once(',') {
            let mime = header.split(';').next().unwrap_or_default();
            return (hint_from_mime(mime), data);
        }
    }
    (None, trimmed)
}

/// "image/png; charset=..." → "PNG".
fn hint_from_mime(mime: &str) -> Option<String> {
    let essence = mime.split(';').next()?.trim();
    let subtype = essence.strip_prefix("image/")?;
    if subtype.is_empty() {
        return None;
    }
    Some(subtype.to_ascii_uppercase())
}
