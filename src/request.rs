//! Request types: where the image comes from and what to do with it.

use crate::config::ResampleFilter;
use crate::error::ImgOpsError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the input image bytes come from.
///
/// The variant is chosen once at the boundary; every later stage sees only
/// the acquired byte buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ImageSource {
    /// Fetch the image from an HTTP/HTTPS URL.
    Remote { url: String },
    /// Base64 text, optionally with a `data:image/...;base64,` prefix.
    Inline { base64_image: String },
    /// Read the image from a local file.
    File { path: PathBuf },
}

impl ImageSource {
    pub fn remote(url: impl Into<String>) -> Self {
        ImageSource::Remote { url: url.into() }
    }

    pub fn inline(base64_image: impl Into<String>) -> Self {
        ImageSource::Inline {
            base64_image: base64_image.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        ImageSource::File { path: path.into() }
    }

    /// Short label for logs. Inline payloads are never logged in full.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Remote { url } => url.clone(),
            ImageSource::Inline { base64_image } => {
                format!("<inline {} chars>", base64_image.len())
            }
            ImageSource::File { path } => path.display().to_string(),
        }
    }
}

/// The transformation to apply to the decoded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    /// Cut out `[x, x+width) × [y, y+height)`. The rectangle may extend past
    /// the source; uncovered pixels are zero-filled.
    Crop {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    },
    /// Resample to exactly `width × height`.
    Resize {
        width: i64,
        height: i64,
        /// Sent as the integer `resample` code. `None` uses
        /// [`crate::config::TransformConfig::default_resample`].
        #[serde(default, rename = "resample")]
        filter: Option<ResampleFilter>,
    },
    /// Re-encode into another container without touching pixels.
    Convert,
}

impl Operation {
    /// Short name for logs and stats.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Crop { .. } => "crop",
            Operation::Resize { .. } => "resize",
            Operation::Convert => "convert",
        }
    }
}

/// A complete transformation request: operation plus output container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformRequest {
    pub operation: Operation,
    /// Output container name, e.g. "JPEG" or "png". `None` uses
    /// [`crate::config::TransformConfig::default_format`].
    #[serde(default, rename = "image_format")]
    pub output_format: Option<String>,
}

impl TransformRequest {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            output_format: None,
        }
    }

    pub fn crop(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self::new(Operation::Crop {
            x,
            y,
            width,
            height,
        })
    }

    pub fn resize(width: i64, height: i64) -> Self {
        Self::new(Operation::Resize {
            width,
            height,
            filter: None,
        })
    }

    pub fn convert() -> Self {
        Self::new(Operation::Convert)
    }

    /// Set the output container.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    /// Set the resample filter. Ignored for crop and convert.
    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        if let Operation::Resize { filter: f, .. } = &mut self.operation {
            *f = Some(filter);
        }
        self
    }

    /// Reject malformed dimensions before any bytes are acquired.
    pub fn validate(&self) -> Result<(), ImgOpsError> {
        match self.operation {
            Operation::Crop { width, height, .. } | Operation::Resize { width, height, .. } => {
                checked_dimensions(width, height).map(|_| ())
            }
            Operation::Convert => Ok(()),
        }
    }
}

/// Convert signed wire dimensions into pixel dimensions.
pub(crate) fn checked_dimensions(width: i64, height: i64) -> Result<(u32, u32), ImgOpsError> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(ImgOpsError::InvalidDimensions { width, height }),
    }
}
