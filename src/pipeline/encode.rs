//! Output encoder: hand encoded image bytes back as a binary body or as
//! base64 text wrapped in `{ "image": "..." }`.
//!
//! Presentation is chosen by the caller after the pipeline has run, so the
//! same [`TransformOutput`] can be served either way without re-running
//! any upstream stage.

use crate::output::{Base64ImageResponse, Presentation, PresentedOutput, TransformOutput};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Wrap `output` for the requested presentation, consuming it.
pub fn present(output: TransformOutput, mode: Presentation) -> PresentedOutput {
    match mode {
        Presentation::Raw => PresentedOutput::Raw {
            bytes: output.bytes,
            mime_type: output.mime_type,
        },
        Presentation::Base64 => PresentedOutput::Base64(to_base64_response(&output.bytes)),
    }
}

/// Base64-encode `bytes` into the single-field response shape.
pub fn to_base64_response(bytes: &[u8]) -> Base64ImageResponse {
    let image = STANDARD.encode(bytes);
    debug!("Encoded {} bytes → {} bytes base64", bytes.len(), image.len());
    Base64ImageResponse { image }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TransformStats;

    fn output(bytes: &[u8]) -> TransformOutput {
        TransformOutput {
            bytes: bytes.to_vec(),
            format: "PNG".into(),
            mime_type: "image/png".into(),
            width: 1,
            height: 1,
            stats: TransformStats::default(),
        }
    }

    #[test]
    fn raw_presentation_passes_bytes_through() {
        match present(output(b"\x89PNG"), Presentation::Raw) {
            PresentedOutput::Raw { bytes, mime_type } => {
                assert_eq!(bytes, b"\x89PNG");
                assert_eq!(mime_type, "image/png");
            }
            other => panic!("expected raw, got {other:?}"),
        }
    }

    #[test]
    fn base64_presentation_wraps_in_image_field() {
        let presented = present(output(b"hello"), Presentation::Base64);
        let PresentedOutput::Base64(resp) = presented else {
            panic!("expected base64");
        };
        assert_eq!(resp.image, "aGVsbG8=");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"image":"aGVsbG8="}"#);
        assert_eq!(STANDARD.decode(&resp.image).unwrap(), b"hello");
    }
}
