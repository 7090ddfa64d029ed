//! Codec engine: bytes → pixel grid → bytes, via the `image` crate.
//!
//! Decoding sniffs the container from the magic bytes. A declared hint is
//! only consulted when sniffing finds nothing (TGA has no signature), and a
//! hint that disagrees with the content is ignored.
//!
//! Encoding distinguishes two failures:
//! [`ImgOpsError::UnsupportedFormat`] when the container name is unknown, and
//! [`ImgOpsError::Encode`] when the pixels cannot be stored in a known
//! container. Alpha is never dropped silently to make an image fit JPEG.

use crate::error::ImgOpsError;
use crate::pipeline::input::RawImageBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use std::borrow::Cow;
use std::io::Cursor;
use tracing::{debug, warn};

/// A decoded pixel grid and the container it came from.
#[derive(Debug)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub source_format: ImageFormat,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Map a container name to an `ImageFormat`, ignoring case.
fn lookup_format(name: &str) -> Option<ImageFormat> {
    let format = match name.trim().to_ascii_uppercase().as_str() {
        "JPEG" | "JPG" => ImageFormat::Jpeg,
        "PNG" => ImageFormat::Png,
        "GIF" => ImageFormat::Gif,
        "BMP" => ImageFormat::Bmp,
        "TIFF" | "TIF" => ImageFormat::Tiff,
        "WEBP" => ImageFormat::WebP,
        "ICO" => ImageFormat::Ico,
        "TGA" => ImageFormat::Tga,
        "PNM" | "PPM" | "PGM" | "PBM" => ImageFormat::Pnm,
        "QOI" => ImageFormat::Qoi,
        _ => return None,
    };
    Some(format)
}

/// Resolve an output container name the encoder can write.
pub fn parse_format(name: &str) -> Result<ImageFormat, ImgOpsError> {
    match lookup_format(name) {
        Some(format) if format.writing_enabled() => Ok(format),
        _ => Err(ImgOpsError::UnsupportedFormat {
            format: name.to_string(),
        }),
    }
}

/// Canonical upper-case name for a container.
pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Png => "PNG",
        ImageFormat::Gif => "GIF",
        ImageFormat::Bmp => "BMP",
        ImageFormat::Tiff => "TIFF",
        ImageFormat::WebP => "WEBP",
        ImageFormat::Ico => "ICO",
        ImageFormat::Tga => "TGA",
        ImageFormat::Pnm => "PNM",
        ImageFormat::Qoi => "QOI",
        _ => "UNKNOWN",
    }
}

/// Decode an acquired buffer. The buffer is consumed.
pub fn decode(raw: RawImageBuffer) -> Result<DecodedImage, ImgOpsError> {
    let hinted = raw.format_hint().and_then(lookup_format);

    let mut reader = ImageReader::new(Cursor::new(raw.bytes()))
        .with_guessed_format()
        .map_err(|e| ImgOpsError::Decode {
            detail: e.to_string(),
        })?;

    let source_format = match (reader.format(), hinted) {
        (Some(sniffed), Some(hint)) if sniffed != hint => {
            warn!(
                "Declared format {} disagrees with content ({}); using content",
                format_name(hint),
                format_name(sniffed)
            );
            sniffed
        }
        (Some(sniffed), _) => sniffed,
        (None, Some(hint)) => {
            debug!("No signature found; trying declared format {}", format_name(hint));
            reader.set_format(hint);
            hint
        }
        (None, None) => {
            return Err(ImgOpsError::Decode {
                detail: "unrecognised image container".into(),
            })
        }
    };

    let image = reader.decode().map_err(|e| ImgOpsError::Decode {
        detail: e.to_string(),
    })?;

    debug!(
        "Decoded {} → {}x{} {:?}",
        format_name(source_format),
        image.width(),
        image.height(),
        image.color()
    );

    Ok(DecodedImage {
        image,
        source_format,
    })
}

/// Bring `image` into a pixel layout the `format` encoder accepts.
///
/// Only bit depth and the gray/colour split change; alpha is kept. GIF and
/// QOI take 8-bit RGB(A) only, JPEG takes 8-bit gray or RGB, PNG and TIFF
/// keep 16-bit samples, and the remaining containers take 8-bit samples.
fn encodable(image: &DynamicImage, format: ImageFormat) -> Cow<'_, DynamicImage> {
    let color = image.color();
    let alpha = color.has_alpha();
    let rgb8 = || DynamicImage::ImageRgb8(image.to_rgb8());
    let rgba8 = || DynamicImage::ImageRgba8(image.to_rgba8());

    let converted = match format {
        ImageFormat::Png => match color {
            ColorType::Rgb32F => Some(DynamicImage::ImageRgb16(image.to_rgb16())),
            ColorType::Rgba32F => Some(DynamicImage::ImageRgba16(image.to_rgba16())),
            _ => None,
        },
        ImageFormat::Tiff => match color {
            ColorType::L8
            | ColorType::L16
            | ColorType::Rgb8
            | ColorType::Rgb16
            | ColorType::Rgba8
            | ColorType::Rgba16 => None,
            ColorType::La8 => Some(rgba8()),
            _ if alpha => Some(DynamicImage::ImageRgba16(image.to_rgba16())),
            _ => Some(DynamicImage::ImageRgb16(image.to_rgb16())),
        },
        ImageFormat::Jpeg => match color {
            ColorType::L8 | ColorType::Rgb8 => None,
            ColorType::L16 => Some(DynamicImage::ImageLuma8(image.to_luma8())),
            _ => Some(rgb8()),
        },
        ImageFormat::Gif | ImageFormat::Qoi => match color {
            ColorType::Rgb8 | ColorType::Rgba8 => None,
            _ if alpha => Some(rgba8()),
            _ => Some(rgb8()),
        },
        _ => match color {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => None,
            ColorType::L16 => Some(DynamicImage::ImageLuma8(image.to_luma8())),
            ColorType::La16 => Some(DynamicImage::ImageLumaA8(image.to_luma_alpha8())),
            _ if alpha => Some(rgba8()),
            _ => Some(rgb8()),
        },
    };

    match converted {
        Some(img) => {
            debug!(
                "Converted {:?} → {:?} for {}",
                color,
                img.color(),
                format_name(format)
            );
            Cow::Owned(img)
        }
        None => Cow::Borrowed(image),
    }
}

/// Encode `image` into `format`.
pub fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, ImgOpsError> {
    let encode_err = |detail: String| ImgOpsError::Encode {
        format: format_name(format).to_string(),
        detail,
    };

    if format == ImageFormat::Jpeg && image.color().has_alpha() {
        return Err(encode_err(format!(
            "cannot write {:?} pixels with an alpha channel",
            image.color()
        )));
    }

    let image = encodable(image, format);
    let mut buf = Vec::new();
    if format == ImageFormat::Jpeg {
        let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality);
        image
            .write_with_encoder(encoder)
            .map_err(|e| encode_err(e.to_string()))?;
    } else {
        image
            .write_to(&mut Cursor::new(&mut buf), format)
            .map_err(|e| encode_err(e.to_string()))?;
    }

    debug!("Encoded {} → {} bytes", format_name(format), buf.len());
    Ok(buf)
}
