//! Pixel operations: crop, resize, convert.
//!
//! Each operation consumes one decoded image and produces one new image.
//! Dimensions are validated here as well as at request level, so nothing
//! with a zero or negative size ever reaches the resampler.
//!
//! ## Crop outside the source
//!
//! Any rectangle is a valid crop. Pixels of the output that fall outside the
//! source are zero (black, or fully transparent when the image has alpha).
//! Negative `x`/`y` follow the same rule.
//!
//! ## Resampling
//!
//! Resize runs on `fast_image_resize`, which offers every kernel in
//! [`ResampleFilter`] including Box and Hamming. If it rejects a pixel
//! layout the resize falls back to `image::imageops` with the closest kernel.

use crate::config::ResampleFilter;
use crate::error::ImgOpsError;
use crate::request::{checked_dimensions, Operation};
use fast_image_resize as fr;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Pixel};
use tracing::{debug, warn};

/// Apply `op` to `image`, consuming it.
pub fn apply(
    image: DynamicImage,
    op: &Operation,
    default_filter: ResampleFilter,
    max_output_pixels: u64,
) -> Result<DynamicImage, ImgOpsError> {
    match *op {
        Operation::Crop {
            x,
            y,
            width,
            height,
        } => {
            let (w, h) = checked_dimensions(width, height)?;
            check_pixel_budget(w, h, max_output_pixels)?;
            Ok(crop(&image, x, y, w, h))
        }
        Operation::Resize {
            width,
            height,
            filter,
        } => {
            let (w, h) = checked_dimensions(width, height)?;
            check_pixel_budget(w, h, max_output_pixels)?;
            Ok(resize(&image, w, h, filter.unwrap_or(default_filter)))
        }
        Operation::Convert => Ok(image),
    }
}

fn check_pixel_budget(width: u32, height: u32, max_pixels: u64) -> Result<(), ImgOpsError> {
    if u64::from(width) * u64::from(height) > max_pixels {
        return Err(ImgOpsError::DimensionsTooLarge {
            width,
            height,
            max_pixels,
        });
    }
    Ok(())
}

/// Cut `[x, x+width) × [y, y+height)` out of `image`, zero-filling whatever
/// lies outside it.
pub fn crop(image: &DynamicImage, x: i64, y: i64, width: u32, height: u32) -> DynamicImage {
    let inside = x >= 0
        && y >= 0
        && x.saturating_add(i64::from(width)) <= i64::from(image.width())
        && y.saturating_add(i64::from(height)) <= i64::from(image.height());

    if inside {
        return image.crop_imm(x as u32, y as u32, width, height);
    }

    debug!(
        "Crop {}x{}+{}+{} extends past {}x{} source; padding",
        width,
        height,
        x,
        y,
        image.width(),
        image.height()
    );

    macro_rules! padded_variants {
        ($($variant:ident),*) => {
            match image {
                $(DynamicImage::$variant(buf) => {
                    DynamicImage::$variant(padded_crop(buf, x, y, width, height))
                })*
                other => DynamicImage::ImageRgba32F(padded_crop(
                    &other.to_rgba32f(),
                    x,
                    y,
                    width,
                    height,
                )),
            }
        };
    }

    padded_variants!(
        ImageLuma8,
        ImageLumaA8,
        ImageRgb8,
        ImageRgba8,
        ImageLuma16,
        ImageLumaA16,
        ImageRgb16,
        ImageRgba16,
        ImageRgb32F,
        ImageRgba32F
    )
}

fn padded_crop<P: Pixel>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let mut out = ImageBuffer::new(width, height);
    imageops::replace(&mut out, src, x.saturating_neg(), y.saturating_neg());
    out
}

/// Resample `image` to exactly `width × height`.
pub fn resize(image: &DynamicImage, width: u32, height: u32, filter: ResampleFilter) -> DynamicImage {
    match resize_fast(image, width, height, filter) {
        Ok(resized) => resized,
        Err(err) => {
            warn!(
                "fast_image_resize failed for {:?} ({}); falling back to image::resize_exact",
                image.color(),
                err
            );
            image.resize_exact(width, height, fallback_filter(filter))
        }
    }
}

fn resize_fast(
    image: &DynamicImage,
    width: u32,
    height: u32,
    filter: ResampleFilter,
) -> Result<DynamicImage, fr::ResizeError> {
    let mut dst = DynamicImage::new(width, height, image.color());
    let options = fr::ResizeOptions::new().resize_alg(resize_alg(filter));
    fr::Resizer::new().resize(image, &mut dst, Some(&options))?;
    debug!(
        "Resized {}x{} → {}x{} ({:?})",
        image.width(),
        image.height(),
        width,
        height,
        filter
    );
    Ok(dst)
}

fn resize_alg(filter: ResampleFilter) -> fr::ResizeAlg {
    let kernel = match filter {
        ResampleFilter::Nearest => return fr::ResizeAlg::Nearest,
        ResampleFilter::Lanczos => fr::FilterType::Lanczos3,
        ResampleFilter::Bilinear => fr::FilterType::Bilinear,
        ResampleFilter::Bicubic => fr::FilterType::CatmullRom,
        ResampleFilter::Box => fr::FilterType::Box,
        ResampleFilter::Hamming => fr::FilterType::Hamming,
    };
    fr::ResizeAlg::Convolution(kernel)
}

fn fallback_filter(filter: ResampleFilter) -> FilterType {
    match filter {
        ResampleFilter::Nearest => FilterType::Nearest,
        ResampleFilter::Lanczos => FilterType::Lanczos3,
        ResampleFilter::Bicubic => FilterType::CatmullRom,
        ResampleFilter::Bilinear | ResampleFilter::Box | ResampleFilter::Hamming => {
            FilterType::Triangle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    const NO_LIMIT: u64 = u64::MAX;

    fn gradient(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([x as u8, y as u8, (x + y) as u8])
        }))
    }

    #[test]
    fn full_crop_is_identity() {
        let img = gradient(100, 80);
        let out = apply(
            img.clone(),
            &Operation::Crop {
                x: 0,
                y: 0,
                width: 100,
                height: 80,
            },
            ResampleFilter::default(),
            NO_LIMIT,
        )
        .unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn inner_crop_copies_pixels() {
        let img = gradient(50, 50);
        let out = crop(&img, 10, 20, 5, 5);
        assert_eq!(out.dimensions(), (5, 5));
        assert_eq!(out.get_pixel(0, 0), img.get_pixel(10, 20));
        assert_eq!(out.get_pixel(4, 4), img.get_pixel(14, 24));
    }

    #[test]
    fn crop_past_bounds_is_padded() {
        let img = gradient(100, 100);
        let out = crop(&img, 50, 50, 100, 100);
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.get_pixel(0, 0), img.get_pixel(50, 50));
        assert_eq!(out.get_pixel(49, 49), img.get_pixel(99, 99));
        assert_eq!(out.get_pixel(50, 50), Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(99, 0), Rgba([0, 0, 0, 255]));
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn crop_with_negative_origin_is_padded() {
        let img = gradient(10, 10);
        let out = crop(&img, -3, -2, 10, 10);
        assert_eq!(out.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(3, 2), img.get_pixel(0, 0));
    }

    #[test]
    fn crop_entirely_outside_is_blank() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])));
        let out = crop(&img, 100, 100, 3, 3);
        assert_eq!(out.dimensions(), (3, 3));
        assert!(out.pixels().all(|(_, _, p)| p == Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn padded_crop_keeps_sixteen_bit_depth() {
        let img = DynamicImage::ImageLuma16(ImageBuffer::from_pixel(4, 4, Luma([40_000u16])));
        let out = crop(&img, 2, 2, 4, 4);
        let buf = out.as_luma16().expect("still 16-bit");
        assert_eq!(buf.get_pixel(0, 0), &Luma([40_000]));
        assert_eq!(buf.get_pixel(3, 3), &Luma([0]));
    }

    #[test]
    fn resize_produces_exact_dimensions_for_every_filter() {
        let img = gradient(37, 23);
        for code in 0..=5 {
            let filter = ResampleFilter::from_code(code).unwrap();
            for (w, h) in [(1, 1), (10, 90), (200, 3), (37, 23)] {
                let out = resize(&img, w, h, filter);
                assert_eq!(out.dimensions(), (w, h), "{filter:?} {w}x{h}");
            }
        }
    }

    #[test]
    fn resize_keeps_color_type() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 40])));
        let out = resize(&img, 4, 4, ResampleFilter::Bilinear);
        assert!(matches!(out, DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn resize_rejects_zero_dimensions() {
        for (w, h) in [(0, 10), (10, 0), (-1, 10)] {
            let err = apply(
                gradient(4, 4),
                &Operation::Resize {
                    width: w,
                    height: h,
                    filter: None,
                },
                ResampleFilter::default(),
                NO_LIMIT,
            )
            .unwrap_err();
            assert!(matches!(err, ImgOpsError::InvalidDimensions { .. }));
        }
    }

    #[test]
    fn pixel_budget_is_enforced() {
        let err = apply(
            gradient(4, 4),
            &Operation::Crop {
                x: 0,
                y: 0,
                width: 1000,
                height: 1000,
            },
            ResampleFilter::default(),
            10_000,
        )
        .unwrap_err();
        assert!(matches!(err, ImgOpsError::DimensionsTooLarge { .. }));
    }

    #[test]
    fn convert_is_identity() {
        let img = gradient(6, 6);
        let out = apply(img.clone(), &Operation::Convert, ResampleFilter::default(), NO_LIMIT)
            .unwrap();
        assert_eq!(out, img);
    }
}
