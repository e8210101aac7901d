//! Image resizing for width-capped conversion and naming previews.
//!
//! All functions return new `DecodedImage` instances; the input surface is
//! left untouched, or consumed where the signature takes it by value.

use super::{DecodedImage, FilterType, PixelLayout, ResizeError};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `ResizeError::ZeroDimension` when either target dimension is zero
/// and `ResizeError::BufferMismatch` when the source buffer is malformed.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, ResizeError> {
    if width == 0 || height == 0 {
        return Err(ResizeError::ZeroDimension { width, height });
    }

    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let mismatch = || ResizeError::BufferMismatch {
        expected: image.expected_len(),
        actual: image.pixels.len(),
    };
    let filter = filter.to_image_filter();

    match image.layout {
        PixelLayout::Rgb8 => {
            let src = image::RgbImage::from_raw(image.width, image.height, image.pixels.clone())
                .ok_or_else(mismatch)?;
            let resized = image::imageops::resize(&src, width, height, filter);
            Ok(DecodedImage::from_rgb_image(resized))
        }
        PixelLayout::Rgba8 => {
            let src = image::RgbaImage::from_raw(image.width, image.height, image.pixels.clone())
                .ok_or_else(mismatch)?;
            let resized = image::imageops::resize(&src, width, height, filter);
            Ok(DecodedImage::from_rgba_image(resized))
        }
    }
}

/// Height that keeps the aspect ratio when the width becomes `target_width`.
///
/// `round(target_width * height / width)`; may be zero for extremely wide
/// sources, which callers must reject.
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return 0;
    }
    (target_width as f64 * height as f64 / width as f64).round() as u32
}

/// Cap the width at `target_width`, preserving aspect ratio.
///
/// Images already at or below `target_width` are returned unchanged; there is
/// no upscaling and no cropping.
///
/// # Errors
///
/// Returns `ResizeError::ZeroDimension` when the scaled height rounds to zero.
pub fn resize_to_width(
    image: DecodedImage,
    target_width: u32,
    filter: FilterType,
) -> Result<DecodedImage, ResizeError> {
    if target_width >= image.width {
        return Ok(image);
    }

    let new_height = scaled_height(image.width, image.height, target_width);
    resize(&image, target_width, new_height, filter)
}

/// Resize an image to fit within a maximum edge length while preserving aspect ratio.
///
/// Images already inside the box are returned unchanged.
pub fn resize_to_fit(
    image: &DecodedImage,
    max_edge: u32,
    filter: FilterType,
) -> Result<DecodedImage, ResizeError> {
    if max_edge == 0 {
        return Err(ResizeError::ZeroDimension {
            width: 0,
            height: 0,
        });
    }

    if image.width <= max_edge && image.height <= max_edge {
        return Ok(image.clone());
    }

    let (new_width, new_height) = calculate_fit_dimensions(image.width, image.height, max_edge);
    resize(image, new_width, new_height, filter)
}

/// Generate a small preview, e.g. for the naming service.
///
/// Uses bilinear interpolation for speed.
pub fn generate_thumbnail(image: &DecodedImage, size: u32) -> Result<DecodedImage, ResizeError> {
    resize_to_fit(image, size, FilterType::Bilinear)
}

/// Calculate dimensions to fit within max_edge while preserving aspect ratio.
fn calculate_fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let ratio = width as f64 / height as f64;

    if width >= height {
        let new_height = (max_edge as f64 / ratio).round() as u32;
        (max_edge, new_height.max(1))
    } else {
        let new_width = (max_edge as f64 * ratio).round() as u32;
        (new_width.max(1), max_edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::gradient;

    #[test]
    fn test_resize_basic() {
        let img = gradient(100, 50);
        let resized = resize(&img, 50, 25, FilterType::Bilinear).unwrap();

        assert_eq!(resized.width, 50);
        assert_eq!(resized.height, 25);
        assert_eq!(resized.pixels.len(), 50 * 25 * 3);
    }

    #[test]
    fn test_resize_rgba_keeps_layout() {
        let img = DecodedImage::new(4, 4, PixelLayout::Rgba8, vec![200u8; 4 * 4 * 4]);
        let resized = resize(&img, 2, 2, FilterType::Lanczos3).unwrap();

        assert_eq!(resized.layout, PixelLayout::Rgba8);
        assert_eq!(resized.pixels.len(), 2 * 2 * 4);
    }

    #[test]
    fn test_resize_zero_dimensions_error() {
        let img = gradient(100, 50);

        assert_eq!(
            resize(&img, 0, 50, FilterType::Bilinear).unwrap_err(),
            ResizeError::ZeroDimension {
                width: 0,
                height: 50
            }
        );
        assert!(resize(&img, 50, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_resize_buffer_mismatch() {
        let img = DecodedImage {
            width: 10,
            height: 10,
            layout: PixelLayout::Rgb8,
            pixels: vec![0u8; 12],
        };
        assert!(matches!(
            resize(&img, 5, 5, FilterType::Nearest),
            Err(ResizeError::BufferMismatch { .. })
        ));
    }

    #[test]
    fn test_scaled_height_rounds() {
        assert_eq!(scaled_height(3000, 2000, 1920), 1280);
        assert_eq!(scaled_height(6000, 4000, 2560), 1707);
        assert_eq!(scaled_height(1000, 1, 100), 0);
        assert_eq!(scaled_height(0, 10, 100), 0);
    }

    #[test]
    fn test_resize_to_width_downscales() {
        let img = gradient(300, 200);
        let resized = resize_to_width(img, 192, FilterType::Bilinear).unwrap();

        assert_eq!((resized.width, resized.height), (192, 128));
    }

    #[test]
    fn test_resize_to_width_never_upscales() {
        let img = gradient(100, 50);
        let same = resize_to_width(img.clone(), 100, FilterType::Bilinear).unwrap();
        let wider = resize_to_width(img, 400, FilterType::Bilinear).unwrap();

        assert_eq!((same.width, same.height), (100, 50));
        assert_eq!((wider.width, wider.height), (100, 50));
    }

    #[test]
    fn test_resize_to_width_degenerate_height() {
        let img = DecodedImage::new(1000, 1, PixelLayout::Rgb8, vec![9u8; 1000 * 3]);
        let result = resize_to_width(img, 100, FilterType::Bilinear);

        assert_eq!(
            result.unwrap_err(),
            ResizeError::ZeroDimension {
                width: 100,
                height: 0
            }
        );
    }

    #[test]
    fn test_resize_to_fit_landscape() {
        let img = gradient(600, 400);
        let resized = resize_to_fit(&img, 256, FilterType::Lanczos3).unwrap();

        assert_eq!(resized.width, 256);
        assert_eq!(resized.height, 171);
    }

    #[test]
    fn test_resize_to_fit_portrait() {
        let img = gradient(400, 600);
        let resized = resize_to_fit(&img, 256, FilterType::Lanczos3).unwrap();

        assert_eq!(resized.height, 256);
        assert_eq!(resized.width, 171);
    }

    #[test]
    fn test_resize_to_fit_already_smaller() {
        let img = gradient(100, 50);
        let resized = resize_to_fit(&img, 256, FilterType::Bilinear).unwrap();

        assert_eq!((resized.width, resized.height), (100, 50));
    }

    #[test]
    fn test_resize_to_fit_zero_max_edge_error() {
        let img = gradient(100, 50);
        assert!(resize_to_fit(&img, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_generate_thumbnail() {
        let img = gradient(600, 400);
        let thumb = generate_thumbnail(&img, 128).unwrap();

        assert!(thumb.width <= 128 && thumb.height <= 128);
        assert!(thumb.width == 128 || thumb.height == 128);
    }

    #[test]
    fn test_calculate_fit_dimensions() {
        assert_eq!(calculate_fit_dimensions(6000, 4000, 2560), (2560, 1707));
        assert_eq!(calculate_fit_dimensions(4000, 6000, 2560), (1707, 2560));
        assert_eq!(calculate_fit_dimensions(4000, 4000, 256), (256, 256));
        assert_eq!(calculate_fit_dimensions(0, 0, 256), (0, 0));
    }
}
