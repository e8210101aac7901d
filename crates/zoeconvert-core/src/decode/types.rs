//! Core types for image decoding.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Zero-byte input.
    #[error("Image file is empty")]
    EmptyInput,

    /// The file format is not recognized or supported.
    #[error("Invalid or unsupported image format")]
    UnsupportedFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),
}

/// Error types for resampling a decoded image.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResizeError {
    /// Target dimensions computed to zero.
    #[error("Invalid resize target: {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    /// The pixel buffer does not match the declared dimensions.
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferMismatch { expected: usize, actual: usize },
}

/// Filter type for image resizing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// Container formats accepted as conversion input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
    /// Accepted so an already converted file can be re-encoded.
    WebP,
}

impl SourceFormat {
    /// Map a sniffed `image` format onto the supported set.
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(SourceFormat::Jpeg),
            image::ImageFormat::Png => Some(SourceFormat::Png),
            image::ImageFormat::WebP => Some(SourceFormat::WebP),
            _ => None,
        }
    }

    /// Canonical MIME type for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "image/jpeg",
            SourceFormat::Png => "image/png",
            SourceFormat::WebP => "image/webp",
        }
    }
}

/// Metadata extracted from an uploaded image.
///
/// Created once per upload and never mutated. `source` is a cheap, shared
/// handle to the caller's bytes; the encoder re-decodes from it on demand.
#[derive(Debug, Clone)]
pub struct ImageMetadata {
    /// Original encoded bytes.
    pub source: Bytes,
    /// Width in pixels after orientation correction.
    pub width: u32,
    /// Height in pixels after orientation correction.
    pub height: u32,
    /// Byte length of `source`.
    pub size_bytes: u64,
    /// Declared content type, or the sniffed one when none was declared.
    pub mime_type: String,
    /// Original file name.
    pub display_name: String,
    /// Sniffed container format.
    pub format: SourceFormat,
}

impl ImageMetadata {
    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// The original bytes as a `data:` URL, for previews.
    pub fn to_data_url(&self) -> String {
        crate::data_url::to_data_url(&self.mime_type, &self.source)
    }
}

/// Channel layout of a decoded pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb8,
    Rgba8,
}

impl PixelLayout {
    /// Bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Rgb8 => 3,
            PixelLayout::Rgba8 => 4,
        }
    }
}

/// A decoded image: the working pixel surface for resize and encode.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Channel layout of `pixels`.
    pub layout: PixelLayout,
    /// Pixel data in row-major order.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Create a new DecodedImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, layout: PixelLayout, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * layout.channels(),
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            layout,
            pixels,
        }
    }

    /// Create a DecodedImage from an image::RgbImage.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            layout: PixelLayout::Rgb8,
            pixels: img.into_raw(),
        }
    }

    /// Create a DecodedImage from an image::RgbaImage.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            layout: PixelLayout::Rgba8,
            pixels: img.into_raw(),
        }
    }

    /// Keep alpha only when the source carries it.
    pub fn from_dynamic(img: image::DynamicImage) -> Self {
        if img.color().has_alpha() {
            Self::from_rgba_image(img.into_rgba8())
        } else {
            Self::from_rgb_image(img.into_rgb8())
        }
    }

    /// Drop the alpha channel, if any.
    pub fn into_rgb(self) -> Self {
        match self.layout {
            PixelLayout::Rgb8 => self,
            PixelLayout::Rgba8 => {
                let pixels = self
                    .pixels
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect();
                Self {
                    width: self.width,
                    height: self.height,
                    layout: PixelLayout::Rgb8,
                    pixels,
                }
            }
        }
    }

    /// Expected buffer length for the current dimensions and layout.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.layout.channels()
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
