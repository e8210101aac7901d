//! Lossy WebP encoding through libwebp.

use super::EncodeError;
use crate::decode::{DecodedImage, PixelLayout};

/// Largest width or height the WebP bitstream can describe.
pub const MAX_WEBP_DIMENSION: u32 = 16_383;

/// Encode a decoded surface to lossy WebP at `quality` in (0, 1].
///
/// Alpha is kept when the surface carries it. Out-of-range quality values
/// are clamped here; option validation happens before this is reached.
///
/// # Errors
///
/// Returns `EncodeError::InvalidDimensions` for empty or oversized surfaces,
/// `EncodeError::InvalidPixelData` for a malformed buffer and
/// `EncodeError::EncodingFailed` if libwebp rejects the input.
pub fn encode_webp_pixels(image: &DecodedImage, quality: f32) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 || width > MAX_WEBP_DIMENSION || height > MAX_WEBP_DIMENSION {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = image.expected_len();
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }

    let encoder = match image.layout {
        PixelLayout::Rgb8 => webp::Encoder::from_rgb(&image.pixels, width, height),
        PixelLayout::Rgba8 => webp::Encoder::from_rgba(&image.pixels, width, height),
    };

    let memory = encoder
        .encode_simple(false, (quality * 100.0).clamp(0.0, 100.0))
        .map_err(|e| EncodeError::EncodingFailed(format!("{e:?}")))?;

    Ok(memory.to_vec())
}
