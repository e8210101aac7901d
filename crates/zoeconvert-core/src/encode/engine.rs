//! The WebP conversion engine: decode, cap width, pick a quality, encode.

use serde::Serialize;

use super::codec::encode_webp_pixels;
use super::search::select_quality;
use super::{EncodeAttempt, EncodeError, EncodeOptions};
use crate::decode::{decode_source, resize_to_width, DecodedImage, ImageMetadata};

/// MIME type of every payload this engine produces.
pub const WEBP_MIME_TYPE: &str = "image/webp";

/// Output of one encode call. Owned entirely by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeResult {
    #[serde(skip)]
    pub payload: Vec<u8>,
    /// Exact length of `payload`.
    pub size_bytes: u64,
    /// Final width after any resize.
    pub width: u32,
    /// Final height after any resize.
    pub height: u32,
    /// Quality that produced `payload`.
    pub quality: f32,
    /// Every encode performed, in order.
    pub attempts: Vec<EncodeAttempt>,
}

impl EncodeResult {
    /// `data:image/webp;base64,...` form of the payload.
    pub fn to_data_url(&self) -> String {
        crate::data_url::to_data_url(WEBP_MIME_TYPE, &self.payload)
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Re-encode an uploaded image as WebP.
///
/// The source is decoded into a working surface owned by this call, which is
/// released on every exit path.
///
/// # Errors
///
/// - `EncodeError::InvalidOption` for malformed options (checked before decoding)
/// - `EncodeError::Decode` if the source no longer decodes
/// - `EncodeError::Resize` if the capped height rounds to zero
/// - `EncodeError::SizeBudgetExceeded` when a size target cannot be met
///
/// # Example
///
/// ```ignore
/// use zoeconvert_core::decode::extract_metadata;
/// use zoeconvert_core::encode::{encode_webp, EncodeOptions};
///
/// let meta = extract_metadata(bytes, "photo.jpg", Some("image/jpeg"))?;
/// let result = encode_webp(&meta, &EncodeOptions::size_targeted(800 * 1024).with_target_width(1920))?;
/// ```
pub fn encode_webp(
    metadata: &ImageMetadata,
    options: &EncodeOptions,
) -> Result<EncodeResult, EncodeError> {
    options.validate()?;
    let surface = decode_source(&metadata.source)?;
    encode_validated(surface, options)
}

/// Encode an already decoded surface, consuming it.
pub fn encode_decoded(
    surface: DecodedImage,
    options: &EncodeOptions,
) -> Result<EncodeResult, EncodeError> {
    options.validate()?;
    encode_validated(surface, options)
}

fn encode_validated(
    surface: DecodedImage,
    options: &EncodeOptions,
) -> Result<EncodeResult, EncodeError> {
    let source_dims = (surface.width, surface.height);
    let surface = match options.target_width {
        Some(target_width) => resize_to_width(surface, target_width, options.filter)?,
        None => surface,
    };
    let (width, height) = (surface.width, surface.height);
    if (width, height) != source_dims {
        log::debug!(
            "resized {}x{} -> {}x{}",
            source_dims.0,
            source_dims.1,
            width,
            height
        );
    }

    let selected = select_quality(&options.policy, |quality| {
        encode_webp_pixels(&surface, quality)
    })?;
    drop(surface);

    Ok(EncodeResult {
        size_bytes: selected.payload.len() as u64,
        payload: selected.payload,
        width,
        height,
        quality: selected.quality,
        attempts: selected.attempts,
    })
}
