//! Source image decoding and metadata extraction.
//!
//! JPEG, PNG and WebP sources are sniffed from their magic bytes, never from
//! the declared content type. EXIF orientation is applied so that reported
//! dimensions match what a browser displays.

use std::io::Cursor;

use bytes::Bytes;
use exif::{In, Reader, Tag};
use image::DynamicImage;

use super::{DecodeError, DecodedImage, ImageMetadata, Orientation, SourceFormat};

/// Sniff the container format of `bytes`.
///
/// # Errors
///
/// Returns `DecodeError::EmptyInput` for zero-byte input and
/// `DecodeError::UnsupportedFormat` when the bytes are not JPEG, PNG or WebP.
pub fn sniff_format(bytes: &[u8]) -> Result<SourceFormat, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyInput);
    }
    let format = image::guess_format(bytes).map_err(|_| DecodeError::UnsupportedFormat)?;
    SourceFormat::from_image_format(format).ok_or(DecodeError::UnsupportedFormat)
}

/// Decode source bytes into a working pixel surface.
///
/// The surface is RGBA when the source carries alpha and RGB otherwise.
/// Ownership passes to the caller; dropping it releases the buffer.
pub fn decode_source(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    decode_with_format(bytes).map(|(_, surface)| surface)
}

fn decode_with_format(bytes: &[u8]) -> Result<(SourceFormat, DecodedImage), DecodeError> {
    let format = sniff_format(bytes)?;
    let orientation = get_orientation(bytes);

    let img = image::load_from_memory_with_format(bytes, to_image_format(format))
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let surface = DecodedImage::from_dynamic(apply_orientation(img, orientation));
    if surface.is_empty() {
        return Err(DecodeError::CorruptedFile(
            "image has no pixels".to_string(),
        ));
    }

    Ok((format, surface))
}

/// Decode `source` and describe it.
///
/// The whole image is decoded so corrupt payloads are rejected here rather
/// than at encode time. The decode buffer is released before returning.
///
/// `declared_type` is the content type the upload claimed; when absent or
/// blank the sniffed type is recorded instead.
///
/// # Errors
///
/// Returns `DecodeError::EmptyInput`, `DecodeError::UnsupportedFormat` or
/// `DecodeError::CorruptedFile`.
pub fn extract_metadata(
    source: impl Into<Bytes>,
    display_name: &str,
    declared_type: Option<&str>,
) -> Result<ImageMetadata, DecodeError> {
    inspect_source(source, display_name, declared_type).map(|(metadata, _)| metadata)
}

/// Like [`extract_metadata`], but hands back the decoded surface too so a
/// caller that goes on to encode does not decode a second time.
///
/// # Errors
///
/// Same as [`extract_metadata`].
pub fn inspect_source(
    source: impl Into<Bytes>,
    display_name: &str,
    declared_type: Option<&str>,
) -> Result<(ImageMetadata, DecodedImage), DecodeError> {
    let source = source.into();
    let (format, surface) = decode_with_format(&source)?;
    let (width, height) = (surface.width, surface.height);

    let mime_type = match declared_type.map(str::trim) {
        Some(declared) if !declared.is_empty() => declared.to_string(),
        _ => format.mime_type().to_string(),
    };

    log::debug!(
        "extracted metadata for {:?}: {}x{}, {} bytes, {}",
        display_name,
        width,
        height,
        source.len(),
        mime_type
    );

    let metadata = ImageMetadata {
        size_bytes: source.len() as u64,
        source,
        width,
        height,
        mime_type,
        display_name: display_name.to_string(),
        format,
    };
    Ok((metadata, surface))
}

fn to_image_format(format: SourceFormat) -> image::ImageFormat {
    match format {
        SourceFormat::Jpeg => image::ImageFormat::Jpeg,
        SourceFormat::Png => image::ImageFormat::Png,
        SourceFormat::WebP => image::ImageFormat::WebP,
    }
}

/// Extract the EXIF orientation from an image container.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
pub fn get_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
