//! WASM-compatible wrapper types.
//!
//! This module provides JavaScript-friendly types that wrap the core Zoe
//! Convert types, handling the conversion between Rust and JavaScript data
//! representations.

use wasm_bindgen::prelude::*;
use zoeconvert_core::decode::{FilterType, ImageMetadata};
use zoeconvert_core::encode::EncodeResult;

/// Metadata of an uploaded image.
///
/// # Memory Management
///
/// The original bytes stay in WASM memory so the image can be re-encoded
/// with different settings without copying it in again. Call `free()` to
/// release them early; otherwise the finalizer does.
#[wasm_bindgen]
pub struct JsImageMetadata {
    inner: ImageMetadata,
}

#[wasm_bindgen]
impl JsImageMetadata {
    /// Width in pixels, after EXIF orientation.
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Height in pixels, after EXIF orientation.
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Byte length of the original upload.
    #[wasm_bindgen(getter, js_name = sizeBytes)]
    pub fn size_bytes(&self) -> f64 {
        self.inner.size_bytes as f64
    }

    #[wasm_bindgen(getter, js_name = mimeType)]
    pub fn mime_type(&self) -> String {
        self.inner.mime_type.clone()
    }

    #[wasm_bindgen(getter, js_name = displayName)]
    pub fn display_name(&self) -> String {
        self.inner.display_name.clone()
    }

    #[wasm_bindgen(getter, js_name = aspectRatio)]
    pub fn aspect_ratio(&self) -> f64 {
        self.inner.aspect_ratio()
    }

    /// The original upload as a `data:` URL, for previews.
    #[wasm_bindgen(js_name = toDataUrl)]
    pub fn to_data_url(&self) -> String {
        self.inner.to_data_url()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {
        // Dropping self releases the memory
    }
}

impl JsImageMetadata {
    pub(crate) fn inner(&self) -> &ImageMetadata {
        &self.inner
    }
}

impl From<ImageMetadata> for JsImageMetadata {
    fn from(inner: ImageMetadata) -> Self {
        Self { inner }
    }
}

/// A finished WebP encode.
#[wasm_bindgen]
pub struct JsEncodeResult {
    inner: EncodeResult,
}

#[wasm_bindgen]
impl JsEncodeResult {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Exact byte length of the WebP payload.
    #[wasm_bindgen(getter, js_name = sizeBytes)]
    pub fn size_bytes(&self) -> f64 {
        self.inner.size_bytes as f64
    }

    /// Quality (0-1) that produced the payload.
    #[wasm_bindgen(getter)]
    pub fn quality(&self) -> f32 {
        self.inner.quality
    }

    /// Number of encodes performed.
    #[wasm_bindgen(getter, js_name = attemptCount)]
    pub fn attempt_count(&self) -> usize {
        self.inner.attempts.len()
    }

    /// Every `{ quality, sizeBytes }` pair tried, in order.
    pub fn attempts(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.attempts).map_err(crate::to_js_error)
    }

    /// WebP payload as Uint8Array.
    ///
    /// Note: This creates a copy of the payload.
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.payload.clone()
    }

    /// `data:image/webp;base64,...`, ready for an `<img>` or a download link.
    #[wasm_bindgen(js_name = toDataUrl)]
    pub fn to_data_url(&self) -> String {
        self.inner.to_data_url()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {
        // Dropping self releases the memory
    }
}

impl From<EncodeResult> for JsEncodeResult {
    fn from(inner: EncodeResult) -> Self {
        Self { inner }
    }
}

/// Convert a u8 filter type value to the core FilterType enum.
///
/// Values:
/// - 0 = Nearest (fastest, lowest quality)
/// - 1 = Bilinear (good balance of speed and quality)
/// - 2 = Lanczos3 (best quality, slowest)
///
/// Any other value defaults to Bilinear.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        2 => FilterType::Lanczos3,
        _ => FilterType::Bilinear, // Default
    }
}
