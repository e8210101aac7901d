//! WebP encoding WASM bindings.
//!
//! This module exposes the zoeconvert-core WebP engine to JavaScript.
//!
//! # Functions
//!
//! - [`encode_webp`] - Encode with a full options object
//! - [`encode_webp_with_quality`] - Encode once at a fixed quality
//! - [`encode_webp_to_budget`] - Lower the quality until the output fits a byte budget
//!
//! # Example
//!
//! ```typescript
//! import { extract_metadata, encode_webp } from '@zoeconvert/wasm';
//!
//! const meta = extract_metadata(bytes, file.name, file.type);
//! const result = encode_webp(meta, {
//!   policy: { mode: 'sizeTargeted', targetMaxBytes: 800 * 1024 },
//!   targetWidth: 1920,
//! });
//! img.src = result.toDataUrl();
//! ```

use crate::types::{filter_from_u8, JsEncodeResult, JsImageMetadata};
use wasm_bindgen::prelude::*;
use zoeconvert_core::encode::{self, EncodeOptions, SizeTarget};

/// Encode an upload as WebP.
///
/// # Arguments
///
/// * `metadata` - Result of `extract_metadata`
/// * `options` - An `EncodeOptions` object; `undefined` or `null` selects the
///   defaults (quality 0.9, no resize)
///
/// # Errors
///
/// Returns an error if the options are malformed, the source no longer
/// decodes, or a size budget cannot be met.
#[wasm_bindgen]
pub fn encode_webp(metadata: &JsImageMetadata, options: JsValue) -> Result<JsEncodeResult, JsValue> {
    let options: EncodeOptions = if options.is_undefined() || options.is_null() {
        EncodeOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options).map_err(crate::to_js_error)?
    };
    run(metadata, &options)
}

/// Encode once at `quality` (0-1).
///
/// # Arguments
///
/// * `metadata` - Result of `extract_metadata`
/// * `quality` - WebP quality in (0, 1]
/// * `target_width` - Optional width cap; never upscales
/// * `filter` - Resampling filter (0=Nearest, 1=Bilinear, 2=Lanczos3)
#[wasm_bindgen]
pub fn encode_webp_with_quality(
    metadata: &JsImageMetadata,
    quality: f32,
    target_width: Option<u32>,
    filter: u8,
) -> Result<JsEncodeResult, JsValue> {
    let options = with_width(EncodeOptions::fixed(quality), target_width, filter);
    run(metadata, &options)
}

/// Encode with the default search schedule against `target_max_bytes`.
///
/// Tries 0.9, 0.8, ... and returns the first output that fits, with one last
/// attempt at 0.1. Fails rather than returning an oversized payload.
#[wasm_bindgen]
pub fn encode_webp_to_budget(
    metadata: &JsImageMetadata,
    target_max_bytes: u32,
    target_width: Option<u32>,
    filter: u8,
) -> Result<JsEncodeResult, JsValue> {
    let options = with_width(
        EncodeOptions::with_target(SizeTarget::new(target_max_bytes as u64)),
        target_width,
        filter,
    );
    run(metadata, &options)
}

fn with_width(options: EncodeOptions, target_width: Option<u32>, filter: u8) -> EncodeOptions {
    let options = options.with_filter(filter_from_u8(filter));
    match target_width {
        Some(width) => options.with_target_width(width),
        None => options,
    }
}

fn run(metadata: &JsImageMetadata, options: &EncodeOptions) -> Result<JsEncodeResult, JsValue> {
    encode::encode_webp(metadata.inner(), options)
        .map(JsEncodeResult::from)
        .map_err(crate::to_js_error)
}
