//! Upload inspection bindings.
//!
//! # Example
//!
//! ```typescript
//! import { extract_metadata } from '@zoeconvert/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const meta = extract_metadata(bytes, file.name, file.type);
//! console.log(`${meta.width}x${meta.height}, ${meta.sizeBytes} bytes`);
//! ```

use crate::types::JsImageMetadata;
use wasm_bindgen::prelude::*;
use zoeconvert_core::decode;

/// Decode an upload and describe it.
///
/// # Arguments
///
/// * `bytes` - The uploaded file as a `Uint8Array`
/// * `display_name` - Original file name
/// * `declared_type` - MIME type reported by the browser; the sniffed type is
///   used when this is missing or empty
///
/// # Errors
///
/// Returns an error if the file is empty, is not JPEG, PNG or WebP, or is
/// corrupted.
#[wasm_bindgen]
pub fn extract_metadata(
    bytes: Vec<u8>,
    display_name: &str,
    declared_type: Option<String>,
) -> Result<JsImageMetadata, JsValue> {
    decode::extract_metadata(bytes, display_name, declared_type.as_deref())
        .map(JsImageMetadata::from)
        .map_err(crate::to_js_error)
}
