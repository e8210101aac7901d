//! File naming bindings.
//!
//! The AI call itself happens in JavaScript; these helpers build the preview
//! it needs and turn its answer (or the original file name) into a download
//! name.

use crate::types::JsImageMetadata;
use wasm_bindgen::prelude::*;
use zoeconvert_core::naming::{self, NamingPreview};

/// Lowercase, hyphenated base name, or `undefined` when nothing usable is left.
#[wasm_bindgen]
pub fn sanitize_base_name(raw: &str) -> Option<String> {
    naming::sanitize_base_name(raw)
}

/// Download name derived from the original file name, e.g.
/// `"IMG_0042.jpg"` with prefix `"Shop"` gives `"shop-img-0042.webp"`.
#[wasm_bindgen]
pub fn fallback_file_name(original_file_name: &str, prefix: &str) -> String {
    naming::compose_file_name(prefix, &naming::fallback_base_name(original_file_name))
}

/// `<prefix>-<base>.webp`, or `<base>.webp` when the prefix is blank.
#[wasm_bindgen]
pub fn compose_file_name(prefix: &str, base_name: &str) -> String {
    naming::compose_file_name(prefix, base_name)
}

/// JPEG preview (longest edge 512 px) to send to the naming service.
///
/// # Errors
///
/// Returns an error if the source no longer decodes.
#[wasm_bindgen]
pub fn naming_preview(metadata: &JsImageMetadata) -> Result<Vec<u8>, JsValue> {
    NamingPreview::from_metadata(metadata.inner())
        .map(|preview| preview.jpeg)
        .map_err(crate::to_js_error)
}
