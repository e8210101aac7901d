//! Zoe Convert WASM - WebAssembly bindings for Zoe Convert
//!
//! This crate provides WASM bindings to expose the zoeconvert-core
//! functionality to JavaScript/TypeScript applications, typically from a
//! Web Worker.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for metadata and encode results
//! - `decode` - Upload inspection (`extract_metadata`)
//! - `encode` - WebP encoding at a fixed quality or against a byte budget
//! - `naming` - Naming preview and download-name helpers
//! - `format` - Human-readable byte sizes
//! - `logging` - Console logger for core log records
//!
//! # Usage
//!
//! ```typescript
//! import init, { extract_metadata, encode_webp_with_quality, format_bytes } from '@zoeconvert/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const meta = extract_metadata(bytes, file.name, file.type);
//! const result = encode_webp_with_quality(meta, 0.9, 1920, 1);
//! console.log(`Converted to ${format_bytes(result.sizeBytes)}`);
//! ```

use std::fmt::Display;

use wasm_bindgen::prelude::*;

mod decode;
mod encode;
mod format;
mod logging;
mod naming;
mod types;

// Re-export public types
pub use decode::extract_metadata;
pub use encode::{encode_webp, encode_webp_to_budget, encode_webp_with_quality};
pub use format::{format_bytes, size_reduction_percent};
pub use logging::set_log_level;
pub use naming::{compose_file_name, fallback_file_name, naming_preview, sanitize_base_name};
pub use types::{JsEncodeResult, JsImageMetadata};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logging::install(log::LevelFilter::Info);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Every error crosses into JavaScript as an `Error` carrying its message.
pub(crate) fn to_js_error(e: impl Display) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_errors_are_js_errors() {
        let err = to_js_error("Image file is empty");
        let err: js_sys::Error = err.dyn_into().unwrap();
        assert_eq!(String::from(err.message()), "Image file is empty");
    }
}
