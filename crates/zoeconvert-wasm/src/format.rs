//! Size formatting bindings for the results panel.

use wasm_bindgen::prelude::*;
use zoeconvert_core::format;

/// Format a byte count, e.g. `format_bytes(1536)` gives `"1.5 KB"`.
///
/// `decimals` defaults to 2. Negative or non-finite counts format as zero.
#[wasm_bindgen]
pub fn format_bytes(bytes: f64, decimals: Option<u32>) -> String {
    format::format_bytes(to_byte_count(bytes), decimals.unwrap_or(2) as usize)
}

/// Percentage saved by a conversion; negative when the output grew.
#[wasm_bindgen]
pub fn size_reduction_percent(original_bytes: f64, converted_bytes: f64) -> i32 {
    let percent = format::size_reduction_percent(
        to_byte_count(original_bytes),
        to_byte_count(converted_bytes),
    );
    percent.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// JS numbers arrive as f64; `as` saturates and maps NaN to zero.
fn to_byte_count(value: f64) -> u64 {
    value as u64
}
