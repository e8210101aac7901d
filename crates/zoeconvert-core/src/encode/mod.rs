//! Image encoding pipeline for Zoe Convert.
//!
//! This module provides functionality for:
//! - Re-encoding uploads to lossy WebP at a fixed quality
//! - Searching downwards for a quality that fits a byte budget
//! - Encoding small JPEG previews for the naming service
//!
//! # Architecture
//!
//! The encoding pipeline is designed to be used from Web Workers via WASM bindings.
//! All operations are synchronous and single-threaded within WASM.
//!
//! # Examples
//!
//! ```ignore
//! use zoeconvert_core::encode::{encode_webp, EncodeOptions};
//!
//! let result = encode_webp(&metadata, &EncodeOptions::fixed(0.8).with_target_width(1920))?;
//! println!("Encoded {} bytes at {}x{}", result.size_bytes, result.width, result.height);
//! ```

mod codec;
mod engine;
mod error;
mod jpeg;
mod options;
mod search;

pub use codec::{encode_webp_pixels, MAX_WEBP_DIMENSION};
pub use engine::{encode_decoded, encode_webp, EncodeResult, WEBP_MIME_TYPE};
pub use error::EncodeError;
pub use jpeg::{encode_jpeg, encode_jpeg_image};
pub use options::{
    EncodeOptions, QualityPolicy, SizeTarget, DEFAULT_FALLBACK_QUALITY, DEFAULT_INITIAL_QUALITY,
    DEFAULT_QUALITY, DEFAULT_QUALITY_FLOOR, DEFAULT_QUALITY_STEP, MAX_ATTEMPTS, MAX_ATTEMPTS_LIMIT,
    MIN_QUALITY_STEP,
};
pub use search::EncodeAttempt;
