//! Image decoding for Zoe Convert.
//!
//! This module provides functionality for:
//! - Sniffing and decoding JPEG, PNG and WebP sources
//! - Extracting upload metadata (dimensions, byte size, content type)
//! - Resizing decoded surfaces for width-capped output and previews
//!
//! # Architecture
//!
//! Decoding is designed to run inside a Web Worker via the WASM bindings.
//! All operations are synchronous and single-threaded; every pixel buffer is
//! owned by the call that created it.
//!
//! # Examples
//!
//! ```ignore
//! use zoeconvert_core::decode::extract_metadata;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let meta = extract_metadata(bytes, "photo.jpg", Some("image/jpeg")).unwrap();
//! println!("{}x{}, {} bytes", meta.width, meta.height, meta.size_bytes);
//! ```

mod resize;
mod source;
mod types;

pub use resize::{generate_thumbnail, resize, resize_to_fit, resize_to_width, scaled_height};
pub use source::{decode_source, extract_metadata, get_orientation, inspect_source, sniff_format};
pub use types::{
    DecodeError, DecodedImage, FilterType, ImageMetadata, Orientation, PixelLayout, ResizeError,
    SourceFormat,
};
