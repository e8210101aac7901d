//! Zoe Convert Core - WebP re-encoding engine
//!
//! This crate provides the core functionality for Zoe Convert: decoding
//! uploads, re-encoding them as WebP at a fixed quality or against a byte
//! budget, naming the output, and driving whole batches against quota.

pub mod batch;
pub mod config;
pub mod data_url;
pub mod decode;
pub mod encode;
pub mod format;
pub mod naming;
pub mod quota;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::{BatchConverter, BatchError, BatchItem, BatchReport, CancelToken, ItemStatus};
pub use config::ConversionSettings;
pub use decode::{extract_metadata, DecodeError, ImageMetadata};
pub use encode::{encode_webp, EncodeError, EncodeOptions, EncodeResult, QualityPolicy, SizeTarget};
pub use format::{format_bytes, size_reduction_percent};
pub use naming::{Language, NamingService};
pub use quota::{InMemoryQuota, Plan, QuotaService};
pub use session::SessionContext;
