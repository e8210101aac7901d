//! Output file naming.
//!
//! This module provides functionality for:
//! - Building the small JPEG preview sent to a naming service
//! - The `NamingService` contract for AI filename suggestions
//! - Sanitising suggestions and original file names into safe base names
//! - Composing the final `<prefix>-<base>.webp` download name
//!
//! # Examples
//!
//! ```ignore
//! use zoeconvert_core::naming::{compose_file_name, sanitize_base_name};
//!
//! let base = sanitize_base_name("Planta en Maceta Blanca").unwrap();
//! assert_eq!(compose_file_name("Mi Tienda", &base), "mi-tienda-planta-en-maceta-blanca.webp");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{decode_source, generate_thumbnail, DecodedImage, ImageMetadata};
use crate::encode::{encode_jpeg_image, EncodeError};

/// Longest edge of the naming preview, in pixels.
pub const PREVIEW_MAX_EDGE: u32 = 512;

/// JPEG quality of the naming preview.
pub const PREVIEW_JPEG_QUALITY: u8 = 80;

/// Base name used when nothing usable survives sanitising.
pub const DEFAULT_BASE_NAME: &str = "image";

/// Extension of every converted file.
pub const OUTPUT_EXTENSION: &str = "webp";

static IMAGE_EXTENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.(webp|jpe?g|png|gif|avif|bmp|tiff?)$").expect("extension regex should compile")
});
static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_.]+").expect("separator regex should compile"));
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9-]").expect("character class regex should compile"));
static HYPHEN_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-{2,}").expect("hyphen regex should compile"));

/// Language of the suggested name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Spanish,
    English,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Spanish => "spanish",
            Language::English => "english",
        }
    }
}

/// Per-batch naming choices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NamingOptions {
    /// Ask the naming service for a descriptive name.
    pub use_ai: bool,
    pub language: Language,
    /// Prepended to every base name, e.g. a shop or project name.
    pub prefix: String,
}

/// Errors reported by a naming service.
#[derive(Debug, Error)]
pub enum NamingError {
    #[error("Naming service unavailable: {0}")]
    Unavailable(String),

    #[error("Naming service timed out")]
    Timeout,

    #[error("Naming service returned an empty name")]
    EmptySuggestion,

    #[error("Failed to build naming preview: {0}")]
    Preview(#[from] EncodeError),
}

/// Small JPEG rendition of an upload, sent to the naming service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPreview {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl NamingPreview {
    /// Decode the upload and shrink it to the preview size.
    pub fn from_metadata(metadata: &ImageMetadata) -> Result<Self, EncodeError> {
        let surface = decode_source(&metadata.source)?;
        Self::from_image(&surface)
    }

    pub fn from_image(image: &DecodedImage) -> Result<Self, EncodeError> {
        let thumbnail = generate_thumbnail(image, PREVIEW_MAX_EDGE)?;
        let (width, height) = (thumbnail.width, thumbnail.height);
        let jpeg = encode_jpeg_image(thumbnail, PREVIEW_JPEG_QUALITY)?;
        Ok(Self {
            jpeg,
            width,
            height,
        })
    }

    /// `data:image/jpeg;base64,...`, the form most vision APIs accept.
    pub fn to_data_url(&self) -> String {
        crate::data_url::to_data_url("image/jpeg", &self.jpeg)
    }
}

/// Suggests a descriptive, hyphenated base name for an image.
///
/// Implementations may fail or time out; callers fall back to the original
/// file name.
#[allow(async_fn_in_trait)]
pub trait NamingService {
    async fn suggest_name(
        &self,
        preview: &NamingPreview,
        language: Language,
    ) -> Result<String, NamingError>;
}

/// Base name chosen for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenName {
    pub base_name: String,
    /// True when the name came from the naming service.
    pub ai_named: bool,
}

/// Ask `service` for a name, falling back to the sanitised original name.
pub async fn choose_name<S: NamingService>(
    service: &S,
    preview: &NamingPreview,
    language: Language,
    original_file_name: &str,
) -> ChosenName {
    let suggestion = service
        .suggest_name(preview, language)
        .await
        .and_then(|raw| sanitize_base_name(&raw).ok_or(NamingError::EmptySuggestion));

    match suggestion {
        Ok(base_name) => ChosenName {
            base_name,
            ai_named: true,
        },
        Err(e) => {
            log::warn!("naming failed for {original_file_name}: {e}; using file name");
            ChosenName {
                base_name: fallback_base_name(original_file_name),
                ai_named: false,
            }
        }
    }
}

/// Normalise free text into a lowercase, hyphenated base name.
///
/// Returns `None` when nothing in `[a-z0-9]` survives.
pub fn sanitize_base_name(raw: &str) -> Option<String> {
    let lowered: String = raw.trim().to_lowercase().chars().map(fold_accent).collect();
    let stem = IMAGE_EXTENSION.replace(&lowered, "");
    let hyphenated = SEPARATORS.replace_all(&stem, "-");
    let cleaned = DISALLOWED.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUNS.replace_all(&cleaned, "-");
    let name = collapsed.trim_matches('-');

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Base name derived from the uploaded file's name.
pub fn fallback_base_name(original_file_name: &str) -> String {
    let stem = match original_file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.trim().is_empty() => stem,
        _ => original_file_name,
    };
    sanitize_base_name(stem).unwrap_or_else(|| DEFAULT_BASE_NAME.to_string())
}

/// `<prefix>-<base>.webp`, or `<base>.webp` when the prefix is blank.
pub fn compose_file_name(prefix: &str, base_name: &str) -> String {
    let base = sanitize_base_name(base_name).unwrap_or_else(|| DEFAULT_BASE_NAME.to_string());
    match sanitize_base_name(prefix) {
        Some(prefix) => format!("{prefix}-{base}.{OUTPUT_EXTENSION}"),
        None => format!("{base}.{OUTPUT_EXTENSION}"),
    }
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}
