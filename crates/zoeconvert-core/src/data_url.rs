//! `data:` URL helpers.
//!
//! The browser UI previews originals and converted images through data URLs
//! and turns them back into blobs for download.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Errors from parsing a data URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("Invalid data URL")]
    Malformed,

    #[error("Cannot parse MIME type from data URL")]
    MissingMimeType,

    #[error("Invalid base64 payload: {0}")]
    Base64(String),
}

/// A decoded data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Render `bytes` as `data:<mime>;base64,<payload>`.
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Split a data URL into its MIME type and decoded bytes.
///
/// The MIME type is the text between the first `:` and the following `;`.
/// Payloads without a `;base64` marker are taken verbatim.
pub fn parse_data_url(input: &str) -> Result<DataUrl, DataUrlError> {
    let (header, payload) = input.trim().split_once(',').ok_or(DataUrlError::Malformed)?;

    let mime_type = header
        .split_once(':')
        .and_then(|(_, rest)| rest.split_once(';'))
        .map(|(mime, _)| mime.trim())
        .filter(|mime| !mime.is_empty())
        .ok_or(DataUrlError::MissingMimeType)?;

    let bytes = if header.ends_with(";base64") {
        STANDARD
            .decode(payload)
            .map_err(|e| DataUrlError::Base64(e.to_string()))?
    } else {
        payload.as_bytes().to_vec()
    };

    Ok(DataUrl {
        mime_type: mime_type.to_string(),
        bytes,
    })
}
