use thiserror::Error;

use crate::decode::{DecodeError, ResizeError};

/// Errors that can occur while producing an encoded payload.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The source could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Target dimensions were degenerate.
    #[error(transparent)]
    Resize(#[from] ResizeError),

    /// Malformed encode options (quality out of range, zero width, ...).
    #[error("Invalid encode option: {0}")]
    InvalidOption(String),

    /// The size-targeting search could not get under the byte budget.
    #[error("Could not reach {target_bytes} bytes: smallest output was {achieved_bytes} bytes")]
    SizeBudgetExceeded {
        achieved_bytes: u64,
        target_bytes: u64,
    },

    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero or beyond what the codec accepts
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec itself failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_message_carries_both_sizes() {
        let err = EncodeError::SizeBudgetExceeded {
            achieved_bytes: 61_440,
            target_bytes: 51_200,
        };
        assert_eq!(
            err.to_string(),
            "Could not reach 51200 bytes: smallest output was 61440 bytes"
        );
    }

    #[test]
    fn test_decode_error_is_transparent() {
        let err = EncodeError::from(DecodeError::EmptyInput);
        assert_eq!(err.to_string(), "Image file is empty");
    }
}
