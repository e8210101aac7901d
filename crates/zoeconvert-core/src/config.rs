//! Conversion settings chosen in the UI for a whole batch.

use serde::{Deserialize, Serialize};

use crate::encode::{EncodeError, EncodeOptions};
use crate::naming::NamingOptions;

/// Width cap applied unless the user picks another.
pub const DEFAULT_TARGET_WIDTH: u32 = 1920;

/// Encode and naming choices shared by every item in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionSettings {
    pub encode: EncodeOptions,
    pub naming: NamingOptions,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            encode: EncodeOptions::default().with_target_width(DEFAULT_TARGET_WIDTH),
            naming: NamingOptions::default(),
        }
    }
}

impl ConversionSettings {
    pub fn validate(&self) -> Result<(), EncodeError> {
        self.encode.validate()
    }
}
