//! Encode options.
//!
//! Quality control is a tagged choice between a fixed quality and a
//! size-targeting search, so the two modes can never be mixed in one call.

use serde::{Deserialize, Serialize};

use super::EncodeError;
use crate::decode::FilterType;

/// Quality used when the caller picks none (the UI slider's default).
pub const DEFAULT_QUALITY: f32 = 0.90;
/// First quality tried by the size-targeting search.
pub const DEFAULT_INITIAL_QUALITY: f32 = 0.90;
/// Quality decrement between search attempts.
pub const DEFAULT_QUALITY_STEP: f32 = 0.10;
/// The search stops once the next quality would drop below this.
pub const DEFAULT_QUALITY_FLOOR: f32 = 0.05;
/// Quality of the last-resort encode after the search is exhausted.
pub const DEFAULT_FALLBACK_QUALITY: f32 = 0.10;
/// Upper bound on search iterations.
pub const MAX_ATTEMPTS: u32 = 10;
/// Largest `maxAttempts` a caller may request.
pub const MAX_ATTEMPTS_LIMIT: u32 = 100;
/// Smallest step that still changes a quality rounded to three decimals.
pub const MIN_QUALITY_STEP: f32 = 0.001;

/// How the encoder picks its quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum QualityPolicy {
    /// Encode once at exactly this quality.
    Fixed {
        #[serde(default = "default_quality")]
        quality: f32,
    },
    /// Lower the quality linearly until the payload fits the budget.
    SizeTargeted(SizeTarget),
}

impl Default for QualityPolicy {
    fn default() -> Self {
        QualityPolicy::Fixed {
            quality: DEFAULT_QUALITY,
        }
    }
}

/// Parameters of the size-targeting search.
///
/// The search only ever descends: `initial_quality`, then
/// `initial_quality - step`, and so on. It does not look for the highest
/// quality under budget, only the first one reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeTarget {
    /// Largest acceptable payload, inclusive.
    pub target_max_bytes: u64,
    #[serde(default = "default_initial_quality")]
    pub initial_quality: f32,
    #[serde(default = "default_step")]
    pub step: f32,
    #[serde(default = "default_floor")]
    pub floor: f32,
    #[serde(default = "default_fallback_quality")]
    pub fallback_quality: f32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl SizeTarget {
    /// Search with the default schedule (0.90 down by 0.10, floor 0.05).
    pub fn new(target_max_bytes: u64) -> Self {
        Self {
            target_max_bytes,
            initial_quality: DEFAULT_INITIAL_QUALITY,
            step: DEFAULT_QUALITY_STEP,
            floor: DEFAULT_QUALITY_FLOOR,
            fallback_quality: DEFAULT_FALLBACK_QUALITY,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Budget expressed in KiB, as the UI collects it.
    pub fn from_kib(kib: u64) -> Self {
        Self::new(kib.saturating_mul(1024))
    }

    pub fn with_initial_quality(mut self, quality: f32) -> Self {
        self.initial_quality = quality;
        self
    }

    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    pub fn with_floor(mut self, floor: f32) -> Self {
        self.floor = floor;
        self
    }

    pub fn with_fallback_quality(mut self, quality: f32) -> Self {
        self.fallback_quality = quality;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    fn validate(&self) -> Result<(), EncodeError> {
        if self.target_max_bytes == 0 {
            return Err(EncodeError::InvalidOption(
                "targetMaxBytes must be positive".to_string(),
            ));
        }
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(EncodeError::InvalidOption(format!(
                "maxAttempts must be between 1 and {MAX_ATTEMPTS_LIMIT}, got {}",
                self.max_attempts
            )));
        }
        check_unit("initialQuality", self.initial_quality)?;
        check_unit("step", self.step)?;
        if self.step < MIN_QUALITY_STEP {
            return Err(EncodeError::InvalidOption(format!(
                "step must be at least {MIN_QUALITY_STEP}, got {}",
                self.step
            )));
        }
        check_unit("floor", self.floor)?;
        check_unit("fallbackQuality", self.fallback_quality)
    }
}

/// Configuration for one encode call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncodeOptions {
    pub policy: QualityPolicy,
    /// Cap on the output width; never upscales.
    pub target_width: Option<u32>,
    /// Resampling filter used when `target_width` applies.
    pub filter: FilterType,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            policy: QualityPolicy::default(),
            target_width: None,
            filter: FilterType::Bilinear,
        }
    }
}

impl EncodeOptions {
    /// Single encode at `quality`.
    pub fn fixed(quality: f32) -> Self {
        Self {
            policy: QualityPolicy::Fixed { quality },
            ..Self::default()
        }
    }

    /// Default search schedule against `target_max_bytes`.
    pub fn size_targeted(target_max_bytes: u64) -> Self {
        Self::with_target(SizeTarget::new(target_max_bytes))
    }

    /// Search with a custom schedule.
    pub fn with_target(target: SizeTarget) -> Self {
        Self {
            policy: QualityPolicy::SizeTargeted(target),
            ..Self::default()
        }
    }

    pub fn with_target_width(mut self, width: u32) -> Self {
        self.target_width = Some(width);
        self
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Reject out-of-range values instead of clamping them.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::InvalidOption` naming the offending field.
    pub fn validate(&self) -> Result<(), EncodeError> {
        if self.target_width == Some(0) {
            return Err(EncodeError::InvalidOption(
                "targetWidth must be positive".to_string(),
            ));
        }
        match &self.policy {
            QualityPolicy::Fixed { quality } => check_unit("quality", *quality),
            QualityPolicy::SizeTargeted(target) => target.validate(),
        }
    }
}

/// Accept only values in (0, 1]; NaN fails both comparisons.
fn check_unit(name: &str, value: f32) -> Result<(), EncodeError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(EncodeError::InvalidOption(format!(
            "{name} must be in (0, 1], got {value}"
        )))
    }
}

fn default_quality() -> f32 {
    DEFAULT_QUALITY
}

fn default_initial_quality() -> f32 {
    DEFAULT_INITIAL_QUALITY
}

fn default_step() -> f32 {
    DEFAULT_QUALITY_STEP
}

fn default_floor() -> f32 {
    DEFAULT_QUALITY_FLOOR
}

fn default_fallback_quality() -> f32 {
    DEFAULT_FALLBACK_QUALITY
}

fn default_max_attempts() -> u32 {
    MAX_ATTEMPTS
}
