//! Quality selection: a single fixed-quality encode, or a bounded linear
//! descent towards a byte budget.
//!
//! The codec is passed in as a closure so the schedule can be exercised
//! without real images.

use serde::Serialize;

use super::{EncodeError, QualityPolicy, SizeTarget};

/// Qualities closer than this are the same setting.
const QUALITY_EPSILON: f32 = 1e-4;

/// One encode performed while choosing a quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeAttempt {
    pub quality: f32,
    pub size_bytes: u64,
}

/// The accepted payload plus the trail that led to it.
#[derive(Debug)]
pub(crate) struct Selected {
    pub payload: Vec<u8>,
    pub quality: f32,
    pub attempts: Vec<EncodeAttempt>,
}

/// Run `policy` against `encode`, which maps a quality to a payload.
pub(crate) fn select_quality<F>(policy: &QualityPolicy, encode: F) -> Result<Selected, EncodeError>
where
    F: FnMut(f32) -> Result<Vec<u8>, EncodeError>,
{
    match policy {
        QualityPolicy::Fixed { quality } => encode_fixed(*quality, encode),
        QualityPolicy::SizeTargeted(target) => search_size_target(target, encode),
    }
}

fn encode_fixed<F>(quality: f32, mut encode: F) -> Result<Selected, EncodeError>
where
    F: FnMut(f32) -> Result<Vec<u8>, EncodeError>,
{
    let payload = encode(quality)?;
    let attempt = EncodeAttempt {
        quality,
        size_bytes: payload.len() as u64,
    };
    log::debug!("fixed quality {:.2}: {} bytes", quality, attempt.size_bytes);

    Ok(Selected {
        payload,
        quality,
        attempts: vec![attempt],
    })
}

fn search_size_target<F>(target: &SizeTarget, mut encode: F) -> Result<Selected, EncodeError>
where
    F: FnMut(f32) -> Result<Vec<u8>, EncodeError>,
{
    let budget = target.target_max_bytes;
    let mut attempts: Vec<EncodeAttempt> = Vec::new();

    for i in 0..target.max_attempts {
        let quality = round_quality(target.initial_quality - target.step * i as f32);
        if i > 0 && quality < target.floor - QUALITY_EPSILON {
            log::debug!("next quality {:.2} is below floor {:.2}", quality, target.floor);
            break;
        }
        if let Some(previous) = attempts.last() {
            if quality > previous.quality - QUALITY_EPSILON {
                log::debug!("step {} no longer lowers quality {:.3}", target.step, quality);
                break;
            }
        }

        let payload = encode(quality)?;
        let size_bytes = payload.len() as u64;
        attempts.push(EncodeAttempt {
            quality,
            size_bytes,
        });
        log::debug!(
            "attempt {}: quality {:.2} -> {} bytes (budget {})",
            i + 1,
            quality,
            size_bytes,
            budget
        );

        if size_bytes <= budget {
            return Ok(Selected {
                payload,
                quality,
                attempts,
            });
        }
    }

    // The codec is deterministic, so a quality already tried cannot succeed now.
    let fallback = target.fallback_quality;
    let achieved_bytes = match attempts
        .iter()
        .find(|a| (a.quality - fallback).abs() < QUALITY_EPSILON)
    {
        Some(previous) => previous.size_bytes,
        None => {
            let payload = encode(fallback)?;
            let size_bytes = payload.len() as u64;
            attempts.push(EncodeAttempt {
                quality: fallback,
                size_bytes,
            });
            if size_bytes <= budget {
                return Ok(Selected {
                    payload,
                    quality: fallback,
                    attempts,
                });
            }
            size_bytes
        }
    };

    log::debug!(
        "budget {} unreachable after {} attempts, best {} bytes",
        budget,
        attempts.len(),
        achieved_bytes
    );
    Err(EncodeError::SizeBudgetExceeded {
        achieved_bytes,
        target_bytes: budget,
    })
}

/// Snap to three decimals so repeated subtraction does not drift.
fn round_quality(quality: f32) -> f32 {
    (quality * 1000.0).round() / 1000.0
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A budget reachable at the floor is always met within the attempt bound.
        #[test]
        fn prop_reachable_budget_is_met(scale in 100u32..=100_000, slack in 0u32..=50) {
            let floor_size = (0.1 * scale as f32).round() as u64;
            let budget = floor_size + slack as u64;
            let policy = QualityPolicy::SizeTargeted(SizeTarget::new(budget));

            let selected = select_quality(&policy, |q| {
                Ok(vec![0u8; (q * scale as f32).round() as usize])
            }).unwrap();

            prop_assert!(selected.payload.len() as u64 <= budget);
            prop_assert!(selected.attempts.len() as u32 <= MAX_ATTEMPTS_WITH_FALLBACK);
        }

        /// A budget below what the floor achieves always fails, never returns oversized output.
        #[test]
        fn prop_unreachable_budget_fails(base in 1000u32..=50_000, budget in 1u64..=999) {
            let policy = QualityPolicy::SizeTargeted(SizeTarget::new(budget));
            let result = select_quality(&policy, |q| {
                Ok(vec![0u8; base as usize + (q * 100.0) as usize])
            });

            let is_budget_error = matches!(
                result,
                Err(EncodeError::SizeBudgetExceeded { target_bytes, .. }) if target_bytes == budget
            );
            prop_assert!(is_budget_error);
        }
    }

    const MAX_ATTEMPTS_WITH_FALLBACK: u32 = crate::encode::MAX_ATTEMPTS + 1;
}
