//! Human-readable sizes for the conversion summary.

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
const BASE: u64 = 1024;

/// Format a byte count with base-1024 units.
///
/// Picks the largest unit whose scaled value is at least 1 (capped at TB),
/// rounds to `decimals` fractional digits and trims trailing zeros, so
/// `1536` with two decimals is `"1.5 KB"`. Zero is always `"0 Bytes"`.
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    let mut threshold = BASE;
    while exponent < UNITS.len() - 1 && bytes >= threshold {
        exponent += 1;
        threshold = threshold.saturating_mul(BASE);
    }

    let scaled = bytes as f64 / (BASE as f64).powi(exponent as i32);
    let rendered = format!("{:.*}", decimals, scaled);
    format!("{} {}", trim_fraction(&rendered), UNITS[exponent])
}

fn trim_fraction(rendered: &str) -> &str {
    if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.')
    } else {
        rendered
    }
}

/// Percentage saved by the conversion, rounded half up.
///
/// Negative when the output grew; zero when the original size is unknown.
pub fn size_reduction_percent(original_bytes: u64, converted_bytes: u64) -> i64 {
    if original_bytes == 0 {
        return 0;
    }
    let ratio = converted_bytes as f64 / original_bytes as f64;
    ((1.0 - ratio) * 100.0 + 0.5).floor() as i64
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every non-zero count renders as "<number> <unit>" with a known unit.
        #[test]
        fn prop_shape_is_number_and_unit(bytes in 1u64..=u64::MAX, decimals in 0usize..=4) {
            let rendered = format_bytes(bytes, decimals);
            let (number, unit) = rendered.split_once(' ').unwrap();

            prop_assert!(UNITS.contains(&unit));
            prop_assert!(number.parse::<f64>().unwrap() > 0.0);
            prop_assert!(!number.ends_with('.'));
        }
    }
}
