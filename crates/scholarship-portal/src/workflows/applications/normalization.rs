//! Numeric helpers turning form answers into figures reviewers can compare.
//!
//! Neither helper fails: unparseable input maps to a fixed default so a malformed answer never
//! blocks intake.

/// Returned when an income range cannot be read.
pub const DEFAULT_INCOME: u32 = 0;
/// Returned for non-numeric averages; the failing mark on the five-point scale.
pub const DEFAULT_GRADE: f32 = 5.0;

/// `below X` is represented at half of its bound.
const BELOW_RANGE_FACTOR: f64 = 0.5;
/// `above X` is represented a quarter past its bound.
const ABOVE_RANGE_FACTOR: f64 = 1.25;

/// Minimum percentage for each five-point grade, best grade first.
const GRADE_THRESHOLDS: &[(f32, f32)] = &[
    (97.0, 1.00),
    (94.0, 1.25),
    (91.0, 1.50),
    (88.0, 1.75),
    (85.0, 2.00),
    (82.0, 2.25),
    (79.0, 2.50),
    (76.0, 2.75),
    (75.0, 3.00),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum IncomeRange {
    Below(f64),
    Between(f64, f64),
    Above(f64),
    Exact(f64),
}

impl IncomeRange {
    fn representative(self) -> f64 {
        match self {
            IncomeRange::Below(bound) => bound * BELOW_RANGE_FACTOR,
            IncomeRange::Between(low, high) => (low + high) / 2.0,
            IncomeRange::Above(bound) => bound * ABOVE_RANGE_FACTOR,
            IncomeRange::Exact(value) => value,
        }
    }
}

/// Representative monthly income for a range string such as `"10,001 - 20,000"`.
pub fn income_from_range(raw: &str) -> u32 {
    match parse_income_range(raw) {
        Some(range) => {
            let value = range.representative().round();
            if value.is_finite() && value >= 0.0 {
                value.min(u32::MAX as f64) as u32
            } else {
                DEFAULT_INCOME
            }
        }
        None => DEFAULT_INCOME,
    }
}

fn parse_income_range(raw: &str) -> Option<IncomeRange> {
    let cleaned = raw
        .trim()
        .to_ascii_lowercase()
        .replace(['₱', ','], "")
        .replace("php", "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    for prefix in ["below", "under", "less than", "<"] {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            return parse_amount(rest).map(IncomeRange::Below);
        }
    }

    for prefix in ["above", "over", "more than", ">"] {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            return parse_amount(rest).map(IncomeRange::Above);
        }
    }

    for suffix in ["and above", "or more", "+"] {
        if let Some(rest) = cleaned.strip_suffix(suffix) {
            return parse_amount(rest).map(IncomeRange::Above);
        }
    }

    for separator in [" to ", "-", "_", "–"] {
        if let Some((low, high)) = cleaned.split_once(separator) {
            let (low, high) = (parse_amount(low)?, parse_amount(high)?);
            return Some(if low <= high {
                IncomeRange::Between(low, high)
            } else {
                IncomeRange::Between(high, low)
            });
        }
    }

    parse_amount(cleaned).map(IncomeRange::Exact)
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

/// Five-point grade (1.00 best, 5.00 failing) for a percentage average.
pub fn grade_from_percentage(percentage: f32) -> f32 {
    if !percentage.is_finite() {
        return DEFAULT_GRADE;
    }

    GRADE_THRESHOLDS
        .iter()
        .find(|(minimum, _)| percentage >= *minimum)
        .map(|(_, grade)| *grade)
        .unwrap_or(DEFAULT_GRADE)
}

/// Same as [`grade_from_percentage`] for raw form input like `"89.5%"`.
pub fn grade_from_percentage_str(raw: &str) -> f32 {
    parse_percentage(raw)
        .map(grade_from_percentage)
        .unwrap_or(DEFAULT_GRADE)
}

pub(crate) fn parse_percentage(raw: &str) -> Option<f32> {
    raw.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite() && (0.0..=100.0).contains(value))
}
