use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses a day field into a calendar date, discarding any time of day.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|datetime| datetime.date_naive())
}

/// Parses a money-like cell. Tolerates a leading `$` and thousands separators.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let cleaned: String = unsigned.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a non-negative integer count. Integral decimals like `15.0` are accepted.
pub fn parse_count(raw: &str) -> Option<u64> {
    let value = raw.trim();
    if let Ok(count) = value.parse::<u64>() {
        return Some(count);
    }

    let decimal = parse_decimal(value)?;
    if decimal < 0.0 || decimal.fract() != 0.0 || decimal > u64::MAX as f64 {
        return None;
    }
    Some(decimal as u64)
}

/// `numerator / denominator`, or 0.0 when the denominator is zero or the
/// quotient is not finite.
pub fn ratio_or_zero(numerator: f64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }

    let quotient = numerator / denominator as f64;
    if quotient.is_finite() {
        quotient
    } else {
        0.0
    }
}

/// Sums values in ascending `total_cmp` order so the result does not depend
/// on the order the values arrived in.
pub fn canonical_sum(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    values.iter().sum()
}
