// Utility helpers for parsing and basic statistics.
//
// This module centralizes the locale-specific cell handling so the rest of
// the code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Parse a French-formatted decimal (`"3,5"`) into `f64`.
///
/// - Trims whitespace.
/// - Replaces the decimal comma with a period before parsing.
/// - Rejects empty input and anything that does not parse to a finite number
///   (`"NaN"` and `"inf"` are valid for `str::parse` but not here).
pub fn parse_decimal_comma(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.replace(',', ".").parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Render a float the way the source file writes it (`3.5` -> `"3,5"`).
///
/// `f64`'s `Display` is the shortest representation that parses back to the
/// same value, so this round-trips through [`parse_decimal_comma`].
pub fn format_decimal_comma(v: f64) -> String {
    v.to_string().replace('.', ",")
}

pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>().ok()
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i32>().ok()
}

/// Left-pad a purely numeric administrative code against a set of known keys.
///
/// Codes are trimmed and ASCII-uppercased first (`"2a"` -> `"2A"`). A code
/// that is already known is returned as is. A numeric code shorter than three
/// characters is tried at width 2, then width 3; if neither is known the
/// width-2 form wins.
pub fn pad_code(raw: &str, is_known: impl Fn(&str) -> bool) -> String {
    let code = raw.trim().to_ascii_uppercase();
    if is_known(&code) || code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return code;
    }
    if code.len() >= 3 {
        return code;
    }
    let two = format!("{code:0>2}");
    if is_known(&two) {
        return two;
    }
    let three = format!("{code:0>3}");
    if is_known(&three) {
        return three;
    }
    two
}

/// Arithmetic mean, `None` for no values.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Middle value (mean of the two middle values for an even count), `None`
/// for no values. Ordering is `f64::total_cmp`.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => None,
        n if n % 2 == 1 => Some(sorted[mid]),
        _ => Some((sorted[mid - 1] + sorted[mid]) / 2.0),
    }
}

/// Fixed decimals with English thousands separators:
/// `1234567.891` at 2 decimals reads `1,234,567.89`.
#[must_use]
pub fn format_number(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (whole, fraction) = fixed
        .split_once('.')
        .map_or((fixed.as_str(), None), |(w, f)| (w, Some(f)));
    let mut out = whole
        .parse::<u64>()
        .map_or_else(|_| whole.to_string(), |w| w.to_formatted_string(&Locale::en));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    // No sign on values that round to zero.
    if n.is_sign_negative() && out.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.insert(0, '-');
    }
    out
}

/// Row and record counts, `9855` -> `9,855`.
#[must_use]
pub fn format_count(n: usize) -> String {
    n.to_formatted_string(&Locale::en)
}
