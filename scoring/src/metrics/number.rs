//! Monetary and percentage literal parsing.
//!
//! Model output writes the same quantity many ways: `$1.5B`, `$1,500M`,
//! `1.5 billion`, `$1.5 bn`. Parsing is exact in decimal: the digits are read
//! as an integer mantissa and scaled by a power of ten, so `1.11 billion`
//! yields the same `f64` as the literal `1.11e9`.

use std::sync::LazyLock;

use regex::Regex;

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$").expect("static regex must compile")
});

const POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

/// Parses a monetary or plain numeric literal.
///
/// A leading `$` is stripped, comma thousands separators must be well
/// formed, and magnitude suffixes (`T`/`tn`/`trillion`, `B`/`bn`/`billion`,
/// `M`/`mm`/`million`, `K`/`thousand`) and a trailing `%` are applied.
/// Returns `None` for anything that is not a well-formed number.
///
/// # Examples
///
/// ```
/// use prompt_harness_scoring::metrics::parse_amount;
///
/// assert_eq!(parse_amount("$10 billion"), Some(1e10));
/// assert_eq!(parse_amount("1,500M"), Some(1.5e9));
/// assert_eq!(parse_amount("1.11 billion"), Some(1.11e9));
/// assert_eq!(parse_amount("95%"), Some(0.95));
/// assert_eq!(parse_amount("1,50M"), None);
/// ```
pub fn parse_amount(raw: &str) -> Option<f64> {
    let (digits, suffix) = split_amount(raw);
    if !DIGITS_RE.is_match(digits) {
        return None;
    }

    let scale = suffix_exponent(suffix)?;
    scaled(digits, scale)
}

/// Parses the two ends of a monetary range such as `$10 to $20 billion`.
///
/// A low bound without a magnitude suffix takes the high bound's suffix.
/// Both ends must parse and the low end must not exceed the high end.
///
/// # Examples
///
/// ```
/// use prompt_harness_scoring::metrics::parse_amount_range;
///
/// assert_eq!(parse_amount_range("$10", "$20 billion"), Some((1e10, 2e10)));
/// assert_eq!(parse_amount_range("$500M", "$2B"), Some((5e8, 2e9)));
/// assert_eq!(parse_amount_range("$9B", "$2B"), None);
/// assert_eq!(parse_amount_range("$1,50B", "$2B"), None);
/// ```
pub fn parse_amount_range(low: &str, high: &str) -> Option<(f64, f64)> {
    let high_value = parse_amount(high)?;
    let (low_digits, low_suffix) = split_amount(low);
    let low_value = if low_suffix.is_empty() {
        let (_, high_suffix) = split_amount(high);
        parse_amount(&format!("{low_digits} {high_suffix}"))?
    } else {
        parse_amount(low)?
    };
    (low_value <= high_value).then_some((low_value, high_value))
}

/// Splits a literal into its digit run and trimmed suffix, dropping `$`.
fn split_amount(raw: &str) -> (&str, &str) {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim_start();

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split);
    (digits, suffix.trim())
}

/// Parses a percentage literal (`9.5%`, `12 %`) into a fraction.
///
/// The `%` sign is required; bare numbers are rejected so that a stray
/// year or count is never read as a rate.
///
/// # Examples
///
/// ```
/// use prompt_harness_scoring::metrics::parse_percent;
///
/// assert_eq!(parse_percent("9.5%"), Some(0.095));
/// assert_eq!(parse_percent("2030"), None);
/// ```
pub fn parse_percent(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix('%')?.trim_end();
    if !DIGITS_RE.is_match(digits) {
        return None;
    }
    scaled(digits, -2)
}

fn suffix_exponent(suffix: &str) -> Option<i32> {
    let exponent = match suffix.to_ascii_lowercase().as_str() {
        "" => 0,
        "%" => -2,
        "t" | "tn" | "trillion" => 12,
        "b" | "bn" | "billion" => 9,
        "m" | "mm" | "million" => 6,
        "k" | "thousand" => 3,
        _ => return None,
    };
    Some(exponent)
}

fn scaled(digits: &str, exponent: i32) -> Option<f64> {
    let plain: String = digits.chars().filter(|c| *c != ',').collect();
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), ""));
    let mantissa: f64 = format!("{int_part}{frac_part}").parse().ok()?;
    let exponent = exponent - i32::try_from(frac_part.len()).ok()?;

    let value = if exponent >= 0 {
        mantissa * pow10(exponent)
    } else {
        mantissa / pow10(-exponent)
    };
    value.is_finite().then_some(value)
}

fn pow10(exponent: i32) -> f64 {
    usize::try_from(exponent)
        .ok()
        .and_then(|idx| POW10.get(idx).copied())
        .unwrap_or_else(|| 10f64.powi(exponent))
}
