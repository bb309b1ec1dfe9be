/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// Rounding is half away from zero on the magnitude. A tiny relative epsilon
/// is added before rounding so that decimal midpoints which are not exactly
/// representable in binary (such as `1.005`) still round up.
///
/// # Examples
///
/// ```
/// use expense_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let factor = 10_f64.powi(decimals as i32);
    let mut scaled = value.abs() * factor;
    // Above 2^53 every f64 is an integer and the nudge would shift digits.
    if scaled < 9_007_199_254_740_992.0 {
        scaled += f64::EPSILON * scaled;
    }
    let rounded = scaled.round();

    let (whole, fraction, is_zero) = if rounded < u128::MAX as f64 {
        let units = rounded as u128;
        let divisor = 10_u128.pow(decimals);
        (
            (units / divisor).to_string(),
            format!("{:0width$}", units % divisor, width = decimals as usize),
            units == 0,
        )
    } else {
        let digits = format!("{:.*}", decimals as usize, value.abs());
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
        (whole.to_string(), fraction.to_string(), false)
    };

    let grouped = group_thousands(&whole);
    let body = if decimals == 0 {
        grouped
    } else {
        format!("{}.{}", grouped, fraction)
    };

    // A value that rounds to zero never carries a sign.
    if value < 0.0 && !is_zero {
        format!("-{}", body)
    } else {
        body
    }
}

/// Format a monetary amount as a US-dollar string with two decimal places and
/// thousands separators. Negative amounts put the minus sign before the `$`.
///
/// # Examples
///
/// ```
/// use expense_core::formatting::format_currency;
///
/// assert_eq!(format_currency(1234.5), "$1,234.50");
/// assert_eq!(format_currency(0.0),    "$0.00");
/// assert_eq!(format_currency(-42.1),  "-$42.10");
/// ```
pub fn format_currency(amount: f64) -> String {
    let formatted = format_number(amount, 2);
    match formatted.strip_prefix('-') {
        Some(magnitude) => format!("-${}", magnitude),
        None => format!("${}", formatted),
    }
}

/// Render a percentage value with a trailing `%`, e.g. `"92.3%"`.
pub fn format_percentage(value: f64, decimals: u32) -> String {
    format!("{}%", format_number(value, decimals))
}

/// Like [`format_percentage`] but prefixes strictly positive values with `+`,
/// as used for month-over-month change.
pub fn format_signed_percentage(value: f64, decimals: u32) -> String {
    let formatted = format_percentage(value, decimals);
    if value > 0.0 && !formatted.starts_with('-') && formatted != format_percentage(0.0, decimals)
    {
        format!("+{}", formatted)
    } else {
        formatted
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_no_thousands() {
        assert_eq!(format_number(123.456, 2), "123.46");
    }

    #[test]
    fn test_format_number_millions() {
        assert_eq!(format_number(1_234_567.0, 0), "1,234,567");
    }

    #[test]
    fn test_format_number_rounds_half_up() {
        assert_eq!(format_number(1.005, 2), "1.01");
        assert_eq!(format_number(2.5, 0), "3");
    }

    #[test]
    fn test_format_number_carries_into_integer_part() {
        assert_eq!(format_number(999.999, 2), "1,000.00");
    }

    #[test]
    fn test_format_number_negative_rounding_to_zero_is_unsigned() {
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_number(-0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_non_finite() {
        assert_eq!(format_number(f64::NAN, 2), "NaN");
        assert_eq!(format_number(f64::INFINITY, 2), "inf");
    }

    // ── format_currency ──────────────────────────────────────────────────────

    #[test]
    fn test_format_currency_positive() {
        assert_eq!(format_currency(1_234.5), "$1,234.50");
        assert_eq!(format_currency(385.72), "$385.72");
    }

    #[test]
    fn test_format_currency_zero() {
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(-42.1), "-$42.10");
        assert_eq!(format_currency(-1_500.0), "-$1,500.00");
    }

    #[test]
    fn test_format_currency_tiny_negative_has_no_sign() {
        assert_eq!(format_currency(-0.004), "$0.00");
    }

    #[test]
    fn test_format_currency_large() {
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
    }

    #[test]
    fn test_format_currency_beyond_u64_range() {
        assert_eq!(format_currency(1e20), "$100,000,000,000,000,000,000.00");
        assert_eq!(format_currency(-1e20), "-$100,000,000,000,000,000,000.00");
    }

    #[test]
    fn test_format_currency_beyond_u128_range() {
        let formatted = format_currency(1e300);
        assert!(formatted.starts_with("$1,000,000,000,000,000,"), "{formatted}");
        assert!(formatted.ends_with(".00"), "{formatted}");
        assert_eq!(formatted.len(), "$".len() + 301 + 100 + ".00".len());
    }

    // ── format_percentage ────────────────────────────────────────────────────

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(92.2856, 1), "92.3%");
        assert_eq!(format_percentage(0.0, 1), "0.0%");
    }

    #[test]
    fn test_format_signed_percentage() {
        assert_eq!(format_signed_percentage(12.34, 1), "+12.3%");
        assert_eq!(format_signed_percentage(-5.0, 1), "-5.0%");
        assert_eq!(format_signed_percentage(0.0, 1), "0.0%");
        assert_eq!(format_signed_percentage(0.01, 1), "0.0%");
    }

    // ── group_thousands ──────────────────────────────────────────────────────

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("5"), "5");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("123456"), "123,456");
    }
}
