//! Number and identifier formatting for LP text.

const SIGNIFICANT_DIGITS: i32 = 12;
const BASE62_ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Format a number with up to 12 significant digits, `%g` style.
///
/// Integral values print without a decimal point, trailing zeros are
/// trimmed, negative zero prints as `0`, and infinities print as `inf` /
/// `-inf`.
pub fn format_lp_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_negative() {
            "-inf".to_string()
        } else {
            "inf".to_string()
        };
    }
    if value == 0.0 {
        return "0".to_string();
    }

    // `%g` picks the exponent of the value already rounded to 12 digits.
    let rendered = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, value);
    let Some((mantissa, exp)) = rendered.split_once('e') else {
        return rendered;
    };
    let Ok(exponent) = exp.parse::<i32>() else {
        return rendered;
    };
    if (-4..SIGNIFICANT_DIGITS).contains(&exponent) {
        let decimals = (SIGNIFICANT_DIGITS - 1 - exponent).max(0) as usize;
        return trim_fraction(format!("{value:.decimals$}"));
    }

    let mantissa = trim_fraction(mantissa.to_string());
    if exponent < 0 {
        format!("{mantissa}e-{:02}", exponent.unsigned_abs())
    } else {
        format!("{mantissa}e+{exponent:02}")
    }
}

fn trim_fraction(mut rendered: String) -> String {
    if rendered.contains('.') {
        while rendered.ends_with('0') {
            rendered.pop();
        }
        if rendered.ends_with('.') {
            rendered.pop();
        }
    }
    if rendered == "-0" { "0".to_string() } else { rendered }
}

/// One signed term: `+2.5 x`, `-x`, `+0 y`.
pub fn format_term(coefficient: f64, name: &str) -> String {
    let sign = if coefficient.is_sign_negative() && coefficient != 0.0 {
        '-'
    } else {
        '+'
    };
    let magnitude = coefficient.abs();
    if magnitude == 1.0 {
        format!("{sign}{name}")
    } else {
        format!("{sign}{} {name}", format_lp_number(magnitude))
    }
}

/// Constant appended to a term list: `+5`, `-0.25`.
pub fn format_signed_constant(value: f64) -> String {
    if value < 0.0 {
        format_lp_number(value)
    } else {
        format!("+{}", format_lp_number(value))
    }
}

/// Base-62 encoding using digits, then lowercase, then uppercase letters.
pub fn base62(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE62_ALPHABET[(value % 62) as usize]);
        value /= 62;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
