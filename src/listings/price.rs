//! Asking-price labels

/// Label used when no usable price is available
pub const CONTACT_FOR_DETAILS: &str = "Contact for Details";

/// Format an asking price as a grouped whole-dollar amount without the
/// currency symbol, e.g. `"250000"` becomes `"250,000"`.
///
/// Missing, empty and non-numeric values yield [`CONTACT_FOR_DETAILS`].
pub fn format_price(asking: Option<&str>) -> String {
    let value = match asking.filter(|s| !s.is_empty()).and_then(parse_number) {
        Some(value) => value,
        None => return CONTACT_FOR_DETAILS.to_string(),
    };

    let sign = if value.is_sign_negative() { "-" } else { "" };
    if value.is_infinite() {
        return format!("{}∞", sign);
    }

    // half away from zero, shortest round-trip digits like the en-US
    // currency formatter
    let whole = format!("{}", value.round().abs());
    format!("{}{}", sign, group_thousands(&whole))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Parse text the way a JavaScript `Number(...)` conversion does.
///
/// Surrounding whitespace is ignored and blank text is zero. Accepts decimal
/// literals with optional sign and exponent, `Infinity`, and unsigned
/// `0x`/`0o`/`0b` integer literals. Returns `None` for anything else.
pub fn parse_number(text: &str) -> Option<f64> {
    let s = text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if s.is_empty() {
        return Some(0.0);
    }

    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(head) = s.get(..2) {
            if head.eq_ignore_ascii_case(prefix) {
                return parse_radix(&s[2..], radix);
            }
        }
    }

    let (negative, unsigned) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = if unsigned == "Infinity" {
        f64::INFINITY
    } else if is_decimal_literal(unsigned) {
        unsigned.parse::<f64>().ok()?
    } else {
        return None;
    };

    Some(if negative { -magnitude } else { magnitude })
}

fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0f64, |acc, ch| {
        ch.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
    })
}

/// `digits [. digits] [e[+-]digits]` with at least one mantissa digit
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut mantissa_digits = 0;

    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        mantissa_digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }

    i == bytes.len()
}
