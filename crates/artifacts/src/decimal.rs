//! Fixed-point formatting with ECMAScript `Number.prototype.toFixed` semantics.
//!
//! Chart values and displayed predictions are compared textually against the
//! service's reference output, so the rounding rule must match exactly:
//! round half up on the exact decimal expansion of the binary value (not
//! banker's rounding, which `format!("{:.N}")` uses on exact ties).

/// Enough fractional digits to print any finite `f64` exactly.
const EXACT_DIGITS: usize = 1100;

/// `toFixed` accepts at most 100 fraction digits.
const MAX_DIGITS: usize = 100;

/// Above this magnitude `toFixed` gives up on fixed notation.
const FIXED_LIMIT: f64 = 1e21;

pub fn to_fixed(value: f64, digits: usize) -> String {
    let digits = digits.min(MAX_DIGITS);

    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value.abs() >= FIXED_LIMIT {
        return exponent_form(value);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let exact = format!("{:.*}", EXACT_DIGITS, value.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(digits))
        .map(|b| b - b'0')
        .collect();

    let round_up = frac_part.as_bytes().get(digits).is_some_and(|&d| d >= b'5');
    if round_up && carry(&mut kept) {
        kept.insert(0, 1);
    }

    let split = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    out.push_str(sign);
    out.extend(kept[..split].iter().map(|d| char::from(b'0' + d)));
    if digits > 0 {
        out.push('.');
        out.extend(kept[split..].iter().map(|d| char::from(b'0' + d)));
    }
    out
}

/// `Number(value.toFixed(digits))`.
pub fn round_to(value: f64, digits: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    to_fixed(value, digits).parse().unwrap_or(value)
}

/// JavaScript `ToString` for magnitudes of at least 1e21: shortest digits,
/// explicit `+` on the exponent.
fn exponent_form(value: f64) -> String {
    format!("{value:e}").replacen('e', "e+", 1)
}

/// Adds one unit in the last place; returns true when it overflows the front.
fn carry(digits: &mut [u8]) -> bool {
    for d in digits.iter_mut().rev() {
        if *d == 9 {
            *d = 0;
        } else {
            *d += 1;
            return false;
        }
    }
    true
}
