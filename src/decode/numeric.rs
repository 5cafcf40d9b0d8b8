//! Numeric coercions used when decoding.
//!
//! `IntNumber` always widens. `DecimalNumber` narrows to `int`/`float` only
//! under `cast_decimal`, and to `int` only when the fraction is zero.
//! Decimal parsing never rounds: a literal that needs more than 28 digits
//! of scale or 96 bits of mantissa is rejected.
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::canonical::CanonicalValue;
use crate::options::Options;

pub(super) fn int(cv: &CanonicalValue, opts: &Options) -> Result<i64, String> {
    match cv {
        CanonicalValue::IntNumber(i) => Ok(*i),
        CanonicalValue::DecimalNumber(text) if !text.is_fractional_literal() => {
            text.as_str().parse::<i64>().map_err(|_| format!("{text} is out of range for a 64-bit integer"))
        }
        CanonicalValue::DecimalNumber(text) => {
            if !opts.cast_decimal {
                return Err(format!("decimal number {text} is not cast to int unless decimal casting is on"));
            }
            let x = exact(text.as_str()).ok_or_else(|| inexact(text.as_str()))?;
            if !x.fract().is_zero() {
                return Err(format!("{text} has a non-zero fractional part"));
            }
            x.to_i64().ok_or_else(|| format!("{text} does not fit a 64-bit integer"))
        }
        other => Err(found(other)),
    }
}

pub(super) fn float(cv: &CanonicalValue, opts: &Options) -> Result<f64, String> {
    match cv {
        CanonicalValue::IntNumber(i) => Ok(*i as f64),
        CanonicalValue::DecimalNumber(text) if opts.cast_decimal => {
            text.to_f64().ok_or_else(|| format!("{text} is out of float range"))
        }
        CanonicalValue::DecimalNumber(text) => {
            Err(format!("decimal number {text} is not cast to float unless decimal casting is on"))
        }
        other => Err(found(other)),
    }
}

pub(super) fn decimal(cv: &CanonicalValue) -> Result<Decimal, String> {
    match cv {
        CanonicalValue::IntNumber(i) => Ok(Decimal::from(*i)),
        CanonicalValue::DecimalNumber(text) => {
            exact(text.as_str()).ok_or_else(|| inexact(text.as_str()))
        }
        CanonicalValue::Str(s) if s.parse::<serde_json::Number>().is_ok() => exact(s).ok_or_else(|| inexact(s)),
        CanonicalValue::Str(s) => Err(format!("'{s}' is not a decimal number")),
        other => Err(found(other)),
    }
}

/// Parses a decimal literal exactly, or not at all.
pub(super) fn exact(text: &str) -> Option<Decimal> {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(at) => (&text[..at], text[at + 1..].parse::<i64>().ok()?),
        None => (text, 0),
    };
    let m = Decimal::from_str_exact(mantissa).ok()?;
    let scale = i64::from(m.scale()) - exponent;
    if scale >= 0 {
        Decimal::try_from_i128_with_scale(m.mantissa(), u32::try_from(scale).ok()?).ok()
    } else {
        let shift = 10i128.checked_pow(u32::try_from(-scale).ok()?)?;
        Decimal::try_from_i128_with_scale(m.mantissa().checked_mul(shift)?, 0).ok()
    }
}

fn inexact(text: &str) -> String {
    format!("{text} cannot be held exactly as a decimal")
}

pub(super) fn found(cv: &CanonicalValue) -> String {
    format!("found {}", cv.kind())
}
