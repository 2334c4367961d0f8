//! Numeric transcoders
//!
//! Values travel as decimal ASCII: no leading zeros, a sign only for
//! negatives. This is exactly what `Display` produces for integers.

use std::str::FromStr;

use bytes::Bytes;

use crate::error::{RedlineError, Result};
use super::Transcoder;

/// `i32` as decimal text
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerTranscoder;

/// `i64` as decimal text
#[derive(Debug, Clone, Copy, Default)]
pub struct LongTranscoder;

/// `f64` as decimal text with an optional fractional part
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleTranscoder;

impl Transcoder for IntegerTranscoder {
    type Value = i32;

    fn encode(&self, value: &i32) -> Result<Bytes> {
        Ok(Bytes::from(value.to_string()))
    }

    fn decode(&self, data: Bytes) -> Result<i32> {
        parse_integer(&data)
    }
}

impl Transcoder for LongTranscoder {
    type Value = i64;

    fn encode(&self, value: &i64) -> Result<Bytes> {
        Ok(Bytes::from(value.to_string()))
    }

    fn decode(&self, data: Bytes) -> Result<i64> {
        parse_integer(&data)
    }
}

impl Transcoder for DoubleTranscoder {
    type Value = f64;

    fn encode(&self, value: &f64) -> Result<Bytes> {
        // Servers spell infinities "inf"; NaN has no wire form
        if value.is_nan() {
            return Err(RedlineError::Transcoder("NaN cannot be encoded".to_string()));
        }
        let text = match (value.is_infinite(), value.is_sign_positive()) {
            (true, true) => "inf".to_string(),
            (true, false) => "-inf".to_string(),
            _ => value.to_string(),
        };
        Ok(Bytes::from(text))
    }

    fn decode(&self, data: Bytes) -> Result<f64> {
        let text = ascii(&data)?;
        let value = match text {
            "inf" | "+inf" => f64::INFINITY,
            "-inf" => f64::NEG_INFINITY,
            _ if is_decimal(text) => text.parse::<f64>().map_err(|e| invalid(text, e))?,
            _ => return Err(invalid(text, "not a decimal number")),
        };
        Ok(value)
    }
}

/// Decimal integer without surrounding whitespace
fn parse_integer<T>(data: &[u8]) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let text = ascii(data)?;
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(text, "not an integer"));
    }
    text.parse::<T>().map_err(|e| invalid(text, e))
}

/// `-?digits(.digits)?` with an optional exponent
fn is_decimal(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    let (mantissa, exponent) = match body.find(&['e', 'E'][..]) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };

    let (whole, fraction) = match mantissa.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (mantissa, None),
    };

    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = match fraction {
        Some(f) => (!whole.is_empty() || !f.is_empty()) && digits(whole) && digits(f),
        None => !whole.is_empty() && digits(whole),
    };
    let exponent_ok = match exponent {
        Some(e) => {
            let e = e.strip_prefix(&['-', '+'][..]).unwrap_or(e);
            !e.is_empty() && digits(e)
        }
        None => true,
    };

    mantissa_ok && exponent_ok
}

fn ascii(data: &[u8]) -> Result<&str> {
    std::str::from_utf8(data)
        .map_err(|_| RedlineError::Transcoder("numeric payload is not UTF-8".to_string()))
}

fn invalid(text: &str, reason: impl std::fmt::Display) -> RedlineError {
    RedlineError::Transcoder(format!("cannot decode '{}': {}", text, reason))
}
