//! Scanning of numeric tokens inside bracketed text data.
use std::io::{self, BufRead};

use crate::error::SpecialValue;
use crate::io::stream::InputStream;
use crate::math::Real;

/// Outcome of scanning one token of text data.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scanned<T> {
    Value(T),
    Special(T, SpecialValue),
    Invalid(String),
}

fn ends_token(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b';' || b == b']'
}

fn classify<T: Real>(value: T) -> Scanned<T> {
    if value.is_nan() {
        Scanned::Special(value, SpecialValue::NaN)
    } else if value.is_infinite() {
        Scanned::Special(value, SpecialValue::Infinity)
    } else {
        Scanned::Value(value)
    }
}

/// Scan a token that starts with a digit or `-`. Signed specials such as
/// `-inf` parse here too.
pub(crate) fn scan_number<T: Real, R: BufRead>(
    input: &mut InputStream<R>,
) -> io::Result<Scanned<T>> {
    let token = input.read_until(ends_token)?.unwrap_or_default();
    Ok(match token.parse::<T>() {
        Ok(value) => classify(value),
        Err(_) => Scanned::Invalid(token),
    })
}

/// Scan any other token; only `inf`, `infinity` and `nan` (any case) are
/// accepted.
pub(crate) fn scan_word<T: Real, R: BufRead>(input: &mut InputStream<R>) -> io::Result<Scanned<T>> {
    let token = input.read_until(ends_token)?.unwrap_or_default();
    let lower = token.to_ascii_lowercase();
    Ok(match lower.as_str() {
        "inf" | "infinity" => Scanned::Special(T::infinity(), SpecialValue::Infinity),
        "nan" => Scanned::Special(T::nan(), SpecialValue::NaN),
        _ => Scanned::Invalid(token),
    })
}

/// After the closing `]`, eat the line terminator written with it.
pub(crate) fn consume_line_end<R: BufRead>(input: &mut InputStream<R>) -> io::Result<()> {
    match input.peek()? {
        Some(b'\r') => {
            input.next_byte()?;
            if input.peek()? == Some(b'\n') {
                input.next_byte()?;
            }
        }
        Some(b'\n') => {
            input.next_byte()?;
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_stop_at_separators() {
        let mut input = InputStream::from_bytes(b"-1.5;2]");
        assert_eq!(scan_number::<f64, _>(&mut input).unwrap(), Scanned::Value(-1.5));
        assert_eq!(input.peek().unwrap(), Some(b';'));
    }

    #[test]
    fn signed_infinity_is_special() {
        let mut input = InputStream::from_bytes(b"-inf ");
        match scan_number::<f32, _>(&mut input).unwrap() {
            Scanned::Special(v, SpecialValue::Infinity) => assert!(v.is_infinite() && v < 0.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn words_accept_only_specials() {
        let mut input = InputStream::from_bytes(b"NaN Infinity abc");
        assert!(matches!(
            scan_word::<f32, _>(&mut input).unwrap(),
            Scanned::Special(_, SpecialValue::NaN)
        ));
        input.skip_whitespace().unwrap();
        assert!(matches!(
            scan_word::<f32, _>(&mut input).unwrap(),
            Scanned::Special(_, SpecialValue::Infinity)
        ));
        input.skip_whitespace().unwrap();
        assert_eq!(
            scan_word::<f32, _>(&mut input).unwrap(),
            Scanned::Invalid("abc".to_string())
        );
    }

    #[test]
    fn line_end_variants() {
        let mut crlf = InputStream::from_bytes(b"\r\nx");
        consume_line_end(&mut crlf).unwrap();
        assert_eq!(crlf.position(), 2);
        let mut none = InputStream::from_bytes(b" x");
        consume_line_end(&mut none).unwrap();
        assert_eq!(none.position(), 0);
    }
}
