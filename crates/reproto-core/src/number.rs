//! Numeric literals.

use std::fmt;

/// A numeric literal as written in a schema.
///
/// Integers without fraction or exponent keep their exact value; anything
/// else is stored as a float.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Integer(i128),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumberError {
    #[error("malformed number literal `{0}`")]
    Malformed(String),
    #[error("number literal `{0}` is out of range")]
    OutOfRange(String),
}

impl Number {
    /// Parse a literal of the form `-?digits(.digits)?([eE][+-]?digits)?`.
    pub fn parse(text: &str) -> Result<Number, NumberError> {
        let malformed = || NumberError::Malformed(text.to_string());

        let unsigned = text.strip_prefix('-').unwrap_or(text);
        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
            None => (unsigned, None),
        };
        let (whole, fraction) = match mantissa.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (mantissa, None),
        };

        if !is_digits(whole) {
            return Err(malformed());
        }
        if let Some(fraction) = fraction {
            if !is_digits(fraction) {
                return Err(malformed());
            }
        }
        if let Some(exponent) = exponent {
            let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            if !is_digits(digits) {
                return Err(malformed());
            }
        }

        if fraction.is_none() && exponent.is_none() {
            return text
                .parse::<i128>()
                .map(Number::Integer)
                .map_err(|_| NumberError::OutOfRange(text.to_string()));
        }

        text.parse::<f64>().map(Number::Float).map_err(|_| malformed())
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Number::Integer(value) => Some(*value),
            Number::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(value) => *value as f64,
            Number::Float(value) => *value,
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(value) => write!(f, "{}", value),
            Number::Float(value) => write!(f, "{}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers() {
        assert_eq!(Number::parse("42"), Ok(Number::Integer(42)));
        assert_eq!(Number::parse("-7"), Ok(Number::Integer(-7)));
        assert_eq!(
            Number::parse("18446744073709551615"),
            Ok(Number::Integer(u64::MAX as i128))
        );
    }

    #[test]
    fn test_fraction_and_exponent() {
        assert_eq!(Number::parse("1.5"), Ok(Number::Float(1.5)));
        assert_eq!(Number::parse("2e3"), Ok(Number::Float(2000.0)));
        assert_eq!(Number::parse("-2.5E-1"), Ok(Number::Float(-0.25)));
    }

    #[test]
    fn test_malformed() {
        for text in ["1.", "1e", "1.2.3", "12abc", "-", "1e+", ".5"] {
            assert!(
                matches!(Number::parse(text), Err(NumberError::Malformed(_))),
                "{text} should be malformed"
            );
        }
    }
}
