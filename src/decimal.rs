use std::fmt;
use std::str::FromStr;

use crate::Error;

/// An arbitrary precision decimal number.
///
/// Records frequently store money and measurements as fixed point
/// decimals while the same numbers show up as floats elsewhere.  This type
/// keeps the literal exactly as it was written so nothing is lost until a
/// comparison explicitly asks for a float via [`Decimal::to_f64`].
///
/// Equality is exact and ignores scale, so `1.5` equals `1.50` but
/// `0.1` does not equal `0.10000000000000001`.
#[derive(Clone, Debug)]
pub struct Decimal {
    repr: String,
    negative: bool,
    digits: String,
    exponent: i64,
}

impl Decimal {
    /// Parses a decimal literal such as `-12.50` or `1.2e-3`.
    pub fn new(s: &str) -> Result<Decimal, Error> {
        let repr = s.trim();
        let (negative, digits, exponent) =
            canonicalize(repr).ok_or_else(|| Error::InvalidDecimal(s.to_string()))?;
        Ok(Decimal {
            repr: repr.to_string(),
            negative,
            digits,
            exponent,
        })
    }

    /// Returns the literal as it was written.
    pub fn as_str(&self) -> &str {
        &self.repr
    }

    /// Returns `true` if the number is zero.
    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Converts into the nearest float.
    pub fn to_f64(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        format!(
            "{}{}e{}",
            if self.negative { "-" } else { "" },
            self.digits,
            self.exponent
        )
        .parse()
        .unwrap_or(f64::NAN)
    }
}

/// Splits a literal into sign, significant digits and exponent with
/// leading and trailing zeros removed.  Zero has no digits and no sign.
fn canonicalize(s: &str) -> Option<(bool, String, i64)> {
    let (negative, rest) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let (mantissa, exponent) = match rest.find(|c: char| c == 'e' || c == 'E') {
        Some(idx) => (&rest[..idx], rest[idx + 1..].parse::<i64>().ok()?),
        None => (rest, 0),
    };
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(idx) => (&mantissa[..idx], &mantissa[idx + 1..]),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part
        .bytes()
        .chain(frac_part.bytes())
        .all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let mut digits: String = int_part
        .chars()
        .chain(frac_part.chars())
        .skip_while(|&c| c == '0')
        .collect();
    let mut exponent = exponent.saturating_sub(frac_part.len() as i64);
    while digits.ends_with('0') {
        digits.pop();
        exponent = exponent.saturating_add(1);
    }
    if digits.is_empty() {
        return Some((false, digits, 0));
    }
    Some((negative, digits, exponent))
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Decimal, Error> {
        Decimal::new(s)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Decimal {
        let repr = value.to_string();
        let (negative, digits, exponent) =
            canonicalize(&repr).unwrap_or((false, String::new(), 0));
        Decimal {
            repr,
            negative,
            digits,
            exponent,
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Decimal) -> bool {
        self.negative == other.negative
            && self.exponent == other.exponent
            && self.digits == other.digits
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Decimal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.repr)
    }
}

#[test]
fn test_scale_insensitive_equality() {
    let a: Decimal = "1.5".parse().unwrap();
    let b: Decimal = "001.500".parse().unwrap();
    let c: Decimal = "15e-1".parse().unwrap();
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_ne!(a, "1.51".parse::<Decimal>().unwrap());
    assert_ne!(a, "-1.5".parse::<Decimal>().unwrap());
}

#[test]
fn test_zero_has_no_sign() {
    let zero = Decimal::new("0").unwrap();
    assert!(zero.is_zero());
    assert_eq!(zero, Decimal::new("-0.000").unwrap());
    assert_eq!(zero.to_f64(), 0.0);
}

#[test]
fn test_to_f64() {
    assert_eq!(Decimal::new("0.5").unwrap().to_f64(), 0.5);
    assert_eq!(Decimal::new("-12.25").unwrap().to_f64(), -12.25);
    assert_eq!(Decimal::new("2.5E2").unwrap().to_f64(), 250.0);
    assert_eq!(Decimal::from(42).to_f64(), 42.0);
    assert_eq!(Decimal::new("0.50000000000000000001").unwrap().to_f64(), 0.5);
}

#[test]
fn test_keeps_literal() {
    let d = Decimal::new(" 10.50 ").unwrap();
    assert_eq!(d.as_str(), "10.50");
    assert_eq!(d.to_string(), "10.50");
}

#[test]
fn test_invalid_literals() {
    for bad in &["", "-", ".", "abc", "1.2.3", "1e", "1,5", "0x10"] {
        assert_eq!(
            Decimal::new(bad).unwrap_err(),
            Error::InvalidDecimal(bad.to_string()),
            "{:?} should be rejected",
            bad
        );
    }
}
