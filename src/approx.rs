//! Approximate equality of field values.
//!
//! Two values are "approximately equal" when a diff should not report them
//! as a change.  Three kinds of noise are tolerated by default:
//!
//! * floats and decimals that only differ by representation error,
//! * `null` versus an empty or whitespace only string,
//! * leading and trailing whitespace around text.
//!
//! ```rust
//! # use fielddiff::{approx_equal, Value};
//! assert!(approx_equal(&Value::Null, &Value::from("  ")));
//! assert!(approx_equal(&Value::from("John "), &Value::from("John")));
//! assert!(!approx_equal(&Value::from(5), &Value::from("John")));
//! ```
use crate::value::same_float;
use crate::{Value, ValueKind};

/// The default maximum absolute difference between two equal floats.
pub const DEFAULT_FLOAT_EQUALITY_TOLERANCE: f64 = 1e-18;

/// Controls what counts as approximately equal.
#[derive(Clone, Debug, PartialEq)]
pub struct ApproxEqConfig {
    float_equality_tolerance: Option<f64>,
    empty_strings_are_equal_to_null_strings: bool,
    ignore_beginning_ending_whitespace_differences: bool,
}

impl Default for ApproxEqConfig {
    fn default() -> ApproxEqConfig {
        ApproxEqConfig {
            float_equality_tolerance: Some(DEFAULT_FLOAT_EQUALITY_TOLERANCE),
            empty_strings_are_equal_to_null_strings: true,
            ignore_beginning_ending_whitespace_differences: true,
        }
    }
}

impl ApproxEqConfig {
    /// Changes the float tolerance.
    ///
    /// The default is [`DEFAULT_FLOAT_EQUALITY_TOLERANCE`] which is small
    /// enough to be an exact match for floats while still absorbing the
    /// noise of converting a decimal into a float.  Passing `None` turns the
    /// tolerance off and floats and decimals use plain equality.
    pub fn float_equality_tolerance(&mut self, tolerance: Option<f64>) -> &mut Self {
        self.float_equality_tolerance = tolerance;
        self
    }

    /// Controls if `null` and blank strings are the same.
    ///
    /// The default is `true`.
    pub fn empty_strings_are_equal_to_null_strings(&mut self, yes: bool) -> &mut Self {
        self.empty_strings_are_equal_to_null_strings = yes;
        self
    }

    /// Controls if leading and trailing whitespace is ignored.
    ///
    /// The default is `true`.
    pub fn ignore_beginning_ending_whitespace_differences(&mut self, yes: bool) -> &mut Self {
        self.ignore_beginning_ending_whitespace_differences = yes;
        self
    }

    /// Returns the configured float tolerance.
    pub fn tolerance(&self) -> Option<f64> {
        self.float_equality_tolerance
    }

    /// Returns `true` if `null` and blank strings are the same.
    pub fn blanks_equal_null(&self) -> bool {
        self.empty_strings_are_equal_to_null_strings
    }

    /// Returns `true` if surrounding whitespace is ignored.
    pub fn ignores_whitespace(&self) -> bool {
        self.ignore_beginning_ending_whitespace_differences
    }

    /// Checks if two values should be treated as equal.
    ///
    /// The rules are applied in order and the first one that applies wins:
    ///
    /// 1. Two precise numbers (floats or decimals, mixed is fine) are equal
    ///    if they are identical or within the tolerance.  `NaN` is
    ///    identical to `NaN` and infinities to themselves.
    /// 2. If either side is text and blanks equal null, two blank values
    ///    are equal.  Blank is `null` or text without any non-whitespace
    ///    character.
    /// 3. If either side is text and whitespace is ignored, both sides must
    ///    be text and equal once trimmed.  Text never equals a non-text
    ///    value here.
    /// 4. Plain equality.
    pub fn approx_equal(&self, x: &Value, y: &Value) -> bool {
        if let Some(tolerance) = self.float_equality_tolerance {
            if let (Some(a), Some(b)) = (x.as_f64(), y.as_f64()) {
                return same_float(a, b) || (a - b).abs() <= tolerance;
            }
        }

        let either_is_text = x.kind() == ValueKind::Textual || y.kind() == ValueKind::Textual;
        if !either_is_text {
            return x == y;
        }

        if self.empty_strings_are_equal_to_null_strings
            && !has_non_whitespace_text(x)
            && !has_non_whitespace_text(y)
        {
            return true;
        }

        if self.ignore_beginning_ending_whitespace_differences {
            match (x.as_str(), y.as_str()) {
                (Some(a), Some(b)) => a.trim() == b.trim(),
                _ => false,
            }
        } else {
            x == y
        }
    }
}

/// Checks two values with the default [`ApproxEqConfig`].
pub fn approx_equal(x: &Value, y: &Value) -> bool {
    ApproxEqConfig::default().approx_equal(x, y)
}

/// Returns `true` if the value has non-whitespace text.
///
/// `null` and blank strings have none.  Values that are not strings at
/// all are considered to have text.
///
/// ```rust
/// # use fielddiff::{has_non_whitespace_text, Value};
/// assert!(!has_non_whitespace_text(&Value::from("  ")));
/// assert!(!has_non_whitespace_text(&Value::Null));
/// assert!(has_non_whitespace_text(&Value::from("  Hello  ")));
/// assert!(has_non_whitespace_text(&Value::from(5)));
/// ```
pub fn has_non_whitespace_text(value: &Value) -> bool {
    match *value {
        Value::Null => false,
        Value::Text(ref s) => !s.trim().is_empty(),
        _ => true,
    }
}

#[cfg(test)]
fn v<T: Into<Value>>(value: T) -> Value {
    value.into()
}

#[test]
#[allow(clippy::excessive_precision)]
fn test_floats() {
    let mut config = ApproxEqConfig::default();
    assert!(config.approx_equal(&v(0.5), &v(0.50000000000000000001)));
    assert!(!config.approx_equal(&v(0.5), &v(0.5000000000000001)));
    config.float_equality_tolerance(Some(0.0001));
    assert!(config.approx_equal(&v(0.5), &v(0.5000000000000001)));
    assert!(!config.approx_equal(&v(0.5), &v(0.5002)));
}

#[test]
fn test_floats_and_decimals_mix() {
    let half = v(crate::Decimal::new("0.5000000").unwrap());
    assert!(approx_equal(&v(0.5), &half));
    assert!(approx_equal(&half, &v(0.5)));
    assert!(approx_equal(
        &v(crate::Decimal::new("0.1").unwrap()),
        &v(0.1)
    ));
    assert!(!approx_equal(&v(0.5), &v(crate::Decimal::new("0.51").unwrap())));
}

#[test]
fn test_tolerance_disabled() {
    let mut config = ApproxEqConfig::default();
    config.float_equality_tolerance(None);
    assert!(config.approx_equal(&v(0.5), &v(0.5)));
    assert!(!config.approx_equal(&v(0.5), &v(0.5000000000000001)));
    assert!(config.approx_equal(
        &v(crate::Decimal::new("1.50").unwrap()),
        &v(crate::Decimal::new("1.5").unwrap())
    ));
}

#[test]
fn test_numbers_never_match_text() {
    assert!(!approx_equal(&v(0.5), &v("0.5")));
    assert!(!approx_equal(&v(5), &v("John")));
    assert!(!approx_equal(&v(5), &v("5")));
}

#[test]
fn test_strings() {
    let config = ApproxEqConfig::default();
    assert!(config.approx_equal(&Value::Null, &Value::Null));
    assert!(config.approx_equal(&Value::Null, &v("")));
    assert!(config.approx_equal(&v(""), &v("")));
    assert!(config.approx_equal(&Value::Null, &v(" ")));
    assert!(config.approx_equal(&v(""), &v(" ")));
    assert!(config.approx_equal(&v("\t\n"), &Value::Null));
    assert!(!config.approx_equal(&v("Bob"), &v("John")));
    assert!(config.approx_equal(&v("John"), &v("John ")));
    assert!(config.approx_equal(&v("John "), &v("John")));
    assert!(!config.approx_equal(&v("Jo hn"), &v("John")));
    assert!(!config.approx_equal(&Value::Null, &v("John")));
}

#[test]
fn test_blanks_not_equal_null() {
    let mut config = ApproxEqConfig::default();
    config.empty_strings_are_equal_to_null_strings(false);
    assert!(!config.approx_equal(&Value::Null, &v("")));
    assert!(!config.approx_equal(&Value::Null, &v(" ")));
    assert!(config.approx_equal(&v(""), &v(" ")));
    assert!(config.approx_equal(&Value::Null, &Value::Null));
}

#[test]
fn test_whitespace_significant() {
    let mut config = ApproxEqConfig::default();
    config.ignore_beginning_ending_whitespace_differences(false);
    assert!(!config.approx_equal(&v("John"), &v("John ")));
    assert!(config.approx_equal(&v("John"), &v("John")));
    assert!(config.approx_equal(&Value::Null, &v("  ")));
    assert!(!config.approx_equal(&v(5), &v("5")));
}

#[test]
fn test_everything_off() {
    let mut config = ApproxEqConfig::default();
    config
        .float_equality_tolerance(None)
        .empty_strings_are_equal_to_null_strings(false)
        .ignore_beginning_ending_whitespace_differences(false);
    assert!(!config.approx_equal(&Value::Null, &v("")));
    assert!(!config.approx_equal(&v(""), &v(" ")));
    assert!(config.approx_equal(&v("a"), &v("a")));
}

#[test]
fn test_integers() {
    assert!(!approx_equal(&v(5), &v(6)));
    assert!(approx_equal(&v(5), &v(5)));
    assert!(!approx_equal(&Value::Null, &v(5)));
    assert!(!approx_equal(&v(5), &Value::Null));
    assert!(approx_equal(&v(5), &v(5.0)));
}

#[test]
fn test_lists_and_bools() {
    assert!(approx_equal(&v(vec!["a", "b"]), &v(vec!["a", "b"])));
    assert!(!approx_equal(&v(vec!["a", "b"]), &v(vec!["a", "b "])));
    assert!(!approx_equal(&Value::Null, &v(Vec::<Value>::new())));
    assert!(approx_equal(&v(true), &v(true)));
    assert!(!approx_equal(&v(true), &v(false)));
}

#[test]
fn test_reflexive_and_symmetric() {
    let values = vec![
        Value::Null,
        v(""),
        v("  "),
        v("John"),
        v(" John "),
        v(5),
        v(0.5),
        v(crate::Decimal::new("0.5").unwrap()),
        v(true),
        v(vec![1, 2]),
        v(f64::NAN),
        v(f64::INFINITY),
        v(f64::NEG_INFINITY),
        v(crate::Decimal::new("1e400").unwrap()),
    ];
    for x in &values {
        assert!(approx_equal(x, x), "{} should equal itself", x);
        for y in &values {
            assert_eq!(approx_equal(x, y), approx_equal(y, x), "{} vs {}", x, y);
        }
    }
}

#[test]
fn test_non_finite_numbers() {
    let huge = v(crate::Decimal::new("1e400").unwrap());
    assert!(approx_equal(&huge, &v(f64::INFINITY)));
    assert!(!approx_equal(&huge, &v(f64::NEG_INFINITY)));
    assert!(!approx_equal(&v(f64::NAN), &v(f64::INFINITY)));
    assert!(!approx_equal(&v(f64::NAN), &v(0.5)));

    let mut config = ApproxEqConfig::default();
    config.float_equality_tolerance(None);
    assert!(config.approx_equal(&v(f64::NAN), &v(f64::NAN)));
}

#[test]
fn test_config_accessors() {
    let mut config = ApproxEqConfig::default();
    assert_eq!(config.tolerance(), Some(DEFAULT_FLOAT_EQUALITY_TOLERANCE));
    assert!(config.blanks_equal_null());
    assert!(config.ignores_whitespace());

    config
        .float_equality_tolerance(Some(0.01))
        .empty_strings_are_equal_to_null_strings(false)
        .ignore_beginning_ending_whitespace_differences(false);
    assert_eq!(config.tolerance(), Some(0.01));
    assert!(!config.blanks_equal_null());
    assert!(!config.ignores_whitespace());
}

#[test]
fn test_has_non_whitespace_text() {
    assert!(!has_non_whitespace_text(&v("  ")));
    assert!(!has_non_whitespace_text(&v("")));
    assert!(!has_non_whitespace_text(&Value::Null));
    assert!(has_non_whitespace_text(&v("Hello")));
    assert!(has_non_whitespace_text(&v("  Hello  ")));
    assert!(has_non_whitespace_text(&v(5)));
    assert!(has_non_whitespace_text(&v(Vec::<Value>::new())));
}
