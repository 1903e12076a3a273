use std::fmt;

use crate::Decimal;

/// A single field value taken from a record.
///
/// This is the closed set of shapes a record field can hold as far as
/// diffing is concerned.  Relationships that are opted into a comparison
/// are expected to be represented by whatever identifies the related
/// record (usually an [`Value::Int`] or [`Value::Text`] key).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum Value {
    /// The absence of a value.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    List(Vec<Value>),
}

/// The semantic kind of a [`Value`].
///
/// Approximate equality dispatches on these kinds in a fixed order:
/// precise numbers first, then text, then everything else.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Ord, PartialOrd)]
pub enum ValueKind {
    /// Numbers with a fractional part (floats and decimals).
    Precise,
    /// Strings.
    Textual,
    /// Everything else, including null.
    Other,
}

impl Value {
    /// Returns the semantic kind of this value.
    pub fn kind(&self) -> ValueKind {
        match *self {
            Value::Float(_) | Value::Decimal(_) => ValueKind::Precise,
            Value::Text(_) => ValueKind::Textual,
            _ => ValueKind::Other,
        }
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(*self, Value::Null)
    }

    /// Returns the string if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::Text(ref s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as float if it is a precise number.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(f) => Some(f),
            Value::Decimal(ref d) => Some(d.to_f64()),
            _ => None,
        }
    }

    /// Returns the items if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match *self {
            Value::List(ref items) => Some(items),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::Null
    }
}

/// Plain equality.
///
/// Numbers compare by magnitude across representations (`5`, `5.0` and a
/// decimal `5.00` are all equal).  Integers and decimals compare exactly,
/// as do integers and floats.  A float and a decimal compare after the
/// decimal is rounded to the nearest float, so `0.1` equals a decimal
/// `0.1`.  `NaN` equals `NaN` so that every value equals itself.  Every
/// other pairing of different variants is unequal, including booleans
/// and integers.  No whitespace or null handling happens here,
/// that is the job of [`approx_equal`](crate::approx_equal).
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => same_float(*a, *b),
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                int_equals_float(*a, *b)
            }
            (Value::Int(a), Value::Decimal(b)) | (Value::Decimal(b), Value::Int(a)) => {
                Decimal::from(*a) == *b
            }
            (Value::Float(a), Value::Decimal(b)) | (Value::Decimal(b), Value::Float(a)) => {
                same_float(*a, b.to_f64())
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

/// Float equality where `NaN` equals `NaN`.
pub(crate) fn same_float(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Exact comparison without rounding the integer to a float.
fn int_equals_float(i: i64, f: f64) -> bool {
    // 2^63 is the first float above i64::MAX
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) && f as i64 == i
}

impl fmt::Display for Value {
    /// Renders the value for diff output.
    ///
    /// Text is quoted so that whitespace differences stay visible.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Decimal(ref d) => write!(f, "{}", d),
            Value::Text(ref s) => write!(f, "{:?}", s),
            Value::List(ref items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Value {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::Float(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Value {
        Value::Decimal(value)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(value: &'a str) -> Value {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Value {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Value {
        value.map_or(Value::Null, Into::into)
    }
}

#[test]
fn test_kinds() {
    assert_eq!(Value::from(0.5).kind(), ValueKind::Precise);
    assert_eq!(
        Value::from(Decimal::new("0.5").unwrap()).kind(),
        ValueKind::Precise
    );
    assert_eq!(Value::from("John").kind(), ValueKind::Textual);
    assert_eq!(Value::from(5).kind(), ValueKind::Other);
    assert_eq!(Value::Null.kind(), ValueKind::Other);
    assert_eq!(Value::from(vec!["a"]).kind(), ValueKind::Other);
}

#[test]
fn test_plain_equality() {
    assert_eq!(Value::Null, Value::Null);
    assert_eq!(Value::from(5), Value::from(5.0));
    assert_eq!(Value::from(5), Value::from(Decimal::new("5.00").unwrap()));
    assert_eq!(Value::from(0.25), Value::from(Decimal::new("0.25").unwrap()));
    assert_eq!(Value::from(vec![1, 2]), Value::from(vec![1, 2]));
    assert_ne!(Value::from(vec![1, 2]), Value::from(vec![2, 1]));
    assert_ne!(Value::from(5), Value::from("5"));
    assert_ne!(Value::Null, Value::from(""));
    assert_ne!(Value::from(true), Value::from(1));
}

#[test]
fn test_plain_equality_edge_numbers() {
    assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
    assert_ne!(Value::from(f64::NAN), Value::from(0.5));
    assert_eq!(Value::from(f64::INFINITY), Value::from(f64::INFINITY));
    let huge = Value::from(Decimal::new("1e400").unwrap());
    assert_eq!(huge, Value::from(f64::INFINITY));
    assert_eq!(huge, huge.clone());
    assert_ne!(Value::from(9_007_199_254_740_993_i64), Value::from(9_007_199_254_740_992.0));
    assert_eq!(Value::from(9_007_199_254_740_992_i64), Value::from(9_007_199_254_740_992.0));
    assert_ne!(Value::from(i64::MAX), Value::from(9_223_372_036_854_775_808.0));
    assert_ne!(Value::from(5), Value::from(5.5));
    assert_ne!(Value::from(5), Value::from(f64::NAN));
    assert_eq!(Value::from(0.1), Value::from(Decimal::new("0.1").unwrap()));
}

#[test]
fn test_as_list() {
    let value = Value::from(vec!["a", "b"]);
    assert_eq!(
        value.as_list(),
        Some(&[Value::from("a"), Value::from("b")][..])
    );
    assert_eq!(Value::from("ab").as_list(), None);
}

#[test]
fn test_from_option() {
    assert!(Value::from(None::<&str>).is_null());
    assert_eq!(Value::from(Some("x")).as_str(), Some("x"));
}

#[test]
fn test_display() {
    let value = Value::from(vec![
        Value::from("a "),
        Value::from(1),
        Value::from(1.0),
        Value::Null,
    ]);
    insta::assert_snapshot!(value.to_string(), @r###"["a ", 1, 1.0, null]"###);
}
